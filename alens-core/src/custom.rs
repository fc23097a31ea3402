// SPDX-License-Identifier: AGPL-3.0-or-later
//! Path-derived custom attributes
//!
//! A handful of custom IDs have a meaning every driver can share: they are
//! computed from the file's path rather than queried from a backend. Name
//! splitting follows the usual file-manager convention:
//!
//! | path                | base-name | complete-base-name | suffix   | complete-suffix |
//! |---------------------|-----------|--------------------|----------|-----------------|
//! | `/a/archive.tar.gz` | `archive` | `archive.tar`      | `gz`     | `tar.gz`        |
//! | `/a/README`         | `README`  | `README`           | (empty)  | (empty)         |
//! | `/a/.bashrc`        | (empty)   | (empty)            | `bashrc` | `bashrc`        |

use std::path::Path;

use crate::attribute::AttributeId;
use crate::value::AttributeValue;

impl AttributeId {
    pub const STANDARD_IS_FILE: Self = Self(Self::CUSTOM_START.0 + 1);
    pub const STANDARD_IS_DIR: Self = Self(Self::CUSTOM_START.0 + 2);
    pub const STANDARD_FILE_PATH: Self = Self(Self::CUSTOM_START.0 + 3);
    pub const STANDARD_PARENT_PATH: Self = Self(Self::CUSTOM_START.0 + 4);
    pub const STANDARD_FILE_NAME: Self = Self(Self::CUSTOM_START.0 + 5);
    pub const STANDARD_BASE_NAME: Self = Self(Self::CUSTOM_START.0 + 6);
    pub const STANDARD_COMPLETE_BASE_NAME: Self = Self(Self::CUSTOM_START.0 + 7);
    pub const STANDARD_SUFFIX: Self = Self(Self::CUSTOM_START.0 + 8);
    pub const STANDARD_COMPLETE_SUFFIX: Self = Self(Self::CUSTOM_START.0 + 9);
}

/// Convention names. Used for name lookup only; the well-known table is
/// never consulted for these IDs.
pub const PATH_ATTRIBUTES: &[(AttributeId, &str)] = &[
    (AttributeId::STANDARD_IS_FILE, "custom::is-file"),
    (AttributeId::STANDARD_IS_DIR, "custom::is-dir"),
    (AttributeId::STANDARD_FILE_PATH, "custom::file-path"),
    (AttributeId::STANDARD_PARENT_PATH, "custom::parent-path"),
    (AttributeId::STANDARD_FILE_NAME, "custom::file-name"),
    (AttributeId::STANDARD_BASE_NAME, "custom::base-name"),
    (AttributeId::STANDARD_COMPLETE_BASE_NAME, "custom::complete-base-name"),
    (AttributeId::STANDARD_SUFFIX, "custom::suffix"),
    (AttributeId::STANDARD_COMPLETE_SUFFIX, "custom::complete-suffix"),
];

pub fn name_of(id: AttributeId) -> Option<&'static str> {
    PATH_ATTRIBUTES
        .iter()
        .find(|(candidate, _)| *candidate == id)
        .map(|(_, name)| *name)
}

pub fn id_of(name: &str) -> Option<AttributeId> {
    PATH_ATTRIBUTES
        .iter()
        .find(|(_, candidate)| *candidate == name)
        .map(|(id, _)| *id)
}

/// Resolve a path-convention attribute; `Invalid` for anything else
pub fn from_path(path: &Path, id: AttributeId) -> AttributeValue {
    name_attribute(path, id)
        .or_else(|| type_attribute(path, id))
        .unwrap_or(AttributeValue::Invalid)
}

/// Attributes computed from the path string alone
pub fn name_attribute(path: &Path, id: AttributeId) -> Option<AttributeValue> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let value = match id {
        AttributeId::STANDARD_FILE_PATH => path.to_string_lossy().into_owned(),
        AttributeId::STANDARD_PARENT_PATH => path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default(),
        AttributeId::STANDARD_FILE_NAME => file_name,
        AttributeId::STANDARD_BASE_NAME => split_first(&file_name).0.to_string(),
        AttributeId::STANDARD_COMPLETE_BASE_NAME => split_last(&file_name).0.to_string(),
        AttributeId::STANDARD_SUFFIX => split_last(&file_name).1.to_string(),
        AttributeId::STANDARD_COMPLETE_SUFFIX => split_first(&file_name).1.to_string(),
        _ => return None,
    };
    Some(AttributeValue::String(value))
}

/// Attributes that need a `stat` of the path
///
/// A path that cannot be inspected yields `None`, like any unresolvable
/// custom attribute.
pub fn type_attribute(path: &Path, id: AttributeId) -> Option<AttributeValue> {
    if id != AttributeId::STANDARD_IS_FILE && id != AttributeId::STANDARD_IS_DIR {
        return None;
    }
    let meta = std::fs::metadata(path).ok()?;
    match id {
        AttributeId::STANDARD_IS_FILE => Some(AttributeValue::Bool(meta.is_file())),
        _ => Some(AttributeValue::Bool(meta.is_dir())),
    }
}

fn split_first(name: &str) -> (&str, &str) {
    name.split_once('.').unwrap_or((name, ""))
}

fn split_last(name: &str) -> (&str, &str) {
    name.rsplit_once('.').unwrap_or((name, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(path: &str, id: AttributeId) -> String {
        from_path(Path::new(path), id).as_str().unwrap().to_string()
    }

    #[test]
    fn all_ids_are_custom() {
        for (id, _) in PATH_ATTRIBUTES {
            assert!(id.is_custom());
            assert!(id.info().is_none());
        }
    }

    #[test]
    fn names_resolve_both_ways() {
        assert_eq!(id_of("custom::suffix"), Some(AttributeId::STANDARD_SUFFIX));
        assert_eq!(name_of(AttributeId::STANDARD_SUFFIX), Some("custom::suffix"));
        assert_eq!(AttributeId::from_name("custom::is-dir"), Some(AttributeId::STANDARD_IS_DIR));
        assert_eq!(name_of(AttributeId(9999)), None);
    }

    #[test]
    fn splits_multi_dot_names() {
        let p = "/home/user/archive.tar.gz";
        assert_eq!(name(p, AttributeId::STANDARD_FILE_NAME), "archive.tar.gz");
        assert_eq!(name(p, AttributeId::STANDARD_BASE_NAME), "archive");
        assert_eq!(name(p, AttributeId::STANDARD_COMPLETE_BASE_NAME), "archive.tar");
        assert_eq!(name(p, AttributeId::STANDARD_SUFFIX), "gz");
        assert_eq!(name(p, AttributeId::STANDARD_COMPLETE_SUFFIX), "tar.gz");
        assert_eq!(name(p, AttributeId::STANDARD_PARENT_PATH), "/home/user");
        assert_eq!(name(p, AttributeId::STANDARD_FILE_PATH), p);
    }

    #[test]
    fn splits_names_without_dot() {
        let p = "/home/user/README";
        assert_eq!(name(p, AttributeId::STANDARD_BASE_NAME), "README");
        assert_eq!(name(p, AttributeId::STANDARD_SUFFIX), "");
    }

    #[test]
    fn splits_dotfiles() {
        let p = "/home/user/.bashrc";
        assert_eq!(name(p, AttributeId::STANDARD_BASE_NAME), "");
        assert_eq!(name(p, AttributeId::STANDARD_SUFFIX), "bashrc");
    }

    #[test]
    fn root_has_empty_names() {
        assert_eq!(name("/", AttributeId::STANDARD_FILE_NAME), "");
        assert_eq!(name("/", AttributeId::STANDARD_PARENT_PATH), "");
    }

    #[test]
    fn type_checks_need_an_existing_path() {
        let missing = Path::new("/definitely/not/here/alens");
        assert_eq!(from_path(missing, AttributeId::STANDARD_IS_FILE), AttributeValue::Invalid);

        let dir = std::env::temp_dir();
        assert_eq!(from_path(&dir, AttributeId::STANDARD_IS_DIR), AttributeValue::Bool(true));
        assert_eq!(from_path(&dir, AttributeId::STANDARD_IS_FILE), AttributeValue::Bool(false));
    }

    #[test]
    fn unknown_custom_ids_are_invalid() {
        assert_eq!(from_path(Path::new("/tmp"), AttributeId(777)), AttributeValue::Invalid);
    }
}
