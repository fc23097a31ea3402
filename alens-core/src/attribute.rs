// SPDX-License-Identifier: AGPL-3.0-or-later
//! Attribute identity space
//!
//! Every piece of file metadata is addressed by an [`AttributeId`]. IDs below
//! [`AttributeId::CUSTOM_START`] are well-known: each has an entry in the
//! static [`ATTRIBUTES`] table giving its name and expected kind (and thereby
//! its default value). IDs from `CUSTOM_START` up are custom; they have no
//! table entry and are interpreted by the active driver or by the path
//! convention in [`crate::custom`]. Raw numbers between the end of the table
//! and `CUSTOM_START` are unassigned and cannot be turned into an ID.
//!
//! Well-known IDs are append-only. Never renumber an existing entry: IDs may
//! have been persisted or sent over the wire by callers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AlensError;
use crate::value::{AttributeKind, AttributeValue};

/// Identifier of one piece of file metadata
///
/// Either a well-known ID with a table entry or a custom ID. Outside this
/// crate IDs come from the named constants, [`AttributeId::from_name`] or
/// `TryFrom<u32>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct AttributeId(pub(crate) u32);

/// Static metadata for a well-known attribute
#[derive(Debug, Clone, Copy)]
pub struct AttributeInfo {
    pub id: AttributeId,
    pub name: &'static str,
    pub kind: AttributeKind,
}

impl AttributeInfo {
    const fn new(id: AttributeId, name: &'static str, kind: AttributeKind) -> Self {
        Self { id, name, kind }
    }

    /// Declared default, returned when resolution fails
    pub fn default_value(&self) -> AttributeValue {
        self.kind.zero()
    }
}

impl AttributeId {
    pub const STANDARD_TYPE: Self = Self(0);
    pub const STANDARD_IS_HIDDEN: Self = Self(1);
    pub const STANDARD_IS_BACKUP: Self = Self(2);
    pub const STANDARD_IS_SYMLINK: Self = Self(3);
    pub const STANDARD_IS_VIRTUAL: Self = Self(4);
    pub const STANDARD_IS_VOLATILE: Self = Self(5);
    pub const STANDARD_NAME: Self = Self(6);
    pub const STANDARD_DISPLAY_NAME: Self = Self(7);
    pub const STANDARD_EDIT_NAME: Self = Self(8);
    pub const STANDARD_COPY_NAME: Self = Self(9);
    pub const STANDARD_CONTENT_TYPE: Self = Self(10);
    pub const STANDARD_FAST_CONTENT_TYPE: Self = Self(11);
    pub const STANDARD_SIZE: Self = Self(12);
    pub const STANDARD_ALLOCATED_SIZE: Self = Self(13);
    pub const STANDARD_SYMLINK_TARGET: Self = Self(14);
    pub const STANDARD_TARGET_URI: Self = Self(15);
    pub const STANDARD_SORT_ORDER: Self = Self(16);
    pub const ETAG_VALUE: Self = Self(17);
    pub const ID_FILE: Self = Self(18);
    pub const ID_FILESYSTEM: Self = Self(19);
    pub const ACCESS_CAN_READ: Self = Self(20);
    pub const ACCESS_CAN_WRITE: Self = Self(21);
    pub const ACCESS_CAN_EXECUTE: Self = Self(22);
    pub const ACCESS_CAN_DELETE: Self = Self(23);
    pub const ACCESS_CAN_TRASH: Self = Self(24);
    pub const ACCESS_CAN_RENAME: Self = Self(25);
    pub const TIME_MODIFIED: Self = Self(26);
    pub const TIME_MODIFIED_USEC: Self = Self(27);
    pub const TIME_ACCESS: Self = Self(28);
    pub const TIME_ACCESS_USEC: Self = Self(29);
    pub const TIME_CHANGED: Self = Self(30);
    pub const TIME_CHANGED_USEC: Self = Self(31);
    pub const TIME_CREATED: Self = Self(32);
    pub const TIME_CREATED_USEC: Self = Self(33);
    pub const UNIX_DEVICE: Self = Self(34);
    pub const UNIX_INODE: Self = Self(35);
    pub const UNIX_MODE: Self = Self(36);
    pub const UNIX_NLINK: Self = Self(37);
    pub const UNIX_UID: Self = Self(38);
    pub const UNIX_GID: Self = Self(39);
    pub const UNIX_RDEV: Self = Self(40);
    pub const UNIX_BLOCK_SIZE: Self = Self(41);
    pub const UNIX_BLOCKS: Self = Self(42);
    pub const UNIX_IS_MOUNTPOINT: Self = Self(43);
    pub const DOS_IS_ARCHIVE: Self = Self(44);
    pub const DOS_IS_SYSTEM: Self = Self(45);
    pub const OWNER_USER: Self = Self(46);
    pub const OWNER_USER_REAL: Self = Self(47);
    pub const OWNER_GROUP: Self = Self(48);
    pub const THUMBNAIL_PATH: Self = Self(49);
    pub const THUMBNAIL_FAILED: Self = Self(50);
    pub const THUMBNAIL_IS_VALID: Self = Self(51);
    pub const FILESYSTEM_SIZE: Self = Self(52);
    pub const FILESYSTEM_FREE: Self = Self(53);
    pub const FILESYSTEM_USED: Self = Self(54);
    pub const FILESYSTEM_TYPE: Self = Self(55);
    pub const FILESYSTEM_READONLY: Self = Self(56);
    pub const GVFS_BACKEND: Self = Self(57);
    pub const SELINUX_CONTEXT: Self = Self(58);
    pub const TRASH_ITEM_COUNT: Self = Self(59);
    pub const TRASH_ORIG_PATH: Self = Self(60);
    pub const TRASH_DELETION_DATE: Self = Self(61);

    /// First custom ID; itself reserved, never resolved
    pub const CUSTOM_START: Self = Self(500);

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_custom(self) -> bool {
        self.0 >= Self::CUSTOM_START.0
    }

    /// Table entry for a well-known ID
    pub fn info(self) -> Option<&'static AttributeInfo> {
        if self.is_custom() {
            return None;
        }
        ATTRIBUTES.get(self.0 as usize)
    }

    /// Display name: the table name for well-known IDs, the convention name
    /// for path-derived custom IDs, `None` otherwise
    pub fn name(self) -> Option<&'static str> {
        match self.info() {
            Some(info) => Some(info.name),
            None => crate::custom::name_of(self),
        }
    }

    /// Declared default; [`AttributeValue::Invalid`] for custom IDs
    pub fn default_value(self) -> AttributeValue {
        self.info()
            .map(AttributeInfo::default_value)
            .unwrap_or(AttributeValue::Invalid)
    }

    /// Look up an ID by its display name
    pub fn from_name(name: &str) -> Option<Self> {
        ATTRIBUTES
            .iter()
            .find(|info| info.name == name)
            .map(|info| info.id)
            .or_else(|| crate::custom::id_of(name))
    }

    /// All well-known IDs, in numbering order
    pub fn well_known() -> impl Iterator<Item = AttributeId> {
        ATTRIBUTES.iter().map(|info| info.id)
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "custom::{}", self.0),
        }
    }
}

impl TryFrom<u32> for AttributeId {
    type Error = AlensError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        if raw < ATTRIBUTES.len() as u32 || raw >= Self::CUSTOM_START.0 {
            Ok(Self(raw))
        } else {
            Err(AlensError::UnassignedAttribute(raw))
        }
    }
}

impl From<AttributeId> for u32 {
    fn from(id: AttributeId) -> Self {
        id.0
    }
}

use crate::value::AttributeKind as K;

/// Well-known attribute table, indexed by ID
pub static ATTRIBUTES: &[AttributeInfo] = &[
    AttributeInfo::new(AttributeId::STANDARD_TYPE, "standard::type", K::U32),
    AttributeInfo::new(AttributeId::STANDARD_IS_HIDDEN, "standard::is-hidden", K::Bool),
    AttributeInfo::new(AttributeId::STANDARD_IS_BACKUP, "standard::is-backup", K::Bool),
    AttributeInfo::new(AttributeId::STANDARD_IS_SYMLINK, "standard::is-symlink", K::Bool),
    AttributeInfo::new(AttributeId::STANDARD_IS_VIRTUAL, "standard::is-virtual", K::Bool),
    AttributeInfo::new(AttributeId::STANDARD_IS_VOLATILE, "standard::is-volatile", K::Bool),
    AttributeInfo::new(AttributeId::STANDARD_NAME, "standard::name", K::String),
    AttributeInfo::new(AttributeId::STANDARD_DISPLAY_NAME, "standard::display-name", K::String),
    AttributeInfo::new(AttributeId::STANDARD_EDIT_NAME, "standard::edit-name", K::String),
    AttributeInfo::new(AttributeId::STANDARD_COPY_NAME, "standard::copy-name", K::String),
    AttributeInfo::new(AttributeId::STANDARD_CONTENT_TYPE, "standard::content-type", K::String),
    AttributeInfo::new(AttributeId::STANDARD_FAST_CONTENT_TYPE, "standard::fast-content-type", K::String),
    AttributeInfo::new(AttributeId::STANDARD_SIZE, "standard::size", K::U64),
    AttributeInfo::new(AttributeId::STANDARD_ALLOCATED_SIZE, "standard::allocated-size", K::U64),
    AttributeInfo::new(AttributeId::STANDARD_SYMLINK_TARGET, "standard::symlink-target", K::String),
    AttributeInfo::new(AttributeId::STANDARD_TARGET_URI, "standard::target-uri", K::String),
    AttributeInfo::new(AttributeId::STANDARD_SORT_ORDER, "standard::sort-order", K::I32),
    AttributeInfo::new(AttributeId::ETAG_VALUE, "etag::value", K::String),
    AttributeInfo::new(AttributeId::ID_FILE, "id::file", K::String),
    AttributeInfo::new(AttributeId::ID_FILESYSTEM, "id::filesystem", K::String),
    AttributeInfo::new(AttributeId::ACCESS_CAN_READ, "access::can-read", K::Bool),
    AttributeInfo::new(AttributeId::ACCESS_CAN_WRITE, "access::can-write", K::Bool),
    AttributeInfo::new(AttributeId::ACCESS_CAN_EXECUTE, "access::can-execute", K::Bool),
    AttributeInfo::new(AttributeId::ACCESS_CAN_DELETE, "access::can-delete", K::Bool),
    AttributeInfo::new(AttributeId::ACCESS_CAN_TRASH, "access::can-trash", K::Bool),
    AttributeInfo::new(AttributeId::ACCESS_CAN_RENAME, "access::can-rename", K::Bool),
    AttributeInfo::new(AttributeId::TIME_MODIFIED, "time::modified", K::U64),
    AttributeInfo::new(AttributeId::TIME_MODIFIED_USEC, "time::modified-usec", K::U32),
    AttributeInfo::new(AttributeId::TIME_ACCESS, "time::access", K::U64),
    AttributeInfo::new(AttributeId::TIME_ACCESS_USEC, "time::access-usec", K::U32),
    AttributeInfo::new(AttributeId::TIME_CHANGED, "time::changed", K::U64),
    AttributeInfo::new(AttributeId::TIME_CHANGED_USEC, "time::changed-usec", K::U32),
    AttributeInfo::new(AttributeId::TIME_CREATED, "time::created", K::U64),
    AttributeInfo::new(AttributeId::TIME_CREATED_USEC, "time::created-usec", K::U32),
    AttributeInfo::new(AttributeId::UNIX_DEVICE, "unix::device", K::U32),
    AttributeInfo::new(AttributeId::UNIX_INODE, "unix::inode", K::U64),
    AttributeInfo::new(AttributeId::UNIX_MODE, "unix::mode", K::U32),
    AttributeInfo::new(AttributeId::UNIX_NLINK, "unix::nlink", K::U32),
    AttributeInfo::new(AttributeId::UNIX_UID, "unix::uid", K::U32),
    AttributeInfo::new(AttributeId::UNIX_GID, "unix::gid", K::U32),
    AttributeInfo::new(AttributeId::UNIX_RDEV, "unix::rdev", K::U32),
    AttributeInfo::new(AttributeId::UNIX_BLOCK_SIZE, "unix::block-size", K::U32),
    AttributeInfo::new(AttributeId::UNIX_BLOCKS, "unix::blocks", K::U64),
    AttributeInfo::new(AttributeId::UNIX_IS_MOUNTPOINT, "unix::is-mountpoint", K::Bool),
    AttributeInfo::new(AttributeId::DOS_IS_ARCHIVE, "dos::is-archive", K::Bool),
    AttributeInfo::new(AttributeId::DOS_IS_SYSTEM, "dos::is-system", K::Bool),
    AttributeInfo::new(AttributeId::OWNER_USER, "owner::user", K::String),
    AttributeInfo::new(AttributeId::OWNER_USER_REAL, "owner::user-real", K::String),
    AttributeInfo::new(AttributeId::OWNER_GROUP, "owner::group", K::String),
    AttributeInfo::new(AttributeId::THUMBNAIL_PATH, "thumbnail::path", K::String),
    AttributeInfo::new(AttributeId::THUMBNAIL_FAILED, "thumbnail::failed", K::Bool),
    AttributeInfo::new(AttributeId::THUMBNAIL_IS_VALID, "thumbnail::is-valid", K::Bool),
    AttributeInfo::new(AttributeId::FILESYSTEM_SIZE, "filesystem::size", K::U64),
    AttributeInfo::new(AttributeId::FILESYSTEM_FREE, "filesystem::free", K::U64),
    AttributeInfo::new(AttributeId::FILESYSTEM_USED, "filesystem::used", K::U64),
    AttributeInfo::new(AttributeId::FILESYSTEM_TYPE, "filesystem::type", K::String),
    AttributeInfo::new(AttributeId::FILESYSTEM_READONLY, "filesystem::readonly", K::Bool),
    AttributeInfo::new(AttributeId::GVFS_BACKEND, "gvfs::backend", K::String),
    AttributeInfo::new(AttributeId::SELINUX_CONTEXT, "selinux::context", K::String),
    AttributeInfo::new(AttributeId::TRASH_ITEM_COUNT, "trash::item-count", K::U32),
    AttributeInfo::new(AttributeId::TRASH_ORIG_PATH, "trash::orig-path", K::String),
    AttributeInfo::new(AttributeId::TRASH_DELETION_DATE, "trash::deletion-date", K::String),
];

/// File type values carried by `standard::type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum FileType {
    Unknown = 0,
    Regular = 1,
    Directory = 2,
    SymbolicLink = 3,
    Special = 4,
    Shortcut = 5,
    Mountable = 6,
}

impl FileType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => FileType::Regular,
            2 => FileType::Directory,
            3 => FileType::SymbolicLink,
            4 => FileType::Special,
            5 => FileType::Shortcut,
            6 => FileType::Mountable,
            _ => FileType::Unknown,
        }
    }
}

impl From<FileType> for AttributeValue {
    fn from(kind: FileType) -> Self {
        AttributeValue::U32(kind as u32)
    }
}
