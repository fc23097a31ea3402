// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mounted remote driver
//!
//! Remote locations are reached through the FUSE mounts a GVFS daemon keeps
//! under a single mount root, one directory per connected location:
//!
//! | URI                               | mount directory                          |
//! |-----------------------------------|------------------------------------------|
//! | `smb://srv/docs/a.txt`            | `smb-share:server=srv,share=docs`        |
//! | `sftp://me@host:2222/home/me/a`   | `sftp:host=host,port=2222,user=me`       |
//! | `ftp://host/pub/a`                | `ftp:host=host`                          |
//! | `davs://host/dav/a`               | `dav:host=host,ssl=true`                 |
//! | `mtp://phone/Internal/DCIM/a.jpg` | `mtp:host=phone`                         |
//!
//! Keys inside a directory name are sorted alphabetically. Metadata then
//! comes from the same POSIX source the local driver uses, minus whatever a
//! FUSE mount cannot report faithfully.

use alens_core::{
    custom, AttributeId, AttributeValue, DriverFactory, DriverRegistry, ErrorCode, FileHandle,
    InfoDriver, IoError, Permissions,
};
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::config::DriverConfig;
use crate::local::{LocalDriver, LocalFile};

/// Attributes a FUSE mount reports with local, not remote, identity
const NODE_IDENTITY: &[AttributeId] = &[
    AttributeId::ID_FILE,
    AttributeId::ID_FILESYSTEM,
    AttributeId::UNIX_DEVICE,
    AttributeId::UNIX_INODE,
    AttributeId::UNIX_RDEV,
];

/// Attributes a scheme can write back through its mount
fn writable(scheme: &str) -> &'static [AttributeId] {
    match scheme {
        "sftp" => &[
            AttributeId::UNIX_MODE,
            AttributeId::TIME_MODIFIED,
            AttributeId::TIME_MODIFIED_USEC,
        ],
        _ => &[],
    }
}

fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Decoded path or key component; `None` if it could leave its directory
fn component(s: &str) -> Option<String> {
    let decoded = decode(s);
    let escapes = decoded == "."
        || decoded == ".."
        || decoded.contains(|c: char| c == '/' || c == '\0');
    (!escapes).then_some(decoded)
}

/// Value of one `key=value` pair in a mount directory name
fn key_value(value: String) -> Option<String> {
    (!value.contains(|c: char| c == ',' || c == '=')).then_some(value)
}

/// Location of `uri` inside `mount_root`, `None` when the URI does not name
/// a mountable location
pub fn mount_path(mount_root: &Path, uri: &Url) -> Option<PathBuf> {
    let host = uri.host_str().filter(|h| !h.is_empty())?;
    let mut segments: Vec<String> = match uri.path_segments() {
        Some(segments) => segments
            .filter(|seg| !seg.is_empty())
            .map(component)
            .collect::<Option<_>>()?,
        None => Vec::new(),
    };

    let mut keys: Vec<(&str, String)> = Vec::new();
    let prefix = match uri.scheme() {
        "smb" => {
            if segments.is_empty() {
                return None;
            }
            keys.push(("server", key_value(host.to_string())?));
            keys.push(("share", key_value(segments.remove(0))?));
            "smb-share"
        }
        "sftp" | "ftp" => {
            keys.push(("host", key_value(host.to_string())?));
            uri.scheme()
        }
        "dav" | "davs" => {
            keys.push(("host", key_value(host.to_string())?));
            keys.push(("ssl", (uri.scheme() == "davs").to_string()));
            "dav"
        }
        "mtp" => {
            keys.push(("host", key_value(component(host)?)?));
            "mtp"
        }
        _ => return None,
    };

    if uri.scheme() != "mtp" {
        if let Some(port) = uri.port() {
            keys.push(("port", port.to_string()));
        }
        if !uri.username().is_empty() {
            keys.push(("user", key_value(component(uri.username())?)?));
        }
    }
    keys.sort_by(|a, b| a.0.cmp(&b.0));

    let params: Vec<String> = keys.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    let mut path = mount_root.join(format!("{}:{}", prefix, params.join(",")));
    path.extend(segments);
    Some(path)
}

/// Driver for one remote scheme, reading through its FUSE mount
pub struct MountedDriver {
    scheme: String,
    inner: LocalDriver,
}

impl MountedDriver {
    pub fn new(uri: Url, mount_root: &Path, registry: Arc<DriverRegistry>, sniff: bool) -> Self {
        let path = mount_path(mount_root, &uri);
        Self {
            scheme: uri.scheme().to_string(),
            inner: LocalDriver::with_path(uri, path, registry, sniff),
        }
    }

    /// Mount-side path, if the URI maps to one
    pub fn local_path(&self) -> Option<&Path> {
        self.inner.local_path()
    }
}

impl InfoDriver for MountedDriver {
    fn uri(&self) -> &Url {
        self.inner.uri()
    }

    fn initialize(&mut self) -> bool {
        let ok = self.inner.initialize();
        if !ok && self.inner.local_path().is_none() {
            debug!("No mount location for {}", self.inner.uri());
        }
        ok
    }

    fn resolve_backend_attribute(&self, id: AttributeId) -> Result<AttributeValue, IoError> {
        match id {
            AttributeId::GVFS_BACKEND if self.inner.stat().is_some() => {
                Ok(AttributeValue::from(self.scheme.as_str()))
            }
            AttributeId::STANDARD_IS_VIRTUAL if self.inner.stat().is_some() => {
                Ok(AttributeValue::Bool(false))
            }
            id if NODE_IDENTITY.contains(&id) => Err(IoError::new(ErrorCode::NotSupported)),
            id => self.inner.resolve_backend_attribute(id),
        }
    }

    /// Name attributes follow the URI path; type checks go through the mount
    fn resolve_custom_attribute(&self, path: &str, id: AttributeId) -> AttributeValue {
        if let Some(value) = custom::name_attribute(Path::new(path), id) {
            return value;
        }
        self.inner
            .local_path()
            .and_then(|local| custom::type_attribute(local, id))
            .unwrap_or_default()
    }

    fn persist_attribute(&self, id: AttributeId, value: &AttributeValue) -> Result<(), IoError> {
        if !writable(&self.scheme).contains(&id) {
            return Err(IoError::new(ErrorCode::NotSupported));
        }
        self.inner.persist_attribute(id, value)
    }

    fn exists(&self) -> bool {
        self.inner.exists()
    }

    fn permissions(&mut self) -> Permissions {
        self.inner.permissions()
    }

    fn last_error(&self) -> IoError {
        self.inner.last_error()
    }

    fn set_last_error(&mut self, error: IoError) {
        self.inner.set_last_error(error);
    }
}

/// Factory for one remote scheme
pub struct MountedFactory {
    scheme: String,
    mount_root: PathBuf,
    sniff: bool,
}

impl MountedFactory {
    pub fn new(scheme: &str, config: &DriverConfig) -> Self {
        Self {
            scheme: scheme.to_ascii_lowercase(),
            mount_root: config.mount_root.clone(),
            sniff: config.sniff_content_type,
        }
    }
}

impl DriverFactory for MountedFactory {
    fn scheme(&self) -> &str {
        &self.scheme
    }

    fn create_driver(&self, uri: &Url, registry: Arc<DriverRegistry>) -> Box<dyn InfoDriver> {
        Box::new(MountedDriver::new(uri.clone(), &self.mount_root, registry, self.sniff))
    }

    fn create_file(&self, uri: &Url) -> Option<Box<dyn FileHandle>> {
        let path = mount_path(&self.mount_root, uri)?;
        Some(Box::new(LocalFile::new(uri.clone(), path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alens_core::FileInfo;
    use std::fs;
    use std::os::unix::fs::{MetadataExt, PermissionsExt};
    use tempfile::TempDir;

    fn uri(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn mapped(s: &str) -> Option<String> {
        mount_path(Path::new("/gvfs"), &uri(s)).map(|p| p.to_string_lossy().into_owned())
    }

    /// Mount root with one sftp location holding `docs/readme.txt`
    fn sftp_mount() -> (TempDir, DriverConfig) {
        let root = TempDir::new().unwrap();
        let docs = root.path().join("sftp:host=example.org,user=alice").join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("readme.txt"), b"hello").unwrap();

        let config = DriverConfig {
            mount_root: root.path().to_path_buf(),
            ..DriverConfig::default()
        };
        (root, config)
    }

    fn registry(config: &DriverConfig) -> Arc<DriverRegistry> {
        let mut registry = DriverRegistry::new();
        crate::register_defaults(&mut registry, config);
        Arc::new(registry)
    }

    #[test]
    fn maps_smb_shares() {
        assert_eq!(
            mapped("smb://srv/docs/a%20b.txt").as_deref(),
            Some("/gvfs/smb-share:server=srv,share=docs/a b.txt")
        );
        assert_eq!(
            mapped("smb://bob@srv/docs/").as_deref(),
            Some("/gvfs/smb-share:server=srv,share=docs,user=bob")
        );
        assert_eq!(mapped("smb://srv/"), None);
    }

    #[test]
    fn maps_sftp_and_ftp() {
        assert_eq!(
            mapped("sftp://me@host:2222/home/me/a").as_deref(),
            Some("/gvfs/sftp:host=host,port=2222,user=me/home/me/a")
        );
        assert_eq!(mapped("ftp://host/pub/a").as_deref(), Some("/gvfs/ftp:host=host/pub/a"));
    }

    #[test]
    fn maps_dav_and_mtp() {
        assert_eq!(
            mapped("davs://host/dav/a").as_deref(),
            Some("/gvfs/dav:host=host,ssl=true/dav/a")
        );
        assert_eq!(
            mapped("dav://host:8080/a").as_deref(),
            Some("/gvfs/dav:host=host,port=8080,ssl=false/a")
        );
        assert_eq!(
            mapped("mtp://phone/Internal/DCIM/a.jpg").as_deref(),
            Some("/gvfs/mtp:host=phone/Internal/DCIM/a.jpg")
        );
    }

    #[test]
    fn rejects_unmappable_uris() {
        assert_eq!(mapped("gopher://host/a"), None);
        assert_eq!(mapped("sftp:/no-host/a"), None);
    }

    #[test]
    fn encoded_separators_cannot_escape_the_root() {
        assert_eq!(mapped("sftp://host/a/%2Fetc%2Fpasswd"), None);
        assert_eq!(mapped("smb://srv/share/x%2F..%2F..%2Fy"), None);
        assert_eq!(mapped("mtp://a%2Fb/c"), None);
    }

    #[test]
    fn key_separators_cannot_add_mount_keys() {
        assert_eq!(mapped("sftp://a%2Chost%3Devil@h/"), None);
        assert_eq!(mapped("smb://srv/sh%2Cuser%3Droot/x"), None);
        assert_eq!(mapped("mtp://dev%2Cice/x"), None);
        assert!(mapped("sftp://a.b-c@h/").is_some());
    }

    #[test]
    fn reads_through_the_mount() {
        let (_root, config) = sftp_mount();
        let registry = registry(&config);
        let mut info = FileInfo::parse(&registry, "sftp://alice@example.org/docs/readme.txt").unwrap();

        assert!(info.is_initialized());
        assert!(info.exists());
        assert_eq!(info.attribute(AttributeId::STANDARD_SIZE), (AttributeValue::U64(5), true));
        assert_eq!(
            info.attribute(AttributeId::GVFS_BACKEND),
            (AttributeValue::from("sftp"), true)
        );
        assert_eq!(
            info.attribute(AttributeId::STANDARD_FILE_PATH),
            (AttributeValue::from("/docs/readme.txt"), true)
        );
        assert_eq!(info.attribute(AttributeId::STANDARD_IS_FILE), (AttributeValue::Bool(true), true));

        let (value, found) = info.attribute(AttributeId::UNIX_INODE);
        assert!(!found);
        assert_eq!(value, AttributeValue::U64(0));
        assert_eq!(info.last_error().code, ErrorCode::NotSupported);
    }

    #[test]
    fn sftp_writes_mode_but_not_owner() {
        let (root, config) = sftp_mount();
        let registry = registry(&config);
        let mut info = FileInfo::parse(&registry, "sftp://alice@example.org/docs/readme.txt").unwrap();

        info.set_attribute(AttributeId::UNIX_MODE, 0o600u32);
        info.set_attribute(AttributeId::UNIX_UID, 0u32);
        assert!(!info.flush());
        assert_eq!(info.last_error().code, ErrorCode::NotSupported);

        let local = root
            .path()
            .join("sftp:host=example.org,user=alice/docs/readme.txt");
        assert_eq!(fs::metadata(&local).unwrap().mode() & 0o777, 0o600);
        assert_eq!(info.permissions(), Permissions::new(0o600));
    }

    #[test]
    fn permissions_come_from_the_mount() {
        let (root, config) = sftp_mount();
        let local = root
            .path()
            .join("sftp:host=example.org,user=alice/docs/readme.txt");
        fs::set_permissions(&local, fs::Permissions::from_mode(0o640)).unwrap();

        let registry = registry(&config);
        let mut info = FileInfo::parse(&registry, "sftp://alice@example.org/docs/readme.txt").unwrap();
        assert_eq!(info.permissions(), Permissions::new(0o640));
    }

    #[test]
    fn unmounted_location_is_not_found() {
        let (_root, config) = sftp_mount();
        let registry = registry(&config);
        let mut info = FileInfo::parse(&registry, "smb://srv/share/a.txt").unwrap();

        assert!(!info.is_initialized());
        assert_eq!(info.last_error().code, ErrorCode::NotFound);
        assert!(!info.exists());
        assert_eq!(
            info.attribute(AttributeId::GVFS_BACKEND),
            (AttributeValue::String(String::new()), false)
        );
    }
}
