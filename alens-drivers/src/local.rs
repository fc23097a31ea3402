// SPDX-License-Identifier: AGPL-3.0-or-later
//! Local filesystem driver (`file://`)

use alens_core::{
    custom, AttributeId, AttributeValue, DriverFactory, DriverRegistry, ErrorCode, FileHandle,
    InfoDriver, IoError, Permissions,
};
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::config::DriverConfig;
use crate::source::{self, FileStat};

/// Driver answering from a `stat` snapshot of a local path
pub struct LocalDriver {
    uri: Url,
    path: Option<PathBuf>,
    sniff: bool,
    registry: Arc<DriverRegistry>,
    stat: Option<FileStat>,
    error: IoError,
}

impl LocalDriver {
    /// Driver for a `file://` URI
    pub fn new(uri: Url, registry: Arc<DriverRegistry>, sniff: bool) -> Self {
        let path = uri.to_file_path().ok();
        Self::with_path(uri, path, registry, sniff)
    }

    /// Driver for `uri` backed by an explicit local path
    ///
    /// `None` stands for a URI with no local counterpart; initialization then
    /// fails with `NotFound`.
    pub fn with_path(
        uri: Url,
        path: Option<PathBuf>,
        registry: Arc<DriverRegistry>,
        sniff: bool,
    ) -> Self {
        Self {
            uri,
            path,
            sniff,
            registry,
            stat: None,
            error: IoError::none(),
        }
    }

    /// Local path backing this driver
    pub fn local_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn stat(&self) -> Option<&FileStat> {
        self.stat.as_ref()
    }
}

impl InfoDriver for LocalDriver {
    fn uri(&self) -> &Url {
        &self.uri
    }

    fn initialize(&mut self) -> bool {
        if self.stat.is_some() {
            return true;
        }
        let Some(path) = &self.path else {
            self.error = IoError::new(ErrorCode::NotFound);
            return false;
        };

        match FileStat::query(path, self.sniff) {
            Ok(stat) => {
                debug!("Queried {}", path.display());
                self.stat = Some(stat);
                true
            }
            Err(error) => {
                debug!("Query of {} failed: {}", path.display(), error);
                self.error = error;
                false
            }
        }
    }

    fn resolve_backend_attribute(&self, id: AttributeId) -> Result<AttributeValue, IoError> {
        self.stat
            .as_ref()
            .ok_or_else(|| IoError::new(ErrorCode::NotInitialized))?
            .attribute(id)
    }

    fn resolve_custom_attribute(&self, path: &str, id: AttributeId) -> AttributeValue {
        custom::from_path(Path::new(path), id)
    }

    fn persist_attribute(&self, id: AttributeId, value: &AttributeValue) -> Result<(), IoError> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| IoError::new(ErrorCode::NotFound))?;
        source::write_attribute(path, id, value)
    }

    fn exists(&self) -> bool {
        self.path
            .as_ref()
            .is_some_and(|path| fs::symlink_metadata(path).is_ok())
    }

    fn permissions(&mut self) -> Permissions {
        match self.registry.permissions_for(&self.uri) {
            Ok(permissions) => permissions,
            Err(error) => {
                self.error = error;
                Permissions::empty()
            }
        }
    }

    fn last_error(&self) -> IoError {
        self.error
    }

    fn set_last_error(&mut self, error: IoError) {
        self.error = error;
    }
}

/// Content-access handle on a local path
pub struct LocalFile {
    uri: Url,
    path: PathBuf,
}

impl LocalFile {
    pub fn new(uri: Url, path: PathBuf) -> Self {
        Self { uri, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileHandle for LocalFile {
    fn uri(&self) -> &Url {
        &self.uri
    }

    fn permissions(&self) -> Result<Permissions, IoError> {
        let meta = fs::metadata(&self.path)?;
        Ok(Permissions::new(meta.mode()))
    }
}

/// Factory for the `file` scheme
pub struct LocalFactory {
    sniff: bool,
}

impl LocalFactory {
    pub fn new(config: &DriverConfig) -> Self {
        Self {
            sniff: config.sniff_content_type,
        }
    }
}

impl Default for LocalFactory {
    fn default() -> Self {
        Self::new(&DriverConfig::default())
    }
}

impl DriverFactory for LocalFactory {
    fn scheme(&self) -> &str {
        "file"
    }

    fn create_driver(&self, uri: &Url, registry: Arc<DriverRegistry>) -> Box<dyn InfoDriver> {
        Box::new(LocalDriver::new(uri.clone(), registry, self.sniff))
    }

    fn create_file(&self, uri: &Url) -> Option<Box<dyn FileHandle>> {
        let path = uri.to_file_path().ok()?;
        Some(Box::new(LocalFile::new(uri.clone(), path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alens_core::FileInfo;
    use std::os::unix::fs::PermissionsExt;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    fn registry() -> Arc<DriverRegistry> {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(LocalFactory::default()));
        Arc::new(registry)
    }

    fn info_for(path: &Path) -> FileInfo {
        FileInfo::new(&registry(), Url::from_file_path(path).unwrap()).unwrap()
    }

    #[test]
    fn reads_size_and_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.final.pdf");
        fs::write(&path, vec![0u8; 4096]).unwrap();

        let mut info = info_for(&path);
        assert!(info.is_initialized());
        assert_eq!(info.attribute(AttributeId::STANDARD_SIZE), (AttributeValue::U64(4096), true));
        assert_eq!(
            info.attribute(AttributeId::STANDARD_SUFFIX),
            (AttributeValue::from("pdf"), true)
        );
        assert_eq!(
            info.attribute(AttributeId::STANDARD_COMPLETE_BASE_NAME),
            (AttributeValue::from("report.final"), true)
        );
        assert_eq!(info.attribute(AttributeId::STANDARD_IS_FILE), (AttributeValue::Bool(true), true));
    }

    #[test]
    fn cached_size_survives_file_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grow.log");
        fs::write(&path, b"abc").unwrap();

        let mut info = info_for(&path);
        assert_eq!(info.attribute(AttributeId::STANDARD_SIZE).0, AttributeValue::U64(3));
        fs::write(&path, b"abcdef").unwrap();
        assert_eq!(info.attribute(AttributeId::STANDARD_SIZE).0, AttributeValue::U64(3));

        info.remove_attribute(AttributeId::STANDARD_SIZE);
        // the snapshot taken at initialization still answers
        assert_eq!(info.attribute(AttributeId::STANDARD_SIZE).0, AttributeValue::U64(3));
    }

    #[test]
    fn set_mode_and_flush() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.sh");
        fs::write(&path, b"#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        let mut info = info_for(&path);
        assert!(info.set_attribute(AttributeId::UNIX_MODE, 0o755u32));
        assert!(info.flush());
        assert_eq!(fs::metadata(&path).unwrap().mode() & 0o777, 0o755);
        assert_eq!(info.permissions(), Permissions::new(0o755));
    }

    #[test]
    fn flush_after_reading_times_keeps_them_exact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"x").unwrap();
        let mtime = UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_789);
        fs::File::options().write(true).open(&path).unwrap().set_modified(mtime).unwrap();

        let mut info = info_for(&path);
        assert_eq!(info.attribute(AttributeId::TIME_MODIFIED).0, AttributeValue::U64(1_700_000_000));
        assert_eq!(info.attribute(AttributeId::TIME_MODIFIED_USEC).0, AttributeValue::U32(123_456));
        info.set_attribute(AttributeId::UNIX_MODE, 0o600u32);

        assert!(info.flush());
        let meta = fs::metadata(&path).unwrap();
        assert_eq!(meta.modified().unwrap(), mtime);
        assert_eq!(meta.mode() & 0o777, 0o600);
    }

    #[test]
    fn flush_reports_read_only_attributes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"x").unwrap();

        let mut info = info_for(&path);
        info.attribute(AttributeId::STANDARD_SIZE);
        info.set_attribute(AttributeId::UNIX_MODE, 0o644u32);

        assert!(!info.flush());
        assert_eq!(info.last_error().code, ErrorCode::NotSupported);
        assert_eq!(fs::metadata(&path).unwrap().mode() & 0o777, 0o644);
    }

    #[test]
    fn missing_file_degrades_to_defaults() {
        let dir = TempDir::new().unwrap();
        let mut info = info_for(&dir.path().join("absent"));

        assert!(!info.is_initialized());
        assert_eq!(info.last_error().code, ErrorCode::NotFound);
        assert!(!info.exists());
        assert_eq!(info.attribute(AttributeId::STANDARD_SIZE), (AttributeValue::U64(0), false));
        assert_eq!(info.last_error().code, ErrorCode::NotInitialized);
        assert!(info.permissions().is_empty());
        assert_eq!(info.last_error().code, ErrorCode::NotFound);
    }

    #[test]
    fn exists_is_fresh() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("temp");
        fs::write(&path, b"").unwrap();

        let info = info_for(&path);
        assert!(info.exists());
        fs::remove_file(&path).unwrap();
        assert!(!info.exists());
    }

    #[test]
    fn non_local_file_uri_has_no_handle() {
        let factory = LocalFactory::default();
        let uri = Url::parse("file://remote-host/share/a").unwrap();
        assert!(factory.create_file(&uri).is_none());

        let mut driver = LocalDriver::new(uri, registry(), true);
        assert!(!driver.initialize());
        assert_eq!(driver.last_error().code, ErrorCode::NotFound);
    }
}
