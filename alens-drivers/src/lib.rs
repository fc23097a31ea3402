//! Metadata drivers for alens
//!
//! A `file` driver over the local filesystem, plus mounted drivers for the
//! remote schemes a GVFS daemon exposes through FUSE. Both read the same
//! POSIX metadata source. Unix only.

pub mod config;
#[cfg(feature = "local")]
pub mod local;
#[cfg(feature = "mounted")]
pub mod mounted;
pub mod source;

pub use config::DriverConfig;
#[cfg(feature = "local")]
pub use local::{LocalDriver, LocalFactory, LocalFile};
#[cfg(feature = "mounted")]
pub use mounted::{mount_path, MountedDriver, MountedFactory};
pub use source::FileStat;

use alens_core::DriverRegistry;
use std::sync::Arc;

/// Remote schemes served through a mount
pub const REMOTE_SCHEMES: &[&str] = &["smb", "sftp", "ftp", "dav", "davs", "mtp"];

/// Register every bundled driver enabled by `config`
pub fn register_defaults(registry: &mut DriverRegistry, config: &DriverConfig) {
    #[cfg(feature = "local")]
    registry.register(Arc::new(LocalFactory::new(config)));

    #[cfg(feature = "mounted")]
    for scheme in &config.remote_schemes {
        registry.register(Arc::new(MountedFactory::new(scheme, config)));
    }

    tracing::debug!("Registered drivers for {}", registry.schemes().join(", "));
}

/// Registry holding the bundled drivers, frozen for sharing
pub fn default_registry(config: &DriverConfig) -> Arc<DriverRegistry> {
    let mut registry = DriverRegistry::new();
    register_defaults(&mut registry, config);
    Arc::new(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_local_and_remote_schemes() {
        let registry = default_registry(&DriverConfig::default());
        assert_eq!(
            registry.schemes(),
            vec!["dav", "davs", "file", "ftp", "mtp", "sftp", "smb"]
        );
    }

    #[test]
    fn remote_schemes_follow_config() {
        let config = DriverConfig {
            remote_schemes: vec!["smb".to_string()],
            ..DriverConfig::default()
        };
        let registry = default_registry(&config);
        assert_eq!(registry.schemes(), vec!["file", "smb"]);
        assert!(registry.get("sftp").is_none());
    }
}
