// SPDX-License-Identifier: AGPL-3.0-or-later
//! Driver configuration

use alens_core::{AlensError, AlensResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::REMOTE_SCHEMES;

/// Settings shared by the bundled drivers
///
/// ```toml
/// mount_root = "/run/user/1000/gvfs"
/// sniff_content_type = true
/// remote_schemes = ["smb", "sftp"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Directory holding one FUSE mount per remote location
    pub mount_root: PathBuf,
    /// Detect content types from file contents, not just names
    pub sniff_content_type: bool,
    /// Remote schemes to register a mounted driver for
    pub remote_schemes: Vec<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            mount_root: default_mount_root(),
            sniff_content_type: true,
            remote_schemes: REMOTE_SCHEMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DriverConfig {
    /// Load from an explicit TOML file; a missing or malformed file is an error
    pub fn load(path: &Path) -> AlensResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AlensError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text).map_err(|e| match e {
            AlensError::Config(msg) => AlensError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Load from the per-user config file, falling back to defaults when it
    /// does not exist
    pub fn load_default() -> AlensResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_toml(text: &str) -> AlensResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| AlensError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// `config.toml` in the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "alens", "alens")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn validate(&self) -> AlensResult<()> {
        for scheme in &self.remote_schemes {
            if !REMOTE_SCHEMES.contains(&scheme.as_str()) {
                return Err(AlensError::Config(format!(
                    "unsupported remote scheme '{}' (expected one of {})",
                    scheme,
                    REMOTE_SCHEMES.join(", ")
                )));
            }
        }
        Ok(())
    }
}

fn default_mount_root() -> PathBuf {
    match std::env::var_os("XDG_RUNTIME_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir).join("gvfs"),
        _ => {
            let uid = unsafe { libc::getuid() };
            PathBuf::from(format!("/run/user/{}/gvfs", uid))
        }
    }
}
