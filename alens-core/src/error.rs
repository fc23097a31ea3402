// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for alens
//!
//! Two layers: [`IoError`] is the backend-neutral, last-error value every
//! driver records while resolving or persisting attributes. [`AlensError`]
//! covers the surfaces around it (configuration, URIs, CLI input).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias
pub type AlensResult<T> = Result<T, AlensError>;

/// Backend-neutral error code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[default]
    None,
    /// No driver, factory or handle available
    NotInitialized,
    /// Attribute or operation not supported by this backend
    NotSupported,
    /// Backing object missing
    NotFound,
    PermissionDenied,
    /// Anything else; the native code is kept on the [`IoError`]
    Unknown,
}

impl ErrorCode {
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::None => "No error",
            ErrorCode::NotInitialized => "Not initialized",
            ErrorCode::NotSupported => "Not supported",
            ErrorCode::NotFound => "Not found",
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::Unknown => "Unknown error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Last-error value attached to a driver
///
/// Drivers keep exactly one of these and overwrite it on every failure;
/// reading it never clears it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoError {
    pub code: ErrorCode,
    pub native: Option<i32>,
}

impl IoError {
    pub fn new(code: ErrorCode) -> Self {
        Self { code, native: None }
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// Translate a native errno value
    pub fn from_errno(errno: i32) -> Self {
        let code = match errno {
            0 => ErrorCode::None,
            libc::ENOENT | libc::ENOTDIR => ErrorCode::NotFound,
            libc::EACCES | libc::EPERM | libc::EROFS => ErrorCode::PermissionDenied,
            libc::ENOSYS | libc::ENOTSUP => ErrorCode::NotSupported,
            #[allow(unreachable_patterns)] // EOPNOTSUPP == ENOTSUP on Linux
            libc::EOPNOTSUPP => ErrorCode::NotSupported,
            _ => ErrorCode::Unknown,
        };
        Self { code, native: Some(errno) }
    }

    pub fn is_none(&self) -> bool {
        self.code == ErrorCode::None
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.native {
            Some(native) => write!(f, "{} (native error {})", self.code, native),
            None => write!(f, "{}", self.code),
        }
    }
}

impl std::error::Error for IoError {}

impl From<ErrorCode> for IoError {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        if let Some(errno) = err.raw_os_error() {
            return Self::from_errno(errno);
        }
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::NotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            std::io::ErrorKind::Unsupported => ErrorCode::NotSupported,
            _ => ErrorCode::Unknown,
        };
        Self::new(code)
    }
}

/// Main error type
#[derive(Error, Debug)]
pub enum AlensError {
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("No driver registered for scheme: {0}")]
    UnknownScheme(String),

    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Unassigned attribute ID: {0}")]
    UnassignedAttribute(u32),

    #[error("Invalid value for {attribute}: {message}")]
    InvalidValue { attribute: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Attribute(#[from] IoError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_errno() {
        assert_eq!(IoError::from_errno(libc::ENOENT).code, ErrorCode::NotFound);
        assert_eq!(IoError::from_errno(libc::ENOTDIR).code, ErrorCode::NotFound);
        assert_eq!(IoError::from_errno(libc::EACCES).code, ErrorCode::PermissionDenied);
        assert_eq!(IoError::from_errno(libc::EPERM).code, ErrorCode::PermissionDenied);
        assert_eq!(IoError::from_errno(libc::ENOTSUP).code, ErrorCode::NotSupported);

        let err = IoError::from_errno(libc::EIO);
        assert_eq!(err.code, ErrorCode::Unknown);
        assert_eq!(err.native, Some(libc::EIO));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::from_raw_os_error(libc::ENOENT);
        let err: IoError = io_err.into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.native, Some(libc::ENOENT));

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err: IoError = io_err.into();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert_eq!(err.native, None);
    }

    #[test]
    fn test_default_is_none() {
        assert!(IoError::default().is_none());
        assert_eq!(IoError::none().code, ErrorCode::None);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(IoError::new(ErrorCode::NotFound).to_string(), "Not found");
        assert_eq!(
            IoError::from_errno(libc::EIO).to_string(),
            format!("Unknown error (native error {})", libc::EIO)
        );

        let err = AlensError::UnknownScheme("gopher".into());
        assert_eq!(format!("{}", err), "No driver registered for scheme: gopher");
    }
}
