//! alens core
//!
//! Uniform file-metadata model: attribute identities and values, the driver
//! contract every storage backend implements, the per-file attribute cache,
//! and the scheme-keyed registry that picks a driver for a URI.
//!
//! ```no_run
//! use std::sync::Arc;
//! use alens_core::{AttributeId, DriverRegistry, FileInfo};
//!
//! # fn main() -> alens_core::AlensResult<()> {
//! let registry = Arc::new(DriverRegistry::new());
//! let mut info = FileInfo::parse(&registry, "file:///etc/hostname")?;
//! let (size, found) = info.attribute(AttributeId::STANDARD_SIZE);
//! # Ok(())
//! # }
//! ```

pub mod attribute;
pub mod custom;
pub mod driver;
pub mod error;
pub mod info;
pub mod permissions;
pub mod registry;
pub mod store;
pub mod value;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use attribute::{AttributeId, AttributeInfo, FileType, ATTRIBUTES};
pub use driver::{FileHandle, InfoDriver};
pub use error::{AlensError, AlensResult, ErrorCode, IoError};
pub use info::FileInfo;
pub use permissions::Permissions;
pub use registry::{DriverFactory, DriverRegistry};
pub use store::AttributeStore;
pub use value::{AttributeKind, AttributeValue};
