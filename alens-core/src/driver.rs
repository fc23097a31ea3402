// SPDX-License-Identifier: AGPL-3.0-or-later
//! Backend driver contract
//!
//! One [`InfoDriver`] implementation exists per storage medium. A driver is
//! constructed bound to a single URI, initialized exactly once by the
//! [`FileInfo`](crate::FileInfo) that owns it, and dropped with it; whatever
//! handles it opened are released in its `Drop`.
//!
//! Every call blocks for the duration of the backend query.

use url::Url;

use crate::{
    attribute::AttributeId,
    error::IoError,
    permissions::Permissions,
    value::AttributeValue,
};

/// Metadata driver for one storage backend
pub trait InfoDriver: Send {
    /// URI this driver is bound to
    fn uri(&self) -> &Url;

    /// Open/query the backing metadata source for the bound URI
    ///
    /// Returns false on failure (including "not found"); the driver then
    /// stays usable but resolves nothing.
    fn initialize(&mut self) -> bool;

    /// Translate one well-known ID into a query against the backing source
    ///
    /// "Not supported by this backend" is an `Err` like any other miss.
    fn resolve_backend_attribute(&self, id: AttributeId) -> Result<AttributeValue, IoError>;

    /// Resolve a custom ID for `path`
    ///
    /// Never fails hard: anything unresolvable is [`AttributeValue::Invalid`].
    fn resolve_custom_attribute(&self, path: &str, id: AttributeId) -> AttributeValue;

    /// Write one attribute back to the backing store
    fn persist_attribute(&self, id: AttributeId, value: &AttributeValue) -> Result<(), IoError>;

    /// Fresh existence check, never served from any cache
    fn exists(&self) -> bool;

    /// Permissions observed through a content-access handle for the URI
    ///
    /// Yields [`Permissions::empty`] and records an error when no handle can
    /// be obtained.
    fn permissions(&mut self) -> Permissions;

    /// Most recently recorded error; reading does not clear it
    fn last_error(&self) -> IoError;

    /// Overwrite the last error
    fn set_last_error(&mut self, error: IoError);
}

/// Content-access handle for a URI
///
/// Drivers never open one of these themselves; they ask the registry for the
/// factory of their scheme. Some backends only expose permission bits
/// through an access attempt.
pub trait FileHandle: Send {
    fn uri(&self) -> &Url;

    fn permissions(&self) -> Result<Permissions, IoError>;
}
