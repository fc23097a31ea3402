// SPDX-License-Identifier: AGPL-3.0-or-later
//! File-info facade
//!
//! A [`FileInfo`] binds one URI to one driver and one attribute store. They
//! are created together and dropped together; the facade itself only
//! forwards.

use percent_encoding::percent_decode_str;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::{
    attribute::AttributeId,
    driver::InfoDriver,
    error::{AlensError, AlensResult, IoError},
    permissions::Permissions,
    registry::DriverRegistry,
    store::AttributeStore,
    value::AttributeValue,
};

/// Metadata view of a single file
pub struct FileInfo {
    uri: Url,
    path: String,
    driver: Box<dyn InfoDriver>,
    store: AttributeStore,
    initialized: bool,
}

impl FileInfo {
    /// Build a file info with the driver registered for the URI's scheme
    pub fn new(registry: &Arc<DriverRegistry>, uri: Url) -> AlensResult<Self> {
        let driver = registry
            .produce(uri.scheme(), &uri)
            .ok_or_else(|| AlensError::UnknownScheme(uri.scheme().to_string()))?;
        Ok(Self::with_driver(driver))
    }

    pub fn parse(registry: &Arc<DriverRegistry>, uri: &str) -> AlensResult<Self> {
        let parsed = Url::parse(uri).map_err(|e| AlensError::InvalidUri(format!("{}: {}", uri, e)))?;
        Self::new(registry, parsed)
    }

    /// Wrap an already constructed driver and initialize it
    ///
    /// A failed initialization still yields a usable, empty file info.
    pub fn with_driver(mut driver: Box<dyn InfoDriver>) -> Self {
        let uri = driver.uri().clone();
        let path = percent_decode_str(uri.path()).decode_utf8_lossy().into_owned();
        let initialized = driver.initialize();
        if initialized {
            debug!("Initialized driver for {}", uri);
        } else {
            debug!("Driver initialization failed for {}: {}", uri, driver.last_error());
        }

        Self {
            uri,
            path,
            driver,
            store: AttributeStore::new(),
            initialized,
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Decoded URI path, as handed to custom resolvers
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Value of `id` and whether it was found
    ///
    /// On a miss the value is the declared default (invalid for custom IDs)
    /// and [`last_error`](Self::last_error) says why.
    pub fn attribute(&mut self, id: AttributeId) -> (AttributeValue, bool) {
        self.store.get(self.driver.as_mut(), &self.path, id)
    }

    /// Cache a value locally; written back on [`flush`](Self::flush)
    pub fn set_attribute(&mut self, id: AttributeId, value: impl Into<AttributeValue>) -> bool {
        self.store.set(id, value.into());
        true
    }

    /// Whether `id` is cached or resolvable; caches it when resolvable
    pub fn has_attribute(&mut self, id: AttributeId) -> bool {
        self.store.has(self.driver.as_mut(), id)
    }

    pub fn remove_attribute(&mut self, id: AttributeId) -> bool {
        self.store.remove(id)
    }

    /// IDs currently cached
    pub fn attribute_id_list(&self) -> Vec<AttributeId> {
        self.store.list()
    }

    /// Fresh existence check against the backend
    pub fn exists(&self) -> bool {
        self.driver.exists()
    }

    /// Write every cached attribute back to the backend
    pub fn flush(&mut self) -> bool {
        self.store.flush(self.driver.as_mut())
    }

    pub fn permissions(&mut self) -> Permissions {
        self.driver.permissions()
    }

    pub fn last_error(&self) -> IoError {
        self.driver.last_error()
    }
}

impl std::fmt::Debug for FileInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileInfo")
            .field("uri", &self.uri.as_str())
            .field("initialized", &self.initialized)
            .field("cached", &self.store.len())
            .finish()
    }
}
