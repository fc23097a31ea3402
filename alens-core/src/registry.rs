// SPDX-License-Identifier: AGPL-3.0-or-later
//! Driver factory registry
//!
//! Maps a URI scheme to the factory that builds drivers and content handles
//! for it. Build the registry mutably at startup, then freeze it behind an
//! `Arc`: after that it is read-only and may be shared across threads.

use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

use crate::{
    driver::{FileHandle, InfoDriver},
    error::{AlensError, AlensResult, ErrorCode, IoError},
    permissions::Permissions,
};

/// Constructor for one scheme's drivers
pub trait DriverFactory: Send + Sync {
    /// URI scheme served by this factory, e.g. `"file"`
    fn scheme(&self) -> &str;

    /// Build an uninitialized metadata driver bound to `uri`
    ///
    /// The driver receives the registry so it can reach content handles for
    /// its own scheme later on.
    fn create_driver(&self, uri: &Url, registry: Arc<DriverRegistry>) -> Box<dyn InfoDriver>;

    /// Open a content-access handle, `None` when the backend cannot
    fn create_file(&self, uri: &Url) -> Option<Box<dyn FileHandle>>;
}

/// Registry of driver factories, keyed by scheme
pub struct DriverRegistry {
    factories: HashMap<String, Arc<dyn DriverFactory>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self { factories: HashMap::new() }
    }

    /// Register a factory; an existing factory for the same scheme is replaced
    pub fn register(&mut self, factory: Arc<dyn DriverFactory>) {
        let scheme = factory.scheme().to_ascii_lowercase();
        if self.factories.insert(scheme.clone(), factory).is_some() {
            tracing::warn!("Replacing driver factory for scheme {}", scheme);
        }
    }

    pub fn get(&self, scheme: &str) -> Option<Arc<dyn DriverFactory>> {
        self.factories.get(&scheme.to_ascii_lowercase()).cloned()
    }

    pub fn get_or_err(&self, scheme: &str) -> AlensResult<Arc<dyn DriverFactory>> {
        self.get(scheme)
            .ok_or_else(|| AlensError::UnknownScheme(scheme.to_string()))
    }

    pub fn contains(&self, scheme: &str) -> bool {
        self.factories.contains_key(&scheme.to_ascii_lowercase())
    }

    /// Registered schemes, sorted
    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        schemes.sort_unstable();
        schemes
    }

    /// Build a driver for `uri`; `None` when `scheme` is not registered
    pub fn produce(self: &Arc<Self>, scheme: &str, uri: &Url) -> Option<Box<dyn InfoDriver>> {
        let factory = self.get(scheme)?;
        Some(factory.create_driver(uri, Arc::clone(self)))
    }

    /// Open a content-access handle for `uri`; `None` when `scheme` is not
    /// registered or its backend has no handles
    pub fn produce_file(&self, scheme: &str, uri: &Url) -> Option<Box<dyn FileHandle>> {
        self.get(scheme)?.create_file(uri)
    }

    /// Permissions of `uri` as seen through a content handle of its scheme
    ///
    /// A missing factory or handle is `NotInitialized`.
    pub fn permissions_for(&self, uri: &Url) -> Result<Permissions, IoError> {
        let handle = self
            .produce_file(uri.scheme(), uri)
            .ok_or_else(|| IoError::new(ErrorCode::NotInitialized))?;
        handle.permissions()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFactory, FakeState};

    fn uri(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn unregistered_scheme_yields_none() {
        let registry = Arc::new(DriverRegistry::new());
        assert!(registry.produce("smb", &uri("smb://host/share/file")).is_none());
        assert!(registry.produce_file("smb", &uri("smb://host/share/file")).is_none());
        assert!(matches!(registry.get_or_err("smb"), Err(AlensError::UnknownScheme(_))));
    }

    #[test]
    fn produce_binds_driver_to_uri() {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(FakeFactory::new("fake", FakeState::shared())));
        let registry = Arc::new(registry);

        let target = uri("fake:///tmp/a.txt");
        let driver = registry.produce("fake", &target).unwrap();
        assert_eq!(driver.uri(), &target);
    }

    #[test]
    fn scheme_lookup_is_case_insensitive() {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(FakeFactory::new("Fake", FakeState::shared())));
        assert!(registry.contains("fake"));
        assert!(registry.contains("FAKE"));
    }

    #[test]
    fn schemes_are_sorted() {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(FakeFactory::new("sftp", FakeState::shared())));
        registry.register(Arc::new(FakeFactory::new("file", FakeState::shared())));
        registry.register(Arc::new(FakeFactory::new("smb", FakeState::shared())));
        assert_eq!(registry.schemes(), vec!["file", "sftp", "smb"]);
    }

    #[test]
    fn reregistering_replaces_factory() {
        let first = FakeState::shared();
        let second = FakeState::shared();
        second.lock().unwrap().permissions = Permissions::new(0o600);

        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(FakeFactory::new("fake", first)));
        registry.register(Arc::new(FakeFactory::new("fake", second)));
        assert_eq!(registry.schemes().len(), 1);

        let perms = registry.permissions_for(&uri("fake:///x")).unwrap();
        assert_eq!(perms, Permissions::new(0o600));
    }

    #[test]
    fn permissions_for_unknown_scheme_is_not_initialized() {
        let registry = DriverRegistry::new();
        let err = registry.permissions_for(&uri("ftp://host/file")).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotInitialized);
    }
}
