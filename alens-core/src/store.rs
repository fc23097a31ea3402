// SPDX-License-Identifier: AGPL-3.0-or-later
//! Per-file attribute cache
//!
//! An [`AttributeStore`] sits between a [`FileInfo`](crate::FileInfo) and its
//! driver. A cached entry is authoritative: it is served without asking the
//! driver again until it is removed. Nothing ever expires on its own.
//!
//! Failures never escape as errors. A miss degrades to the declared default
//! and the driver's last error records why.

use std::collections::HashMap;
use tracing::{debug, trace, warn};

use crate::{attribute::AttributeId, driver::InfoDriver, value::AttributeValue};

#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    entries: HashMap<AttributeId, AttributeValue>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value, or resolve through `driver` and cache on success
    ///
    /// Custom IDs go to the driver's custom resolver with `path`; they return
    /// [`AttributeValue::Invalid`] on a miss and leave the last error alone.
    /// Well-known IDs go to the backend resolver; a miss returns the declared
    /// default and records the driver's error.
    pub fn get(
        &mut self,
        driver: &mut dyn InfoDriver,
        path: &str,
        id: AttributeId,
    ) -> (AttributeValue, bool) {
        if let Some(value) = self.entries.get(&id) {
            trace!("Cache hit for {}", id);
            return (value.clone(), true);
        }

        if id.is_custom() {
            let value = driver.resolve_custom_attribute(path, id);
            if !value.is_valid() {
                debug!("Custom attribute {} unresolved for {}", id, path);
                return (AttributeValue::Invalid, false);
            }
            self.entries.insert(id, value.clone());
            return (value, true);
        }

        match self.resolve(driver, id) {
            Some(value) => (value, true),
            None => (id.default_value(), false),
        }
    }

    /// Replace any entry for `id`; never contacts the backend
    pub fn set(&mut self, id: AttributeId, value: AttributeValue) {
        self.entries.remove(&id);
        self.entries.insert(id, value);
    }

    /// True if cached, or if the backend resolver can produce it
    ///
    /// A successful lookup is cached, so this doubles as a prefetch.
    pub fn has(&mut self, driver: &mut dyn InfoDriver, id: AttributeId) -> bool {
        self.entries.contains_key(&id) || self.resolve(driver, id).is_some()
    }

    /// Drop the entry for `id`; succeeds whether or not it was cached
    pub fn remove(&mut self, id: AttributeId) -> bool {
        self.entries.remove(&id);
        true
    }

    /// Cached IDs, ascending
    pub fn list(&self) -> Vec<AttributeId> {
        let mut ids: Vec<AttributeId> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Cached entries, ascending by ID
    pub fn cached(&self) -> Vec<(AttributeId, &AttributeValue)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(id, v)| (*id, v)).collect();
        entries.sort_unstable_by_key(|(id, _)| *id);
        entries
    }

    /// Persist every cached entry through `driver`
    ///
    /// Every entry is attempted even after a failure. Returns false if any
    /// failed; the last failure is left in the driver's last error.
    pub fn flush(&self, driver: &mut dyn InfoDriver) -> bool {
        let mut ok = true;
        for (id, value) in self.cached() {
            if let Err(error) = driver.persist_attribute(id, value) {
                warn!("Failed to persist {} on {}: {}", id, driver.uri(), error);
                driver.set_last_error(error);
                ok = false;
            }
        }
        ok
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn resolve(&mut self, driver: &mut dyn InfoDriver, id: AttributeId) -> Option<AttributeValue> {
        match driver.resolve_backend_attribute(id) {
            Ok(value) if value.is_valid() => {
                debug!("Resolved {} from backend", id);
                self.entries.insert(id, value.clone());
                Some(value)
            }
            Ok(_) => None,
            Err(error) => {
                debug!("Backend miss for {}: {}", id, error);
                driver.set_last_error(error);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::{FakeDriver, FakeState};
    use url::Url;

    fn driver(state: &std::sync::Arc<std::sync::Mutex<FakeState>>) -> FakeDriver {
        let mut driver = FakeDriver::new(Url::parse("fake:///tmp/a.txt").unwrap(), state.clone());
        driver.initialize();
        driver
    }

    #[test]
    fn default_on_miss() {
        let state = FakeState::shared();
        let mut driver = driver(&state);
        let mut store = AttributeStore::new();

        let (value, found) = store.get(&mut driver, "/tmp/a.txt", AttributeId::STANDARD_SIZE);
        assert!(!found);
        assert_eq!(value, AttributeValue::U64(0));
        assert_eq!(driver.last_error().code, ErrorCode::NotSupported);
        assert!(store.is_empty());
    }

    #[test]
    fn resolved_values_are_cached() {
        let state = FakeState::with_values([(AttributeId::STANDARD_SIZE, AttributeValue::U64(4096))]);
        let mut driver = driver(&state);
        let mut store = AttributeStore::new();

        for _ in 0..3 {
            let (value, found) = store.get(&mut driver, "/tmp/a.txt", AttributeId::STANDARD_SIZE);
            assert!(found);
            assert_eq!(value, AttributeValue::U64(4096));
        }
        assert_eq!(state.lock().unwrap().backend_calls_for(AttributeId::STANDARD_SIZE), 1);
    }

    #[test]
    fn set_entries_are_served_without_backend() {
        let state = FakeState::shared();
        let mut driver = driver(&state);
        let mut store = AttributeStore::new();

        store.set(AttributeId::UNIX_MODE, AttributeValue::U32(0o600));
        let (value, found) = store.get(&mut driver, "/tmp/a.txt", AttributeId::UNIX_MODE);
        assert!(found);
        assert_eq!(value, AttributeValue::U32(0o600));
        assert!(state.lock().unwrap().backend_calls.is_empty());
    }

    #[test]
    fn set_overwrites_type_and_value() {
        let mut store = AttributeStore::new();
        store.set(AttributeId::STANDARD_NAME, AttributeValue::U32(7));
        store.set(AttributeId::STANDARD_NAME, AttributeValue::from("notes.txt"));

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.cached(),
            vec![(AttributeId::STANDARD_NAME, &AttributeValue::from("notes.txt"))]
        );
    }

    #[test]
    fn remove_is_idempotent() {
        let mut store = AttributeStore::new();
        store.set(AttributeId::STANDARD_SIZE, AttributeValue::U64(1));
        assert!(store.remove(AttributeId::STANDARD_SIZE));
        assert!(store.remove(AttributeId::STANDARD_SIZE));
        assert!(store.is_empty());
        assert!(store.remove(AttributeId::UNIX_UID));
    }

    #[test]
    fn has_prefetches() {
        let state = FakeState::with_values([(AttributeId::UNIX_UID, AttributeValue::U32(1000))]);
        let mut driver = driver(&state);
        let mut store = AttributeStore::new();

        assert!(store.has(&mut driver, AttributeId::UNIX_UID));
        assert_eq!(store.list(), vec![AttributeId::UNIX_UID]);

        let (value, found) = store.get(&mut driver, "/tmp/a.txt", AttributeId::UNIX_UID);
        assert!(found);
        assert_eq!(value, AttributeValue::U32(1000));
        assert_eq!(state.lock().unwrap().backend_calls_for(AttributeId::UNIX_UID), 1);
    }

    #[test]
    fn has_miss_records_error() {
        let state = FakeState::shared();
        let mut driver = driver(&state);
        let mut store = AttributeStore::new();

        assert!(!store.has(&mut driver, AttributeId::UNIX_GID));
        assert_eq!(driver.last_error().code, ErrorCode::NotSupported);
        assert!(store.list().is_empty());
    }

    #[test]
    fn has_skips_the_custom_resolver() {
        let state = FakeState::shared();
        state
            .lock()
            .unwrap()
            .custom
            .insert(AttributeId::STANDARD_SUFFIX, AttributeValue::from("txt"));
        let mut driver = driver(&state);
        let mut store = AttributeStore::new();

        assert!(!store.has(&mut driver, AttributeId::STANDARD_SUFFIX));
        assert!(state.lock().unwrap().custom_calls.is_empty());
    }

    #[test]
    fn custom_ids_bypass_the_table() {
        let state = FakeState::shared();
        let mut driver = driver(&state);
        let mut store = AttributeStore::new();

        let (value, found) = store.get(&mut driver, "/tmp/a.txt", AttributeId(777));
        assert!(!found);
        assert_eq!(value, AttributeValue::Invalid);

        let guard = state.lock().unwrap();
        assert!(guard.backend_calls.is_empty());
        assert_eq!(guard.custom_calls, vec![("/tmp/a.txt".to_string(), AttributeId(777))]);
    }

    #[test]
    fn resolved_custom_values_are_cached() {
        let state = FakeState::shared();
        state
            .lock()
            .unwrap()
            .custom
            .insert(AttributeId::STANDARD_SUFFIX, AttributeValue::from("txt"));
        let mut driver = driver(&state);
        let mut store = AttributeStore::new();

        let first = store.get(&mut driver, "/tmp/a.txt", AttributeId::STANDARD_SUFFIX);
        let second = store.get(&mut driver, "/tmp/a.txt", AttributeId::STANDARD_SUFFIX);
        assert_eq!(first, (AttributeValue::from("txt"), true));
        assert_eq!(second, first);
        assert_eq!(state.lock().unwrap().custom_calls.len(), 1);
    }

    #[test]
    fn flush_attempts_every_entry() {
        let state = FakeState::shared();
        state.lock().unwrap().fail_persist.insert(AttributeId::UNIX_UID);
        let mut driver = driver(&state);
        let mut store = AttributeStore::new();

        store.set(AttributeId::UNIX_MODE, AttributeValue::U32(0o644));
        store.set(AttributeId::UNIX_UID, AttributeValue::U32(1000));
        store.set(AttributeId::UNIX_GID, AttributeValue::U32(1000));

        assert!(!store.flush(&mut driver));
        assert_eq!(state.lock().unwrap().persisted.len(), 3);
        assert_eq!(driver.last_error().code, ErrorCode::PermissionDenied);
        // flushing keeps the cache
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn flush_of_empty_store_succeeds() {
        let state = FakeState::shared();
        let mut driver = driver(&state);
        assert!(AttributeStore::new().flush(&mut driver));
        assert!(state.lock().unwrap().persisted.is_empty());
    }
}
