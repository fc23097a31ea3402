// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory driver for tests
//!
//! [`FakeDriver`] answers from a shared [`FakeState`] and records every call
//! made against it, so tests can assert on cache hits and persist attempts.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

use crate::{
    attribute::AttributeId,
    driver::{FileHandle, InfoDriver},
    error::{ErrorCode, IoError},
    permissions::Permissions,
    registry::{DriverFactory, DriverRegistry},
    value::AttributeValue,
};

/// Backing data and call log shared between a test and its fakes
#[derive(Debug, Clone)]
pub struct FakeState {
    /// Well-known attributes the backend knows about
    pub values: HashMap<AttributeId, AttributeValue>,
    /// Custom attributes the backend knows about
    pub custom: HashMap<AttributeId, AttributeValue>,
    /// Outcome of `initialize`
    pub init_ok: bool,
    pub exists: bool,
    /// Whether the factory hands out content handles
    pub has_handle: bool,
    pub permissions: Permissions,
    /// Attributes whose persist attempt fails with `PermissionDenied`
    pub fail_persist: HashSet<AttributeId>,

    pub init_calls: usize,
    pub backend_calls: Vec<AttributeId>,
    pub custom_calls: Vec<(String, AttributeId)>,
    /// Every persist attempt, failed ones included
    pub persisted: Vec<(AttributeId, AttributeValue)>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
            custom: HashMap::new(),
            init_ok: true,
            exists: true,
            has_handle: true,
            permissions: Permissions::new(0o644),
            fail_persist: HashSet::new(),
            init_calls: 0,
            backend_calls: Vec::new(),
            custom_calls: Vec::new(),
            persisted: Vec::new(),
        }
    }
}

impl FakeState {
    pub fn shared() -> Arc<Mutex<FakeState>> {
        Arc::new(Mutex::new(FakeState::default()))
    }

    pub fn with_values<I>(values: I) -> Arc<Mutex<FakeState>>
    where
        I: IntoIterator<Item = (AttributeId, AttributeValue)>,
    {
        Arc::new(Mutex::new(FakeState {
            values: values.into_iter().collect(),
            ..FakeState::default()
        }))
    }

    /// Backend queries made for `id`
    pub fn backend_calls_for(&self, id: AttributeId) -> usize {
        self.backend_calls.iter().filter(|c| **c == id).count()
    }

    /// Persist attempts made for `id`
    pub fn persisted_for(&self, id: AttributeId) -> Vec<AttributeValue> {
        self.persisted
            .iter()
            .filter(|(candidate, _)| *candidate == id)
            .map(|(_, value)| value.clone())
            .collect()
    }
}

fn lock(state: &Mutex<FakeState>) -> MutexGuard<'_, FakeState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Call-counting driver over a [`FakeState`]
pub struct FakeDriver {
    uri: Url,
    state: Arc<Mutex<FakeState>>,
    registry: Option<Arc<DriverRegistry>>,
    initialized: bool,
    error: IoError,
}

impl FakeDriver {
    /// Driver with no registry behind it; `permissions` always fails
    pub fn new(uri: Url, state: Arc<Mutex<FakeState>>) -> Self {
        Self {
            uri,
            state,
            registry: None,
            initialized: false,
            error: IoError::none(),
        }
    }

    pub fn with_registry(uri: Url, state: Arc<Mutex<FakeState>>, registry: Arc<DriverRegistry>) -> Self {
        Self {
            registry: Some(registry),
            ..Self::new(uri, state)
        }
    }
}

impl InfoDriver for FakeDriver {
    fn uri(&self) -> &Url {
        &self.uri
    }

    fn initialize(&mut self) -> bool {
        let mut state = lock(&self.state);
        state.init_calls += 1;
        self.initialized = state.init_ok;
        if !self.initialized {
            self.error = IoError::new(ErrorCode::NotFound);
        }
        self.initialized
    }

    fn resolve_backend_attribute(&self, id: AttributeId) -> Result<AttributeValue, IoError> {
        let mut state = lock(&self.state);
        state.backend_calls.push(id);
        if !self.initialized {
            return Err(IoError::new(ErrorCode::NotInitialized));
        }
        state
            .values
            .get(&id)
            .cloned()
            .ok_or_else(|| IoError::new(ErrorCode::NotSupported))
    }

    fn resolve_custom_attribute(&self, path: &str, id: AttributeId) -> AttributeValue {
        let mut state = lock(&self.state);
        state.custom_calls.push((path.to_string(), id));
        state.custom.get(&id).cloned().unwrap_or_default()
    }

    fn persist_attribute(&self, id: AttributeId, value: &AttributeValue) -> Result<(), IoError> {
        let mut state = lock(&self.state);
        state.persisted.push((id, value.clone()));
        if state.fail_persist.contains(&id) {
            return Err(IoError::new(ErrorCode::PermissionDenied));
        }
        state.values.insert(id, value.clone());
        Ok(())
    }

    fn exists(&self) -> bool {
        lock(&self.state).exists
    }

    fn permissions(&mut self) -> Permissions {
        let result = match &self.registry {
            Some(registry) => registry.permissions_for(&self.uri),
            None => Err(IoError::new(ErrorCode::NotInitialized)),
        };
        match result {
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

/// Content handle reporting the state's permissions
pub struct FakeHandle {
    uri: Url,
    permissions: Permissions,
}

impl FileHandle for FakeHandle {
    fn uri(&self) -> &Url {
        &self.uri
    }

    fn permissions(&self) -> Result<Permissions, IoError> {
        Ok(self.permissions)
    }
}

/// Factory producing [`FakeDriver`]s that share one [`FakeState`]
pub struct FakeFactory {
    scheme: String,
    state: Arc<Mutex<FakeState>>,
}

impl FakeFactory {
    pub fn new(scheme: &str, state: Arc<Mutex<FakeState>>) -> Self {
        Self {
            scheme: scheme.to_string(),
            state,
        }
    }
}

impl DriverFactory for FakeFactory {
    fn scheme(&self) -> &str {
        &self.scheme
    }

    fn create_driver(&self, uri: &Url, registry: Arc<DriverRegistry>) -> Box<dyn InfoDriver> {
        Box::new(FakeDriver::with_registry(uri.clone(), Arc::clone(&self.state), registry))
    }

    fn create_file(&self, uri: &Url) -> Option<Box<dyn FileHandle>> {
        let state = lock(&self.state);
        if !state.has_handle {
            return None;
        }
        Some(Box::new(FakeHandle {
            uri: uri.clone(),
            permissions: state.permissions,
        }))
    }
}
