use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use crate::common::errors::EnvError;
use crate::env::{
    AppCache, AppCacheStatus, CacheStorage, CapabilityProvider, WorkerRegistration, WorkerRegistry,
};

#[derive(Debug)]
pub struct MemoryAppCache {
    status: Cell<AppCacheStatus>,
    fail_update: Cell<bool>,
}

impl MemoryAppCache {
    pub fn new(status: AppCacheStatus) -> Self {
        Self {
            status: Cell::new(status),
            fail_update: Cell::new(false),
        }
    }

    /// Make `update()` throw, as browsers do when no manifest is attached
    pub fn fail_update(&self) {
        self.fail_update.set(true);
    }

    pub fn current_status(&self) -> AppCacheStatus {
        self.status.get()
    }
}

#[async_trait(?Send)]
impl AppCache for MemoryAppCache {
    fn status(&self) -> AppCacheStatus {
        self.status.get()
    }

    fn update(&self) -> Result<(), EnvError> {
        if self.fail_update.get() {
            return Err(EnvError::new("applicationCache.update", "InvalidStateError"));
        }
        self.status.set(AppCacheStatus::Obsolete);
        Ok(())
    }

    async fn obsolete(&self) -> Result<(), EnvError> {
        match self.status.get() {
            AppCacheStatus::Obsolete => Ok(()),
            other => Err(EnvError::new(
                "applicationCache.obsolete",
                format!("cache still {:?}", other),
            )),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryWorkers {
    scopes: RefCell<Vec<String>>,
    failing: RefCell<HashSet<String>>,
}

impl MemoryWorkers {
    pub fn new<I: IntoIterator<Item = S>, S: Into<String>>(scopes: I) -> Self {
        Self {
            scopes: RefCell::new(scopes.into_iter().map(Into::into).collect()),
            failing: RefCell::new(HashSet::new()),
        }
    }

    /// Make unregistering `scope` fail
    pub fn fail_scope(&self, scope: &str) {
        self.failing.borrow_mut().insert(scope.to_string());
    }

    pub fn scopes(&self) -> Vec<String> {
        self.scopes.borrow().clone()
    }
}

#[async_trait(?Send)]
impl WorkerRegistry for MemoryWorkers {
    async fn registrations(&self) -> Result<Vec<WorkerRegistration>, EnvError> {
        Ok(self
            .scopes
            .borrow()
            .iter()
            .map(|scope| WorkerRegistration { scope: scope.clone() })
            .collect())
    }

    async fn unregister(&self, registration: &WorkerRegistration) -> Result<bool, EnvError> {
        if self.failing.borrow().contains(&registration.scope) {
            return Err(EnvError::new(
                "ServiceWorkerRegistration.unregister",
                format!("scope {} refused", registration.scope),
            ));
        }
        let mut scopes = self.scopes.borrow_mut();
        let before = scopes.len();
        scopes.retain(|s| s != &registration.scope);
        Ok(scopes.len() < before)
    }
}

#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    names: RefCell<Vec<String>>,
}

impl MemoryCacheStorage {
    pub fn new<I: IntoIterator<Item = S>, S: Into<String>>(names: I) -> Self {
        Self {
            names: RefCell::new(names.into_iter().map(Into::into).collect()),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.names.borrow().clone()
    }
}

#[async_trait(?Send)]
impl CacheStorage for MemoryCacheStorage {
    async fn keys(&self) -> Result<Vec<String>, EnvError> {
        Ok(self.names())
    }

    async fn delete(&self, name: &str) -> Result<bool, EnvError> {
        let mut names = self.names.borrow_mut();
        let before = names.len();
        names.retain(|n| n != name);
        Ok(names.len() < before)
    }
}

/// Any combination of the optional capabilities; `None` fields are unsupported
#[derive(Debug, Default)]
pub struct MemoryCapabilities {
    pub app_cache: Option<MemoryAppCache>,
    pub workers: Option<MemoryWorkers>,
    pub cache_storage: Option<MemoryCacheStorage>,
}

impl CapabilityProvider for MemoryCapabilities {
    fn app_cache(&self) -> Option<&dyn AppCache> {
        self.app_cache.as_ref().map(|c| c as &dyn AppCache)
    }

    fn workers(&self) -> Option<&dyn WorkerRegistry> {
        self.workers.as_ref().map(|w| w as &dyn WorkerRegistry)
    }

    fn cache_storage(&self) -> Option<&dyn CacheStorage> {
        self.cache_storage.as_ref().map(|c| c as &dyn CacheStorage)
    }
}
