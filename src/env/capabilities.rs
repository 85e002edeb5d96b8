use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::common::errors::EnvError;

/// Status of the deprecated application cache, mirroring
/// `window.applicationCache.status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppCacheStatus {
    Uncached,
    Idle,
    Checking,
    Downloading,
    UpdateReady,
    Obsolete,
}

/// Legacy offline application cache
#[async_trait(?Send)]
pub trait AppCache {
    fn status(&self) -> AppCacheStatus;

    /// Kick off an update check; with the manifest gone this leads to obsolescence
    fn update(&self) -> Result<(), EnvError>;

    /// Resolves when the cache reports itself obsolete
    async fn obsolete(&self) -> Result<(), EnvError>;
}

/// A registered background (service) worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRegistration {
    pub scope: String,
}

/// Background worker registry for the origin
#[async_trait(?Send)]
pub trait WorkerRegistry {
    async fn registrations(&self) -> Result<Vec<WorkerRegistration>, EnvError>;

    /// Returns whether a registration was actually removed
    async fn unregister(&self, registration: &WorkerRegistration) -> Result<bool, EnvError>;
}

/// Named response caches (`CacheStorage`)
#[async_trait(?Send)]
pub trait CacheStorage {
    async fn keys(&self) -> Result<Vec<String>, EnvError>;

    /// Returns whether a cache with that name existed
    async fn delete(&self, name: &str) -> Result<bool, EnvError>;
}

/// Hands out the optional browser capabilities. `None` means the
/// environment does not support that capability at all.
pub trait CapabilityProvider {
    fn app_cache(&self) -> Option<&dyn AppCache>;
    fn workers(&self) -> Option<&dyn WorkerRegistry>;
    fn cache_storage(&self) -> Option<&dyn CacheStorage>;
}

/// An environment with none of the optional capabilities
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCapabilities;

impl CapabilityProvider for NoCapabilities {
    fn app_cache(&self) -> Option<&dyn AppCache> {
        None
    }

    fn workers(&self) -> Option<&dyn WorkerRegistry> {
        None
    }

    fn cache_storage(&self) -> Option<&dyn CacheStorage> {
        None
    }
}
