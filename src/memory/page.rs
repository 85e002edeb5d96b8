use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use super::capabilities::{MemoryAppCache, MemoryCacheStorage, MemoryCapabilities, MemoryWorkers};
use super::clock::ManualClock;
use super::cookies::{Cookie, MemoryCookieJar};
use super::document::{Element, MemoryDocument};
use super::storage::MemoryStore;
use crate::env::{AppCacheStatus, BrowserEnv, Clock, PageLocation, SystemClock, Viewport};

/// Serializable picture of a page's client-side state.
///
/// A `None` capability field means the browser does not support it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageState {
    pub location: PageLocation,

    #[serde(default)]
    pub viewport: Viewport,

    #[serde(default)]
    pub local_storage: BTreeMap<String, String>,

    #[serde(default)]
    pub session_storage: BTreeMap<String, String>,

    #[serde(default)]
    pub cookies: Vec<Cookie>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_cache: Option<AppCacheStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_workers: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_storage: Option<Vec<String>>,

    #[serde(default)]
    pub elements: Vec<Element>,
}

impl PageState {
    pub fn new(location: PageLocation) -> Self {
        Self {
            location,
            viewport: Viewport::default(),
            local_storage: BTreeMap::new(),
            session_storage: BTreeMap::new(),
            cookies: Vec::new(),
            app_cache: None,
            service_workers: None,
            cache_storage: None,
            elements: Vec::new(),
        }
    }

    /// Read a page snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read page state: {}", path.display()))?;
        let state: PageState = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse page state: {}", path.display()))?;
        Ok(state)
    }

    /// Write the snapshot back as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize page state")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write page state: {}", path.display()))?;
        Ok(())
    }
}

/// A whole page held in memory, with typed handles on every surface so
/// callers can seed it, run a clearer against `env()`, and inspect it.
pub struct MemoryPage {
    pub durable: Rc<MemoryStore>,
    pub session: Rc<MemoryStore>,
    pub cookies: Rc<MemoryCookieJar>,
    pub document: Rc<MemoryDocument>,
    pub capabilities: Rc<MemoryCapabilities>,
    clock: Rc<dyn Clock>,
}

impl MemoryPage {
    /// Empty page with no optional capabilities and a manual clock
    pub fn new(location: PageLocation) -> Self {
        Self::build(
            PageState::new(location),
            MemoryCapabilities::default(),
            Rc::new(ManualClock::new(0)),
        )
    }

    pub fn with_capabilities(location: PageLocation, capabilities: MemoryCapabilities) -> Self {
        Self::build(
            PageState::new(location),
            capabilities,
            Rc::new(ManualClock::new(0)),
        )
    }

    /// Rebuild a page from a snapshot, running on the wall clock
    pub fn from_state(state: PageState) -> Self {
        let capabilities = MemoryCapabilities {
            app_cache: state.app_cache.map(MemoryAppCache::new),
            workers: state.service_workers.clone().map(MemoryWorkers::new),
            cache_storage: state.cache_storage.clone().map(MemoryCacheStorage::new),
        };
        Self::build(state, capabilities, Rc::new(SystemClock))
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn build(state: PageState, capabilities: MemoryCapabilities, clock: Rc<dyn Clock>) -> Self {
        let cookies = MemoryCookieJar::new(state.location.clone());
        for cookie in state.cookies {
            cookies.insert(cookie);
        }
        let document = MemoryDocument::new(state.location, state.viewport);
        for element in state.elements {
            document.append(element);
        }
        Self {
            durable: Rc::new(MemoryStore::with_entries(state.local_storage)),
            session: Rc::new(MemoryStore::with_entries(state.session_storage)),
            cookies: Rc::new(cookies),
            document: Rc::new(document),
            capabilities: Rc::new(capabilities),
            clock,
        }
    }

    /// The environment a clearer runs against; shares state with this page
    pub fn env(&self) -> BrowserEnv {
        BrowserEnv {
            durable: self.durable.clone(),
            session: self.session.clone(),
            cookies: self.cookies.clone(),
            document: self.document.clone(),
            clock: self.clock.clone(),
            capabilities: self.capabilities.clone(),
        }
    }

    /// Current state, ready to be saved
    pub fn to_state(&self) -> PageState {
        use crate::env::Document;

        let caps = &self.capabilities;
        PageState {
            location: self.document.location(),
            viewport: self.document.viewport(),
            local_storage: self.durable.snapshot(),
            session_storage: self.session.snapshot(),
            cookies: self.cookies.all(),
            app_cache: caps.app_cache.as_ref().map(|c| c.current_status()),
            service_workers: caps.workers.as_ref().map(|w| w.scopes()),
            cache_storage: caps.cache_storage.as_ref().map(|c| c.names()),
            elements: self.document.elements(),
        }
    }
}
