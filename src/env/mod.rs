//! Host-environment seams the clearer runs against.
//!
//! Every browser surface the clearing pass touches is a trait here, so the
//! same pass drives a real page binding or the in-memory page in `memory`.

pub mod capabilities;
pub mod clock;
pub mod cookies;
pub mod document;
pub mod storage;

use std::rc::Rc;

pub use capabilities::{
    AppCache, AppCacheStatus, CacheStorage, CapabilityProvider, NoCapabilities,
    WorkerRegistration, WorkerRegistry,
};
pub use clock::{Clock, SystemClock};
pub use cookies::CookieJar;
pub use document::{Document, NodeId, PageLocation, Rect, Viewport};
pub use storage::{DurableStore, SessionStore};

/// Everything one page exposes to the clearer
#[derive(Clone)]
pub struct BrowserEnv {
    pub durable: Rc<dyn DurableStore>,
    pub session: Rc<dyn SessionStore>,
    pub cookies: Rc<dyn CookieJar>,
    pub document: Rc<dyn Document>,
    pub clock: Rc<dyn Clock>,
    pub capabilities: Rc<dyn CapabilityProvider>,
}
