//! In-memory browser surfaces.
//!
//! Each type behaves like its browser counterpart closely enough for the
//! clearing pass to be exercised end to end: cookie writes honor domain and
//! path scoping, stylesheet loads can be made to fail, optional
//! capabilities can be present or absent in any combination.

pub mod capabilities;
pub mod clock;
pub mod cookies;
pub mod document;
pub mod page;
pub mod storage;

pub use capabilities::{MemoryAppCache, MemoryCacheStorage, MemoryCapabilities, MemoryWorkers};
pub use clock::ManualClock;
pub use cookies::{Cookie, MemoryCookieJar};
pub use document::{Element, MemoryDocument};
pub use page::{MemoryPage, PageState};
pub use storage::MemoryStore;
