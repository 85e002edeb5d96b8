use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::common::errors::EnvError;

/// Opaque handle to an element owned by a `Document`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Element box in viewport coordinates, as `getBoundingClientRect` reports it
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

/// Where the page lives; drives cookie domain and path scoping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLocation {
    pub hostname: String,
    #[serde(default = "root_path")]
    pub pathname: String,
}

fn root_path() -> String {
    "/".to_string()
}

impl PageLocation {
    pub fn new(hostname: impl Into<String>, pathname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            pathname: pathname.into(),
        }
    }
}

/// The slice of the DOM the clearer touches: asset elements for cache
/// busting, the UI mount element, and page geometry.
#[async_trait(?Send)]
pub trait Document {
    fn location(&self) -> PageLocation;
    fn viewport(&self) -> Viewport;

    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Elements with the given tag name, in document order
    fn elements_by_tag(&self, tag: &str) -> Vec<NodeId>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), EnvError>;

    fn set_inner_html(&self, node: NodeId, html: &str) -> Result<(), EnvError>;

    /// Insert a shallow copy of `node` directly after it and return the copy
    fn clone_after(&self, node: NodeId) -> Result<NodeId, EnvError>;

    fn remove(&self, node: NodeId) -> Result<(), EnvError>;

    fn bounding_rect(&self, node: NodeId) -> Option<Rect>;

    /// Resolves once `node` has finished loading its resource
    async fn loaded(&self, node: NodeId) -> Result<(), EnvError>;
}
