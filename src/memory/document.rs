use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};

use crate::common::errors::EnvError;
use crate::env::{Document, NodeId, PageLocation, Rect, Viewport};

/// A flat element: tag, attributes, markup content and layout box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub inner_html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<Rect>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            inner_html: String::new(),
            rect: None,
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn at(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn stylesheet(href: &str) -> Self {
        Self::new("link").attr("rel", "stylesheet").attr("href", href)
    }

    pub fn script(src: &str) -> Self {
        Self::new("script").attr("src", src)
    }

    pub fn image(src: &str, rect: Rect) -> Self {
        Self::new("img").attr("src", src).at(rect)
    }

    pub fn mount(id: &str) -> Self {
        Self::new("div").attr("id", id)
    }

    fn url(&self) -> Option<&String> {
        self.attributes
            .get("href")
            .or_else(|| self.attributes.get("src"))
    }
}

/// Document order list of elements with stable handles
#[derive(Debug)]
pub struct MemoryDocument {
    location: PageLocation,
    viewport: Viewport,
    nodes: RefCell<Vec<(NodeId, Element)>>,
    next_id: Cell<u32>,
    broken: RefCell<HashSet<String>>,
    render_budget: Cell<Option<usize>>,
    failing: RefCell<HashSet<&'static str>>,
}

impl MemoryDocument {
    pub fn new(location: PageLocation, viewport: Viewport) -> Self {
        Self {
            location,
            viewport,
            nodes: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            broken: RefCell::new(HashSet::new()),
            render_budget: Cell::new(None),
            failing: RefCell::new(HashSet::new()),
        }
    }

    pub fn append(&self, element: Element) -> NodeId {
        let id = self.allocate();
        self.nodes.borrow_mut().push((id, element));
        id
    }

    /// Loads of any URL starting with `prefix` will fail
    pub fn break_url(&self, prefix: &str) {
        self.broken.borrow_mut().insert(prefix.to_string());
    }

    /// Make an element mutation (`setAttribute`, `innerHTML`) fail from now on
    pub fn fail(&self, operation: &'static str) {
        self.failing.borrow_mut().insert(operation);
    }

    /// Only the next `count` markup writes succeed; later ones fail
    pub fn allow_renders(&self, count: usize) {
        self.render_budget.set(Some(count));
    }

    pub fn element(&self, node: NodeId) -> Option<Element> {
        self.nodes
            .borrow()
            .iter()
            .find(|(id, _)| *id == node)
            .map(|(_, el)| el.clone())
    }

    /// Every element, in document order
    pub fn elements(&self) -> Vec<Element> {
        self.nodes.borrow().iter().map(|(_, el)| el.clone()).collect()
    }

    fn allocate(&self) -> NodeId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        NodeId(id)
    }

    fn with_element<T>(
        &self,
        node: NodeId,
        operation: &str,
        f: impl FnOnce(&mut Element) -> T,
    ) -> Result<T, EnvError> {
        if self.failing.borrow().contains(operation) {
            return Err(EnvError::new(operation, "injected failure"));
        }
        let mut nodes = self.nodes.borrow_mut();
        match nodes.iter_mut().find(|(id, _)| *id == node) {
            Some((_, el)) => Ok(f(el)),
            None => Err(EnvError::new(operation, format!("node {} is detached", node.0))),
        }
    }
}

#[async_trait(?Send)]
impl Document for MemoryDocument {
    fn location(&self) -> PageLocation {
        self.location.clone()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.nodes
            .borrow()
            .iter()
            .find(|(_, el)| el.attributes.get("id").is_some_and(|v| v == id))
            .map(|(node, _)| *node)
    }

    fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.nodes
            .borrow()
            .iter()
            .filter(|(_, el)| el.tag.eq_ignore_ascii_case(tag))
            .map(|(node, _)| *node)
            .collect()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node)
            .and_then(|el| el.attributes.get(name).cloned())
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), EnvError> {
        self.with_element(node, "setAttribute", |el| {
            el.attributes.insert(name.to_string(), value.to_string());
        })
    }

    fn set_inner_html(&self, node: NodeId, html: &str) -> Result<(), EnvError> {
        match self.render_budget.get() {
            Some(0) => return Err(EnvError::new("innerHTML", "rendering is blocked")),
            Some(left) => self.render_budget.set(Some(left - 1)),
            None => {}
        }
        self.with_element(node, "innerHTML", |el| el.inner_html = html.to_string())
    }

    fn clone_after(&self, node: NodeId) -> Result<NodeId, EnvError> {
        let copy_id = self.allocate();
        let mut nodes = self.nodes.borrow_mut();
        let idx = nodes
            .iter()
            .position(|(id, _)| *id == node)
            .ok_or_else(|| EnvError::new("cloneNode", format!("node {} is detached", node.0)))?;
        let copy = nodes[idx].1.clone();
        nodes.insert(idx + 1, (copy_id, copy));
        Ok(copy_id)
    }

    fn remove(&self, node: NodeId) -> Result<(), EnvError> {
        let mut nodes = self.nodes.borrow_mut();
        let before = nodes.len();
        nodes.retain(|(id, _)| *id != node);
        if nodes.len() == before {
            return Err(EnvError::new("remove", format!("node {} is detached", node.0)));
        }
        Ok(())
    }

    fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        self.element(node).and_then(|el| el.rect)
    }

    async fn loaded(&self, node: NodeId) -> Result<(), EnvError> {
        let url = self
            .element(node)
            .and_then(|el| el.url().cloned())
            .ok_or_else(|| EnvError::new("load", format!("node {} has no resource", node.0)))?;
        if self.broken.borrow().iter().any(|prefix| url.starts_with(prefix)) {
            return Err(EnvError::new("load", format!("{} failed to load", url)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> MemoryDocument {
        MemoryDocument::new(PageLocation::new("example.com", "/"), Viewport::default())
    }

    #[test]
    fn test_clone_after_keeps_order() {
        let doc = doc();
        let a = doc.append(Element::stylesheet("/a.css"));
        let b = doc.append(Element::stylesheet("/b.css"));
        let copy = doc.clone_after(a).unwrap();
        assert_eq!(doc.elements_by_tag("link"), vec![a, copy, b]);
    }

    #[test]
    fn test_detached_node_errors() {
        let doc = doc();
        let a = doc.append(Element::script("/a.js"));
        doc.remove(a).unwrap();
        assert!(doc.remove(a).is_err());
        assert!(doc.set_attribute(a, "src", "/b.js").is_err());
    }

    #[test]
    fn test_render_budget() {
        let doc = doc();
        let mount = doc.append(Element::mount("status"));
        doc.allow_renders(1);
        assert!(doc.set_inner_html(mount, "a").is_ok());
        assert!(doc.set_inner_html(mount, "b").is_err());
        assert_eq!(doc.element(mount).unwrap().inner_html, "a");
    }

    #[test]
    fn test_element_by_id() {
        let doc = doc();
        let mount = doc.append(Element::mount("status"));
        assert_eq!(doc.element_by_id("status"), Some(mount));
        assert_eq!(doc.element_by_id("missing"), None);
    }
}
