//! Headless in-memory document.
//!
//! [`MemoryDom`] is an arena of elements parsed from real page markup with
//! `scraper`, plus the small amount of window state the controllers read:
//! scroll position, viewport size, tab visibility. There is no layout engine;
//! each element's box is whatever [`MemoryDom::set_layout`] assigned
//! (document coordinates), zero otherwise. [`Dom::bounding_rect`] translates
//! that box by the current scroll offset like the browser does.
//!
//! Dispatched notifications and smooth-scroll requests are recorded so tests
//! and the `simulate` command can inspect them.

use super::selector::Selector;
use super::{Dom, DomError, NodeId, Notification, Rect, Viewport};
use scraper::{ElementRef, Html};
use std::collections::BTreeMap;

const DOCUMENT_TAG: &str = "#document";

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    text: String,
    layout: Rect,
}

impl Node {
    fn new(tag: &str, parent: Option<NodeId>) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            parent,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            text: String::new(),
            layout: Rect::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<Node>,
    root: NodeId,
    scroll_top: f64,
    viewport: Viewport,
    hidden: bool,
    notifications: Vec<Notification>,
    scroll_requests: Vec<f64>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::parse_html("<!DOCTYPE html><html><head></head><body></body></html>")
    }
}

impl MemoryDom {
    /// Parse a full HTML document. html5ever is lenient, so this never fails;
    /// missing `<html>`, `<head>` and `<body>` are synthesized.
    pub fn parse_html(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut dom = Self {
            nodes: vec![Node::new(DOCUMENT_TAG, None)],
            root: NodeId(0),
            scroll_top: 0.0,
            viewport: Viewport::default(),
            hidden: false,
            notifications: Vec::new(),
            scroll_requests: Vec::new(),
        };
        let root = dom.root;
        dom.import(parsed.root_element(), root);
        dom
    }

    fn import(&mut self, element: ElementRef<'_>, parent: NodeId) {
        let value = element.value();
        let id = self.alloc(value.name(), Some(parent));
        self.nodes[parent.0].children.push(id);
        for (name, attr) in value.attrs() {
            self.nodes[id.0]
                .attributes
                .insert(name.to_ascii_lowercase(), attr.to_string());
        }
        for child in element.children() {
            match child.value() {
                scraper::Node::Text(text) => self.nodes[id.0].text.push_str(text),
                scraper::Node::Element(_) => {
                    if let Some(child_element) = ElementRef::wrap(child) {
                        self.import(child_element, id);
                    }
                }
                _ => {}
            }
        }
    }

    fn alloc(&mut self, tag: &str, parent: Option<NodeId>) -> NodeId {
        self.nodes.push(Node::new(tag, parent));
        NodeId(self.nodes.len() - 1)
    }

    /// Attached descendants of `from` in document order, `from` excluded.
    fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[from.0].children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.nodes[node.0].children.iter().rev().copied());
        }
        out
    }

    fn select(&self, from: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .descendants(from)
            .into_iter()
            .filter(|&n| selector.matches(self, n))
            .collect())
    }

    fn first_with_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|n| self.nodes[n.0].tag == tag)
    }

    /// Assign the element's box in document coordinates.
    pub fn set_layout(&mut self, node: NodeId, rect: Rect) {
        self.nodes[node.0].layout = rect;
    }

    pub fn set_scroll_top(&mut self, top: f64) {
        self.scroll_top = top.max(0.0);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node.0].tag
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn classes(&self, node: NodeId) -> Vec<&str> {
        self.nodes[node.0]
            .attributes
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub(super) fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].attributes.get(name).map(String::as_str)
    }

    pub(super) fn attributes(&self, node: NodeId) -> &BTreeMap<String, String> {
        &self.nodes[node.0].attributes
    }

    /// Text directly inside `node`, descendants excluded.
    pub(super) fn own_text(&self, node: NodeId) -> &str {
        &self.nodes[node.0].text
    }

    /// Notifications dispatched so far, oldest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Targets of every smooth-scroll request, oldest first.
    pub fn scroll_requests(&self) -> &[f64] {
        &self.scroll_requests
    }
}

impl Dom for MemoryDom {
    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        self.select(self.root, selector)
    }

    fn query_within(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError> {
        self.select(root, selector)
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.attr(n, "id") == Some(id))
    }

    fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>, DomError> {
        let selector = Selector::parse(selector)?;
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if selector.matches(self, current) {
                return Ok(Some(current));
            }
            cursor = self.nodes[current.0].parent;
        }
        Ok(None)
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes[current.0].parent;
        }
        false
    }

    fn head(&self) -> Option<NodeId> {
        self.first_with_tag("head")
    }

    fn body(&self) -> Option<NodeId> {
        self.first_with_tag("body")
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.classes(node).contains(&class)
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let list = self.nodes[node.0]
            .attributes
            .entry("class".to_string())
            .or_default();
        if !list.trim().is_empty() {
            list.push(' ');
        }
        list.push_str(class);
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(list) = self.nodes[node.0].attributes.get_mut("class") {
            *list = list
                .split_whitespace()
                .filter(|c| *c != class)
                .collect::<Vec<_>>()
                .join(" ");
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.attr(node, name).map(str::to_string)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.nodes[node.0]
            .attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        self.nodes[node.0].attributes.remove(name);
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.nodes[node.0].styles.get(property).cloned()
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        self.nodes[node.0]
            .styles
            .insert(property.to_string(), value.to_string());
    }

    fn text(&self, node: NodeId) -> String {
        let mut out = self.nodes[node.0].text.clone();
        for child in self.descendants(node) {
            out.push_str(&self.nodes[child.0].text);
        }
        out
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        for child in std::mem::take(&mut self.nodes[node.0].children) {
            self.nodes[child.0].parent = None;
        }
        self.nodes[node.0].text = text.to_string();
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeId, DomError> {
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(DomError::Backend(format!("invalid tag name `{tag}`")));
        }
        Ok(self.alloc(tag, None))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(old) = self.nodes[child.0].parent {
            self.nodes[old.0].children.retain(|&c| c != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        let layout = self.nodes[node.0].layout;
        Rect {
            top: layout.top - self.scroll_top,
            ..layout
        }
    }

    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn scroll_to(&mut self, top: f64) {
        self.scroll_requests.push(top);
        self.set_scroll_top(top);
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn dispatch(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"<!DOCTYPE html>
<html><head><title>cv</title></head>
<body class="loading">
  <nav class="modern-nav"><a class="nav-link" href="#home">Home</a></nav>
  <main>
    <div id="home"><h1 class="hero-title">Hi</h1></div>
    <section id="SKILLS"><ul class="Tech-skills-list"><li>Rust</li></ul></section>
  </main>
</body></html>"##;

    #[test]
    fn parse_builds_tree() {
        let dom = MemoryDom::parse_html(PAGE);
        let body = dom.body().unwrap();
        assert!(dom.has_class(body, "loading"));
        assert!(dom.head().is_some());
        let sections = dom.query_all("section[id], main > div[id]").unwrap();
        let ids: Vec<_> = sections
            .iter()
            .map(|&n| dom.attribute(n, "id").unwrap())
            .collect();
        assert_eq!(ids, vec!["home", "SKILLS"]);
    }

    #[test]
    fn text_includes_descendants() {
        let dom = MemoryDom::parse_html(PAGE);
        let nav = dom.query(".modern-nav").unwrap().unwrap();
        assert_eq!(dom.text(nav), "Home");
    }

    #[test]
    fn class_mutation() {
        let mut dom = MemoryDom::parse_html(PAGE);
        let body = dom.body().unwrap();
        dom.add_class(body, "keyboard-navigation");
        dom.add_class(body, "keyboard-navigation");
        assert_eq!(dom.classes(body), vec!["loading", "keyboard-navigation"]);
        dom.remove_class(body, "loading");
        assert_eq!(dom.classes(body), vec!["keyboard-navigation"]);
        dom.toggle_class(body, "x", false);
        assert_eq!(dom.classes(body), vec!["keyboard-navigation"]);
    }

    #[test]
    fn created_elements_are_queryable_once_attached() {
        let mut dom = MemoryDom::parse_html(PAGE);
        let button = crate::dom::create_with_class(&mut dom, "button", "btn filter-btn").unwrap();
        assert!(dom.query_all(".filter-btn").unwrap().is_empty());
        let main = dom.query("main").unwrap().unwrap();
        dom.append_child(main, button);
        assert_eq!(dom.query_all("main .filter-btn").unwrap(), vec![button]);
        assert_eq!(dom.closest(button, "main").unwrap(), Some(main));
        assert!(dom.contains(main, button));
    }

    #[test]
    fn invalid_tag_rejected() {
        let mut dom = MemoryDom::default();
        assert!(dom.create_element("not a tag").is_err());
    }

    #[test]
    fn bounding_rect_tracks_scroll() {
        let mut dom = MemoryDom::parse_html(PAGE);
        let skills = dom.element_by_id("SKILLS").unwrap();
        dom.set_layout(
            skills,
            Rect {
                left: 0.0,
                top: 900.0,
                width: 1280.0,
                height: 600.0,
            },
        );
        dom.set_scroll_top(850.0);
        let rect = dom.bounding_rect(skills);
        assert_eq!(rect.top, 50.0);
        assert_eq!(rect.bottom(), 650.0);
    }

    #[test]
    fn set_text_replaces_children() {
        let mut dom = MemoryDom::parse_html(PAGE);
        let nav = dom.query(".modern-nav").unwrap().unwrap();
        dom.set_text(nav, "plain");
        assert_eq!(dom.text(nav), "plain");
        assert!(dom.query_all(".nav-link").unwrap().is_empty());
    }

    #[test]
    fn scroll_requests_are_recorded_and_clamped() {
        let mut dom = MemoryDom::default();
        dom.scroll_to(-20.0);
        dom.scroll_to(400.0);
        assert_eq!(dom.scroll_requests(), &[-20.0, 400.0]);
        assert_eq!(dom.scroll_top(), 400.0);
    }
}
