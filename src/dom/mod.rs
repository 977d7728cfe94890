//! Document access behind a trait.
//!
//! Every controller reads and writes the page through [`Dom`], so the same
//! behavior code runs against the browser ([`WebDom`](crate::web), wasm only)
//! and against [`MemoryDom`], the headless document used by tests and the
//! `simulate` command.
//!
//! | Concern | Trait surface |
//! |---|---|
//! | **Lookup** | `query_all`, `query_within`, `element_by_id`, `closest`, `contains` |
//! | **Classes** | `has_class`, `add_class`, `remove_class`, `toggle_class` |
//! | **Attributes** | `attribute`, `set_attribute`, `remove_attribute` |
//! | **Style / text** | `style`, `set_style`, `text`, `set_text` |
//! | **Tree** | `create_element`, `append_child`, `head`, `body` |
//! | **Window** | `bounding_rect`, `scroll_top`, `scroll_to`, `viewport`, `is_hidden` |
//! | **Notifications** | `dispatch` (plus [`run_then_deliver`] for backends that queue them) |
//!
//! Lookups are fallible because a browser rejects malformed selectors at
//! runtime. Mutations are not: an element handle that was valid when it was
//! queried stays valid for the life of the page.

pub mod memory;
pub mod selector;

pub use memory::MemoryDom;

use serde::Serialize;
use std::cell::RefCell;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomError {
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("DOM backend error: {0}")]
    Backend(String),
}

/// Opaque handle to an element owned by a [`Dom`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

/// Viewport-relative bounding box, same meaning as `getBoundingClientRect()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
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

/// Custom events dispatched on the document for outside listeners.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    #[serde(rename = "cvAppResize")]
    Resize { width: f64, height: f64 },
    #[serde(rename = "cvAppLoaded")]
    Loaded,
}

impl Notification {
    /// DOM event name the notification is dispatched under.
    pub fn event_name(&self) -> &'static str {
        match self {
            Notification::Resize { .. } => "cvAppResize",
            Notification::Loaded => "cvAppLoaded",
        }
    }
}

pub trait Dom {
    /// All elements matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError>;

    /// First element matching `selector`.
    fn query(&self, selector: &str) -> Result<Option<NodeId>, DomError> {
        Ok(self.query_all(selector)?.into_iter().next())
    }

    /// Descendants of `root` matching `selector`, in document order.
    fn query_within(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError>;

    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Nearest inclusive ancestor of `node` matching `selector`.
    fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>, DomError>;

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    fn head(&self) -> Option<NodeId>;
    fn body(&self) -> Option<NodeId>;

    fn has_class(&self, node: NodeId, class: &str) -> bool;
    fn add_class(&mut self, node: NodeId, class: &str);
    fn remove_class(&mut self, node: NodeId, class: &str);

    fn toggle_class(&mut self, node: NodeId, class: &str, on: bool) {
        if on {
            self.add_class(node, class);
        } else {
            self.remove_class(node, class);
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);
    fn remove_attribute(&mut self, node: NodeId, name: &str);

    /// Inline style property, CSS (kebab-case) name.
    fn style(&self, node: NodeId, property: &str) -> Option<String>;
    fn set_style(&mut self, node: NodeId, property: &str, value: &str);

    fn text(&self, node: NodeId) -> String;
    fn set_text(&mut self, node: NodeId, text: &str);

    fn create_element(&mut self, tag: &str) -> Result<NodeId, DomError>;
    fn append_child(&mut self, parent: NodeId, child: NodeId);

    fn bounding_rect(&self, node: NodeId) -> Rect;
    fn scroll_top(&self) -> f64;
    /// Animated scroll of the window to `top` (document coordinates).
    fn scroll_to(&mut self, top: f64);
    fn viewport(&self) -> Viewport;
    fn is_hidden(&self) -> bool;

    fn dispatch(&mut self, notification: Notification);
}

/// Create `<tag class="…">` in one call.
pub fn create_with_class<D: Dom + ?Sized>(
    dom: &mut D,
    tag: &str,
    class: &str,
) -> Result<NodeId, DomError> {
    let node = dom.create_element(tag)?;
    for name in class.split_whitespace() {
        dom.add_class(node, name);
    }
    Ok(node)
}

/// Run `act` on a shared value, then hand each notification it queued to
/// `deliver` once the borrow has ended. Outside listeners reached through
/// `deliver` may borrow `shared` again. Returns `None` without running
/// anything when `shared` is already borrowed.
pub fn run_then_deliver<T, R>(
    shared: &RefCell<T>,
    act: impl FnOnce(&mut T) -> R,
    take: impl FnOnce(&mut T) -> Vec<Notification>,
    mut deliver: impl FnMut(Notification),
) -> Option<R> {
    let (result, queued) = {
        let Ok(mut value) = shared.try_borrow_mut() else {
            tracing::warn!("page runtime busy, call dropped");
            return None;
        };
        let result = act(&mut value);
        (result, take(&mut value))
    };
    for notification in queued {
        deliver(notification);
    }
    Some(result)
}

/// Format a pixel offset the way JavaScript stringifies numbers (`-0` → `0`).
pub fn css_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        format!("{value}")
    }
}
