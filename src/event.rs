//! Inputs the page reacts to.
//!
//! Window-level events carry no target; element events name the element the
//! browser dispatched them on. Window state that the event implies (new
//! scroll offset, new viewport size, hidden flag) is already applied to the
//! [`Dom`](crate::dom::Dom) when the event is handled.

use crate::dom::NodeId;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Load,
    Scroll,
    Resize,
    VisibilityChange,
    KeyDown { key: String },
    Click { target: NodeId },
    Submit {
        form: NodeId,
        fields: BTreeMap<String, String>,
    },
    Change { target: NodeId, value: String },
    PointerEnter { target: NodeId },
    PointerLeave { target: NodeId },
    TouchStart { target: NodeId, x: f64 },
    TouchEnd { target: NodeId, x: f64 },
    ImageLoad { target: NodeId },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Load => "load",
            Event::Scroll => "scroll",
            Event::Resize => "resize",
            Event::VisibilityChange => "visibilitychange",
            Event::KeyDown { .. } => "keydown",
            Event::Click { .. } => "click",
            Event::Submit { .. } => "submit",
            Event::Change { .. } => "change",
            Event::PointerEnter { .. } => "mouseenter",
            Event::PointerLeave { .. } => "mouseleave",
            Event::TouchStart { .. } => "touchstart",
            Event::TouchEnd { .. } => "touchend",
            Event::ImageLoad { .. } => "load",
        }
    }
}

/// What the caller must do with the native event after handling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub prevent_default: bool,
}

impl Outcome {
    pub fn prevent(prevent_default: bool) -> Self {
        Self { prevent_default }
    }
}
