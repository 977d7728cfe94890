//! Browser backend.
//!
//! [`WebDom`] implements [`Dom`] over `web-sys`. Elements are registered on
//! first sight and keep their [`NodeId`] for the life of the page; identity
//! is checked with `isSameNode`, so the same element reached through two
//! different queries maps to one id.
//!
//! [`start`] is the wasm entry point: it attaches an [`App`] to the live
//! document, forwards native events into it, and pumps the virtual clock
//! from `performance.now()` on a 16ms interval. All listeners live as long
//! as the page.
//!
//! `cvAppLoaded` and `cvAppResize` are queued while the runtime is borrowed
//! and dispatched on the document after it is released, so a page listener
//! may call straight back into [`CvPage`].

use crate::app::App;
use crate::config::PageConfig;
use crate::dom::{Dom, DomError, NodeId, Notification, Rect, Viewport, run_then_deliver};
use crate::event::Event;
use crate::page::Level;
use crate::timers::Millis;
use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::timers::callback::Interval;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CustomEvent, CustomEventInit, Document, Element, EventTarget, FormData, HtmlElement,
    HtmlFormElement, HtmlSelectElement, KeyboardEvent, Node, ScrollBehavior, ScrollToOptions,
    TouchEvent, Window,
};

const PUMP_MS: u32 = 16;
const CONTACT_FIELDS: [&str; 3] = ["name", "email", "message"];

fn backend(err: JsValue) -> DomError {
    DomError::Backend(format!("{err:?}"))
}

pub struct WebDom {
    window: Window,
    document: Document,
    nodes: RefCell<Vec<Element>>,
    queued: Vec<Notification>,
}

impl WebDom {
    pub fn new() -> Result<Self, DomError> {
        let window = web_sys::window().ok_or_else(|| DomError::Backend("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| DomError::Backend("no document".into()))?;
        Ok(Self {
            window,
            document,
            nodes: RefCell::new(Vec::new()),
            queued: Vec::new(),
        })
    }

    fn register(&self, element: Element) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let as_node: &Node = element.as_ref();
        if let Some(index) = nodes.iter().position(|known| known.is_same_node(Some(as_node))) {
            return NodeId(index);
        }
        nodes.push(element);
        NodeId(nodes.len() - 1)
    }

    fn element(&self, node: NodeId) -> Element {
        self.nodes.borrow()[node.0].clone()
    }

    /// Id of the element an event was dispatched on, if it is an element.
    pub fn node_of(&self, target: Option<EventTarget>) -> Option<NodeId> {
        let element = target?.dyn_into::<Element>().ok()?;
        Some(self.register(element))
    }

    /// The live element behind `node`.
    pub fn element_of(&self, node: NodeId) -> Element {
        self.element(node)
    }

    /// Notifications dispatched since the last call, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.queued)
    }

    fn collect(&self, list: web_sys::NodeList) -> Vec<NodeId> {
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|element| self.register(element))
            .collect()
    }
}

fn invalid(selector: &str) -> impl FnOnce(JsValue) -> DomError + '_ {
    move |err| DomError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{err:?}"),
    }
}

impl Dom for WebDom {
    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let list = self
            .document
            .query_selector_all(selector)
            .map_err(invalid(selector))?;
        Ok(self.collect(list))
    }

    fn query_within(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let list = self
            .element(root)
            .query_selector_all(selector)
            .map_err(invalid(selector))?;
        Ok(self.collect(list))
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.document
            .get_element_by_id(id)
            .map(|element| self.register(element))
    }

    fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>, DomError> {
        let found = self
            .element(node)
            .closest(selector)
            .map_err(invalid(selector))?;
        Ok(found.map(|element| self.register(element)))
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let inner = self.element(node);
        let inner: &Node = inner.as_ref();
        self.element(ancestor).contains(Some(inner))
    }

    fn head(&self) -> Option<NodeId> {
        self.document
            .head()
            .map(|head| self.register(head.into()))
    }

    fn body(&self) -> Option<NodeId> {
        self.document
            .body()
            .map(|body| self.register(body.into()))
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).class_list().contains(class)
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        let _ = self.element(node).class_list().add_1(class);
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        let _ = self.element(node).class_list().remove_1(class);
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node).get_attribute(name)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let _ = self.element(node).set_attribute(name, value);
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        let _ = self.element(node).remove_attribute(name);
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        let element = self.element(node);
        let html = element.dyn_ref::<HtmlElement>()?;
        html.style()
            .get_property_value(property)
            .ok()
            .filter(|value| !value.is_empty())
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(html) = self.element(node).dyn_ref::<HtmlElement>() {
            let _ = html.style().set_property(property, value);
        }
    }

    fn text(&self, node: NodeId) -> String {
        self.element(node).text_content().unwrap_or_default()
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        self.element(node).set_text_content(Some(text));
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeId, DomError> {
        let element = self.document.create_element(tag).map_err(backend)?;
        Ok(self.register(element))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let child = self.element(child);
        let child: &Node = child.as_ref();
        let _ = self.element(parent).append_child(child);
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        let rect = self.element(node).get_bounding_client_rect();
        Rect {
            left: rect.left(),
            top: rect.top(),
            width: rect.width(),
            height: rect.height(),
        }
    }

    fn scroll_top(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn scroll_to(&mut self, top: f64) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(ScrollBehavior::Smooth);
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn viewport(&self) -> Viewport {
        let read = |value: Result<JsValue, JsValue>| value.ok().and_then(|v| v.as_f64());
        let fallback = Viewport::default();
        Viewport {
            width: read(self.window.inner_width()).unwrap_or(fallback.width),
            height: read(self.window.inner_height()).unwrap_or(fallback.height),
        }
    }

    fn is_hidden(&self) -> bool {
        self.document.hidden()
    }

    fn dispatch(&mut self, notification: Notification) {
        self.queued.push(notification);
    }
}

/// Dispatch `notification` on the document as a `CustomEvent`.
fn fire(document: &Document, notification: &Notification) {
    let detail = js_sys::Object::new();
    if let Notification::Resize { width, height } = *notification {
        let _ = js_sys::Reflect::set(&detail, &"width".into(), &width.into());
        let _ = js_sys::Reflect::set(&detail, &"height".into(), &height.into());
    }
    let init = CustomEventInit::new();
    init.set_detail(&detail);
    match CustomEvent::new_with_event_init_dict(notification.event_name(), &init) {
        Ok(event) => {
            let _ = document.dispatch_event(&event);
        }
        Err(err) => tracing::warn!(?err, "could not build {}", notification.event_name()),
    }
}

// -----------------------------------------------------------------------------
// Entry point
// -----------------------------------------------------------------------------

struct Runtime {
    app: App<WebDom>,
    origin: f64,
}

impl Runtime {
    fn elapsed(&self) -> Millis {
        let now = self
            .app
            .dom()
            .window
            .performance()
            .map_or(self.origin, |p| p.now());
        (now - self.origin).max(0.0) as Millis
    }

    fn catch_up(&mut self) {
        let now = self.elapsed();
        self.app.advance_to(now);
    }
}

type Shared = Rc<RefCell<Runtime>>;

/// Run `act` on the runtime, then fire whatever it dispatched.
fn with_runtime<R>(
    runtime: &Shared,
    document: &Document,
    act: impl FnOnce(&mut Runtime) -> R,
) -> Option<R> {
    run_then_deliver(
        &**runtime,
        act,
        |rt| rt.app.dom_mut().take_notifications(),
        |notification| fire(document, &notification),
    )
}

/// Handle returned to JavaScript; exposes the page's public entry points.
#[wasm_bindgen]
pub struct CvPage {
    runtime: Shared,
    document: Document,
}

impl CvPage {
    fn run(&self, act: impl FnOnce(&mut App<WebDom>)) {
        with_runtime(&self.runtime, &self.document, |rt| act(&mut rt.app));
    }
}

#[wasm_bindgen]
impl CvPage {
    #[wasm_bindgen(js_name = scrollToSection)]
    pub fn scroll_to_section(&self, section_id: &str) {
        self.run(|app| app.scroll_to_section(section_id));
    }

    #[wasm_bindgen(js_name = updateProgress)]
    pub fn update_progress(&self, percentage: f64) {
        self.run(|app| app.update_progress(percentage));
    }

    #[wasm_bindgen(js_name = toggleContact)]
    pub fn toggle_contact(&self) {
        self.run(App::toggle_contact);
    }

    #[wasm_bindgen(js_name = scrollToTop)]
    pub fn scroll_to_top(&self) {
        self.run(App::scroll_to_top);
    }

    #[wasm_bindgen(js_name = showNotification)]
    pub fn show_notification(&self, message: &str, level: &str) {
        let level = match level {
            "success" => Level::Success,
            "warning" => Level::Warning,
            "error" => Level::Error,
            _ => Level::Info,
        };
        self.run(|app| app.show_notification(message, level));
    }
}

fn listen<T, F>(target: &T, name: &'static str, phase: EventListenerPhase, page: &CvPage, map: F)
where
    T: AsRef<EventTarget>,
    F: Fn(&WebDom, &web_sys::Event) -> Option<Event> + 'static,
{
    let runtime = Rc::clone(&page.runtime);
    let document = page.document.clone();
    let options = EventListenerOptions {
        phase,
        passive: false,
    };
    EventListener::new_with_options(target.as_ref(), name, options, move |raw| {
        let prevent = with_runtime(&runtime, &document, |rt| {
            rt.catch_up();
            let event = map(rt.app.dom(), raw)?;
            Some(rt.app.handle(&event).prevent_default)
        });
        if prevent.flatten() == Some(true) {
            raw.prevent_default();
        }
    })
    .forget();
}

fn form_fields(target: Option<EventTarget>) -> Option<BTreeMap<String, String>> {
    let form = target?.dyn_into::<HtmlFormElement>().ok()?;
    let data = FormData::new_with_form(&form).ok()?;
    Some(
        CONTACT_FIELDS
            .iter()
            .map(|&name| (name.to_string(), data.get(name).as_string().unwrap_or_default()))
            .collect(),
    )
}

fn touch_x(raw: &web_sys::Event) -> Option<f64> {
    let touch = raw.dyn_ref::<TouchEvent>()?.changed_touches().get(0)?;
    Some(f64::from(touch.screen_x()))
}

/// Attach to the live page. `config_json` overrides the stock config with a
/// JSON object shaped like `cv-page.toml`.
#[wasm_bindgen]
pub fn start(config_json: Option<String>) -> Result<CvPage, JsValue> {
    let config: PageConfig = match config_json {
        Some(json) => serde_json::from_str(&json).map_err(|e| JsValue::from_str(&e.to_string()))?,
        None => PageConfig::default(),
    };
    let dom = WebDom::new().map_err(|e| JsValue::from_str(&e.to_string()))?;
    let window = dom.window.clone();
    let document = dom.document.clone();
    let origin = window.performance().map_or(0.0, |p| p.now());

    let seed = (js_sys::Math::random() * u64::MAX as f64) as u64;
    let mut rng = StdRng::seed_from_u64(seed);
    let app = App::start(dom, &config, &mut rng).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let carousel_root = app.carousel().map(|c| app.dom().element_of(c.root()));
    let page = CvPage {
        runtime: Rc::new(RefCell::new(Runtime { app, origin })),
        document: document.clone(),
    };

    use EventListenerPhase::{Bubble, Capture};
    listen(&window, "scroll", Bubble, &page, |_, _| Some(Event::Scroll));
    listen(&window, "resize", Bubble, &page, |_, _| Some(Event::Resize));
    listen(&window, "load", Bubble, &page, |_, _| Some(Event::Load));
    listen(&document, "visibilitychange", Bubble, &page, |_, _| {
        Some(Event::VisibilityChange)
    });
    listen(&document, "keydown", Bubble, &page, |_, raw| {
        let key = raw.dyn_ref::<KeyboardEvent>()?.key();
        Some(Event::KeyDown { key })
    });
    listen(&document, "click", Bubble, &page, |dom, raw| {
        Some(Event::Click {
            target: dom.node_of(raw.target())?,
        })
    });
    listen(&document, "submit", Bubble, &page, |dom, raw| {
        Some(Event::Submit {
            form: dom.node_of(raw.target())?,
            fields: form_fields(raw.target())?,
        })
    });
    listen(&document, "change", Bubble, &page, |dom, raw| {
        let select = raw.target()?.dyn_into::<HtmlSelectElement>().ok()?;
        Some(Event::Change {
            target: dom.node_of(raw.target())?,
            value: select.value(),
        })
    });
    // image `load` does not bubble
    listen(&document, "load", Capture, &page, |dom, raw| {
        Some(Event::ImageLoad {
            target: dom.node_of(raw.target())?,
        })
    });

    if let Some(root) = carousel_root {
        listen(&root, "mouseenter", Bubble, &page, |dom, raw| {
            Some(Event::PointerEnter {
                target: dom.node_of(raw.target())?,
            })
        });
        listen(&root, "mouseleave", Bubble, &page, |dom, raw| {
            Some(Event::PointerLeave {
                target: dom.node_of(raw.target())?,
            })
        });
        listen(&root, "touchstart", Bubble, &page, |dom, raw| {
            Some(Event::TouchStart {
                target: dom.node_of(raw.target())?,
                x: touch_x(raw)?,
            })
        });
        listen(&root, "touchend", Bubble, &page, |dom, raw| {
            Some(Event::TouchEnd {
                target: dom.node_of(raw.target())?,
                x: touch_x(raw)?,
            })
        });
    }

    let pump = Rc::clone(&page.runtime);
    Interval::new(PUMP_MS, move || {
        with_runtime(&pump, &document, Runtime::catch_up);
    })
    .forget();

    tracing::info!("page attached");
    Ok(page)
}
