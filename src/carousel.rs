//! Autoplay carousel.
//!
//! Rotates the `.carousel-item` children of one container. Adds prev/next
//! buttons and one indicator dot per item, advances on a fixed interval while
//! autoplay is on, pauses while the pointer hovers the container, and turns a
//! horizontal swipe longer than the threshold into next (leftward) or prev
//! (rightward).
//!
//! The index is always taken modulo the item count, so every transition lands
//! in `[0, N)`. A carousel without items cannot be built.

use crate::config::CarouselConfig;
use crate::dom::{Dom, DomError, NodeId, create_with_class};
use crate::timers::{Millis, Scheduler, TimerId};
use thiserror::Error;

const ITEMS: &str = ".carousel-item";
const ACTIVE: &str = "active";

#[derive(Error, Debug)]
pub enum CarouselError {
    #[error("carousel `{0}` has no .carousel-item children")]
    Empty(String),
    #[error(transparent)]
    Dom(#[from] DomError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselTask {
    AutoAdvance,
}

#[derive(Debug)]
pub struct Carousel {
    root: NodeId,
    items: Vec<NodeId>,
    indicators: Vec<NodeId>,
    prev_button: NodeId,
    next_button: NodeId,
    current: usize,
    auto_playing: bool,
    interval_ms: Millis,
    swipe_threshold: f64,
    touch_start_x: Option<f64>,
    autoplay_timer: Option<TimerId>,
    timers: Scheduler<CarouselTask>,
}

impl Carousel {
    /// `Ok(None)` when the page has no element matching
    /// `config.selector`.
    pub fn attach<D: Dom + ?Sized>(
        dom: &mut D,
        config: &CarouselConfig,
    ) -> Result<Option<Self>, CarouselError> {
        let Some(root) = dom.query(&config.selector)? else {
            return Ok(None);
        };
        let items = dom.query_within(root, ITEMS)?;
        if items.is_empty() {
            return Err(CarouselError::Empty(config.selector.clone()));
        }

        let prev_button = control_button(dom, "carousel-btn carousel-prev", "fa fa-chevron-left")?;
        let next_button = control_button(dom, "carousel-btn carousel-next", "fa fa-chevron-right")?;
        dom.append_child(root, prev_button);
        dom.append_child(root, next_button);

        let strip = create_with_class(dom, "div", "carousel-indicators")?;
        let mut indicators = Vec::with_capacity(items.len());
        for index in 0..items.len() {
            let dot = create_with_class(dom, "button", "carousel-indicator")?;
            dom.set_attribute(dot, "aria-label", &format!("Go to slide {}", index + 1));
            dom.append_child(strip, dot);
            indicators.push(dot);
        }
        dom.append_child(root, strip);

        let mut carousel = Self {
            root,
            items,
            indicators,
            prev_button,
            next_button,
            current: 0,
            auto_playing: config.autoplay,
            interval_ms: config.interval_ms,
            swipe_threshold: config.swipe_threshold,
            touch_start_x: None,
            autoplay_timer: None,
            timers: Scheduler::new(),
        };
        carousel.render(dom);
        carousel.start_autoplay();
        tracing::debug!(items = carousel.items.len(), "carousel attached");
        Ok(Some(carousel))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn items(&self) -> &[NodeId] {
        &self.items
    }

    pub fn indicators(&self) -> &[NodeId] {
        &self.indicators
    }

    pub fn is_autoplay_running(&self) -> bool {
        self.autoplay_timer
            .is_some_and(|id| self.timers.is_pending(id))
    }

    pub fn next<D: Dom + ?Sized>(&mut self, dom: &mut D) {
        self.current = (self.current + 1) % self.items.len();
        self.render(dom);
    }

    pub fn prev<D: Dom + ?Sized>(&mut self, dom: &mut D) {
        let len = self.items.len();
        self.current = (self.current + len - 1) % len;
        self.render(dom);
    }

    /// Jump to `index`, wrapped into range.
    pub fn go_to<D: Dom + ?Sized>(&mut self, dom: &mut D, index: usize) {
        self.current = index % self.items.len();
        self.render(dom);
    }

    fn render<D: Dom + ?Sized>(&self, dom: &mut D) {
        for (index, &item) in self.items.iter().enumerate() {
            dom.toggle_class(item, ACTIVE, index == self.current);
        }
        for (index, &dot) in self.indicators.iter().enumerate() {
            dom.toggle_class(dot, ACTIVE, index == self.current);
        }
    }

    /// Restart the autoplay interval if autoplay is on. Any running interval
    /// is replaced, never duplicated.
    pub fn start_autoplay(&mut self) {
        self.pause_autoplay();
        if self.auto_playing {
            self.autoplay_timer = Some(
                self.timers
                    .schedule(self.interval_ms, CarouselTask::AutoAdvance),
            );
        }
    }

    pub fn pause_autoplay(&mut self) {
        if let Some(id) = self.autoplay_timer.take() {
            self.timers.cancel(id);
        }
    }

    /// Route a click. Returns `true` if it hit a control.
    pub fn handle_click<D: Dom + ?Sized>(&mut self, dom: &mut D, target: NodeId) -> bool {
        if dom.contains(self.prev_button, target) {
            self.prev(dom);
        } else if dom.contains(self.next_button, target) {
            self.next(dom);
        } else if let Some(index) = self
            .indicators
            .iter()
            .position(|&dot| dom.contains(dot, target))
        {
            self.go_to(dom, index);
        } else {
            return false;
        }
        true
    }

    pub fn pointer_enter(&mut self, target: NodeId) {
        if target == self.root {
            self.pause_autoplay();
        }
    }

    pub fn pointer_leave(&mut self, target: NodeId) {
        if target == self.root {
            self.start_autoplay();
        }
    }

    pub fn touch_start<D: Dom + ?Sized>(&mut self, dom: &D, target: NodeId, x: f64) {
        if dom.contains(self.root, target) {
            self.touch_start_x = Some(x);
        }
    }

    pub fn touch_end<D: Dom + ?Sized>(&mut self, dom: &mut D, target: NodeId, x: f64) {
        if !dom.contains(self.root, target) {
            return;
        }
        let Some(start) = self.touch_start_x.take() else {
            return;
        };
        let diff = start - x;
        if diff.abs() > self.swipe_threshold {
            if diff > 0.0 {
                self.next(dom);
            } else {
                self.prev(dom);
            }
        }
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.timers.next_due()
    }

    pub fn set_now(&mut self, now: Millis) {
        self.timers.set_now(now);
    }

    /// Run one due timer, if any.
    pub fn fire_due<D: Dom + ?Sized>(&mut self, dom: &mut D) -> bool {
        let Some((id, CarouselTask::AutoAdvance)) = self.timers.pop_due() else {
            return false;
        };
        if self.autoplay_timer == Some(id) {
            // interval semantics: the next tick is relative to this one
            self.autoplay_timer = Some(self.timers.schedule_at(
                id.due() + self.interval_ms,
                CarouselTask::AutoAdvance,
            ));
            self.next(dom);
        }
        true
    }
}

fn control_button<D: Dom + ?Sized>(
    dom: &mut D,
    class: &str,
    icon_class: &str,
) -> Result<NodeId, DomError> {
    let button = create_with_class(dom, "button", class)?;
    let icon = create_with_class(dom, "i", icon_class)?;
    dom.append_child(button, icon);
    Ok(button)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;
    use crate::test_helpers::*;

    fn setup() -> (MemoryDom, Carousel) {
        let mut dom = fixture_page();
        let carousel = Carousel::attach(&mut dom, &CarouselConfig::default())
            .unwrap()
            .unwrap();
        (dom, carousel)
    }

    fn assert_single_active(dom: &MemoryDom, carousel: &Carousel) {
        assert_eq!(active_count(dom, carousel.items()), 1);
        assert_eq!(active_count(dom, carousel.indicators()), 1);
        assert!(dom.has_class(carousel.items()[carousel.current()], "active"));
        assert!(dom.has_class(carousel.indicators()[carousel.current()], "active"));
    }

    fn tick(carousel: &mut Carousel, dom: &mut MemoryDom, to: Millis) {
        carousel.set_now(to);
        while carousel.fire_due(dom) {}
    }

    #[test]
    fn builds_controls_and_indicators() {
        let (dom, carousel) = setup();
        assert_eq!(carousel.len(), 3);
        assert_eq!(carousel.indicators().len(), 3);
        assert_eq!(dom.query_all(".main-cert .carousel-btn").unwrap().len(), 2);
        assert!(dom.query(".carousel-prev i.fa-chevron-left").unwrap().is_some());
        assert_single_active(&dom, &carousel);
    }

    #[test]
    fn index_wraps_both_ways() {
        let (mut dom, mut carousel) = setup();
        carousel.prev(&mut dom);
        assert_eq!(carousel.current(), 2);
        carousel.next(&mut dom);
        assert_eq!(carousel.current(), 0);
        carousel.go_to(&mut dom, 7);
        assert_eq!(carousel.current(), 1);
        assert_single_active(&dom, &carousel);
    }

    #[test]
    fn any_sequence_keeps_one_active() {
        let (mut dom, mut carousel) = setup();
        let moves = [0usize, 1, 1, 2, 0, 2, 2, 1, 0, 0, 2];
        for (step, m) in moves.iter().enumerate() {
            match m {
                0 => carousel.next(&mut dom),
                1 => carousel.prev(&mut dom),
                _ => carousel.go_to(&mut dom, step * 5),
            }
            assert!(carousel.current() < carousel.len());
            assert_single_active(&dom, &carousel);
        }
    }

    #[test]
    fn autoplay_cycles_back_after_n_ticks() {
        let (mut dom, mut carousel) = setup();
        let start = carousel.current();
        tick(&mut carousel, &mut dom, 5000);
        assert_eq!(carousel.current(), 1);
        tick(&mut carousel, &mut dom, 15_000);
        assert_eq!(carousel.current(), start);
    }

    #[test]
    fn hover_pauses_and_resumes() {
        let (mut dom, mut carousel) = setup();
        let root = carousel.root();
        carousel.pointer_enter(root);
        assert!(!carousel.is_autoplay_running());
        tick(&mut carousel, &mut dom, 20_000);
        assert_eq!(carousel.current(), 0);
        carousel.pointer_leave(root);
        assert!(carousel.is_autoplay_running());
        tick(&mut carousel, &mut dom, 25_000);
        assert_eq!(carousel.current(), 1);
    }

    #[test]
    fn repeated_leave_does_not_stack_intervals() {
        let (mut dom, mut carousel) = setup();
        let root = carousel.root();
        carousel.pointer_leave(root);
        carousel.pointer_leave(root);
        tick(&mut carousel, &mut dom, 5000);
        assert_eq!(carousel.current(), 1);
    }

    #[test]
    fn swipe_threshold() {
        let (mut dom, mut carousel) = setup();
        let item = carousel.items()[0];
        carousel.touch_start(&dom, item, 300.0);
        carousel.touch_end(&mut dom, item, 260.0);
        assert_eq!(carousel.current(), 0);
        carousel.touch_start(&dom, item, 300.0);
        carousel.touch_end(&mut dom, item, 200.0);
        assert_eq!(carousel.current(), 1);
        carousel.touch_start(&dom, item, 100.0);
        carousel.touch_end(&mut dom, item, 151.0);
        assert_eq!(carousel.current(), 0);
    }

    #[test]
    fn control_clicks() {
        let (mut dom, mut carousel) = setup();
        let next = dom.query(".carousel-next i").unwrap().unwrap();
        assert!(carousel.handle_click(&mut dom, next));
        assert_eq!(carousel.current(), 1);
        let dot = carousel.indicators()[2];
        assert!(carousel.handle_click(&mut dom, dot));
        assert_eq!(carousel.current(), 2);
        let body = dom.body().unwrap();
        assert!(!carousel.handle_click(&mut dom, body));
    }

    #[test]
    fn empty_carousel_is_rejected() {
        let mut dom = MemoryDom::parse_html(r#"<body><div class="main-cert"></div></body>"#);
        let result = Carousel::attach(&mut dom, &CarouselConfig::default());
        assert!(matches!(result, Err(CarouselError::Empty(_))));
    }

    #[test]
    fn missing_container_is_soft() {
        let mut dom = MemoryDom::default();
        assert!(
            Carousel::attach(&mut dom, &CarouselConfig::default())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn autoplay_off_never_advances() {
        let mut dom = fixture_page();
        let config = CarouselConfig {
            autoplay: false,
            ..CarouselConfig::default()
        };
        let mut carousel = Carousel::attach(&mut dom, &config).unwrap().unwrap();
        tick(&mut carousel, &mut dom, 60_000);
        assert_eq!(carousel.current(), 0);
        assert!(!carousel.is_autoplay_running());
    }
}
