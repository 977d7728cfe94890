//! The running page: one document, three controllers, one clock.
//!
//! [`App::start`] attaches the page controller, the project filter and the
//! carousel to a [`Dom`]. [`App::handle`] routes each [`Event`] to every
//! controller that listens for it, and [`App::advance_to`] moves virtual
//! time forward, firing due timers across all controllers in due-time order.
//! When two controllers have a timer due at the same instant the page goes
//! first, then the filter, then the carousel.
//!
//! Handler failures are logged and swallowed so one broken feature never
//! takes the rest of the page down.

use crate::carousel::Carousel;
use crate::config::{ConfigError, PageConfig};
use crate::contact::Submission;
use crate::dom::{Dom, DomError};
use crate::event::{Event, Outcome};
use crate::filter::{Category, ProjectFilter};
use crate::page::{Level, PageController, PageInventory, PageState};
use crate::timers::Millis;
use rand::Rng;
use serde::Serialize;

const CONTACT_INFO_ID: &str = "contact-info";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarouselSnapshot {
    pub current: usize,
    pub len: usize,
    pub autoplay: bool,
}

/// Point-in-time view of everything observable about the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub time_ms: Millis,
    pub scroll_top: f64,
    pub page: PageState,
    pub typing_text: Option<String>,
    pub filter: Option<Category>,
    pub visible_projects: Vec<usize>,
    pub carousel: Option<CarouselSnapshot>,
    pub submissions: Vec<Submission>,
}

/// Which features found their markup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inventory {
    pub page: PageInventory,
    pub project_cards: usize,
    pub filter_buttons: usize,
    pub filter_select: bool,
    pub carousel_items: Option<usize>,
}

#[derive(Debug)]
pub struct App<D: Dom> {
    dom: D,
    now: Millis,
    page: PageController,
    filter: Option<ProjectFilter>,
    carousel: Option<Carousel>,
    submissions: Vec<Submission>,
}

impl<D: Dom> App<D> {
    /// Validate `config` and attach every controller. `rng` only seeds skill
    /// levels the config leaves open.
    pub fn start<R: Rng>(
        mut dom: D,
        config: &PageConfig,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let page = PageController::attach(&mut dom, config, rng);
        let filter = match ProjectFilter::attach(&mut dom, &config.filter) {
            Ok(filter) => Some(filter),
            Err(err) => {
                tracing::error!(%err, "project filter disabled");
                None
            }
        };
        let carousel = match Carousel::attach(&mut dom, &config.carousel) {
            Ok(carousel) => carousel,
            Err(err) => {
                tracing::warn!(%err, "carousel disabled");
                None
            }
        };

        tracing::info!(
            filter = filter.is_some(),
            carousel = carousel.is_some(),
            "page started"
        );
        Ok(Self {
            dom,
            now: 0,
            page,
            filter,
            carousel,
            submissions: Vec::new(),
        })
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn page(&self) -> &PageController {
        &self.page
    }

    pub fn filter(&self) -> Option<&ProjectFilter> {
        self.filter.as_ref()
    }

    pub fn carousel(&self) -> Option<&Carousel> {
        self.carousel.as_ref()
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    pub fn handle(&mut self, event: &Event) -> Outcome {
        tracing::trace!(event = event.name(), at = self.now, "dispatch");
        match self.route(event) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(%err, event = event.name(), "event handler failed");
                Outcome::default()
            }
        }
    }

    fn route(&mut self, event: &Event) -> Result<Outcome, DomError> {
        let dom = &mut self.dom;
        match event {
            Event::Load => self.page.on_load(dom)?,
            Event::Scroll => {
                if !self.page.on_scroll(dom)? {
                    tracing::trace!("scroll throttled");
                }
            }
            Event::Resize => self.page.on_resize(),
            Event::VisibilityChange => self.page.on_visibility_change(dom)?,
            Event::KeyDown { key } => self.page.on_keydown(dom, key)?,
            Event::Click { target } => {
                if let Some(filter) = self.filter.as_mut() {
                    filter.handle_click(dom, *target)?;
                }
                if let Some(carousel) = self.carousel.as_mut() {
                    carousel.handle_click(dom, *target);
                }
                return Ok(Outcome::prevent(self.page.on_click(dom, *target)?));
            }
            Event::Submit { form, fields } => {
                if let Some(submission) = self.page.on_submit(*form, fields) {
                    self.submissions.push(submission);
                    return Ok(Outcome::prevent(true));
                }
            }
            Event::Change { target, value } => {
                if let Some(filter) = self.filter.as_mut() {
                    filter.handle_change(dom, *target, value);
                }
            }
            Event::PointerEnter { target } => {
                if let Some(carousel) = self.carousel.as_mut() {
                    carousel.pointer_enter(*target);
                }
            }
            Event::PointerLeave { target } => {
                if let Some(carousel) = self.carousel.as_mut() {
                    carousel.pointer_leave(*target);
                }
            }
            Event::TouchStart { target, x } => {
                if let Some(carousel) = self.carousel.as_mut() {
                    carousel.touch_start(&*dom, *target, *x);
                }
            }
            Event::TouchEnd { target, x } => {
                if let Some(carousel) = self.carousel.as_mut() {
                    carousel.touch_end(dom, *target, *x);
                }
            }
            Event::ImageLoad { target } => self.page.on_image_load(dom, *target),
        }
        Ok(Outcome::default())
    }

    // -------------------------------------------------------------------------
    // Clock
    // -------------------------------------------------------------------------

    fn next_due(&self) -> Option<Millis> {
        [
            self.page.next_due(),
            self.filter.as_ref().and_then(ProjectFilter::next_due),
            self.carousel.as_ref().and_then(Carousel::next_due),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn set_clock(&mut self, now: Millis) {
        self.now = self.now.max(now);
        self.page.set_now(self.now);
        if let Some(filter) = self.filter.as_mut() {
            filter.set_now(self.now);
        }
        if let Some(carousel) = self.carousel.as_mut() {
            carousel.set_now(self.now);
        }
    }

    fn fire_one(&mut self) -> bool {
        let dom = &mut self.dom;
        self.page.fire_due(dom)
            || self.filter.as_mut().is_some_and(|f| f.fire_due(dom))
            || self.carousel.as_mut().is_some_and(|c| c.fire_due(dom))
    }

    /// Fire every timer due at or before `until`, in due order, with the
    /// clock set to each timer's due time while it runs.
    pub fn advance_to(&mut self, until: Millis) {
        while let Some(due) = self.next_due().filter(|&due| due <= until) {
            self.set_clock(due);
            if !self.fire_one() {
                break;
            }
        }
        self.set_clock(until);
    }

    pub fn advance_by(&mut self, ms: Millis) {
        self.advance_to(self.now.saturating_add(ms));
    }

    // -------------------------------------------------------------------------
    // Public entry points
    // -------------------------------------------------------------------------

    pub fn scroll_to_section(&mut self, section_id: &str) {
        self.page.scroll_to_section(&mut self.dom, section_id);
    }

    pub fn update_progress(&mut self, percentage: f64) {
        if let Err(err) = self.page.update_progress(&mut self.dom, percentage) {
            tracing::error!(%err, "progress update failed");
        }
    }

    pub fn toggle_contact(&mut self) {
        if let Some(info) = self.dom.element_by_id(CONTACT_INFO_ID) {
            let on = !self.dom.has_class(info, "active");
            self.dom.toggle_class(info, "active", on);
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.dom.scroll_to(0.0);
    }

    pub fn show_notification(&self, message: &str, level: Level) {
        self.page.show_notification(message, level);
    }

    pub fn filter_projects(&mut self, category: Category) {
        if let Some(filter) = self.filter.as_mut() {
            filter.filter_projects(&mut self.dom, category);
        }
    }

    pub fn inventory(&self) -> Inventory {
        Inventory {
            page: self.page.inventory(&self.dom),
            project_cards: self.filter.as_ref().map_or(0, |f| f.projects().len()),
            filter_buttons: self.filter.as_ref().map_or(0, |f| f.buttons().count()),
            filter_select: self.filter.as_ref().is_some_and(ProjectFilter::has_select),
            carousel_items: self.carousel.as_ref().map(Carousel::len),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let visible_projects = self
            .filter
            .as_ref()
            .map(|filter| {
                filter
                    .projects()
                    .iter()
                    .enumerate()
                    .filter(|&(_, &card)| {
                        self.dom.style(card, "display").as_deref() != Some("none")
                    })
                    .map(|(index, _)| index)
                    .collect()
            })
            .unwrap_or_default();
        Snapshot {
            time_ms: self.now,
            scroll_top: self.dom.scroll_top(),
            page: self.page.state().clone(),
            typing_text: self.page.typewriter().map(|tw| tw.text()),
            filter: self.filter.as_ref().map(ProjectFilter::current),
            visible_projects,
            carousel: self.carousel.as_ref().map(|c| CarouselSnapshot {
                current: c.current(),
                len: c.len(),
                autoplay: c.is_autoplay_running(),
            }),
            submissions: self.submissions.clone(),
        }
    }
}
