//! Page chrome controller.
//!
//! Everything on the page that reacts to scroll position, viewport
//! visibility, window events and timers, apart from the project filter and
//! the carousel:
//!
//! - **Scroll** (throttled): nav `scrolled` state, current-section tracking
//!   with exactly one active nav link, parallax offsets, scroll-to-top button.
//! - **Visibility**: sections and `.reveal` elements become `active` when they
//!   first enter the viewport; the skills and projects sections additionally
//!   fire a one-time effect (progress bars fill, thumbnails load).
//! - **Typing effect** driven by [`Typewriter`].
//! - **Resize** (debounced): recompute the section, dispatch `cvAppResize`.
//! - **Click / keys**: anchor smooth-scroll, modal and dropdown dismissal,
//!   keyboard-navigation mode.
//! - **Load**: drop the `loading` class, dispatch `cvAppLoaded`, bind the
//!   contact form.
//! - **Tab visibility**: pause and resume `.animated-element` animations.
//! - **Lazy images**: `img[data-src]` get their source on first view.
//!
//! Visibility is polled on every scroll event, outside the scroll throttle.
//!
//! Missing markup silently disables the feature that needs it. A setup step
//! that fails outright is logged and the remaining steps still run.

use crate::config::PageConfig;
use crate::contact::{self, ContactForm, Submission};
use crate::dom::{Dom, DomError, NodeId, Notification, create_with_class, css_number};
use crate::observe::Observer;
use crate::timers::{Debounce, Millis, Scheduler, Throttle};
use crate::typing::Typewriter;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;

const NAV: &str = ".modern-nav";
const NAV_LINKS: &str = ".nav-link";
const SECTIONS: &str = "section[id], main > div[id]";
const ANCHOR_LINKS: &str = "a[href^=\"#\"]";
const SCROLL_TOP_ID: &str = "scroll-top";
const PARALLAX: &str = ".parallax";
const PARALLAX_IMAGES: &str = ".main-img img";
const PARALLAX_HOST: &str = ".main-img";
const TYPING: &str = ".typing-effect";
const SKILL_ITEMS: &str = ".Tech-skills-list li, .soft-skills-list li";
const PROGRESS_FILL: &str = ".progress-fill";
const PROJECT_IMAGES: &str = ".project-veiw-img img[data-src]";
const REVEAL_TARGETS: &str = ".reveal, section, .animate-on-scroll";
const ANIMATE_ON_SCROLL: &str = ".animate-on-scroll";
const LAZY_IMAGES: &str = "img[data-src]";
const BACKGROUND_SPANS: &str = ".animated-background span";
const ANIMATED_ELEMENTS: &str = ".animated-element";
const CONTACT_FORM: &str = "#contact-form";
const PAGE_PROGRESS: &str = ".page-progress";
const HERO: [&str; 4] = [
    ".hero-title",
    ".hero-subtitle",
    ".hero-description",
    ".hero-actions",
];
const HERO_TRANSITION: &str = "all 0.8s cubic-bezier(0.23, 1, 0.320, 1)";

const SKILLS_SECTION: &str = "SKILLS";
const PROJECTS_SECTION: &str = "PROJECT";
const PARALLAX_IMAGE_SPEED: &str = "0.3";
const DEFAULT_SKILL_PERCENT: &str = "80";

/// Transient UI mode of the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageState {
    pub is_scrolled: bool,
    pub current_section: String,
    pub skills_animated: bool,
    pub projects_loaded: bool,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            is_scrolled: false,
            current_section: "home".to_string(),
            skills_animated: false,
            projects_loaded: false,
        }
    }
}

/// Which page hooks were found at attach time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInventory {
    pub nav: bool,
    pub sections: Vec<String>,
    pub typing: bool,
    pub skill_bars: usize,
    pub reveal_targets: usize,
    pub lazy_images: usize,
    pub scroll_top_button: bool,
    pub contact_form: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTask {
    HeroReveal(NodeId),
    SkillBar(NodeId),
    HideScrollTop,
    TypingStep,
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug)]
pub struct PageController {
    state: PageState,
    config: PageConfig,
    timers: Scheduler<PageTask>,
    scroll_gate: Throttle,
    resize_gate: Debounce,
    nav: Option<NodeId>,
    sections: Vec<NodeId>,
    scroll_top_button: Option<NodeId>,
    typing: Option<(NodeId, Typewriter)>,
    reveal: Observer,
    animate_on_scroll: Observer,
    lazy_images: Observer,
    project_images: Vec<NodeId>,
    contact_form: Option<NodeId>,
}

fn soft(step: &str, result: Result<(), DomError>) {
    if let Err(err) = result {
        tracing::error!(%err, "{step} setup failed");
    }
}

impl PageController {
    /// Run every setup step against the page. Never fails: a broken step is
    /// logged and skipped.
    pub fn attach<D: Dom + ?Sized, R: Rng>(
        dom: &mut D,
        config: &PageConfig,
        rng: &mut R,
    ) -> Self {
        let mut page = Self {
            state: PageState::default(),
            config: config.clone(),
            timers: Scheduler::new(),
            scroll_gate: Throttle::new(config.scroll.throttle_ms),
            resize_gate: Debounce::new(config.resize.debounce_ms),
            nav: None,
            sections: Vec::new(),
            scroll_top_button: None,
            typing: None,
            reveal: Observer::new(config.reveal.threshold, 0.0),
            animate_on_scroll: Observer::new(config.reveal.threshold, config.reveal.bottom_margin),
            lazy_images: Observer::new(0.0, 0.0),
            project_images: Vec::new(),
            contact_form: None,
        };

        soft("observer", page.observe_reveal_targets(&*dom));
        soft("navigation", page.init_navigation(&*dom));
        page.init_typing_effect(dom);
        soft("parallax", page.init_parallax(dom));
        soft("progress bar", page.init_progress_bars(dom, rng));

        if let Err(err) = page.setup_animations(dom) {
            tracing::error!(%err, "animation setup failed");
        }

        soft("lazy loading", page.setup_lazy_loading(&*dom));
        soft("preload", page.preload_critical_resources(dom));
        tracing::info!("service worker registration skipped (not supported by this build)");

        soft("visibility", page.sweep(dom));
        tracing::info!("page controller initialized");
        page
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn typewriter(&self) -> Option<&Typewriter> {
        self.typing.as_ref().map(|(_, tw)| tw)
    }

    pub fn inventory<D: Dom + ?Sized>(&self, dom: &D) -> PageInventory {
        let count = |selector: &str| dom.query_all(selector).map_or(0, |nodes| nodes.len());
        PageInventory {
            nav: self.nav.is_some(),
            sections: self
                .sections
                .iter()
                .filter_map(|&section| dom.attribute(section, "id"))
                .collect(),
            typing: self.typing.is_some(),
            skill_bars: count(PROGRESS_FILL),
            reveal_targets: self.reveal.len(),
            lazy_images: count(LAZY_IMAGES),
            scroll_top_button: self.scroll_top_button.is_some(),
            contact_form: count(CONTACT_FORM) > 0,
        }
    }

    // -------------------------------------------------------------------------
    // Setup
    // -------------------------------------------------------------------------

    fn observe_reveal_targets<D: Dom + ?Sized>(&mut self, dom: &D) -> Result<(), DomError> {
        for node in dom.query_all(REVEAL_TARGETS)? {
            self.reveal.observe(node);
        }
        Ok(())
    }

    fn init_navigation<D: Dom + ?Sized>(&mut self, dom: &D) -> Result<(), DomError> {
        self.nav = dom.query(NAV)?;
        self.sections = dom.query_all(SECTIONS)?;
        self.scroll_top_button = dom.element_by_id(SCROLL_TOP_ID);
        Ok(())
    }

    fn init_typing_effect<D: Dom + ?Sized>(&mut self, dom: &mut D) {
        let Ok(Some(node)) = dom.query(TYPING) else {
            return;
        };
        let mut typewriter = Typewriter::new(&self.config.typing);
        let frame = typewriter.step();
        dom.set_text(node, &frame.text);
        self.timers.schedule(frame.delay, PageTask::TypingStep);
        self.typing = Some((node, typewriter));
    }

    fn init_parallax<D: Dom + ?Sized>(&mut self, dom: &mut D) -> Result<(), DomError> {
        for image in dom.query_all(PARALLAX_IMAGES)? {
            if let Some(host) = dom.closest(image, PARALLAX_HOST)? {
                dom.add_class(host, "parallax");
                dom.set_attribute(host, "data-speed", PARALLAX_IMAGE_SPEED);
            }
        }
        Ok(())
    }

    fn init_progress_bars<D: Dom + ?Sized, R: Rng>(
        &mut self,
        dom: &mut D,
        rng: &mut R,
    ) -> Result<(), DomError> {
        let skills = &self.config.skills;
        for (index, item) in dom.query_all(SKILL_ITEMS)?.into_iter().enumerate() {
            let level = match skills.levels.get(index) {
                Some(&level) => level,
                None => rng.random_range(skills.min..skills.max),
            };
            let bar = create_with_class(dom, "div", "progress-bar")?;
            let fill = create_with_class(dom, "div", "progress-fill")?;
            dom.set_attribute(fill, "data-percentage", &level.to_string());
            dom.append_child(bar, fill);
            dom.append_child(item, bar);
        }
        Ok(())
    }

    fn setup_animations<D: Dom + ?Sized>(&mut self, dom: &mut D) -> Result<(), DomError> {
        tracing::debug!("setting up animations");
        self.animate_hero(dom)?;
        for node in dom.query_all(ANIMATE_ON_SCROLL)? {
            self.animate_on_scroll.observe(node);
        }
        for (index, span) in dom.query_all(BACKGROUND_SPANS)?.into_iter().enumerate() {
            dom.set_style(span, "animation-delay", &format!("{}s", index * 2));
            dom.set_style(span, "animation", "float 20s infinite linear");
        }
        Ok(())
    }

    fn animate_hero<D: Dom + ?Sized>(&mut self, dom: &mut D) -> Result<(), DomError> {
        for (index, selector) in HERO.iter().enumerate() {
            if let Some(node) = dom.query(selector)? {
                dom.set_style(node, "opacity", "0");
                dom.set_style(node, "transform", "translateY(30px)");
                self.timers.schedule(
                    index as Millis * self.config.hero.stagger_ms,
                    PageTask::HeroReveal(node),
                );
            }
        }
        Ok(())
    }

    fn setup_lazy_loading<D: Dom + ?Sized>(&mut self, dom: &D) -> Result<(), DomError> {
        for image in dom.query_all(LAZY_IMAGES)? {
            self.lazy_images.observe(image);
        }
        Ok(())
    }

    fn preload_critical_resources<D: Dom + ?Sized>(&mut self, dom: &mut D) -> Result<(), DomError> {
        let Some(head) = dom.head() else {
            return Ok(());
        };
        for href in &self.config.preload.images {
            let link = dom.create_element("link")?;
            dom.set_attribute(link, "rel", "preload");
            dom.set_attribute(link, "as", "image");
            dom.set_attribute(link, "href", href);
            dom.append_child(head, link);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Visibility
    // -------------------------------------------------------------------------

    /// Poll every observer; apply entry effects.
    pub fn sweep<D: Dom + ?Sized>(&mut self, dom: &mut D) -> Result<(), DomError> {
        for node in self.reveal.poll(&*dom) {
            dom.add_class(node, "active");
            if let Some(id) = dom.attribute(node, "id") {
                self.trigger_section_animation(dom, &id)?;
            }
        }
        for node in self.animate_on_scroll.poll(&*dom) {
            dom.add_class(node, "animate-in");
        }
        for image in self.lazy_images.poll(&*dom) {
            if let Some(src) = dom.attribute(image, "data-src") {
                dom.set_attribute(image, "src", &src);
            }
            dom.remove_class(image, "lazy");
            self.lazy_images.unobserve(image);
        }
        Ok(())
    }

    fn trigger_section_animation<D: Dom + ?Sized>(
        &mut self,
        dom: &mut D,
        section_id: &str,
    ) -> Result<(), DomError> {
        match section_id {
            SKILLS_SECTION if !self.state.skills_animated => {
                self.state.skills_animated = true;
                self.animate_skills(&*dom)
            }
            PROJECTS_SECTION if !self.state.projects_loaded => {
                self.state.projects_loaded = true;
                self.load_projects(dom)
            }
            _ => Ok(()),
        }
    }

    fn animate_skills<D: Dom + ?Sized>(&mut self, dom: &D) -> Result<(), DomError> {
        for (index, bar) in dom.query_all(PROGRESS_FILL)?.into_iter().enumerate() {
            self.timers.schedule(
                index as Millis * self.config.skills.stagger_ms,
                PageTask::SkillBar(bar),
            );
        }
        Ok(())
    }

    fn load_projects<D: Dom + ?Sized>(&mut self, dom: &mut D) -> Result<(), DomError> {
        for image in dom.query_all(PROJECT_IMAGES)? {
            if let Some(src) = dom.attribute(image, "data-src") {
                dom.set_attribute(image, "src", &src);
            }
            self.project_images.push(image);
        }
        tracing::debug!(images = self.project_images.len(), "project thumbnails loading");
        Ok(())
    }

    /// An image finished loading. Project thumbnails get `loaded`.
    pub fn on_image_load<D: Dom + ?Sized>(&mut self, dom: &mut D, target: NodeId) {
        if let Some(pos) = self.project_images.iter().position(|&n| n == target) {
            self.project_images.swap_remove(pos);
            dom.add_class(target, "loaded");
        }
    }

    // -------------------------------------------------------------------------
    // Scroll
    // -------------------------------------------------------------------------

    /// Scroll handler. Visibility is checked on every call; the chrome
    /// updates are throttled and `false` means they were dropped.
    pub fn on_scroll<D: Dom + ?Sized>(&mut self, dom: &mut D) -> Result<bool, DomError> {
        self.sweep(dom)?;
        if !self.scroll_gate.try_pass(self.timers.now()) {
            return Ok(false);
        }
        let scroll_top = dom.scroll_top();
        self.update_navigation_state(dom, scroll_top);
        self.update_current_section(dom)?;
        self.update_parallax(dom, scroll_top)?;
        self.update_scroll_to_top(dom, scroll_top);
        Ok(true)
    }

    fn update_navigation_state<D: Dom + ?Sized>(&mut self, dom: &mut D, scroll_top: f64) {
        let Some(nav) = self.nav else {
            return;
        };
        let threshold = self.config.scroll.nav_threshold;
        if scroll_top > threshold && !self.state.is_scrolled {
            dom.add_class(nav, "scrolled");
            self.state.is_scrolled = true;
        } else if scroll_top <= threshold && self.state.is_scrolled {
            dom.remove_class(nav, "scrolled");
            self.state.is_scrolled = false;
        }
    }

    /// The last section whose box straddles the section line wins; none gives
    /// an empty id.
    pub fn update_current_section<D: Dom + ?Sized>(&mut self, dom: &mut D) -> Result<(), DomError> {
        let line = self.config.scroll.section_line;
        let mut current = String::new();
        for &section in &self.sections {
            let rect = dom.bounding_rect(section);
            if rect.top <= line && rect.bottom() >= line {
                current = dom.attribute(section, "id").unwrap_or_default();
            }
        }
        if current != self.state.current_section {
            tracing::debug!(from = %self.state.current_section, to = %current, "section changed");
            self.update_active_nav_link(dom, &current)?;
            self.state.current_section = current;
        }
        Ok(())
    }

    fn update_active_nav_link<D: Dom + ?Sized>(
        &self,
        dom: &mut D,
        section_id: &str,
    ) -> Result<(), DomError> {
        for link in dom.query_all(NAV_LINKS)? {
            dom.remove_class(link, "active");
        }
        if section_id.is_empty() {
            return Ok(());
        }
        if let Some(link) = dom.query(&format!("a[href=\"#{section_id}\"]"))? {
            dom.add_class(link, "active");
        }
        Ok(())
    }

    fn update_parallax<D: Dom + ?Sized>(&self, dom: &mut D, scroll_top: f64) -> Result<(), DomError> {
        for node in dom.query_all(PARALLAX)? {
            let speed = dom
                .attribute(node, "data-speed")
                .and_then(|s| s.trim().parse::<f64>().ok())
                .unwrap_or(self.config.scroll.parallax_speed);
            let offset = -(scroll_top * speed);
            dom.set_style(
                node,
                "transform",
                &format!("translateY({}px)", css_number(offset)),
            );
        }
        Ok(())
    }

    fn update_scroll_to_top<D: Dom + ?Sized>(&mut self, dom: &mut D, scroll_top: f64) {
        let Some(button) = self.scroll_top_button else {
            return;
        };
        if scroll_top > self.config.scroll.scroll_top_threshold {
            dom.set_style(button, "display", "block");
            dom.add_class(button, "visible");
        } else if dom.has_class(button, "visible") {
            // fade out only on the way down; further scrolls below the
            // threshold leave the pending hide alone
            dom.remove_class(button, "visible");
            self.timers
                .schedule(self.config.scroll.scroll_top_fade_ms, PageTask::HideScrollTop);
        }
    }

    // -------------------------------------------------------------------------
    // Window / document events
    // -------------------------------------------------------------------------

    /// Debounced; the work happens when [`PageTask::Resize`] fires.
    pub fn on_resize(&mut self) {
        self.resize_gate.trigger(&mut self.timers, PageTask::Resize);
    }

    /// Returns `true` when the browser's default action must be prevented
    /// (same-page anchor links).
    pub fn on_click<D: Dom + ?Sized>(&mut self, dom: &mut D, target: NodeId) -> Result<bool, DomError> {
        let mut prevent_default = false;
        if let Some(link) = dom.closest(target, ANCHOR_LINKS)? {
            prevent_default = true;
            let href = dom.attribute(link, "href").unwrap_or_default();
            if let Some(section) = dom.element_by_id(href.trim_start_matches('#')) {
                self.smooth_scroll_to(dom, section);
            }
        }
        if dom.has_class(target, "modal-backdrop") {
            close_modal(dom)?;
        }
        if dom.closest(target, ".dropdown")?.is_none() {
            close_all_dropdowns(dom)?;
        }
        Ok(prevent_default)
    }

    pub fn on_keydown<D: Dom + ?Sized>(&mut self, dom: &mut D, key: &str) -> Result<(), DomError> {
        match key {
            "Escape" => {
                close_modal(dom)?;
                close_all_dropdowns(dom)?;
            }
            "Tab" => {
                if let Some(body) = dom.body() {
                    dom.add_class(body, "keyboard-navigation");
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub fn on_load<D: Dom + ?Sized>(&mut self, dom: &mut D) -> Result<(), DomError> {
        if let Some(body) = dom.body() {
            dom.remove_class(body, "loading");
        }
        dom.dispatch(Notification::Loaded);
        self.contact_form = dom.query(CONTACT_FORM)?;
        self.sweep(dom)
    }

    pub fn on_visibility_change<D: Dom + ?Sized>(&mut self, dom: &mut D) -> Result<(), DomError> {
        let state = if dom.is_hidden() { "paused" } else { "running" };
        for node in dom.query_all(ANIMATED_ELEMENTS)? {
            dom.set_style(node, "animation-play-state", state);
        }
        Ok(())
    }

    /// `None` unless `form` is the bound contact form.
    pub fn on_submit(
        &mut self,
        form: NodeId,
        fields: &BTreeMap<String, String>,
    ) -> Option<Submission> {
        if self.contact_form != Some(form) {
            return None;
        }
        Some(contact::submit(ContactForm::from_fields(fields)))
    }

    // -------------------------------------------------------------------------
    // Public entry points
    // -------------------------------------------------------------------------

    pub fn scroll_to_section<D: Dom + ?Sized>(&self, dom: &mut D, section_id: &str) {
        if let Some(section) = dom.element_by_id(section_id) {
            self.smooth_scroll_to(dom, section);
        }
    }

    fn smooth_scroll_to<D: Dom + ?Sized>(&self, dom: &mut D, node: NodeId) {
        let top = dom.bounding_rect(node).top + dom.scroll_top() - self.config.scroll.header_offset;
        dom.scroll_to(top);
    }

    pub fn update_progress<D: Dom + ?Sized>(&self, dom: &mut D, percentage: f64) -> Result<(), DomError> {
        if let Some(bar) = dom.query(PAGE_PROGRESS)? {
            dom.set_style(bar, "width", &format!("{}%", css_number(percentage)));
        }
        Ok(())
    }

    pub fn show_notification(&self, message: &str, level: Level) {
        match level {
            Level::Error => tracing::error!("{message}"),
            Level::Warning => tracing::warn!("{message}"),
            Level::Info | Level::Success => tracing::info!(?level, "{message}"),
        }
    }

    // -------------------------------------------------------------------------
    // Timers
    // -------------------------------------------------------------------------

    pub fn next_due(&self) -> Option<Millis> {
        self.timers.next_due()
    }

    pub fn set_now(&mut self, now: Millis) {
        self.timers.set_now(now);
    }

    /// Run one due timer, if any.
    pub fn fire_due<D: Dom + ?Sized>(&mut self, dom: &mut D) -> bool {
        let Some((id, task)) = self.timers.pop_due() else {
            return false;
        };
        let result = match task {
            PageTask::HeroReveal(node) => {
                dom.set_style(node, "opacity", "1");
                dom.set_style(node, "transform", "translateY(0)");
                dom.set_style(node, "transition", HERO_TRANSITION);
                Ok(())
            }
            PageTask::SkillBar(bar) => {
                let percentage = dom
                    .attribute(bar, "data-percentage")
                    .unwrap_or_else(|| DEFAULT_SKILL_PERCENT.to_string());
                dom.set_style(bar, "width", &format!("{percentage}%"));
                Ok(())
            }
            PageTask::HideScrollTop => {
                let button = self.scroll_top_button;
                if let Some(button) = button.filter(|&b| !dom.has_class(b, "visible")) {
                    dom.set_style(button, "display", "none");
                }
                Ok(())
            }
            PageTask::TypingStep => {
                if let Some((node, typewriter)) = self.typing.as_mut() {
                    let frame = typewriter.step();
                    dom.set_text(*node, &frame.text);
                    self.timers
                        .schedule_at(id.due() + frame.delay, PageTask::TypingStep);
                }
                Ok(())
            }
            PageTask::Resize => {
                if self.resize_gate.fire(id) {
                    self.handle_resize(dom)
                } else {
                    Ok(())
                }
            }
        };
        if let Err(err) = result {
            tracing::error!(%err, ?task, "page timer failed");
        }
        true
    }

    fn handle_resize<D: Dom + ?Sized>(&mut self, dom: &mut D) -> Result<(), DomError> {
        self.update_current_section(dom)?;
        let viewport = dom.viewport();
        dom.dispatch(Notification::Resize {
            width: viewport.width,
            height: viewport.height,
        });
        self.sweep(dom)
    }
}

fn close_modal<D: Dom + ?Sized>(dom: &mut D) -> Result<(), DomError> {
    if let Some(modal) = dom.query(".modal.active")? {
        dom.remove_class(modal, "active");
    }
    Ok(())
}

fn close_all_dropdowns<D: Dom + ?Sized>(dom: &mut D) -> Result<(), DomError> {
    for dropdown in dom.query_all(".dropdown.open")? {
        dom.remove_class(dropdown, "open");
    }
    Ok(())
}
