//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output reads as an inventory of the page, grouped by feature. Each group
//! has a header line and indented detail lines; numbered entities use a
//! 3-digit positional index like the rest of the CLI.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Page
//!     Navigation: found
//!     Sections: home, SKILLS, PROJECT, contact
//!     Typing effect: found
//!     Skill bars: 5
//!     Reveal targets: 6
//!     Lazy images: 5
//!     Scroll-to-top: found
//!     Contact form: found
//! Projects
//!     Cards: 4
//!     Filter buttons: 7
//!     Filter select: found
//! Carousel
//!     Items: 3
//! ```
//!
//! ## Simulate
//!
//! ```text
//! At 16000ms, scrolled to 1600px
//! Page
//!     Section: PROJECT
//!     Nav scrolled: yes
//!     Skills animated: yes
//!     Projects loaded: yes
//!     Typing: "SOFTWARE ENG"
//! Projects
//!     Filter: java
//!     Visible: 001
//! Carousel
//!     Slide 1 of 3 (autoplay on)
//! Steps
//!     000000 load
//!     000300 submit (default prevented)
//! Notifications
//!     cvAppLoaded
//! Submissions
//!     001 accepted: Jane <jane@example.com>
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::app::Inventory;
use crate::contact::Submission;
use crate::dom::{Notification, css_number};
use crate::scenario::Report;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn found(present: bool) -> &'static str {
    if present { "found" } else { "missing" }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn detail(label: &str, value: impl std::fmt::Display) -> String {
    format!("{}{}: {}", indent(1), label, value)
}

fn notification_line(notification: &Notification) -> String {
    match notification {
        Notification::Resize { width, height } => format!(
            "{} {}x{}",
            notification.event_name(),
            css_number(*width),
            css_number(*height)
        ),
        Notification::Loaded => notification.event_name().to_string(),
    }
}

fn submission_line(index: usize, submission: &Submission) -> String {
    match submission {
        Submission::Accepted { form } => format!(
            "{} accepted: {} <{}>",
            format_index(index),
            form.name.trim(),
            form.email
        ),
        Submission::Rejected { violations } => {
            let reasons: Vec<String> = violations.iter().map(ToString::to_string).collect();
            format!("{} rejected: {}", format_index(index), reasons.join("; "))
        }
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_inventory(inventory: &Inventory) -> Vec<String> {
    let page = &inventory.page;
    let sections = if page.sections.is_empty() {
        "none".to_string()
    } else {
        page.sections.join(", ")
    };
    let mut lines = vec![
        "Page".to_string(),
        detail("Navigation", found(page.nav)),
        detail("Sections", sections),
        detail("Typing effect", found(page.typing)),
        detail("Skill bars", page.skill_bars),
        detail("Reveal targets", page.reveal_targets),
        detail("Lazy images", page.lazy_images),
        detail("Scroll-to-top", found(page.scroll_top_button)),
        detail("Contact form", found(page.contact_form)),
        "Projects".to_string(),
        detail("Cards", inventory.project_cards),
        detail("Filter buttons", inventory.filter_buttons),
        detail("Filter select", found(inventory.filter_select)),
        "Carousel".to_string(),
    ];
    lines.push(match inventory.carousel_items {
        Some(n) => detail("Items", n),
        None => detail("Items", "disabled"),
    });
    lines
}

pub fn print_inventory(inventory: &Inventory) {
    for line in format_inventory(inventory) {
        println!("{}", line);
    }
}

// ============================================================================
// Simulate
// ============================================================================

pub fn format_report(report: &Report) -> Vec<String> {
    let snapshot = &report.snapshot;
    let state = &snapshot.page;
    let mut lines = vec![
        format!(
            "At {}ms, scrolled to {}px",
            snapshot.time_ms,
            css_number(snapshot.scroll_top)
        ),
        "Page".to_string(),
    ];
    let section = if state.current_section.is_empty() {
        "(none)"
    } else {
        state.current_section.as_str()
    };
    lines.push(detail("Section", section));
    lines.push(detail("Nav scrolled", yes_no(state.is_scrolled)));
    lines.push(detail("Skills animated", yes_no(state.skills_animated)));
    lines.push(detail("Projects loaded", yes_no(state.projects_loaded)));
    if let Some(text) = &snapshot.typing_text {
        lines.push(detail("Typing", format!("{text:?}")));
    }

    if let Some(filter) = snapshot.filter {
        lines.push("Projects".to_string());
        lines.push(detail("Filter", filter));
        let visible: Vec<String> = snapshot
            .visible_projects
            .iter()
            .map(|&i| format_index(i + 1))
            .collect();
        let visible = if visible.is_empty() {
            "none".to_string()
        } else {
            visible.join(", ")
        };
        lines.push(detail("Visible", visible));
    }

    if let Some(carousel) = &snapshot.carousel {
        lines.push("Carousel".to_string());
        lines.push(format!(
            "{}Slide {} of {} (autoplay {})",
            indent(1),
            carousel.current + 1,
            carousel.len,
            if carousel.autoplay { "on" } else { "off" }
        ));
    }

    if !report.steps.is_empty() {
        lines.push("Steps".to_string());
        for step in &report.steps {
            let suffix = if step.prevent_default {
                " (default prevented)"
            } else {
                ""
            };
            lines.push(format!("{}{:0>6} {}{}", indent(1), step.at, step.event, suffix));
        }
    }

    if !report.notifications.is_empty() {
        lines.push("Notifications".to_string());
        for notification in &report.notifications {
            lines.push(format!("{}{}", indent(1), notification_line(notification)));
        }
    }

    if !report.scroll_requests.is_empty() {
        lines.push("Smooth scrolls".to_string());
        for top in &report.scroll_requests {
            lines.push(format!("{}to {}px", indent(1), css_number(*top)));
        }
    }

    if !snapshot.submissions.is_empty() {
        lines.push("Submissions".to_string());
        for (i, submission) in snapshot.submissions.iter().enumerate() {
            lines.push(format!("{}{}", indent(1), submission_line(i + 1, submission)));
        }
    }
    lines
}

pub fn print_report(report: &Report) {
    for line in format_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
