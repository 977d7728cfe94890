//! Project filter.
//!
//! Builds one button per [`Category`] into `.categroy`, listens to the
//! optional `#PRO-LANG` select, and shows or hides `.project-veiw-card`
//! elements by CSS class membership.
//!
//! Hiding is immediate. Showing is staggered by card index so cards fade in
//! one after another. Each call to [`ProjectFilter::filter_projects`] starts a
//! new generation; reveal timers from an older generation are discarded when
//! they fire, so the final state of every card reflects only the latest
//! filter no matter how calls overlap.

use crate::config::FilterConfig;
use crate::dom::{Dom, DomError, NodeId, create_with_class};
use crate::timers::{Millis, Scheduler};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const PROJECT_CARDS: &str = ".project-veiw-card";
const FILTER_SELECT_ID: &str = "PRO-LANG";
const BUTTON_HOST: &str = ".categroy";
const FILTER_BUTTON: &str = ".filter-btn";
const FADE_IN: &str = "animate-fade-in-up";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "website")]
    Website,
    #[serde(rename = "java")]
    Java,
    #[serde(rename = "python")]
    Python,
    #[serde(rename = "javascript")]
    JavaScript,
    #[serde(rename = "mysql")]
    Mysql,
    #[serde(rename = "cyberSecurity")]
    CyberSecurity,
}

impl Category {
    /// Button order.
    pub const ALL: [Category; 7] = [
        Category::All,
        Category::Website,
        Category::Java,
        Category::Python,
        Category::JavaScript,
        Category::Mysql,
        Category::CyberSecurity,
    ];

    /// Filter value, which is also the CSS class cards carry.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::All => "all",
            Category::Website => "website",
            Category::Java => "java",
            Category::Python => "python",
            Category::JavaScript => "javascript",
            Category::Mysql => "mysql",
            Category::CyberSecurity => "cyberSecurity",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::All => "All Projects",
            Category::Website => "Web Development",
            Category::Java => "Java",
            Category::Python => "Python",
            Category::JavaScript => "JavaScript",
            Category::Mysql => "Database",
            Category::CyberSecurity => "Security",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown project category `{0}`")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTask {
    Reveal { generation: u64, card: usize },
}

#[derive(Debug)]
pub struct ProjectFilter {
    current: Category,
    generation: u64,
    projects: Vec<NodeId>,
    buttons: Vec<(Category, NodeId)>,
    select: Option<NodeId>,
    stagger_ms: Millis,
    timers: Scheduler<FilterTask>,
}

impl ProjectFilter {
    /// Collect the cards and build the buttons. With no `.categroy` host the
    /// filter still works through the select and [`Self::filter_projects`].
    pub fn attach<D: Dom + ?Sized>(dom: &mut D, config: &FilterConfig) -> Result<Self, DomError> {
        let projects = dom.query_all(PROJECT_CARDS)?;
        let select = dom.element_by_id(FILTER_SELECT_ID);
        let mut buttons = Vec::new();
        if let Some(host) = dom.query(BUTTON_HOST)? {
            let row = create_with_class(
                dom,
                "div",
                "filter-buttons flex flex-wrap justify-center gap-2 mb-6",
            )?;
            for category in Category::ALL {
                let button = create_with_class(dom, "button", "btn btn-ghost filter-btn")?;
                dom.set_attribute(button, "data-filter", category.as_str());
                dom.set_text(button, category.label());
                if category == Category::All {
                    dom.add_class(button, "active");
                }
                dom.append_child(row, button);
                buttons.push((category, button));
            }
            dom.append_child(host, row);
        }
        tracing::debug!(
            projects = projects.len(),
            buttons = buttons.len(),
            select = select.is_some(),
            "project filter attached"
        );
        Ok(Self {
            current: Category::All,
            generation: 0,
            projects,
            buttons,
            select,
            stagger_ms: config.stagger_ms,
            timers: Scheduler::new(),
        })
    }

    pub fn current(&self) -> Category {
        self.current
    }

    pub fn projects(&self) -> &[NodeId] {
        &self.projects
    }

    pub fn has_select(&self) -> bool {
        self.select.is_some()
    }

    pub fn buttons(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.buttons.iter().map(|(_, node)| *node)
    }

    pub fn filter_projects<D: Dom + ?Sized>(&mut self, dom: &mut D, category: Category) {
        self.current = category;
        self.generation += 1;
        for &button in self.buttons.iter().map(|(_, node)| node) {
            let value = dom.attribute(button, "data-filter");
            dom.toggle_class(button, "active", value.as_deref() == Some(category.as_str()));
        }
        for (index, &card) in self.projects.iter().enumerate() {
            let show = category == Category::All || dom.has_class(card, category.as_str());
            if show {
                self.timers.schedule(
                    index as Millis * self.stagger_ms,
                    FilterTask::Reveal {
                        generation: self.generation,
                        card: index,
                    },
                );
            } else {
                dom.set_style(card, "display", "none");
                dom.remove_class(card, FADE_IN);
            }
        }
        tracing::debug!(%category, generation = self.generation, "filtering projects");
    }

    /// Route a click. Returns `true` if it landed on one of our buttons.
    pub fn handle_click<D: Dom + ?Sized>(
        &mut self,
        dom: &mut D,
        target: NodeId,
    ) -> Result<bool, DomError> {
        let Some(button) = dom.closest(target, FILTER_BUTTON)? else {
            return Ok(false);
        };
        let Some(category) = self
            .buttons
            .iter()
            .find(|(_, node)| *node == button)
            .map(|(c, _)| *c)
        else {
            return Ok(false);
        };
        self.filter_projects(dom, category);
        Ok(true)
    }

    /// Route a `change` event. Returns `true` if it came from the select.
    pub fn handle_change<D: Dom + ?Sized>(
        &mut self,
        dom: &mut D,
        target: NodeId,
        value: &str,
    ) -> bool {
        if self.select != Some(target) {
            return false;
        }
        match value.parse() {
            Ok(category) => self.filter_projects(dom, category),
            Err(err) => tracing::warn!("{err}"),
        }
        true
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.timers.next_due()
    }

    pub fn set_now(&mut self, now: Millis) {
        self.timers.set_now(now);
    }

    /// Run one due timer, if any.
    pub fn fire_due<D: Dom + ?Sized>(&mut self, dom: &mut D) -> bool {
        let Some((_, task)) = self.timers.pop_due() else {
            return false;
        };
        match task {
            FilterTask::Reveal { generation, card } => {
                if generation != self.generation {
                    return true;
                }
                if let Some(&node) = self.projects.get(card) {
                    dom.set_style(node, "display", "block");
                    dom.add_class(node, FADE_IN);
                }
            }
        }
        true
    }
}
