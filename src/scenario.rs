//! Scripted page sessions.
//!
//! A scenario file describes a viewport, element boxes (there is no layout
//! engine, so the script says where things are) and a timeline of user
//! events. [`run`] replays it against a [`MemoryDom`] built from a page's
//! HTML and returns a [`Report`] of the final state.
//!
//! ```toml
//! seed = 7
//! run_until = 16000
//!
//! [viewport]
//! width = 1280
//! height = 800
//!
//! [[layout]]
//! selector = "#SKILLS"
//! top = 800
//! height = 800
//! cascade = true          # descendants share the box
//!
//! [[step]]
//! at = 0
//! event = "load"
//!
//! [[step]]
//! at = 100
//! event = "scroll"
//! top = 600
//!
//! [[step]]
//! at = 2000
//! event = "click"
//! target = ".filter-btn[data-filter=\"java\"]"
//! ```
//!
//! Targets are CSS selectors; the first match receives the event.

use crate::app::{App, Snapshot};
use crate::config::{ConfigError, PageConfig};
use crate::dom::{Dom, DomError, MemoryDom, NodeId, Notification, Rect, Viewport};
use crate::event::Event;
use crate::timers::Millis;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("scenario parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("no element matches `{0}`")]
    Target(String),
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub seed: u64,
    pub run_until: Option<Millis>,
    pub viewport: Option<ViewportSpec>,
    #[serde(default)]
    pub layout: Vec<LayoutRule>,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewportSpec {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutRule {
    pub selector: String,
    pub top: f64,
    pub height: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default)]
    pub cascade: bool,
}

fn default_width() -> f64 {
    Viewport::default().width
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Step {
    pub at: Millis,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Action {
    Load,
    Scroll {
        top: f64,
    },
    Resize {
        width: f64,
        height: f64,
    },
    Click {
        target: String,
    },
    Key {
        key: String,
    },
    Visibility {
        hidden: bool,
    },
    Submit {
        target: String,
        #[serde(default)]
        fields: BTreeMap<String, String>,
    },
    Change {
        target: String,
        value: String,
    },
    PointerEnter {
        target: String,
    },
    PointerLeave {
        target: String,
    },
    TouchStart {
        target: String,
        x: f64,
    },
    TouchEnd {
        target: String,
        x: f64,
    },
    ImageLoad {
        target: String,
    },
}

/// One replayed step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub at: Millis,
    pub event: &'static str,
    pub prevent_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub notifications: Vec<Notification>,
    pub scroll_requests: Vec<f64>,
    pub steps: Vec<StepRecord>,
}

impl Scenario {
    pub fn parse(content: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        Self::parse(&fs::read_to_string(path)?)
    }
}

fn resolve(dom: &MemoryDom, selector: &str) -> Result<NodeId, ScenarioError> {
    dom.query(selector)?
        .ok_or_else(|| ScenarioError::Target(selector.to_string()))
}

fn apply_layout(dom: &mut MemoryDom, rules: &[LayoutRule]) -> Result<(), ScenarioError> {
    for rule in rules {
        let rect = Rect {
            left: rule.left,
            top: rule.top,
            width: rule.width,
            height: rule.height,
        };
        let nodes = dom.query_all(&rule.selector)?;
        if nodes.is_empty() {
            tracing::warn!(selector = %rule.selector, "layout rule matches nothing");
        }
        for node in nodes {
            dom.set_layout(node, rect);
            if rule.cascade {
                for inner in dom.query_within(node, "*")? {
                    dom.set_layout(inner, rect);
                }
            }
        }
    }
    Ok(())
}

/// Turn a scripted action into an event, applying the window state it
/// implies first.
fn to_event(dom: &mut MemoryDom, action: &Action) -> Result<Event, ScenarioError> {
    Ok(match action {
        Action::Load => Event::Load,
        Action::Scroll { top } => {
            dom.set_scroll_top(*top);
            Event::Scroll
        }
        Action::Resize { width, height } => {
            dom.set_viewport(Viewport {
                width: *width,
                height: *height,
            });
            Event::Resize
        }
        Action::Click { target } => Event::Click {
            target: resolve(dom, target)?,
        },
        Action::Key { key } => Event::KeyDown { key: key.clone() },
        Action::Visibility { hidden } => {
            dom.set_hidden(*hidden);
            Event::VisibilityChange
        }
        Action::Submit { target, fields } => Event::Submit {
            form: resolve(dom, target)?,
            fields: fields.clone(),
        },
        Action::Change { target, value } => Event::Change {
            target: resolve(dom, target)?,
            value: value.clone(),
        },
        Action::PointerEnter { target } => Event::PointerEnter {
            target: resolve(dom, target)?,
        },
        Action::PointerLeave { target } => Event::PointerLeave {
            target: resolve(dom, target)?,
        },
        Action::TouchStart { target, x } => Event::TouchStart {
            target: resolve(dom, target)?,
            x: *x,
        },
        Action::TouchEnd { target, x } => Event::TouchEnd {
            target: resolve(dom, target)?,
            x: *x,
        },
        Action::ImageLoad { target } => Event::ImageLoad {
            target: resolve(dom, target)?,
        },
    })
}

/// Replay `scenario` against the page in `html`.
///
/// Steps run in `at` order (ties keep file order). Timers due before a step
/// fire first. After the last step the clock runs on to `run_until`, if it
/// is later.
pub fn run(html: &str, scenario: &Scenario, config: &PageConfig) -> Result<Report, ScenarioError> {
    let mut dom = MemoryDom::parse_html(html);
    if let Some(viewport) = &scenario.viewport {
        dom.set_viewport(Viewport {
            width: viewport.width,
            height: viewport.height,
        });
    }
    apply_layout(&mut dom, &scenario.layout)?;

    let mut rng = StdRng::seed_from_u64(scenario.seed);
    let mut app = App::start(dom, config, &mut rng)?;

    let mut steps: Vec<&Step> = scenario.steps.iter().collect();
    steps.sort_by_key(|step| step.at);

    let mut records = Vec::with_capacity(steps.len());
    for step in steps {
        app.advance_to(step.at);
        let event = to_event(app.dom_mut(), &step.action)?;
        let outcome = app.handle(&event);
        tracing::debug!(at = step.at, event = event.name(), "step");
        records.push(StepRecord {
            at: step.at,
            event: event.name(),
            prevent_default: outcome.prevent_default,
        });
    }
    if let Some(until) = scenario.run_until {
        app.advance_to(until);
    }

    Ok(Report {
        snapshot: app.snapshot(),
        notifications: app.dom().notifications().to_vec(),
        scroll_requests: app.dom().scroll_requests().to_vec(),
        steps: records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Category;
    use crate::test_helpers::*;

    const LAYOUT: &str = r##"
        [[layout]]
        selector = "#home"
        top = 0
        height = 800
        cascade = true

        [[layout]]
        selector = "#SKILLS"
        top = 800
        height = 800
        cascade = true

        [[layout]]
        selector = "#PROJECT"
        top = 1600
        height = 800
        cascade = true
    "##;

    fn replay(run_until: Option<Millis>, steps: &str) -> Report {
        let header = run_until
            .map(|t| format!("run_until = {t}\n"))
            .unwrap_or_default();
        let scenario = Scenario::parse(&format!("{header}{LAYOUT}\n{steps}")).unwrap();
        run(&fixture_markup().into_string(), &scenario, &PageConfig::default()).unwrap()
    }

    #[test]
    fn parses_every_event_kind() {
        let scenario = Scenario::parse(
            r##"
            seed = 3
            run_until = 100

            [viewport]
            width = 390
            height = 844

            [[step]]
            at = 0
            event = "load"

            [[step]]
            at = 5
            event = "scroll"
            top = 600

            [[step]]
            at = 6
            event = "resize"
            width = 800
            height = 600

            [[step]]
            at = 7
            event = "key"
            key = "Escape"

            [[step]]
            at = 8
            event = "visibility"
            hidden = true

            [[step]]
            at = 9
            event = "submit"
            target = "#contact-form"
            fields = { name = "Jane", email = "jane@example.com" }

            [[step]]
            at = 10
            event = "touch-end"
            target = ".main-cert"
            x = 12.5

            [[step]]
            at = 11
            event = "image-load"
            target = "img"
            "##,
        )
        .unwrap();
        assert_eq!(scenario.seed, 3);
        assert_eq!(scenario.steps.len(), 8);
        assert_eq!(scenario.steps[1].action, Action::Scroll { top: 600.0 });
        assert!(matches!(
            &scenario.steps[5].action,
            Action::Submit { fields, .. } if fields["email"] == "jane@example.com"
        ));
        assert_eq!(
            scenario.steps[6].action,
            Action::TouchEnd {
                target: ".main-cert".into(),
                x: 12.5
            }
        );
    }

    #[test]
    fn rejects_unknown_event() {
        let err = Scenario::parse("[[step]]\nat = 0\nevent = \"double-click\"\n");
        assert!(matches!(err, Err(ScenarioError::Toml(_))));
    }

    #[test]
    fn unresolved_target_is_an_error() {
        let scenario = Scenario::parse(
            "[[step]]\nat = 0\nevent = \"click\"\ntarget = \"#nope\"\n",
        )
        .unwrap();
        let err = run(&fixture_markup().into_string(), &scenario, &PageConfig::default());
        assert!(matches!(err, Err(ScenarioError::Target(s)) if s == "#nope"));
    }

    #[test]
    fn replays_scroll_filter_and_submit() {
        let report = replay(
            Some(16_000),
            r##"
            [[step]]
            at = 0
            event = "load"

            [[step]]
            at = 100
            event = "scroll"
            top = 1600

            [[step]]
            at = 200
            event = "click"
            target = ".filter-btn[data-filter=\"java\"]"

            [[step]]
            at = 300
            event = "submit"
            target = "#contact-form"
            fields = { name = "Jane", email = "jane@example.com", message = "Would love to chat." }
            "##,
        );
        assert_eq!(report.snapshot.time_ms, 16_000);
        assert_eq!(report.snapshot.page.current_section, "PROJECT");
        assert!(report.snapshot.page.projects_loaded);
        assert_eq!(report.snapshot.filter, Some(Category::Java));
        assert_eq!(report.snapshot.visible_projects, vec![0]);
        assert_eq!(report.snapshot.carousel.as_ref().unwrap().current, 0);
        assert_eq!(report.notifications, vec![Notification::Loaded]);
        assert_eq!(report.snapshot.submissions.len(), 1);
        assert!(report.steps[3].prevent_default);
        assert!(!report.steps[0].prevent_default);
    }

    #[test]
    fn steps_run_in_time_order() {
        let report = replay(
            None,
            r##"
            [[step]]
            at = 500
            event = "key"
            key = "Tab"

            [[step]]
            at = 100
            event = "load"
            "##,
        );
        let order: Vec<_> = report.steps.iter().map(|s| (s.at, s.event)).collect();
        assert_eq!(order, vec![(100, "load"), (500, "keydown")]);
        assert_eq!(report.snapshot.time_ms, 500);
    }

    #[test]
    fn report_serializes_flat() {
        let report = replay(Some(10), "");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["time_ms"], 10);
        assert_eq!(json["page"]["current_section"], "home");
        assert_eq!(json["filter"], "all");
        assert!(json["notifications"].as_array().unwrap().is_empty());
    }
}
