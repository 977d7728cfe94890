//! Page behavior configuration.
//!
//! Every timing constant, threshold and piece of page content the controllers
//! use lives here, with the stock values as defaults. A `cv-page.toml` (or the
//! file passed with `--config`) only needs the keys it overrides; user values
//! are merged on top of the stock defaults before validation.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [scroll]
//! nav_threshold = 100         # px scrolled before the nav gets `scrolled`
//! section_line = 100          # viewport y used to pick the current section
//! scroll_top_threshold = 500  # px scrolled before the scroll-to-top button shows
//! scroll_top_fade_ms = 300    # delay before the hidden button gets display:none
//! throttle_ms = 16            # scroll handler runs at most once per window
//! header_offset = 80          # fixed header height subtracted from anchor targets
//! parallax_speed = 0.5        # fallback when an element has no data-speed
//!
//! [resize]
//! debounce_ms = 250
//!
//! [typing]
//! roles = ["WEB DEVELOPER", "SOFTWARE ENGINEER", "UI/UX DESIGNER",
//!          "CYBER SECURITY SPECIALIST", "PROBLEM SOLVER"]
//! type_ms = 150
//! delete_ms = 75
//! pause_full_ms = 2500
//! pause_empty_ms = 800
//!
//! [skills]
//! levels = []                 # per-skill percentages; empty = random in [min, max)
//! min = 70
//! max = 100
//! stagger_ms = 100
//!
//! [reveal]
//! threshold = 0.1
//! bottom_margin = 50
//!
//! [hero]
//! stagger_ms = 300
//!
//! [filter]
//! stagger_ms = 50
//!
//! [carousel]
//! selector = ".main-cert"
//! autoplay = true
//! interval_ms = 5000
//! swipe_threshold = 50
//!
//! [preload]
//! images = ["./IMG_9346 (2).jpg", "./progromming (1).jpeg"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::timers::Millis;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File looked up in the working directory when `--config` is not given.
pub const CONFIG_FILENAME: &str = "cv-page.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    pub scroll: ScrollConfig,
    pub resize: ResizeConfig,
    pub typing: TypingConfig,
    pub skills: SkillsConfig,
    pub reveal: RevealConfig,
    pub hero: HeroConfig,
    pub filter: FilterConfig,
    pub carousel: CarouselConfig,
    pub preload: PreloadConfig,
}

impl PageConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scroll.throttle_ms == 0 {
            return Err(ConfigError::Validation(
                "scroll.throttle_ms must be non-zero".into(),
            ));
        }
        if self.typing.roles.is_empty() {
            return Err(ConfigError::Validation(
                "typing.roles must not be empty".into(),
            ));
        }
        if self.typing.roles.iter().any(|r| r.is_empty()) {
            return Err(ConfigError::Validation(
                "typing.roles must not contain empty strings".into(),
            ));
        }
        let typing = &self.typing;
        if [
            typing.type_ms,
            typing.delete_ms,
            typing.pause_full_ms,
            typing.pause_empty_ms,
        ]
        .contains(&0)
        {
            return Err(ConfigError::Validation(
                "typing timings must be non-zero".into(),
            ));
        }
        if self.skills.max > 100 {
            return Err(ConfigError::Validation("skills.max must be 0-100".into()));
        }
        if self.skills.min >= self.skills.max {
            return Err(ConfigError::Validation(
                "skills.min must be below skills.max".into(),
            ));
        }
        if self.skills.levels.iter().any(|&l| l > 100) {
            return Err(ConfigError::Validation(
                "skills.levels values must be 0-100".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.reveal.threshold) {
            return Err(ConfigError::Validation(
                "reveal.threshold must be between 0 and 1".into(),
            ));
        }
        if self.carousel.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "carousel.interval_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Scroll-driven chrome: nav state, current section, parallax, scroll-to-top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScrollConfig {
    pub nav_threshold: f64,
    pub section_line: f64,
    pub scroll_top_threshold: f64,
    pub scroll_top_fade_ms: Millis,
    pub throttle_ms: Millis,
    pub header_offset: f64,
    pub parallax_speed: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            nav_threshold: 100.0,
            section_line: 100.0,
            scroll_top_threshold: 500.0,
            scroll_top_fade_ms: 300,
            throttle_ms: 16,
            header_offset: 80.0,
            parallax_speed: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub debounce_ms: Millis,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self { debounce_ms: 250 }
    }
}

/// Typing-text effect: the rotating role strings and the per-phase timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypingConfig {
    pub roles: Vec<String>,
    pub type_ms: Millis,
    pub delete_ms: Millis,
    pub pause_full_ms: Millis,
    pub pause_empty_ms: Millis,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            roles: [
                "WEB DEVELOPER",
                "SOFTWARE ENGINEER",
                "UI/UX DESIGNER",
                "CYBER SECURITY SPECIALIST",
                "PROBLEM SOLVER",
            ]
            .map(String::from)
            .to_vec(),
            type_ms: 150,
            delete_ms: 75,
            pause_full_ms: 2500,
            pause_empty_ms: 800,
        }
    }
}

/// Skill progress bars.
///
/// `levels[i]` is the percentage for the i-th skill in page order. Skills
/// past the end of the list (all of them, by default) get a random
/// percentage in `[min, max)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SkillsConfig {
    pub levels: Vec<u8>,
    pub min: u8,
    pub max: u8,
    pub stagger_ms: Millis,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            levels: Vec::new(),
            min: 70,
            max: 100,
            stagger_ms: 100,
        }
    }
}

/// Reveal-on-scroll intersection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RevealConfig {
    pub threshold: f64,
    /// Only used for `.animate-on-scroll`; the viewport is shrunk this many
    /// px from below.
    pub bottom_margin: f64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            bottom_margin: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeroConfig {
    pub stagger_ms: Millis,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self { stagger_ms: 300 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    pub stagger_ms: Millis,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { stagger_ms: 50 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CarouselConfig {
    pub selector: String,
    pub autoplay: bool,
    pub interval_ms: Millis,
    pub swipe_threshold: f64,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            selector: ".main-cert".to_string(),
            autoplay: true,
            interval_ms: 5000,
            swipe_threshold: 50.0,
        }
    }
}

/// Images announced to the browser with `<link rel="preload">`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreloadConfig {
    pub images: Vec<String>,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            images: vec![
                "./IMG_9346 (2).jpg".to_string(),
                "./progromming (1).jpeg".to_string(),
            ],
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PageConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `cv-page.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `cv-page.toml`.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    parse_raw(&fs::read_to_string(&config_path)?).map(Some)
}

fn parse_raw(content: &str) -> Result<toml::Value, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<PageConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PageConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load an explicit config file. Unlike [`load_raw_config`], a missing file
/// is an error.
pub fn load_config(path: &Path) -> Result<PageConfig, ConfigError> {
    let overlay = parse_raw(&fs::read_to_string(path)?)?;
    resolve_config(Some(overlay))
}

/// Load `cv-page.toml` from `dir` if present, stock defaults otherwise.
pub fn load_config_in(dir: &Path) -> Result<PageConfig, ConfigError> {
    resolve_config(load_raw_config(dir)?)
}

/// Returns a fully-commented stock `cv-page.toml` with all keys and
/// explanations. Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# cv-page Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Scroll-driven chrome
# ---------------------------------------------------------------------------
[scroll]
# Pixels scrolled before the nav bar gets the `scrolled` class.
nav_threshold = 100.0

# Viewport y-coordinate used to decide which section is current.
section_line = 100.0

# Pixels scrolled before the scroll-to-top button appears.
scroll_top_threshold = 500.0

# Delay before the hidden scroll-to-top button is taken out of layout,
# leaving time for its fade-out transition.
scroll_top_fade_ms = 300

# The scroll handler runs at most once per window (16ms = ~60Hz).
throttle_ms = 16

# Height of the fixed header, subtracted when scrolling to an anchor.
header_offset = 80.0

# Parallax factor for elements without a data-speed attribute.
parallax_speed = 0.5

# ---------------------------------------------------------------------------
# Resize
# ---------------------------------------------------------------------------
[resize]
# Quiet period before a burst of resize events is handled once.
debounce_ms = 250

# ---------------------------------------------------------------------------
# Typing effect
# ---------------------------------------------------------------------------
[typing]
roles = [
    "WEB DEVELOPER",
    "SOFTWARE ENGINEER",
    "UI/UX DESIGNER",
    "CYBER SECURITY SPECIALIST",
    "PROBLEM SOLVER",
]
type_ms = 150
delete_ms = 75
pause_full_ms = 2500
pause_empty_ms = 800

# ---------------------------------------------------------------------------
# Skill progress bars
# ---------------------------------------------------------------------------
[skills]
# Percentages for each skill in page order. Skills without an entry get a
# random value in [min, max).
levels = []
min = 70
max = 100
# Delay between successive bars filling.
stagger_ms = 100

# ---------------------------------------------------------------------------
# Reveal on scroll
# ---------------------------------------------------------------------------
[reveal]
# Visible fraction that counts as "in view".
threshold = 0.1
# .animate-on-scroll elements trigger this many px above the viewport bottom.
bottom_margin = 50.0

# ---------------------------------------------------------------------------
# Hero entrance
# ---------------------------------------------------------------------------
[hero]
stagger_ms = 300

# ---------------------------------------------------------------------------
# Project filter
# ---------------------------------------------------------------------------
[filter]
# Per-card delay of the fade-in when a filter is applied.
stagger_ms = 50

# ---------------------------------------------------------------------------
# Carousel
# ---------------------------------------------------------------------------
[carousel]
selector = ".main-cert"
autoplay = true
interval_ms = 5000
# Minimum horizontal swipe distance in px.
swipe_threshold = 50.0

# ---------------------------------------------------------------------------
# Preloaded images
# ---------------------------------------------------------------------------
[preload]
images = ["./IMG_9346 (2).jpg", "./progromming (1).jpeg"]
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_page_constants() {
        let config = PageConfig::default();
        assert_eq!(config.scroll.nav_threshold, 100.0);
        assert_eq!(config.scroll.throttle_ms, 16);
        assert_eq!(config.resize.debounce_ms, 250);
        assert_eq!(config.typing.roles.len(), 5);
        assert_eq!(config.carousel.interval_ms, 5000);
        assert_eq!(config.filter.stagger_ms, 50);
    }

    #[test]
    fn stock_toml_parses_to_defaults() {
        let config: PageConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, PageConfig::default());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[carousel]
interval_ms = 3000
"#;
        let config: PageConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.carousel.interval_ms, 3000);
        assert_eq!(config.carousel.selector, ".main-cert");
        assert_eq!(config.typing.type_ms, 150);
    }

    #[test]
    fn load_config_in_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config_in(tmp.path()).unwrap();
        assert_eq!(config, PageConfig::default());
    }

    #[test]
    fn load_config_in_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
[skills]
levels = [90, 75]

[typing]
roles = ["RUSTACEAN"]
"#,
        )
        .unwrap();
        let config = load_config_in(tmp.path()).unwrap();
        assert_eq!(config.skills.levels, vec![90, 75]);
        assert_eq!(config.typing.roles, vec!["RUSTACEAN"]);
        assert_eq!(config.skills.min, 70);
    }

    #[test]
    fn load_config_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(&tmp.path().join("nope.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "[carousel\ninterval_ms = ").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let toml = r#"
[carousel]
intervall_ms = 10
"#;
        let result: Result<PageConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<PageConfig, _> = toml::from_str("[menu]\nopen = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn merge_toml_preserves_base_keys() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_replaces_arrays_whole() {
        let base: toml::Value = toml::from_str("roles = [\"a\", \"b\"]\n").unwrap();
        let overlay: toml::Value = toml::from_str("roles = [\"c\"]\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["roles"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(PageConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_roles() {
        let mut config = PageConfig::default();
        config.typing.roles.clear();
        assert!(config.validate().is_err());
        config.typing.roles = vec!["OK".into(), String::new()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_typing_delay() {
        let mut config = PageConfig::default();
        config.typing.pause_empty_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_skill_bounds() {
        let mut config = PageConfig::default();
        config.skills.min = 100;
        assert!(config.validate().is_err());
        let mut config = PageConfig::default();
        config.skills.max = 101;
        assert!(config.validate().is_err());
        let mut config = PageConfig::default();
        config.skills.levels = vec![50, 101];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_threshold_and_intervals() {
        let mut config = PageConfig::default();
        config.reveal.threshold = 1.5;
        assert!(config.validate().is_err());
        let mut config = PageConfig::default();
        config.carousel.interval_ms = 0;
        assert!(config.validate().is_err());
        let mut config = PageConfig::default();
        config.scroll.throttle_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn resolve_config_validates_values() {
        let overlay: toml::Value = toml::from_str("[reveal]\nthreshold = -0.5\n").unwrap();
        assert!(matches!(
            resolve_config(Some(overlay)),
            Err(ConfigError::Validation(_))
        ));
    }
}
