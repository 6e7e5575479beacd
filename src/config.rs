//! Behavior configuration.
//!
//! Every timing, threshold, selector and class name the behaviors use comes
//! from [`BehaviorConfig`]. All fields have defaults matching the stock
//! conference page markup, so a page that follows the conventions needs no
//! configuration at all.
//!
//! ## Where config comes from
//!
//! - **CLI**: `--config stagehand.toml`, merged on top of stock defaults.
//! - **Browser**: an optional inline block, merged the same way:
//!
//! ```html
//! <script type="text/toml" id="stagehand-config">
//! [slideshow]
//! interval_ms = 8000
//! </script>
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! [slideshow]
//! interval_ms = 5000        # Auto-advance period
//!
//! [header]
//! scrolled_offset = 24      # "scrolled" once scrollY exceeds this
//! solid_margin_top = 72     # Fixed header height, trimmed off the viewport top
//!
//! [timeline]
//! reveal_threshold = 0.22   # Visible fraction that reveals an item
//!
//! [back_to_top]
//! show_offset = 320         # Button shown once scrollY exceeds this
//!
//! [countdown]
//! tick_ms = 1000
//! # target = "2026-11-12T09:00:00+01:00"   # Fallback when the page has no date
//! ```
//!
//! `[selectors]` and `[classes]` tables rename the markup hooks; see
//! [`stock_config_toml`] for the full list. Unknown keys are rejected to
//! catch typos early.

use crate::selector::{SelectorError, SelectorList};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid selector for {key}: {source}")]
    Selector {
        key: &'static str,
        #[source]
        source: SelectorError,
    },
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Behavior configuration loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BehaviorConfig {
    pub slideshow: SlideshowConfig,
    pub header: HeaderConfig,
    pub timeline: TimelineConfig,
    pub back_to_top: BackToTopConfig,
    pub countdown: CountdownConfig,
    pub selectors: Selectors,
    pub classes: Classes,
}

impl BehaviorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slideshow.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "slideshow.interval_ms must be positive".into(),
            ));
        }
        if self.countdown.tick_ms == 0 {
            return Err(ConfigError::Validation(
                "countdown.tick_ms must be positive".into(),
            ));
        }
        let threshold = self.timeline.reveal_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::Validation(
                "timeline.reveal_threshold must be in (0, 1]".into(),
            ));
        }
        for (key, selector) in self.selectors.entries() {
            SelectorList::parse(selector)
                .map_err(|source| ConfigError::Selector { key, source })?;
        }
        if self.selectors.countdown_date_attribute.trim().is_empty() {
            return Err(ConfigError::Validation(
                "selectors.countdown_date_attribute must not be empty".into(),
            ));
        }
        for (key, class) in self.classes.entries() {
            if class.is_empty() || class.contains(char::is_whitespace) {
                return Err(ConfigError::Validation(format!(
                    "classes.{key} must be a single class name"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlideshowConfig {
    /// Milliseconds between automatic advances.
    pub interval_ms: u32,
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self { interval_ms: 5000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderConfig {
    /// The header is "scrolled" strictly above this offset (CSS px).
    pub scrolled_offset: f64,
    /// Height of the fixed header; the hero counts as hidden once it is
    /// entirely behind it.
    pub solid_margin_top: u32,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            scrolled_offset: 24.0,
            solid_margin_top: 72,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimelineConfig {
    /// Fraction of an item's area that must be visible to reveal it.
    pub reveal_threshold: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            reveal_threshold: 0.22,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackToTopConfig {
    /// The button shows strictly above this offset (CSS px).
    pub show_offset: f64,
}

impl Default for BackToTopConfig {
    fn default() -> Self {
        Self { show_offset: 320.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CountdownConfig {
    /// Milliseconds between re-renders.
    pub tick_ms: u32,
    /// Used only when the countdown container carries no date attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            target: None,
        }
    }
}

/// CSS selectors locating each behavior's elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Selectors {
    pub slideshow: String,
    pub slides: String,
    pub indicators: String,
    pub captions: String,
    pub header: String,
    /// Plain banner used as the header's hero when there is no slideshow.
    pub banner: String,
    pub timeline_items: String,
    pub menu_roots: String,
    /// Toggle control, relative to a menu root.
    pub menu_toggle: String,
    /// Collapsible panel, relative to a menu root.
    pub submenu: String,
    /// First focus target inside an opened submenu.
    pub submenu_focusable: String,
    pub back_to_top: String,
    pub contact_link: String,
    pub contact_section: String,
    pub countdown: String,
    pub countdown_days: String,
    pub countdown_hours: String,
    pub countdown_minutes: String,
    pub countdown_seconds: String,
    /// Attribute on the countdown container holding the target date.
    pub countdown_date_attribute: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            slideshow: ".hero-slideshow".to_string(),
            slides: ".hero-slideshow .slide".to_string(),
            indicators: ".carousel-indicators .dot".to_string(),
            captions: ".hero-inner .hero-text".to_string(),
            header: "#pageHeader, .top-header".to_string(),
            banner: ".page-banner".to_string(),
            timeline_items: ".overview-timeline .timeline-item".to_string(),
            menu_roots: ".nav-center .has-submenu".to_string(),
            menu_toggle: ".nav-link".to_string(),
            submenu: ".submenu".to_string(),
            submenu_focusable: "a, button".to_string(),
            back_to_top: "#backToTop".to_string(),
            contact_link: r##"nav a[href="#contact"]"##.to_string(),
            contact_section: "#contact".to_string(),
            countdown: ".countdown".to_string(),
            countdown_days: r#"[data-unit="days"]"#.to_string(),
            countdown_hours: r#"[data-unit="hours"]"#.to_string(),
            countdown_minutes: r#"[data-unit="minutes"]"#.to_string(),
            countdown_seconds: r#"[data-unit="seconds"]"#.to_string(),
            countdown_date_attribute: "data-date".to_string(),
        }
    }
}

impl Selectors {
    /// Every selector field with its config key, for validation.
    fn entries(&self) -> [(&'static str, &str); 19] {
        [
            ("slideshow", self.slideshow.as_str()),
            ("slides", self.slides.as_str()),
            ("indicators", self.indicators.as_str()),
            ("captions", self.captions.as_str()),
            ("header", self.header.as_str()),
            ("banner", self.banner.as_str()),
            ("timeline_items", self.timeline_items.as_str()),
            ("menu_roots", self.menu_roots.as_str()),
            ("menu_toggle", self.menu_toggle.as_str()),
            ("submenu", self.submenu.as_str()),
            ("submenu_focusable", self.submenu_focusable.as_str()),
            ("back_to_top", self.back_to_top.as_str()),
            ("contact_link", self.contact_link.as_str()),
            ("contact_section", self.contact_section.as_str()),
            ("countdown", self.countdown.as_str()),
            ("countdown_days", self.countdown_days.as_str()),
            ("countdown_hours", self.countdown_hours.as_str()),
            ("countdown_minutes", self.countdown_minutes.as_str()),
            ("countdown_seconds", self.countdown_seconds.as_str()),
        ]
    }
}

/// State class names toggled on elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Classes {
    pub slide_visible: String,
    pub indicator_active: String,
    pub caption_active: String,
    pub header_scrolled: String,
    pub header_solid: String,
    pub revealed: String,
    pub back_to_top_shown: String,
}

impl Default for Classes {
    fn default() -> Self {
        Self {
            slide_visible: "visible".to_string(),
            indicator_active: "active".to_string(),
            caption_active: "fade-in".to_string(),
            header_scrolled: "scrolled".to_string(),
            header_solid: "solid".to_string(),
            revealed: "in-view".to_string(),
            back_to_top_shown: "show".to_string(),
        }
    }
}

impl Classes {
    fn entries(&self) -> [(&'static str, &str); 7] {
        [
            ("slide_visible", self.slide_visible.as_str()),
            ("indicator_active", self.indicator_active.as_str()),
            ("caption_active", self.caption_active.as_str()),
            ("header_scrolled", self.header_scrolled.as_str()),
            ("header_solid", self.header_solid.as_str()),
            ("revealed", self.revealed.as_str()),
            ("back_to_top_shown", self.back_to_top_shown.as_str()),
        ]
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(BehaviorConfig::default()).expect("default config must serialize")
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

/// Parse TOML source text into a raw overlay value.
pub fn parse_overlay(source: &str) -> Result<toml::Value, ConfigError> {
    Ok(toml::from_str(source)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BehaviorConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BehaviorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Resolve an inline overlay (the page's config block) over stock defaults.
///
/// A broken overlay must not disable the page, so any parse or validation
/// error is logged and the stock defaults are used instead.
pub fn inline_config(source: Option<&str>) -> BehaviorConfig {
    let resolved = source
        .map(parse_overlay)
        .transpose()
        .and_then(|overlay| resolve_config(stock_defaults_value(), overlay));
    match resolved {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(%err, "ignoring inline config, using defaults");
            BehaviorConfig::default()
        }
    }
}

/// Load a config file, merged over stock defaults and validated.
///
/// `None` yields the validated defaults.
pub fn load_config(path: Option<&Path>) -> Result<BehaviorConfig, ConfigError> {
    let overlay = match path {
        Some(path) => Some(parse_overlay(&fs::read_to_string(path)?)?),
        None => None,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Stagehand Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Hero slideshow
# ---------------------------------------------------------------------------
[slideshow]
# Milliseconds between automatic advances. Hovering the slideshow or hiding
# the tab pauses it.
interval_ms = 5000

# ---------------------------------------------------------------------------
# Header states
# ---------------------------------------------------------------------------
[header]
# "scrolled" class once the page is scrolled past this many pixels.
scrolled_offset = 24.0

# Height of the fixed header in pixels. The header turns "solid" once the
# hero is entirely hidden behind it.
solid_margin_top = 72

# ---------------------------------------------------------------------------
# Timeline reveal
# ---------------------------------------------------------------------------
[timeline]
# Fraction of a timeline item that must be visible before it is revealed.
reveal_threshold = 0.22

# ---------------------------------------------------------------------------
# Back-to-top button
# ---------------------------------------------------------------------------
[back_to_top]
# Button is shown once the page is scrolled past this many pixels.
show_offset = 320.0

# ---------------------------------------------------------------------------
# Countdown
# ---------------------------------------------------------------------------
[countdown]
# Milliseconds between re-renders.
tick_ms = 1000

# Target used when the countdown element has no date attribute.
# RFC 3339 recommended; dates without an offset are read as UTC.
# target = "2026-11-12T09:00:00+01:00"

# ---------------------------------------------------------------------------
# Markup hooks (CSS selectors)
# ---------------------------------------------------------------------------
[selectors]
slideshow = ".hero-slideshow"
slides = ".hero-slideshow .slide"
indicators = ".carousel-indicators .dot"
captions = ".hero-inner .hero-text"
header = "#pageHeader, .top-header"
banner = ".page-banner"
timeline_items = ".overview-timeline .timeline-item"
menu_roots = ".nav-center .has-submenu"
menu_toggle = ".nav-link"            # relative to a menu root
submenu = ".submenu"                 # relative to a menu root
submenu_focusable = "a, button"      # relative to the submenu
back_to_top = "#backToTop"
contact_link = 'nav a[href="#contact"]'
contact_section = "#contact"
countdown = ".countdown"
countdown_days = '[data-unit="days"]'
countdown_hours = '[data-unit="hours"]'
countdown_minutes = '[data-unit="minutes"]'
countdown_seconds = '[data-unit="seconds"]'
countdown_date_attribute = "data-date"

# ---------------------------------------------------------------------------
# State classes
# ---------------------------------------------------------------------------
[classes]
slide_visible = "visible"
indicator_active = "active"
caption_active = "fade-in"
header_scrolled = "scrolled"
header_solid = "solid"
revealed = "in-view"
back_to_top_shown = "show"
"##
}
