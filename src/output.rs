//! CLI output formatting.
//!
//! Each command has a `format_*` function returning lines for testability
//! and a `print_*` wrapper that writes them to stdout. Format functions are
//! pure: no I/O, no side effects.
//!
//! # Simulation
//!
//! ```text
//! Mounted: slideshow, header_scrolled, header_solid, timeline, submenus, back_to_top,
//!     contact_link, countdown
//! Clock
//!     now: 12000 ms
//!     scroll: 400 px
//! Slideshow
//!     slide 3 of 3 (running)
//! Header
//!     scrolled, solid
//! Timeline
//!     1 revealed, 3 pending
//! Submenus
//!     open: 1 of 2
//! Back to top
//!     shown
//! Countdown
//!     1d 01h 01m 01s (ticking)
//! Focus
//!     a[href=#program]
//! Timers
//!     2 active
//! ```
//!
//! `--html` renders the same snapshot as a standalone Maud page.

use crate::config::BehaviorConfig;
use crate::countdown::Remaining;
use crate::simulate::Snapshot;
use maud::{DOCTYPE, Markup, html};

const UNITS: [&str; 4] = ["days", "hours", "minutes", "seconds"];

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn running(on: bool) -> &'static str {
    if on { "running" } else { "paused" }
}

fn header_flags(scrolled: bool, solid: bool) -> String {
    let flags: Vec<&str> = [("scrolled", scrolled), ("solid", solid)]
        .into_iter()
        .filter_map(|(name, on)| on.then_some(name))
        .collect();
    if flags.is_empty() {
        "plain".to_string()
    } else {
        flags.join(", ")
    }
}

// ============================================================================
// simulate
// ============================================================================

pub fn format_snapshot(snapshot: &Snapshot) -> Vec<String> {
    let mut lines = Vec::new();
    let i = indent(1);

    if snapshot.mounted.is_empty() {
        lines.push("Mounted: nothing".to_string());
    } else {
        lines.push(format!("Mounted: {}", snapshot.mounted.join(", ")));
    }

    lines.push("Clock".to_string());
    lines.push(format!("{i}now: {} ms", snapshot.now_ms));
    lines.push(format!("{i}scroll: {} px", snapshot.scroll_y));

    if let Some(slideshow) = &snapshot.slideshow {
        lines.push("Slideshow".to_string());
        lines.push(format!(
            "{i}slide {} of {} ({})",
            slideshow.current + 1,
            slideshow.slides,
            running(slideshow.running)
        ));
    }
    if let Some(header) = &snapshot.header {
        lines.push("Header".to_string());
        lines.push(format!("{i}{}", header_flags(header.scrolled, header.solid)));
    }
    if let Some(timeline) = &snapshot.timeline {
        lines.push("Timeline".to_string());
        lines.push(format!(
            "{i}{} revealed, {} pending",
            timeline.revealed, timeline.pending
        ));
    }
    if let Some(submenus) = &snapshot.submenus {
        lines.push("Submenus".to_string());
        match submenus.open {
            Some(open) => lines.push(format!("{i}open: {} of {}", open + 1, submenus.menus)),
            None => lines.push(format!("{i}all {} closed", submenus.menus)),
        }
    }
    if let Some(shown) = snapshot.back_to_top_shown {
        lines.push("Back to top".to_string());
        lines.push(format!("{i}{}", if shown { "shown" } else { "hidden" }));
    }
    if let Some(countdown) = &snapshot.countdown {
        let [d, h, m, s] = &countdown.fields;
        let state = match (countdown.target_ms, countdown.running) {
            (None, _) => "no target",
            (Some(_), true) => "ticking",
            (Some(_), false) => "stopped",
        };
        lines.push("Countdown".to_string());
        lines.push(format!("{i}{d}d {h}h {m}m {s}s ({state})"));
    }
    if let Some(focused) = &snapshot.focused {
        lines.push("Focus".to_string());
        lines.push(format!("{i}{focused}"));
    }
    lines.push("Timers".to_string());
    lines.push(format!("{i}{} active", snapshot.active_timers));
    lines
}

pub fn print_snapshot(snapshot: &Snapshot) {
    for line in format_snapshot(snapshot) {
        println!("{}", line);
    }
}

/// Standalone HTML page describing a snapshot.
pub fn render_html_report(title: &str, snapshot: &Snapshot) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                title { (title) }
            }
            body {
                h1 { (title) }
                p { "Mounted: " (snapshot.mounted.join(", ")) }
                table {
                    tr { th { "Clock" } td { (snapshot.now_ms) " ms" } }
                    tr { th { "Scroll" } td { (snapshot.scroll_y) " px" } }
                    @if let Some(slideshow) = &snapshot.slideshow {
                        tr {
                            th { "Slideshow" }
                            td {
                                "slide " (slideshow.current + 1) " of " (slideshow.slides)
                                " (" (running(slideshow.running)) ")"
                            }
                        }
                    }
                    @if let Some(header) = &snapshot.header {
                        tr { th { "Header" } td { (header_flags(header.scrolled, header.solid)) } }
                    }
                    @if let Some(timeline) = &snapshot.timeline {
                        tr {
                            th { "Timeline" }
                            td { (timeline.revealed) " revealed, " (timeline.pending) " pending" }
                        }
                    }
                    @if let Some(submenus) = &snapshot.submenus {
                        tr {
                            th { "Submenus" }
                            td {
                                @match submenus.open {
                                    Some(open) => { "open: " (open + 1) " of " (submenus.menus) }
                                    None => { "all closed" }
                                }
                            }
                        }
                    }
                    @if let Some(shown) = snapshot.back_to_top_shown {
                        tr { th { "Back to top" } td { (if shown { "shown" } else { "hidden" }) } }
                    }
                    @if let Some(countdown) = &snapshot.countdown {
                        tr {
                            th { "Countdown" }
                            td.countdown {
                                @for (value, unit) in countdown.fields.iter().zip(UNITS) {
                                    span data-unit=(unit) { (value) }
                                    " "
                                }
                            }
                        }
                    }
                    @if let Some(focused) = &snapshot.focused {
                        tr { th { "Focus" } td { code { (focused) } } }
                    }
                    tr { th { "Timers" } td { (snapshot.active_timers) " active" } }
                }
            }
        }
    }
}

// ============================================================================
// countdown
// ============================================================================

pub fn format_countdown(remaining: &Remaining) -> Vec<String> {
    let [d, h, m, s] = remaining.fields();
    vec![
        format!("days     {d}"),
        format!("hours    {h}"),
        format!("minutes  {m}"),
        format!("seconds  {s}"),
    ]
}

pub fn print_countdown(remaining: &Remaining) {
    for line in format_countdown(remaining) {
        println!("{}", line);
    }
}

// ============================================================================
// check-config
// ============================================================================

pub fn format_config_summary(config: &BehaviorConfig) -> Vec<String> {
    let i = indent(1);
    let mut lines = vec![
        "Config OK".to_string(),
        format!("{i}slideshow interval: {} ms", config.slideshow.interval_ms),
        format!(
            "{i}header: scrolled past {} px, solid below {} px",
            config.header.scrolled_offset, config.header.solid_margin_top
        ),
        format!(
            "{i}timeline reveal at {}% visible",
            config.timeline.reveal_threshold * 100.0
        ),
        format!("{i}back to top past {} px", config.back_to_top.show_offset),
        format!("{i}countdown tick: {} ms", config.countdown.tick_ms),
    ];
    if let Some(target) = &config.countdown.target {
        lines.push(format!("{i}countdown fallback target: {target}"));
    }
    lines
}

pub fn print_config_summary(config: &BehaviorConfig) {
    for line in format_config_summary(config) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Layout;
    use crate::simulate::Simulation;

    fn snapshot() -> Snapshot {
        let mut sim = Simulation::new(&Layout::default(), &BehaviorConfig::default(), 0.0);
        sim.scroll_to(400.0);
        sim.snapshot()
    }

    #[test]
    fn snapshot_lines_cover_every_component() {
        let lines = format_snapshot(&snapshot());
        assert!(lines[0].starts_with("Mounted: slideshow"));
        assert!(lines.contains(&"    slide 1 of 3 (running)".to_string()));
        assert!(lines.contains(&"    scrolled".to_string()));
        assert!(lines.contains(&"    0 revealed, 4 pending".to_string()));
        assert!(lines.contains(&"    all 2 closed".to_string()));
        assert!(lines.contains(&"    shown".to_string()));
        assert_eq!(lines.last().unwrap(), "    2 active");
    }

    #[test]
    fn empty_page_prints_nothing_mounted() {
        let sim = Simulation::from_document(
            crate::memory::MemoryDocument::new(),
            &BehaviorConfig::default(),
            0.0,
        );
        let lines = format_snapshot(&sim.snapshot());
        assert_eq!(lines[0], "Mounted: nothing");
        assert!(!lines.iter().any(|l| l == "Slideshow"));
    }

    #[test]
    fn countdown_lines_pad_all_but_days() {
        let lines = format_countdown(&Remaining::between(90_061_000, 0));
        assert_eq!(lines[0], "days     1");
        assert_eq!(lines[3], "seconds  01");
    }

    #[test]
    fn html_report_is_a_document() {
        let html = render_html_report("Run", &snapshot()).into_string();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Run</h1>"));
        assert!(html.contains(r#"data-unit="seconds""#));
    }

    #[test]
    fn config_summary_mentions_fallback_target() {
        let mut config = BehaviorConfig::default();
        config.countdown.target = Some("2027-01-01".to_string());
        let lines = format_config_summary(&config);
        assert_eq!(lines[0], "Config OK");
        assert!(lines.iter().any(|l| l.contains("2027-01-01")));
    }
}
