//! Countdown to a fixed target time.
//!
//! The target is read once at mount from the container's date attribute,
//! falling back to `[countdown] target`. The rendered value is a pure
//! function of `max(0, target - now)`, so it never goes negative, and the
//! timer is dropped once it reaches zero.
//!
//! A missing or unparseable target freezes the display at `0/00/00/00`
//! with a warning instead of rendering garbage.

use crate::config::BehaviorConfig;
use crate::dom::{Document, Runtime, TimerId};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub const SECOND_MS: i64 = 1000;
pub const MINUTE_MS: i64 = 60 * SECOND_MS;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CountdownError {
    #[error("Invalid countdown target {0:?}")]
    InvalidTarget(String),
    #[error("No countdown target: the container has no date and no fallback is configured")]
    MissingTarget,
}

/// Parse a target time. Offsets are honored; naive times are UTC.
pub fn parse_target(raw: &str) -> Result<DateTime<Utc>, CountdownError> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CountdownError::InvalidTarget(raw.to_string()))
}

/// Time left, decomposed for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Remaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Remaining {
    /// Floored at zero: a past target yields all zeros.
    pub fn between(target_ms: i64, now_ms: i64) -> Self {
        let left = (target_ms - now_ms).max(0);
        Self {
            days: left / DAY_MS,
            hours: (left % DAY_MS) / HOUR_MS,
            minutes: (left % HOUR_MS) / MINUTE_MS,
            seconds: (left % MINUTE_MS) / SECOND_MS,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Rendered fields: days unpadded, the rest two digits.
    pub fn fields(&self) -> [String; 4] {
        [
            self.days.to_string(),
            format!("{:02}", self.hours),
            format!("{:02}", self.minutes),
            format!("{:02}", self.seconds),
        ]
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [d, h, m, s] = self.fields();
        write!(f, "{d}d {h}h {m}m {s}s")
    }
}

#[derive(Debug)]
pub struct Countdown<E> {
    /// Days, hours, minutes, seconds. Missing fields are skipped.
    fields: [Option<E>; 4],
    target_ms: Option<i64>,
    remaining: Remaining,
    timer: Option<TimerId>,
}

impl<E: Clone + PartialEq> Countdown<E> {
    pub fn mount<D, R>(doc: &D, runtime: &mut R, config: &BehaviorConfig) -> Option<Self>
    where
        D: Document<Element = E>,
        R: Runtime<E>,
    {
        let selectors = &config.selectors;
        let container = doc.query(&selectors.countdown)?;
        let fields = [
            &selectors.countdown_days,
            &selectors.countdown_hours,
            &selectors.countdown_minutes,
            &selectors.countdown_seconds,
        ]
        .map(|selector| doc.query_in(&container, selector));

        let raw = doc
            .attribute(&container, &selectors.countdown_date_attribute)
            .filter(|raw| !raw.trim().is_empty())
            .or_else(|| config.countdown.target.clone());
        let target = raw
            .ok_or(CountdownError::MissingTarget)
            .and_then(|raw| parse_target(&raw));
        let target_ms = match target {
            Ok(target) => Some(target.timestamp_millis()),
            Err(err) => {
                tracing::warn!(%err, "countdown frozen at zero");
                None
            }
        };

        let mut countdown = Self {
            fields,
            target_ms,
            remaining: Remaining::default(),
            timer: None,
        };
        countdown.render(doc, runtime.now_ms());
        if countdown.target_ms.is_some() && !countdown.remaining.is_zero() {
            countdown.timer = Some(runtime.set_interval(config.countdown.tick_ms));
        }
        tracing::debug!(target_ms = ?countdown.target_ms, "countdown mounted");
        Some(countdown)
    }

    pub fn remaining(&self) -> Remaining {
        self.remaining
    }

    pub fn target_ms(&self) -> Option<i64> {
        self.target_ms
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Recompute and write the fields for `now_ms`.
    pub fn render<D: Document<Element = E>>(&mut self, doc: &D, now_ms: f64) {
        self.remaining = match self.target_ms {
            Some(target) => Remaining::between(target, now_ms.floor() as i64),
            None => Remaining::default(),
        };
        for (field, text) in self.fields.iter().zip(self.remaining.fields()) {
            if let Some(field) = field {
                doc.set_text(field, &text);
            }
        }
    }

    /// Re-render if `timer` is ours, stopping once zero is reached.
    pub fn on_tick<D, R>(&mut self, doc: &D, runtime: &mut R, timer: TimerId) -> bool
    where
        D: Document<Element = E>,
        R: Runtime<E>,
    {
        if self.timer != Some(timer) {
            return false;
        }
        self.render(doc, runtime.now_ms());
        if self.remaining.is_zero() {
            runtime.clear_interval(timer);
            self.timer = None;
            tracing::info!("countdown reached zero");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Layout, ManualRuntime, MemoryDocument, NodeId};

    const TARGET: &str = "2026-11-12T09:00:00Z";

    fn target_ms() -> i64 {
        parse_target(TARGET).unwrap().timestamp_millis()
    }

    fn rendered(doc: &MemoryDocument) -> Vec<String> {
        doc.query_all(".countdown span")
            .into_iter()
            .map(|span| doc.text(span))
            .collect()
    }

    fn mount_at(
        layout: &Layout,
        config: &BehaviorConfig,
        now_ms: i64,
    ) -> (MemoryDocument, ManualRuntime<NodeId>, Countdown<NodeId>) {
        let doc = MemoryDocument::from_layout(layout);
        let mut rt = ManualRuntime::new(now_ms as f64);
        let countdown = Countdown::mount(&doc, &mut rt, config).unwrap();
        (doc, rt, countdown)
    }

    #[test]
    fn decomposes_one_of_each_unit() {
        let remaining = Remaining::between(90_061_000, 0);
        assert_eq!(remaining.fields(), ["1", "01", "01", "01"]);
        assert_eq!(remaining.to_string(), "1d 01h 01m 01s");
    }

    #[test]
    fn past_target_floors_at_zero() {
        let remaining = Remaining::between(1_000, 50_000);
        assert!(remaining.is_zero());
        assert_eq!(remaining.fields(), ["0", "00", "00", "00"]);
    }

    #[test]
    fn days_are_unpadded_and_unbounded() {
        let remaining = Remaining::between(400 * DAY_MS + 5 * SECOND_MS, 0);
        assert_eq!(remaining.fields(), ["400", "00", "00", "05"]);
    }

    #[test]
    fn parse_accepts_common_shapes() {
        let expected = target_ms();
        assert_eq!(parse_target("2026-11-12T10:00:00+01:00").unwrap().timestamp_millis(), expected);
        assert_eq!(parse_target("2026-11-12T09:00:00").unwrap().timestamp_millis(), expected);
        assert_eq!(parse_target("2026-11-12 09:00").unwrap().timestamp_millis(), expected);
        assert_eq!(
            parse_target("2026-11-12").unwrap().timestamp_millis(),
            expected - 9 * HOUR_MS
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            parse_target("next tuesday"),
            Err(CountdownError::InvalidTarget("next tuesday".to_string()))
        );
    }

    #[test]
    fn mount_renders_immediately_and_ticks() {
        let config = BehaviorConfig::default();
        let (doc, mut rt, mut countdown) =
            mount_at(&Layout::default(), &config, target_ms() - 90_061_000);
        assert_eq!(rendered(&doc), ["1", "01", "01", "01"]);
        assert!(countdown.is_running());

        let timer = rt.fire_next_due(f64::MAX).unwrap();
        assert!(countdown.on_tick(&doc, &mut rt, timer));
        assert_eq!(rendered(&doc), ["1", "01", "01", "00"]);
    }

    #[test]
    fn ticking_stops_at_zero() {
        let config = BehaviorConfig::default();
        let (doc, mut rt, mut countdown) =
            mount_at(&Layout::default(), &config, target_ms() - 2_000);

        for _ in 0..2 {
            let timer = rt.fire_next_due(f64::MAX).unwrap();
            countdown.on_tick(&doc, &mut rt, timer);
        }
        assert_eq!(rendered(&doc), ["0", "00", "00", "00"]);
        assert!(!countdown.is_running());
        assert_eq!(rt.active_timers(), 0);
    }

    #[test]
    fn invalid_date_freezes_at_zero() {
        let layout = Layout {
            countdown: Some("soon".to_string()),
            ..Layout::default()
        };
        let (doc, rt, countdown) = mount_at(&layout, &BehaviorConfig::default(), 0);
        assert_eq!(rendered(&doc), ["0", "00", "00", "00"]);
        assert_eq!(countdown.target_ms(), None);
        assert_eq!(rt.active_timers(), 0);
    }

    #[test]
    fn config_target_is_a_fallback() {
        let mut config = BehaviorConfig::default();
        config.countdown.target = Some("2026-11-13T09:00:00Z".to_string());
        let (_, _, with_attribute) = mount_at(&Layout::default(), &config, 0);
        assert_eq!(with_attribute.target_ms(), Some(target_ms()));

        let doc = MemoryDocument::from_layout(&Layout::default());
        let container = doc.query(".countdown").unwrap();
        doc.set_attribute(&container, "data-date", "");
        let mut rt = ManualRuntime::new(0.0);
        let fallback = Countdown::mount(&doc, &mut rt, &config).unwrap();
        assert_eq!(fallback.target_ms(), Some(target_ms() + DAY_MS));
    }

    #[test]
    fn ignores_foreign_ticks() {
        let config = BehaviorConfig::default();
        let (doc, mut rt, mut countdown) = mount_at(&Layout::default(), &config, 0);
        assert!(!countdown.on_tick(&doc, &mut rt, TimerId(999)));
    }
}
