//! Hero slideshow.
//!
//! Three parallel sequences share one current index: slides, indicator
//! dots, and caption blocks. [`Slideshow::set_slide`] is the only place
//! that mutates their presentation, so exactly one triple is active after
//! every call:
//!
//! | Element | Active | Inactive |
//! |---------|--------|----------|
//! | slide | `.visible`, `aria-hidden="false"` | `aria-hidden="true"` |
//! | indicator | `.active` | none |
//! | caption | `.fade-in`, shown, `aria-hidden="false"` | `hidden`, `aria-hidden="true"` |
//!
//! The auto-advance timer is owned here too. [`Slideshow::start`] always
//! clears the previous timer before arming a new one, so repeated starts
//! (hover out, indicator clicks, tab re-shown) never stack intervals. A
//! single slide never gets a timer.

use crate::config::BehaviorConfig;
use crate::dom::{Document, Runtime, TimerId};

/// Normalize any signed index into `0..total`.
///
/// `total` must be non-zero.
pub fn wrap_index(index: i64, total: usize) -> usize {
    index.rem_euclid(total as i64) as usize
}

/// Parse an indicator's `data-index`. Anything but an integer is ignored.
pub fn parse_indicator_index(raw: Option<&str>) -> Option<i64> {
    raw?.trim().parse().ok()
}

#[derive(Debug, Clone)]
struct SlideClasses {
    visible: String,
    active: String,
    caption: String,
}

#[derive(Debug)]
pub struct Slideshow<E> {
    container: Option<E>,
    slides: Vec<E>,
    indicators: Vec<E>,
    captions: Vec<E>,
    current: usize,
    timer: Option<TimerId>,
    interval_ms: u32,
    classes: SlideClasses,
}

impl<E: Clone + PartialEq> Slideshow<E> {
    /// Find the slideshow, show the first slide and start auto-advance.
    ///
    /// Returns `None` when the page has no slides.
    pub fn mount<D, R>(doc: &D, runtime: &mut R, config: &BehaviorConfig) -> Option<Self>
    where
        D: Document<Element = E>,
        R: Runtime<E>,
    {
        let slides = doc.query_all(&config.selectors.slides);
        if slides.is_empty() {
            return None;
        }
        let container = doc.query(&config.selectors.slideshow);
        if let Some(container) = &container {
            // Arrow keys need a focusable target.
            doc.set_attribute(container, "tabindex", "-1");
        }

        let mut slideshow = Self {
            container,
            slides,
            indicators: doc.query_all(&config.selectors.indicators),
            captions: doc.query_all(&config.selectors.captions),
            current: 0,
            timer: None,
            interval_ms: config.slideshow.interval_ms,
            classes: SlideClasses {
                visible: config.classes.slide_visible.clone(),
                active: config.classes.indicator_active.clone(),
                caption: config.classes.caption_active.clone(),
            },
        };
        tracing::debug!(
            slides = slideshow.slides.len(),
            indicators = slideshow.indicators.len(),
            captions = slideshow.captions.len(),
            "slideshow mounted"
        );
        slideshow.set_slide(doc, 0);
        slideshow.start(runtime);
        Some(slideshow)
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn container(&self) -> Option<&E> {
        self.container.as_ref()
    }

    /// Activate the slide at `index` (wrapped into range).
    pub fn set_slide<D: Document<Element = E>>(&mut self, doc: &D, index: i64) {
        if self.slides.is_empty() {
            return;
        }
        let next = wrap_index(index, self.slides.len());

        for (i, slide) in self.slides.iter().enumerate() {
            let active = i == next;
            doc.set_class(slide, &self.classes.visible, active);
            doc.set_attribute(slide, "aria-hidden", aria_hidden(active));
        }
        for (i, dot) in self.indicators.iter().enumerate() {
            doc.set_class(dot, &self.classes.active, i == next);
        }
        for (i, caption) in self.captions.iter().enumerate() {
            let active = i == next;
            doc.set_hidden(caption, !active);
            doc.set_attribute(caption, "aria-hidden", aria_hidden(active));
            doc.set_class(caption, &self.classes.caption, active);
        }

        self.current = next;
    }

    pub fn next<D: Document<Element = E>>(&mut self, doc: &D) {
        self.set_slide(doc, self.current as i64 + 1);
    }

    pub fn prev<D: Document<Element = E>>(&mut self, doc: &D) {
        self.set_slide(doc, self.current as i64 - 1);
    }

    /// (Re)arm auto-advance. Clears any running timer first.
    pub fn start<R: Runtime<E>>(&mut self, runtime: &mut R) {
        self.stop(runtime);
        if self.slides.len() > 1 {
            self.timer = Some(runtime.set_interval(self.interval_ms));
        }
    }

    pub fn stop<R: Runtime<E>>(&mut self, runtime: &mut R) {
        if let Some(timer) = self.timer.take() {
            runtime.clear_interval(timer);
        }
    }

    /// Advance if `timer` is ours. Returns whether it was.
    pub fn on_tick<D: Document<Element = E>>(&mut self, doc: &D, timer: TimerId) -> bool {
        if self.timer != Some(timer) {
            return false;
        }
        self.next(doc);
        true
    }

    /// Position of the indicator containing `target`, if any.
    pub fn indicator_containing<D: Document<Element = E>>(
        &self,
        doc: &D,
        target: &E,
    ) -> Option<usize> {
        self.indicators
            .iter()
            .position(|dot| doc.contains(dot, target))
    }

    /// Jump to the slide named by an indicator's `data-index` and restart
    /// the timer. A dot without the attribute stands for its own position;
    /// malformed indices change nothing.
    pub fn activate_indicator<D, R>(&mut self, doc: &D, runtime: &mut R, position: usize) -> bool
    where
        D: Document<Element = E>,
        R: Runtime<E>,
    {
        let Some(dot) = self.indicators.get(position) else {
            return false;
        };
        let raw = doc.attribute(dot, "data-index");
        let index = match raw.as_deref() {
            None => Some(position as i64),
            Some(value) => parse_indicator_index(Some(value)),
        };
        match index {
            Some(index) => {
                self.set_slide(doc, index);
                self.start(runtime);
                true
            }
            None => {
                tracing::warn!(?raw, "ignoring indicator with malformed data-index");
                false
            }
        }
    }

    /// True if `target` is inside the slideshow container.
    pub fn contains<D: Document<Element = E>>(&self, doc: &D, target: &E) -> bool {
        self.container
            .as_ref()
            .is_some_and(|container| doc.contains(container, target))
    }
}

fn aria_hidden(active: bool) -> &'static str {
    if active { "false" } else { "true" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Layout, ManualRuntime, MemoryDocument, NodeId};
    use crate::test_helpers::marked_positions;
    use proptest::prelude::*;

    fn mounted(slides: usize) -> (MemoryDocument, ManualRuntime<NodeId>, Slideshow<NodeId>) {
        let layout = Layout {
            slides,
            ..Layout::default()
        };
        let doc = MemoryDocument::from_layout(&layout);
        let mut rt = ManualRuntime::new(0.0);
        let show = Slideshow::mount(&doc, &mut rt, &BehaviorConfig::default()).unwrap();
        (doc, rt, show)
    }

    fn active_slides(doc: &MemoryDocument) -> Vec<usize> {
        marked_positions(doc, ".slide", "visible")
    }

    #[test]
    fn wrap_index_handles_negative_and_overflow() {
        assert_eq!(wrap_index(-1, 3), 2);
        assert_eq!(wrap_index(3, 3), 0);
        assert_eq!(wrap_index(-7, 3), 2);
        assert_eq!(wrap_index(1, 3), 1);
    }

    #[test]
    fn parse_indicator_index_rejects_garbage() {
        assert_eq!(parse_indicator_index(Some("2")), Some(2));
        assert_eq!(parse_indicator_index(Some(" -1 ")), Some(-1));
        assert_eq!(parse_indicator_index(Some("two")), None);
        assert_eq!(parse_indicator_index(Some("")), None);
        assert_eq!(parse_indicator_index(None), None);
    }

    #[test]
    fn mount_shows_first_slide_and_starts() {
        let (doc, rt, show) = mounted(3);
        assert_eq!(show.current(), 0);
        assert_eq!(active_slides(&doc), vec![0]);
        assert!(show.is_running());
        assert_eq!(rt.active_timers(), 1);
        let container = show.container().copied().unwrap();
        assert_eq!(doc.attribute(&container, "tabindex").as_deref(), Some("-1"));
    }

    #[test]
    fn mount_without_slides_is_none() {
        let layout = Layout {
            slides: 0,
            ..Layout::default()
        };
        let doc = MemoryDocument::from_layout(&layout);
        let mut rt = ManualRuntime::new(0.0);
        assert!(Slideshow::mount(&doc, &mut rt, &BehaviorConfig::default()).is_none());
        assert_eq!(rt.active_timers(), 0);
    }

    #[test]
    fn single_slide_never_starts_timer() {
        let (_doc, mut rt, mut show) = mounted(1);
        assert!(!show.is_running());
        show.start(&mut rt);
        show.start(&mut rt);
        assert_eq!(rt.active_timers(), 0);
    }

    #[test]
    fn repeated_start_keeps_one_timer() {
        let (_doc, mut rt, mut show) = mounted(3);
        for _ in 0..10 {
            show.start(&mut rt);
        }
        assert_eq!(rt.active_timers(), 1);
        show.stop(&mut rt);
        assert_eq!(rt.active_timers(), 0);
        show.stop(&mut rt);
        assert!(!show.is_running());
    }

    #[test]
    fn set_slide_negative_selects_last() {
        let (doc, _rt, mut show) = mounted(3);
        show.set_slide(&doc, -1);
        assert_eq!(show.current(), 2);
        assert_eq!(active_slides(&doc), vec![2]);
    }

    #[test]
    fn captions_and_indicators_follow_slide() {
        let (doc, _rt, mut show) = mounted(3);
        show.set_slide(&doc, 1);
        let dots = doc.query_all(".dot");
        let captions = doc.query_all(".hero-text");
        assert!(doc.has_class(&dots[1], "active"));
        assert!(!doc.has_class(&dots[0], "active"));
        assert!(!doc.is_hidden(captions[1]));
        assert!(doc.is_hidden(captions[0]));
        assert_eq!(doc.attribute(&captions[2], "aria-hidden").as_deref(), Some("true"));
        assert!(doc.has_class(&captions[1], "fade-in"));
    }

    #[test]
    fn tick_advances_only_for_own_timer() {
        let (doc, mut rt, mut show) = mounted(3);
        assert!(!show.on_tick(&doc, TimerId(999)));
        let id = rt.fire_next_due(5000.0).unwrap();
        assert!(show.on_tick(&doc, id));
        assert_eq!(show.current(), 1);
    }

    #[test]
    fn malformed_indicator_is_ignored() {
        let (doc, mut rt, mut show) = mounted(3);
        let dots = doc.query_all(".dot");
        doc.set_attribute(&dots[2], "data-index", "last");
        assert!(!show.activate_indicator(&doc, &mut rt, 2));
        assert_eq!(show.current(), 0);
        assert!(show.activate_indicator(&doc, &mut rt, 1));
        assert_eq!(show.current(), 1);
    }

    #[test]
    fn indicator_without_index_uses_its_position() {
        let doc = MemoryDocument::new();
        let hero = doc.append(doc.body(), "section", &["hero-slideshow"]);
        let row = doc.append(hero, "div", &["carousel-indicators"]);
        for _ in 0..3 {
            doc.append(hero, "div", &["slide"]);
            doc.append(row, "button", &["dot"]);
        }
        let mut rt = ManualRuntime::new(0.0);
        let mut show = Slideshow::mount(&doc, &mut rt, &BehaviorConfig::default()).unwrap();

        assert!(show.activate_indicator(&doc, &mut rt, 2));
        assert_eq!(show.current(), 2);
        assert_eq!(active_slides(&doc), vec![2]);
        assert_eq!(rt.active_timers(), 1);
    }

    proptest! {
        #[test]
        fn exactly_one_slide_active(total in 2usize..8, index in -50i64..50) {
            let (doc, _rt, mut show) = mounted(total);
            show.set_slide(&doc, index);
            let expected = index.rem_euclid(total as i64) as usize;
            prop_assert_eq!(active_slides(&doc), vec![expected]);
            let hidden: Vec<bool> = doc
                .query_all(".slide")
                .iter()
                .map(|s| doc.attribute(s, "aria-hidden").as_deref() == Some("true"))
                .collect();
            prop_assert_eq!(hidden.iter().filter(|h| !**h).count(), 1);
        }

        #[test]
        fn next_then_prev_is_identity(total in 1usize..8, start in 0i64..8) {
            let (doc, _rt, mut show) = mounted(total);
            show.set_slide(&doc, start);
            let before = show.current();
            show.next(&doc);
            show.prev(&doc);
            prop_assert_eq!(show.current(), before);
        }
    }
}
