//! One-shot timeline reveal.
//!
//! Every timeline item starts pending and observed. The first time an item
//! is at least `reveal_threshold` visible it gets the revealed class, leaves
//! the pending set and is unobserved. There is no path back: a revealed
//! item is never hidden again nor observed again.

use crate::config::BehaviorConfig;
use crate::dom::{Document, IntersectionEntry, ObserverId, ObserverOptions, Runtime};

/// Hosts report ratios as floats computed from layout rects; an item
/// sitting exactly on the threshold may come back a hair below it.
const RATIO_TOLERANCE: f64 = 1e-3;

#[derive(Debug)]
pub struct TimelineReveal<E> {
    observer: ObserverId,
    pending: Vec<E>,
    revealed: usize,
    threshold: f64,
    class: String,
}

impl<E: Clone + PartialEq> TimelineReveal<E> {
    pub fn mount<D, R>(doc: &D, runtime: &mut R, config: &BehaviorConfig) -> Option<Self>
    where
        D: Document<Element = E>,
        R: Runtime<E>,
    {
        let items = doc.query_all(&config.selectors.timeline_items);
        if items.is_empty() {
            return None;
        }
        let threshold = config.timeline.reveal_threshold;
        let observer = runtime.observe(&items, &ObserverOptions::with_threshold(threshold));
        tracing::debug!(items = items.len(), threshold, "timeline reveal mounted");
        Some(Self {
            observer,
            pending: items,
            revealed: 0,
            threshold,
            class: config.classes.revealed.clone(),
        })
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn revealed(&self) -> usize {
        self.revealed
    }

    /// Reveal the entry's target if it is pending and visible enough.
    /// Returns whether the entry belonged to this observer.
    pub fn on_intersection<D, R>(
        &mut self,
        doc: &D,
        runtime: &mut R,
        entry: &IntersectionEntry<E>,
    ) -> bool
    where
        D: Document<Element = E>,
        R: Runtime<E>,
    {
        if entry.observer != self.observer {
            return false;
        }
        if !entry.intersecting || entry.ratio + RATIO_TOLERANCE < self.threshold {
            return true;
        }
        let Some(position) = self.pending.iter().position(|item| *item == entry.target) else {
            return true;
        };

        let item = self.pending.swap_remove(position);
        doc.set_class(&item, &self.class, true);
        runtime.unobserve(self.observer, &item);
        self.revealed += 1;
        tracing::debug!(pending = self.pending.len(), "timeline item revealed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Layout, ManualRuntime, MemoryDocument, NodeId};

    fn mounted() -> (MemoryDocument, ManualRuntime<NodeId>, TimelineReveal<NodeId>) {
        let doc = MemoryDocument::from_layout(&Layout::default());
        let mut rt = ManualRuntime::new(0.0);
        let reveal = TimelineReveal::mount(&doc, &mut rt, &BehaviorConfig::default()).unwrap();
        (doc, rt, reveal)
    }

    fn entry(observer: ObserverId, target: NodeId, ratio: f64) -> IntersectionEntry<NodeId> {
        IntersectionEntry {
            observer,
            target,
            ratio,
            intersecting: ratio > 0.0,
        }
    }

    #[test]
    fn mount_observes_every_item() {
        let (doc, rt, reveal) = mounted();
        let items = doc.query_all(".timeline-item");
        assert_eq!(reveal.pending(), 4);
        assert!(items.iter().all(|item| rt.is_observed(item)));
        assert_eq!(rt.observers_of(&items[0])[0].1.threshold, 0.22);
    }

    #[test]
    fn below_threshold_does_not_reveal() {
        let (doc, mut rt, mut reveal) = mounted();
        let item = doc.query(".timeline-item").unwrap();
        let observer = reveal.observer;
        assert!(reveal.on_intersection(&doc, &mut rt, &entry(observer, item, 0.1)));
        assert!(!doc.has_class(&item, "in-view"));
        assert!(rt.is_observed(&item));
    }

    #[test]
    fn reveal_is_one_shot() {
        let (doc, mut rt, mut reveal) = mounted();
        let item = doc.query(".timeline-item").unwrap();
        let observer = reveal.observer;

        reveal.on_intersection(&doc, &mut rt, &entry(observer, item, 0.22));
        assert!(doc.has_class(&item, "in-view"));
        assert!(!rt.is_observed(&item));
        assert_eq!(reveal.revealed(), 1);

        // A late duplicate delivery changes nothing.
        reveal.on_intersection(&doc, &mut rt, &entry(observer, item, 0.9));
        assert_eq!(reveal.revealed(), 1);
        assert_eq!(reveal.pending(), 3);

        // Scrolling away never un-reveals.
        reveal.on_intersection(&doc, &mut rt, &entry(observer, item, 0.0));
        assert!(doc.has_class(&item, "in-view"));
    }

    #[test]
    fn foreign_observer_is_ignored() {
        let (doc, mut rt, mut reveal) = mounted();
        let item = doc.query(".timeline-item").unwrap();
        assert!(!reveal.on_intersection(&doc, &mut rt, &entry(ObserverId(999), item, 1.0)));
        assert_eq!(reveal.revealed(), 0);
    }

    #[test]
    fn no_items_mounts_nothing() {
        let layout = Layout {
            timeline_items: 0,
            ..Layout::default()
        };
        let doc = MemoryDocument::from_layout(&layout);
        let mut rt = ManualRuntime::new(0.0);
        assert!(TimelineReveal::mount(&doc, &mut rt, &BehaviorConfig::default()).is_none());
    }
}
