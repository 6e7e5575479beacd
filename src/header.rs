//! Header presentation states.
//!
//! Two independent flags land on the same header element:
//!
//! - **scrolled**: a pure function of the scroll offset, re-derived on
//!   every scroll event by a [`ScrollToggle`].
//! - **solid**: a pure function of whether the hero is visible below the
//!   fixed header, driven by intersection tracking in [`SolidSwitch`].
//!
//! Neither keeps history and they touch disjoint classes, so the order in
//! which their events arrive never matters.

use crate::config::BehaviorConfig;
use crate::dom::{Document, IntersectionEntry, ObserverId, ObserverOptions, Runtime};

/// A class that is on strictly above a scroll offset and off at or below it.
///
/// Shared by the header's "scrolled" state and the back-to-top button.
#[derive(Debug, Clone)]
pub struct ScrollToggle<E> {
    element: E,
    class: String,
    offset: f64,
}

impl<E> ScrollToggle<E> {
    pub fn new(element: E, class: impl Into<String>, offset: f64) -> Self {
        Self {
            element,
            class: class.into(),
            offset,
        }
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    /// Re-derive the class from the current scroll offset. Returns the new state.
    pub fn apply<D: Document<Element = E>>(&self, doc: &D) -> bool {
        let on = doc.scroll_y() > self.offset;
        doc.set_class(&self.element, &self.class, on);
        on
    }
}

/// Mount the header's "scrolled" toggle and apply it once.
pub fn mount_scrolled<D: Document>(
    doc: &D,
    config: &BehaviorConfig,
) -> Option<ScrollToggle<D::Element>> {
    let header = doc.query(&config.selectors.header)?;
    let toggle = ScrollToggle::new(
        header,
        config.classes.header_scrolled.as_str(),
        config.header.scrolled_offset,
    );
    toggle.apply(doc);
    Some(toggle)
}

#[derive(Debug)]
pub struct SolidSwitch<E> {
    header: E,
    /// `None` when the page has no hero: the header is solid for good.
    tracking: Option<(ObserverId, E)>,
    class: String,
}

impl<E: Clone + PartialEq> SolidSwitch<E> {
    /// Track the hero (slideshow, else banner) below the fixed header.
    pub fn mount<D, R>(doc: &D, runtime: &mut R, config: &BehaviorConfig) -> Option<Self>
    where
        D: Document<Element = E>,
        R: Runtime<E>,
    {
        let header = doc.query(&config.selectors.header)?;
        let class = config.classes.header_solid.clone();
        let hero = doc
            .query(&config.selectors.slideshow)
            .or_else(|| doc.query(&config.selectors.banner));

        let tracking = match hero {
            Some(hero) => {
                let options = ObserverOptions::below_top_edge(config.header.solid_margin_top);
                let observer = runtime.observe(std::slice::from_ref(&hero), &options);
                Some((observer, hero))
            }
            None => {
                tracing::debug!("no hero element, header stays solid");
                doc.set_class(&header, &class, true);
                None
            }
        };

        Some(Self {
            header,
            tracking,
            class,
        })
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.is_some()
    }

    /// Apply an intersection change for the hero. Returns whether the entry
    /// was ours.
    pub fn on_intersection<D: Document<Element = E>>(
        &self,
        doc: &D,
        entry: &IntersectionEntry<E>,
    ) -> bool {
        match &self.tracking {
            Some((observer, hero)) if *observer == entry.observer && *hero == entry.target => {
                doc.set_class(&self.header, &self.class, !entry.intersecting);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{HeroKind, Layout, ManualRuntime, MemoryDocument, NodeId};

    fn header(doc: &MemoryDocument) -> NodeId {
        doc.query("#pageHeader").unwrap()
    }

    #[test]
    fn scrolled_boundary_is_exclusive() {
        let doc = MemoryDocument::from_layout(&Layout::default());
        let toggle = mount_scrolled(&doc, &BehaviorConfig::default()).unwrap();

        doc.set_scroll_y(25.0);
        assert!(toggle.apply(&doc));
        assert!(doc.has_class(&header(&doc), "scrolled"));

        doc.set_scroll_y(24.0);
        assert!(!toggle.apply(&doc));
        assert!(!doc.has_class(&header(&doc), "scrolled"));

        doc.set_scroll_y(0.0);
        assert!(!toggle.apply(&doc));
    }

    #[test]
    fn scrolled_is_applied_at_mount() {
        let doc = MemoryDocument::from_layout(&Layout::default());
        doc.set_scroll_y(400.0);
        mount_scrolled(&doc, &BehaviorConfig::default()).unwrap();
        assert!(doc.has_class(&header(&doc), "scrolled"));
    }

    #[test]
    fn no_header_mounts_nothing() {
        let layout = Layout {
            header: false,
            ..Layout::default()
        };
        let doc = MemoryDocument::from_layout(&layout);
        let mut rt = ManualRuntime::new(0.0);
        let config = BehaviorConfig::default();
        assert!(mount_scrolled(&doc, &config).is_none());
        assert!(SolidSwitch::mount(&doc, &mut rt, &config).is_none());
    }

    #[test]
    fn solid_without_hero_is_permanent() {
        let layout = Layout {
            hero: HeroKind::None,
            ..Layout::default()
        };
        let doc = MemoryDocument::from_layout(&layout);
        let mut rt: ManualRuntime<NodeId> = ManualRuntime::new(0.0);
        let switch = SolidSwitch::mount(&doc, &mut rt, &BehaviorConfig::default()).unwrap();
        assert!(!switch.is_tracking());
        assert!(doc.has_class(&header(&doc), "solid"));
        assert_eq!(rt.observers_of(&header(&doc)).len(), 0);
    }

    #[test]
    fn solid_tracks_banner_when_no_slideshow() {
        let layout = Layout {
            hero: HeroKind::Banner,
            ..Layout::default()
        };
        let doc = MemoryDocument::from_layout(&layout);
        let mut rt = ManualRuntime::new(0.0);
        let switch = SolidSwitch::mount(&doc, &mut rt, &BehaviorConfig::default()).unwrap();
        assert!(switch.is_tracking());
        let banner = doc.query(".page-banner").unwrap();
        let observers = rt.observers_of(&banner);
        assert_eq!(observers.len(), 1);
        assert_eq!(observers[0].1.root_margin, "-72px 0px 0px 0px");
    }

    #[test]
    fn solid_follows_hero_visibility() {
        let doc = MemoryDocument::from_layout(&Layout::default());
        let mut rt = ManualRuntime::new(0.0);
        let switch = SolidSwitch::mount(&doc, &mut rt, &BehaviorConfig::default()).unwrap();
        let hero = doc.query(".hero-slideshow").unwrap();
        let (observer, _) = rt.observers_of(&hero)[0].clone();

        let mut entry = IntersectionEntry {
            observer,
            target: hero,
            ratio: 0.0,
            intersecting: false,
        };
        assert!(switch.on_intersection(&doc, &entry));
        assert!(doc.has_class(&header(&doc), "solid"));

        entry.ratio = 0.4;
        entry.intersecting = true;
        assert!(switch.on_intersection(&doc, &entry));
        assert!(!doc.has_class(&header(&doc), "solid"));
    }

    #[test]
    fn solid_ignores_foreign_entries() {
        let doc = MemoryDocument::from_layout(&Layout::default());
        let mut rt = ManualRuntime::new(0.0);
        let switch = SolidSwitch::mount(&doc, &mut rt, &BehaviorConfig::default()).unwrap();
        let entry = IntersectionEntry {
            observer: ObserverId(999),
            target: header(&doc),
            ratio: 0.0,
            intersecting: false,
        };
        assert!(!switch.on_intersection(&doc, &entry));
        assert!(!doc.has_class(&header(&doc), "solid"));
    }
}
