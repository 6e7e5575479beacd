//! Scroll-driven controls: the back-to-top button and the contact link.

use crate::config::BehaviorConfig;
use crate::dom::{Dispatch, Document};
use crate::header::ScrollToggle;

/// Shown past `show_offset`; activating it scrolls home and drops focus.
#[derive(Debug)]
pub struct BackToTop<E> {
    visibility: ScrollToggle<E>,
}

impl<E: Clone + PartialEq> BackToTop<E> {
    pub fn mount<D: Document<Element = E>>(doc: &D, config: &BehaviorConfig) -> Option<Self> {
        let button = doc.query(&config.selectors.back_to_top)?;
        let visibility = ScrollToggle::new(
            button,
            config.classes.back_to_top_shown.as_str(),
            config.back_to_top.show_offset,
        );
        visibility.apply(doc);
        Some(Self { visibility })
    }

    pub fn button(&self) -> &E {
        self.visibility.element()
    }

    pub fn on_scroll<D: Document<Element = E>>(&self, doc: &D) -> bool {
        self.visibility.apply(doc)
    }

    pub fn activate<D: Document<Element = E>>(&self, doc: &D) {
        doc.smooth_scroll_to_top();
        doc.blur(self.button());
    }
}

/// The one navigation link that scrolls instead of jumping.
///
/// Only mounted when both the link and its target section exist, so a
/// page missing either keeps its default anchor navigation.
#[derive(Debug)]
pub struct ContactLink<E> {
    link: E,
    section: E,
}

impl<E: Clone + PartialEq> ContactLink<E> {
    pub fn mount<D: Document<Element = E>>(doc: &D, config: &BehaviorConfig) -> Option<Self> {
        let link = doc.query(&config.selectors.contact_link)?;
        let Some(section) = doc.query(&config.selectors.contact_section) else {
            tracing::debug!("contact link without target section, leaving default navigation");
            return None;
        };
        Some(Self { link, section })
    }

    pub fn link(&self) -> &E {
        &self.link
    }

    /// Handle a click anywhere; only clicks inside the link are taken over.
    pub fn on_click<D: Document<Element = E>>(&self, doc: &D, target: &E) -> Option<Dispatch> {
        if !doc.contains(&self.link, target) {
            return None;
        }
        doc.smooth_scroll_into_view(&self.section);
        Some(Dispatch::prevent_default())
    }
}
