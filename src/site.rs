//! Composition root.
//!
//! [`Site::mount`] builds every behavior whose elements are present on the
//! page and runs their initial renders. Absent elements simply leave the
//! component unmounted; nothing here fails.
//!
//! After mounting, the host attaches one real listener per entry of
//! [`Site::listeners`] and forwards everything to [`Site::dispatch`].
//! Routing is by delegation:
//!
//! | Event | Routed by |
//! |-------|-----------|
//! | click, keydown | containment of the event target |
//! | pointer enter/leave | containment in the slideshow container |
//! | tick | `TimerId` |
//! | intersection | `ObserverId` (each component ignores foreign entries) |

use crate::config::BehaviorConfig;
use crate::countdown::Countdown;
use crate::dom::{Dispatch, Document, Event, EventKind, Key, Listener, Runtime};
use crate::header::{self, ScrollToggle, SolidSwitch};
use crate::reveal::TimelineReveal;
use crate::scroll::{BackToTop, ContactLink};
use crate::slideshow::Slideshow;
use crate::submenu::SubmenuController;

pub struct Site<D: Document, R> {
    doc: D,
    runtime: R,
    slideshow: Option<Slideshow<D::Element>>,
    scrolled: Option<ScrollToggle<D::Element>>,
    solid: Option<SolidSwitch<D::Element>>,
    timeline: Option<TimelineReveal<D::Element>>,
    submenus: Option<SubmenuController<D::Element>>,
    back_to_top: Option<BackToTop<D::Element>>,
    contact: Option<ContactLink<D::Element>>,
    countdown: Option<Countdown<D::Element>>,
}

impl<D, R> Site<D, R>
where
    D: Document,
    R: Runtime<D::Element>,
{
    pub fn mount(doc: D, mut runtime: R, config: &BehaviorConfig) -> Self {
        let slideshow = Slideshow::mount(&doc, &mut runtime, config);
        let scrolled = header::mount_scrolled(&doc, config);
        let solid = SolidSwitch::mount(&doc, &mut runtime, config);
        let timeline = TimelineReveal::mount(&doc, &mut runtime, config);
        let submenus = SubmenuController::mount(&doc, config);
        let back_to_top = BackToTop::mount(&doc, config);
        let contact = ContactLink::mount(&doc, config);
        let countdown = Countdown::mount(&doc, &mut runtime, config);

        let site = Self {
            doc,
            runtime,
            slideshow,
            scrolled,
            solid,
            timeline,
            submenus,
            back_to_top,
            contact,
            countdown,
        };
        tracing::info!(components = ?site.mounted(), "site mounted");
        site
    }

    /// Names of the mounted components, in mount order.
    pub fn mounted(&self) -> Vec<&'static str> {
        [
            ("slideshow", self.slideshow.is_some()),
            ("header_scrolled", self.scrolled.is_some()),
            ("header_solid", self.solid.is_some()),
            ("timeline", self.timeline.is_some()),
            ("submenus", self.submenus.is_some()),
            ("back_to_top", self.back_to_top.is_some()),
            ("contact_link", self.contact.is_some()),
            ("countdown", self.countdown.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }

    /// DOM listeners the host must attach.
    pub fn listeners(&self) -> Vec<Listener<D::Element>> {
        let mut listeners = Vec::new();
        if self.scrolled.is_some() || self.back_to_top.is_some() {
            listeners.push(Listener::window(EventKind::Scroll));
        }
        if self.slideshow.is_some()
            || self.submenus.is_some()
            || self.back_to_top.is_some()
            || self.contact.is_some()
        {
            listeners.push(Listener::document(EventKind::Click));
        }
        if self.slideshow.is_some() || self.submenus.is_some() {
            listeners.push(Listener::document(EventKind::KeyDown));
        }
        if let Some(slideshow) = &self.slideshow {
            if let Some(container) = slideshow.container() {
                listeners.push(Listener::element(container.clone(), EventKind::PointerEnter));
                listeners.push(Listener::element(container.clone(), EventKind::PointerLeave));
            }
            listeners.push(Listener::document(EventKind::VisibilityChange));
        }
        listeners
    }

    pub fn dispatch(&mut self, event: Event<D::Element>) -> Dispatch {
        match event {
            Event::Scroll => {
                self.on_scroll();
                Dispatch::default()
            }
            Event::Click { target } => self.on_click(&target),
            Event::KeyDown { target, key } => self.on_key(&target, &key),
            Event::PointerEnter { target } => {
                if let Some(slideshow) = &mut self.slideshow {
                    if slideshow.contains(&self.doc, &target) {
                        slideshow.stop(&mut self.runtime);
                    }
                }
                Dispatch::default()
            }
            Event::PointerLeave { target } => {
                if let Some(slideshow) = &mut self.slideshow {
                    if slideshow.contains(&self.doc, &target) {
                        slideshow.start(&mut self.runtime);
                    }
                }
                Dispatch::default()
            }
            Event::VisibilityChange { hidden } => {
                if let Some(slideshow) = &mut self.slideshow {
                    if hidden {
                        slideshow.stop(&mut self.runtime);
                    } else {
                        slideshow.start(&mut self.runtime);
                    }
                }
                Dispatch::default()
            }
            Event::Intersection(entry) => {
                let mut handled = false;
                if let Some(solid) = &self.solid {
                    handled |= solid.on_intersection(&self.doc, &entry);
                }
                if let Some(timeline) = &mut self.timeline {
                    handled |= timeline.on_intersection(&self.doc, &mut self.runtime, &entry);
                }
                if !handled {
                    tracing::debug!(
                        observer = ?entry.observer,
                        "intersection for unknown observer"
                    );
                }
                Dispatch::default()
            }
            Event::Tick(timer) => {
                let mut handled = false;
                if let Some(slideshow) = &mut self.slideshow {
                    handled |= slideshow.on_tick(&self.doc, timer);
                }
                if !handled {
                    if let Some(countdown) = &mut self.countdown {
                        handled |= countdown.on_tick(&self.doc, &mut self.runtime, timer);
                    }
                }
                if !handled {
                    tracing::debug!(?timer, "tick for unknown timer");
                }
                Dispatch::default()
            }
        }
    }

    fn on_scroll(&mut self) {
        if let Some(scrolled) = &self.scrolled {
            scrolled.apply(&self.doc);
        }
        if let Some(back_to_top) = &self.back_to_top {
            back_to_top.on_scroll(&self.doc);
        }
    }

    fn on_click(&mut self, target: &D::Element) -> Dispatch {
        let mut dispatch = Dispatch::default();

        if let Some(slideshow) = &mut self.slideshow {
            if let Some(position) = slideshow.indicator_containing(&self.doc, target) {
                slideshow.activate_indicator(&self.doc, &mut self.runtime, position);
            }
        }
        if let Some(submenus) = &mut self.submenus {
            submenus.on_click(&self.doc, target);
        }
        if let Some(back_to_top) = &self.back_to_top {
            if self.doc.contains(back_to_top.button(), target) {
                back_to_top.activate(&self.doc);
            }
        }
        if let Some(contact) = &self.contact {
            if let Some(result) = contact.on_click(&self.doc, target) {
                dispatch = dispatch.merge(result);
            }
        }
        dispatch
    }

    fn on_key(&mut self, target: &D::Element, key: &Key) -> Dispatch {
        let mut dispatch = Dispatch::default();

        if let Some(slideshow) = &mut self.slideshow {
            if key.activates() {
                if let Some(position) = slideshow.indicator_containing(&self.doc, target) {
                    slideshow.activate_indicator(&self.doc, &mut self.runtime, position);
                    // Space would otherwise scroll the page.
                    dispatch = dispatch.merge(Dispatch::prevent_default());
                }
            }
            if slideshow.contains(&self.doc, target) {
                match key {
                    Key::ArrowRight => {
                        slideshow.next(&self.doc);
                        slideshow.start(&mut self.runtime);
                    }
                    Key::ArrowLeft => {
                        slideshow.prev(&self.doc);
                        slideshow.start(&mut self.runtime);
                    }
                    _ => {}
                }
            }
        }

        if *key == Key::Escape {
            if let Some(submenus) = &mut self.submenus {
                if let Some(index) = submenus.root_containing(&self.doc, target) {
                    submenus.escape(&self.doc, index);
                }
            }
        }
        dispatch
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    pub fn slideshow(&self) -> Option<&Slideshow<D::Element>> {
        self.slideshow.as_ref()
    }

    pub fn solid(&self) -> Option<&SolidSwitch<D::Element>> {
        self.solid.as_ref()
    }

    pub fn timeline(&self) -> Option<&TimelineReveal<D::Element>> {
        self.timeline.as_ref()
    }

    pub fn submenus(&self) -> Option<&SubmenuController<D::Element>> {
        self.submenus.as_ref()
    }

    pub fn back_to_top(&self) -> Option<&BackToTop<D::Element>> {
        self.back_to_top.as_ref()
    }

    pub fn contact(&self) -> Option<&ContactLink<D::Element>> {
        self.contact.as_ref()
    }

    pub fn countdown(&self) -> Option<&Countdown<D::Element>> {
        self.countdown.as_ref()
    }

    pub fn header_scrolled(&self) -> Option<&ScrollToggle<D::Element>> {
        self.scrolled.as_ref()
    }
}
