//! Host seam: the document and runtime every behavior is written against.
//!
//! Behaviors never touch `web_sys` directly. They read and mutate the page
//! through [`Document`] and schedule work through [`Runtime`], so the same
//! controller code runs in the browser ([`crate::web`], wasm32 only) and
//! against the headless [`MemoryDocument`](crate::memory::MemoryDocument)
//! used by tests and `stagehand simulate`.
//!
//! Events flow the other way: the host translates whatever it observes
//! (DOM events, timer callbacks, intersection callbacks) into [`Event`]
//! values and hands them to [`Site::dispatch`](crate::site::Site::dispatch).
//! Every handler runs to completion synchronously.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Read/write access to the page structure.
///
/// Methods take `&self`: both hosts mutate through shared handles (the
/// browser DOM, or a `RefCell` in the headless document).
pub trait Document {
    /// Opaque element handle. Cheap to clone, compared by identity.
    type Element: Clone + PartialEq + fmt::Debug;

    /// First element in document order matching `selector`.
    fn query(&self, selector: &str) -> Option<Self::Element>;

    /// All elements in document order matching `selector`.
    fn query_all(&self, selector: &str) -> Vec<Self::Element>;

    /// First descendant of `scope` matching `selector`.
    fn query_in(&self, scope: &Self::Element, selector: &str) -> Option<Self::Element>;

    fn element_by_id(&self, id: &str) -> Option<Self::Element>;

    /// Inclusive containment: an element contains itself.
    fn contains(&self, ancestor: &Self::Element, node: &Self::Element) -> bool;

    fn set_class(&self, element: &Self::Element, class: &str, on: bool);
    fn has_class(&self, element: &Self::Element, class: &str) -> bool;

    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;
    fn set_attribute(&self, element: &Self::Element, name: &str, value: &str);

    /// The `hidden` property.
    fn set_hidden(&self, element: &Self::Element, hidden: bool);

    /// Inline `style.display`.
    fn set_display(&self, element: &Self::Element, value: &str);

    fn set_text(&self, element: &Self::Element, text: &str);

    fn focus(&self, element: &Self::Element);
    fn blur(&self, element: &Self::Element);

    /// Vertical scroll offset of the viewport in CSS pixels.
    fn scroll_y(&self) -> f64;

    /// Animated scroll to the document top.
    fn smooth_scroll_to_top(&self);

    /// Animated scroll bringing `element` into view.
    fn smooth_scroll_into_view(&self, element: &Self::Element);
}

/// Clock, timers and viewport-intersection tracking.
pub trait Runtime<E> {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> f64;

    /// Start a repeating timer. Each firing arrives as [`Event::Tick`].
    fn set_interval(&mut self, period_ms: u32) -> TimerId;

    fn clear_interval(&mut self, id: TimerId);

    /// Track `targets` against the viewport. Changes arrive as
    /// [`Event::Intersection`].
    fn observe(&mut self, targets: &[E], options: &ObserverOptions) -> ObserverId;

    /// Stop tracking one target. Other targets of the observer are unaffected.
    fn unobserve(&mut self, observer: ObserverId, target: &E);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObserverId(pub u32);

/// Mirrors `IntersectionObserverInit`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverOptions {
    /// Fraction of the target's area that must be visible, `0.0..=1.0`.
    pub threshold: f64,
    /// CSS margin applied to the viewport before intersecting.
    pub root_margin: String,
}

impl ObserverOptions {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            root_margin: "0px".to_string(),
        }
    }

    /// Shrink the viewport's top edge by `px`, e.g. to sit below a fixed header.
    pub fn below_top_edge(px: u32) -> Self {
        Self {
            threshold: 0.0,
            root_margin: format!("-{px}px 0px 0px 0px"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry<E> {
    pub observer: ObserverId,
    pub target: E,
    pub ratio: f64,
    pub intersecting: bool,
}

/// Keyboard keys the behaviors react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Enter,
    Space,
    Escape,
    ArrowLeft,
    ArrowRight,
    Other(String),
}

impl Key {
    /// Map a `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Enter" => Key::Enter,
            " " | "Spacebar" => Key::Space,
            "Escape" | "Esc" => Key::Escape,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            other => Key::Other(other.to_string()),
        }
    }

    pub fn activates(&self) -> bool {
        matches!(self, Key::Enter | Key::Space)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event<E> {
    Scroll,
    Click { target: E },
    KeyDown { target: E, key: Key },
    PointerEnter { target: E },
    PointerLeave { target: E },
    VisibilityChange { hidden: bool },
    Intersection(IntersectionEntry<E>),
    Tick(TimerId),
}

/// What the host must do after a dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub default_prevented: bool,
}

impl Dispatch {
    pub fn prevent_default() -> Self {
        Self {
            default_prevented: true,
        }
    }

    pub fn merge(self, other: Dispatch) -> Dispatch {
        Dispatch {
            default_prevented: self.default_prevented || other.default_prevented,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    Scroll,
    Click,
    KeyDown,
    PointerEnter,
    PointerLeave,
    VisibilityChange,
}

impl EventKind {
    /// DOM event type name.
    pub fn dom_name(self) -> &'static str {
        match self {
            EventKind::Scroll => "scroll",
            EventKind::Click => "click",
            EventKind::KeyDown => "keydown",
            EventKind::PointerEnter => "mouseenter",
            EventKind::PointerLeave => "mouseleave",
            EventKind::VisibilityChange => "visibilitychange",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListenerTarget<E> {
    Window,
    Document,
    Element(E),
}

/// One DOM listener a host must attach for the mounted behaviors to work.
#[derive(Debug, Clone, PartialEq)]
pub struct Listener<E> {
    pub target: ListenerTarget<E>,
    pub kind: EventKind,
}

impl<E> Listener<E> {
    pub fn window(kind: EventKind) -> Self {
        Self {
            target: ListenerTarget::Window,
            kind,
        }
    }

    pub fn document(kind: EventKind) -> Self {
        Self {
            target: ListenerTarget::Document,
            kind,
        }
    }

    pub fn element(element: E, kind: EventKind) -> Self {
        Self {
            target: ListenerTarget::Element(element),
            kind,
        }
    }
}
