//! Browser host (wasm32 only).
//!
//! [`WebDocument`] and [`WebRuntime`] implement the host seam over
//! `web-sys`. [`start`] runs when the module is instantiated: it waits for
//! `DOMContentLoaded`, reads the optional inline config block, mounts a
//! [`Site`] and attaches one DOM listener per [`Listener`] it asks for.
//!
//! The mounted site lives in a shared `Rc<RefCell<Option<_>>>`. Every JS
//! callback (DOM events, intervals, intersection observers) holds a `Weak`
//! to it and dispatches through `try_borrow_mut`, so a callback arriving
//! while another dispatch is running is dropped rather than panicking.

use crate::config::{self, BehaviorConfig};
use crate::dom::{
    Dispatch, Document, Event, EventKind, IntersectionEntry, Key, Listener, ListenerTarget,
    ObserverId, ObserverOptions, Runtime, TimerId,
};
use crate::site::Site;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, Element, HtmlElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, KeyboardEvent, ScrollBehavior,
    ScrollIntoViewOptions, ScrollToOptions, Window,
};

/// Id of the optional `<script type="text/toml">` config block.
pub const CONFIG_ELEMENT_ID: &str = "stagehand-config";

type WebSite = Site<WebDocument, WebRuntime>;
type SiteCell = RefCell<Option<WebSite>>;

fn log_js_error(action: &str, result: Result<(), JsValue>) {
    if let Err(err) = result {
        tracing::warn!(action, error = ?err, "DOM call failed");
    }
}

// ============================================================================
// Document
// ============================================================================

pub struct WebDocument {
    window: Window,
    document: web_sys::Document,
}

impl WebDocument {
    pub fn new(window: Window, document: web_sys::Document) -> Self {
        Self { window, document }
    }
}

impl Document for WebDocument {
    type Element = Element;

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            tracing::warn!(selector, "ignoring invalid selector");
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn query_in(&self, scope: &Element, selector: &str) -> Option<Element> {
        scope.query_selector(selector).ok().flatten()
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn contains(&self, ancestor: &Element, node: &Element) -> bool {
        let node: &web_sys::Node = node.as_ref();
        ancestor.contains(Some(node))
    }

    fn set_class(&self, element: &Element, class: &str, on: bool) {
        log_js_error(
            "classList.toggle",
            element.class_list().toggle_with_force(class, on).map(|_| ()),
        );
    }

    fn has_class(&self, element: &Element, class: &str) -> bool {
        element.class_list().contains(class)
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn set_attribute(&self, element: &Element, name: &str, value: &str) {
        log_js_error("setAttribute", element.set_attribute(name, value));
    }

    fn set_hidden(&self, element: &Element, hidden: bool) {
        if let Some(html) = element.dyn_ref::<HtmlElement>() {
            html.set_hidden(hidden);
        }
    }

    fn set_display(&self, element: &Element, value: &str) {
        if let Some(html) = element.dyn_ref::<HtmlElement>() {
            log_js_error("style.display", html.style().set_property("display", value));
        }
    }

    fn set_text(&self, element: &Element, text: &str) {
        element.set_text_content(Some(text));
    }

    fn focus(&self, element: &Element) {
        if let Some(html) = element.dyn_ref::<HtmlElement>() {
            log_js_error("focus", html.focus());
        }
    }

    fn blur(&self, element: &Element) {
        if let Some(html) = element.dyn_ref::<HtmlElement>() {
            log_js_error("blur", html.blur());
        }
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn smooth_scroll_to_top(&self) {
        let options = ScrollToOptions::new();
        options.set_top(0.0);
        options.set_behavior(ScrollBehavior::Smooth);
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn smooth_scroll_into_view(&self, element: &Element) {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        element.scroll_into_view_with_scroll_into_view_options(&options);
    }
}

// ============================================================================
// Runtime
// ============================================================================

struct Interval {
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

struct Observation {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

pub struct WebRuntime {
    window: Window,
    site: Weak<SiteCell>,
    next_id: u32,
    intervals: BTreeMap<TimerId, Interval>,
    /// A timer may clear itself from inside its own callback, so cleared
    /// closures are only dropped on the next `set_interval`.
    retired: Vec<Interval>,
    observers: BTreeMap<ObserverId, Observation>,
}

impl WebRuntime {
    fn new(window: Window, site: Weak<SiteCell>) -> Self {
        Self {
            window,
            site,
            next_id: 1,
            intervals: BTreeMap::new(),
            retired: Vec::new(),
            observers: BTreeMap::new(),
        }
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Runtime<Element> for WebRuntime {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    fn set_interval(&mut self, period_ms: u32) -> TimerId {
        self.retired.clear();
        let id = TimerId(self.allocate_id());
        let site = self.site.clone();
        let callback = Closure::<dyn FnMut()>::new(move || {
            deliver(&site, Event::Tick(id));
        });
        let timeout = i32::try_from(period_ms).unwrap_or(i32::MAX);
        match self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                timeout,
            ) {
            Ok(handle) => {
                self.intervals.insert(
                    id,
                    Interval {
                        handle,
                        _callback: callback,
                    },
                );
            }
            Err(err) => tracing::warn!(error = ?err, "setInterval failed"),
        }
        id
    }

    fn clear_interval(&mut self, id: TimerId) {
        if let Some(interval) = self.intervals.remove(&id) {
            self.window.clear_interval_with_handle(interval.handle);
            self.retired.push(interval);
        }
    }

    fn observe(&mut self, targets: &[Element], options: &ObserverOptions) -> ObserverId {
        let id = ObserverId(self.allocate_id());
        let site = self.site.clone();
        let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let entry: IntersectionObserverEntry = entry.unchecked_into();
                    deliver(
                        &site,
                        Event::Intersection(IntersectionEntry {
                            observer: id,
                            target: entry.target(),
                            ratio: entry.intersection_ratio(),
                            intersecting: entry.is_intersecting(),
                        }),
                    );
                }
            },
        );

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&options.root_margin);
        match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
            Ok(observer) => {
                for target in targets {
                    observer.observe(target);
                }
                self.observers.insert(
                    id,
                    Observation {
                        observer,
                        _callback: callback,
                    },
                );
            }
            Err(err) => tracing::warn!(error = ?err, "IntersectionObserver unavailable"),
        }
        id
    }

    fn unobserve(&mut self, observer: ObserverId, target: &Element) {
        if let Some(observation) = self.observers.get(&observer) {
            observation.observer.unobserve(target);
        }
    }
}

/// Dispatch into the shared site if it is mounted and idle.
fn deliver(site: &Weak<SiteCell>, event: Event<Element>) -> Dispatch {
    let Some(cell) = site.upgrade() else {
        return Dispatch::default();
    };
    let Ok(mut slot) = cell.try_borrow_mut() else {
        tracing::debug!("dropping re-entrant event");
        return Dispatch::default();
    };
    match slot.as_mut() {
        Some(site) => site.dispatch(event),
        None => Dispatch::default(),
    }
}

// ============================================================================
// Startup
// ============================================================================

/// Merge the inline config block, if any, over stock defaults.
fn page_config(document: &web_sys::Document) -> BehaviorConfig {
    let source = document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|element| element.text_content());
    config::inline_config(source.as_deref())
}

fn translate(
    kind: EventKind,
    event: &web_sys::Event,
    document: &web_sys::Document,
) -> Option<Event<Element>> {
    let target = || event.target().and_then(|t| t.dyn_into::<Element>().ok());
    match kind {
        EventKind::Scroll => Some(Event::Scroll),
        EventKind::Click => Some(Event::Click { target: target()? }),
        EventKind::KeyDown => {
            let key = event.dyn_ref::<KeyboardEvent>()?.key();
            Some(Event::KeyDown {
                target: target()?,
                key: Key::from_dom(&key),
            })
        }
        EventKind::PointerEnter => Some(Event::PointerEnter { target: target()? }),
        EventKind::PointerLeave => Some(Event::PointerLeave { target: target()? }),
        EventKind::VisibilityChange => Some(Event::VisibilityChange {
            hidden: document.hidden(),
        }),
    }
}

fn attach(
    window: &Window,
    document: &web_sys::Document,
    site: &Rc<SiteCell>,
    listener: Listener<Element>,
) -> Result<(), JsValue> {
    let weak = Rc::downgrade(site);
    let kind = listener.kind;
    let doc = document.clone();
    let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
        if let Some(translated) = translate(kind, &event, &doc) {
            if deliver(&weak, translated).default_prevented {
                event.prevent_default();
            }
        }
    });

    let target: web_sys::EventTarget = match listener.target {
        ListenerTarget::Window => window.clone().into(),
        ListenerTarget::Document => document.clone().into(),
        ListenerTarget::Element(element) => element.into(),
    };
    let function = callback.as_ref().unchecked_ref();
    if kind == EventKind::Scroll {
        let options = AddEventListenerOptions::new();
        options.set_passive(true);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            kind.dom_name(),
            function,
            &options,
        )?;
    } else {
        target.add_event_listener_with_callback(kind.dom_name(), function)?;
    }
    // Listeners live as long as the page.
    callback.forget();
    Ok(())
}

fn boot(window: Window) -> Result<(), JsValue> {
    let document = window.document().ok_or("no document")?;
    let config = page_config(&document);

    let cell: Rc<SiteCell> = Rc::new(RefCell::new(None));
    let runtime = WebRuntime::new(window.clone(), Rc::downgrade(&cell));
    let site = Site::mount(WebDocument::new(window.clone(), document.clone()), runtime, &config);
    let listeners = site.listeners();
    *cell.borrow_mut() = Some(site);

    for listener in listeners {
        let kind = listener.kind;
        if let Err(err) = attach(&window, &document, &cell, listener) {
            tracing::warn!(event = kind.dom_name(), error = ?err, "could not attach listener");
        }
    }
    // The cell is reachable only through the callbacks' weak handles.
    std::mem::forget(cell);
    Ok(())
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    if document.ready_state() != "loading" {
        return boot(window);
    }

    let on_ready = Closure::<dyn FnMut()>::once(move || {
        if let Err(err) = boot(window) {
            wasm_bindgen::throw_val(err);
        }
    });
    document
        .add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref())?;
    on_ready.forget();
    Ok(())
}
