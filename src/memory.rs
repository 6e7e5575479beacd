//! Headless host: an in-memory document and a manually driven runtime.
//!
//! [`MemoryDocument`] is a plain element tree with just enough DOM
//! semantics for the behaviors: classes, attributes, `hidden`, inline
//! `display`, text, focus and scroll position. Smooth scrolls complete
//! instantly and are recorded as [`ScrollRequest`]s.
//!
//! [`ManualRuntime`] replaces the browser's timers and intersection
//! observers with a virtual clock and an observer registry. Nothing fires
//! on its own; [`Simulation`](crate::simulate::Simulation) advances the
//! clock and delivers intersections explicitly.
//!
//! [`Layout`] describes a conference page in a few fields and
//! [`MemoryDocument::from_layout`] builds the markup the stock selectors
//! expect:
//!
//! ```text
//! body
//! ├── header#pageHeader.top-header
//! │   └── nav > div.nav-center
//! │       ├── div.has-submenu > button.nav-link + ul.submenu > li > a
//! │       └── a.nav-link[href="#contact"]
//! ├── section.hero-slideshow            (or div.page-banner)
//! │   ├── div.slide × N
//! │   ├── div.carousel-indicators > button.dot[data-index] × N
//! │   └── div.hero-inner > div.hero-text × N
//! ├── section.overview-timeline > div.timeline-item × M
//! ├── div.countdown[data-date] > span[data-unit] × 4
//! ├── section#contact
//! └── button#backToTop
//! ```

use crate::dom::{Document, ObserverId, ObserverOptions, Runtime, TimerId};
use crate::selector::{SelectorList, SelectorTree};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;

/// Handle to an element of a [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScrollRequest {
    Top,
    IntoView(NodeId),
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    text: String,
    hidden: bool,
    display: Option<String>,
    offset_top: f64,
}

impl Node {
    fn new(tag: &str, parent: Option<NodeId>) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            parent,
            children: Vec::new(),
            text: String::new(),
            hidden: false,
            display: None,
            offset_top: 0.0,
        }
    }
}

#[derive(Debug)]
struct Tree {
    nodes: Vec<Node>,
    focused: Option<NodeId>,
    scroll_y: f64,
    scroll_requests: Vec<ScrollRequest>,
}

impl SelectorTree for Tree {
    type Node = NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node.0].tag
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].attributes.get(name).map(String::as_str)
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes[node.0].classes.iter().any(|c| c == class)
    }
}

impl Tree {
    /// Descendants of `scope` in document order, excluding `scope`.
    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[scope.0].children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.nodes[node.0].children.iter().rev().copied());
        }
        out
    }

    fn select(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        let list = match SelectorList::parse(selector) {
            Ok(list) => list,
            Err(err) => {
                tracing::warn!(%err, "ignoring invalid selector");
                return Vec::new();
            }
        };
        self.descendants(scope)
            .into_iter()
            .filter(|&node| list.matches(self, node))
            .collect()
    }
}

/// In-memory implementation of [`Document`].
#[derive(Debug)]
pub struct MemoryDocument {
    tree: RefCell<Tree>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// An empty document containing only `<body>`.
    pub fn new() -> Self {
        Self {
            tree: RefCell::new(Tree {
                nodes: vec![Node::new("body", None)],
                focused: None,
                scroll_y: 0.0,
                scroll_requests: Vec::new(),
            }),
        }
    }

    pub fn body(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a new element under `parent` and return its handle.
    pub fn append(&self, parent: NodeId, tag: &str, classes: &[&str]) -> NodeId {
        let mut tree = self.tree.borrow_mut();
        let id = NodeId(tree.nodes.len());
        let mut node = Node::new(tag, Some(parent));
        node.classes = classes.iter().map(|c| c.to_string()).collect();
        tree.nodes.push(node);
        tree.nodes[parent.0].children.push(id);
        id
    }

    /// Set the layout offset [`smooth_scroll_into_view`](Document::smooth_scroll_into_view)
    /// scrolls to.
    pub fn set_offset_top(&self, node: NodeId, offset: f64) {
        self.tree.borrow_mut().nodes[node.0].offset_top = offset;
    }

    /// Move the viewport without emitting anything.
    pub fn set_scroll_y(&self, y: f64) {
        self.tree.borrow_mut().scroll_y = y.max(0.0);
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.tree.borrow().focused
    }

    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.tree.borrow().nodes[node.0].hidden
    }

    pub fn display(&self, node: NodeId) -> Option<String> {
        self.tree.borrow().nodes[node.0].display.clone()
    }

    pub fn text(&self, node: NodeId) -> String {
        self.tree.borrow().nodes[node.0].text.clone()
    }

    pub fn scroll_requests(&self) -> Vec<ScrollRequest> {
        self.tree.borrow().scroll_requests.clone()
    }

    /// Short CSS-like label, e.g. `a.nav-link[href=#program]`.
    pub fn describe(&self, node: NodeId) -> String {
        let tree = self.tree.borrow();
        let n = &tree.nodes[node.0];
        let mut label = n.tag.clone();
        if let Some(id) = n.attributes.get("id") {
            label.push('#');
            label.push_str(id);
        }
        for class in &n.classes {
            label.push('.');
            label.push_str(class);
        }
        if let Some(href) = n.attributes.get("href") {
            label.push_str(&format!("[href={href}]"));
        }
        label
    }

    /// Build the conference page described by `layout`.
    pub fn from_layout(layout: &Layout) -> Self {
        let doc = Self::new();
        let body = doc.body();

        let nav_parent = if layout.header {
            let header = doc.append(body, "header", &["top-header"]);
            doc.set_attribute(&header, "id", "pageHeader");
            doc.append(header, "nav", &[])
        } else {
            doc.append(body, "nav", &[])
        };
        let nav_center = doc.append(nav_parent, "div", &["nav-center"]);
        for menu in &layout.menus {
            let root = doc.append(nav_center, "div", &["has-submenu"]);
            let toggle = doc.append(root, "button", &["nav-link"]);
            doc.set_text(&toggle, &menu.label);
            // Markup ships expanded; mounting must reset it.
            doc.set_attribute(&toggle, "aria-expanded", "true");
            let list = doc.append(root, "ul", &["submenu"]);
            for link in &menu.links {
                let item = doc.append(list, "li", &[]);
                let anchor = doc.append(item, "a", &[]);
                doc.set_attribute(&anchor, "href", &format!("#{}", slug(link)));
                doc.set_text(&anchor, link);
            }
        }
        if layout.contact_link {
            let link = doc.append(nav_center, "a", &["nav-link"]);
            doc.set_attribute(&link, "href", "#contact");
            doc.set_text(&link, "Contact");
        }

        match layout.hero {
            HeroKind::Slideshow => {
                let hero = doc.append(body, "section", &["hero-slideshow"]);
                for i in 0..layout.slides {
                    let slide = doc.append(hero, "div", &["slide"]);
                    doc.set_attribute(&slide, "data-slide", &i.to_string());
                }
                if layout.indicators {
                    let dots = doc.append(hero, "div", &["carousel-indicators"]);
                    for i in 0..layout.slides {
                        let dot = doc.append(dots, "button", &["dot"]);
                        doc.set_attribute(&dot, "data-index", &i.to_string());
                    }
                }
                if layout.captions {
                    let inner = doc.append(hero, "div", &["hero-inner"]);
                    for i in 0..layout.slides {
                        let text = doc.append(inner, "div", &["hero-text"]);
                        doc.set_text(&text, &format!("Slide {}", i + 1));
                    }
                }
            }
            HeroKind::Banner => {
                doc.append(body, "div", &["page-banner"]);
            }
            HeroKind::None => {}
        }

        if layout.timeline_items > 0 {
            let timeline = doc.append(body, "section", &["overview-timeline"]);
            for _ in 0..layout.timeline_items {
                doc.append(timeline, "div", &["timeline-item"]);
            }
        }

        if let Some(date) = &layout.countdown {
            let countdown = doc.append(body, "div", &["countdown"]);
            doc.set_attribute(&countdown, "data-date", date);
            for unit in ["days", "hours", "minutes", "seconds"] {
                let field = doc.append(countdown, "span", &[]);
                doc.set_attribute(&field, "data-unit", unit);
            }
        }

        if layout.contact_section {
            let contact = doc.append(body, "section", &[]);
            doc.set_attribute(&contact, "id", "contact");
            doc.set_offset_top(contact, layout.contact_offset);
        }

        if layout.back_to_top {
            let button = doc.append(body, "button", &[]);
            doc.set_attribute(&button, "id", "backToTop");
        }

        doc
    }
}

fn slug(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

impl Document for MemoryDocument {
    type Element = NodeId;

    fn query(&self, selector: &str) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        tree.select(NodeId(0), selector)
    }

    fn query_in(&self, scope: &NodeId, selector: &str) -> Option<NodeId> {
        let tree = self.tree.borrow();
        tree.select(*scope, selector).into_iter().next()
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let tree = self.tree.borrow();
        (0..tree.nodes.len())
            .map(NodeId)
            .find(|&node| tree.attribute(node, "id") == Some(id))
    }

    fn contains(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        let tree = self.tree.borrow();
        let mut cursor = Some(*node);
        while let Some(current) = cursor {
            if current == *ancestor {
                return true;
            }
            cursor = tree.parent(current);
        }
        false
    }

    fn set_class(&self, element: &NodeId, class: &str, on: bool) {
        let mut tree = self.tree.borrow_mut();
        let classes = &mut tree.nodes[element.0].classes;
        let present = classes.iter().any(|c| c == class);
        if on && !present {
            classes.push(class.to_string());
        } else if !on && present {
            classes.retain(|c| c != class);
        }
    }

    fn has_class(&self, element: &NodeId, class: &str) -> bool {
        SelectorTree::has_class(&*self.tree.borrow(), *element, class)
    }

    fn attribute(&self, element: &NodeId, name: &str) -> Option<String> {
        self.tree.borrow().nodes[element.0].attributes.get(name).cloned()
    }

    fn set_attribute(&self, element: &NodeId, name: &str, value: &str) {
        self.tree.borrow_mut().nodes[element.0]
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn set_hidden(&self, element: &NodeId, hidden: bool) {
        self.tree.borrow_mut().nodes[element.0].hidden = hidden;
    }

    fn set_display(&self, element: &NodeId, value: &str) {
        self.tree.borrow_mut().nodes[element.0].display = Some(value.to_string());
    }

    fn set_text(&self, element: &NodeId, text: &str) {
        self.tree.borrow_mut().nodes[element.0].text = text.to_string();
    }

    fn focus(&self, element: &NodeId) {
        self.tree.borrow_mut().focused = Some(*element);
    }

    fn blur(&self, element: &NodeId) {
        let mut tree = self.tree.borrow_mut();
        if tree.focused == Some(*element) {
            tree.focused = None;
        }
    }

    fn scroll_y(&self) -> f64 {
        self.tree.borrow().scroll_y
    }

    fn smooth_scroll_to_top(&self) {
        let mut tree = self.tree.borrow_mut();
        tree.scroll_y = 0.0;
        tree.scroll_requests.push(ScrollRequest::Top);
    }

    fn smooth_scroll_into_view(&self, element: &NodeId) {
        let mut tree = self.tree.borrow_mut();
        tree.scroll_y = tree.nodes[element.0].offset_top;
        tree.scroll_requests.push(ScrollRequest::IntoView(*element));
    }
}

// ============================================================================
// Layout
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeroKind {
    #[default]
    Slideshow,
    Banner,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuLayout {
    pub label: String,
    #[serde(default)]
    pub links: Vec<String>,
}

/// A conference page described by counts and presence flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Layout {
    pub header: bool,
    pub hero: HeroKind,
    pub slides: usize,
    pub indicators: bool,
    pub captions: bool,
    pub timeline_items: usize,
    pub menus: Vec<MenuLayout>,
    pub back_to_top: bool,
    pub contact_link: bool,
    pub contact_section: bool,
    /// Where the contact section sits, for scroll-into-view.
    pub contact_offset: f64,
    /// Countdown target written to `data-date`; `None` omits the countdown.
    pub countdown: Option<String>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            header: true,
            hero: HeroKind::Slideshow,
            slides: 3,
            indicators: true,
            captions: true,
            timeline_items: 4,
            menus: vec![
                MenuLayout {
                    label: "Conference".to_string(),
                    links: vec!["Program".to_string(), "Speakers".to_string()],
                },
                MenuLayout {
                    label: "Venue".to_string(),
                    links: vec!["Travel".to_string(), "Hotels".to_string()],
                },
            ],
            back_to_top: true,
            contact_link: true,
            contact_section: true,
            contact_offset: 2400.0,
            countdown: Some("2026-11-12T09:00:00Z".to_string()),
        }
    }
}

impl Layout {
    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}

// ============================================================================
// Manual runtime
// ============================================================================

#[derive(Debug, Clone)]
struct Interval {
    period_ms: u32,
    due_ms: f64,
}

#[derive(Debug, Clone)]
struct Observation<E> {
    options: ObserverOptions,
    targets: Vec<E>,
}

/// Virtual-clock implementation of [`Runtime`].
pub struct ManualRuntime<E> {
    now_ms: f64,
    next_id: u32,
    intervals: BTreeMap<TimerId, Interval>,
    observers: BTreeMap<ObserverId, Observation<E>>,
}

impl<E> fmt::Debug for ManualRuntime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualRuntime")
            .field("now_ms", &self.now_ms)
            .field("intervals", &self.intervals.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl<E: Clone + PartialEq> ManualRuntime<E> {
    pub fn new(now_ms: f64) -> Self {
        Self {
            now_ms,
            next_id: 1,
            intervals: BTreeMap::new(),
            observers: BTreeMap::new(),
        }
    }

    pub fn active_timers(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.intervals.contains_key(&id)
    }

    pub fn period(&self, id: TimerId) -> Option<u32> {
        self.intervals.get(&id).map(|i| i.period_ms)
    }

    /// Observers currently tracking `target`.
    pub fn observers_of(&self, target: &E) -> Vec<(ObserverId, ObserverOptions)> {
        self.observers
            .iter()
            .filter(|(_, obs)| obs.targets.contains(target))
            .map(|(id, obs)| (*id, obs.options.clone()))
            .collect()
    }

    pub fn is_observed(&self, target: &E) -> bool {
        self.observers.values().any(|obs| obs.targets.contains(target))
    }

    /// Pop the earliest interval due at or before `until_ms`, move the
    /// clock to its due time and re-arm it.
    pub fn fire_next_due(&mut self, until_ms: f64) -> Option<TimerId> {
        let (id, due) = self
            .intervals
            .iter()
            .filter(|(_, interval)| interval.due_ms <= until_ms)
            .min_by(|a, b| a.1.due_ms.total_cmp(&b.1.due_ms).then(a.0.cmp(b.0)))
            .map(|(id, interval)| (*id, interval.due_ms))?;
        self.now_ms = due;
        if let Some(interval) = self.intervals.get_mut(&id) {
            interval.due_ms += f64::from(interval.period_ms);
        }
        Some(id)
    }

    pub fn set_now(&mut self, now_ms: f64) {
        self.now_ms = now_ms;
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl<E: Clone + PartialEq> Runtime<E> for ManualRuntime<E> {
    fn now_ms(&self) -> f64 {
        self.now_ms
    }

    fn set_interval(&mut self, period_ms: u32) -> TimerId {
        let id = TimerId(self.allocate_id());
        self.intervals.insert(
            id,
            Interval {
                period_ms,
                due_ms: self.now_ms + f64::from(period_ms),
            },
        );
        id
    }

    fn clear_interval(&mut self, id: TimerId) {
        self.intervals.remove(&id);
    }

    fn observe(&mut self, targets: &[E], options: &ObserverOptions) -> ObserverId {
        let id = ObserverId(self.allocate_id());
        self.observers.insert(
            id,
            Observation {
                options: options.clone(),
                targets: targets.to_vec(),
            },
        );
        id
    }

    fn unobserve(&mut self, observer: ObserverId, target: &E) {
        if let Some(obs) = self.observers.get_mut(&observer) {
            obs.targets.retain(|t| t != target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_follows_document_order() {
        let doc = MemoryDocument::from_layout(&Layout::default());
        let slides = doc.query_all(".hero-slideshow .slide");
        assert_eq!(slides.len(), 3);
        assert!(slides.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn query_in_is_scoped() {
        let doc = MemoryDocument::from_layout(&Layout::default());
        let roots = doc.query_all(".nav-center .has-submenu");
        assert_eq!(roots.len(), 2);
        let first_link = doc.query_in(&roots[1], "a, button").unwrap();
        assert_eq!(doc.text(first_link), "Venue");
    }

    #[test]
    fn attribute_selector_finds_contact_link() {
        let doc = MemoryDocument::from_layout(&Layout::default());
        let link = doc.query(r##"nav a[href="#contact"]"##).unwrap();
        assert_eq!(doc.describe(link), "a.nav-link[href=#contact]");
        assert!(doc.element_by_id("contact").is_some());
    }

    #[test]
    fn invalid_selector_matches_nothing() {
        let doc = MemoryDocument::from_layout(&Layout::default());
        assert!(doc.query("div > .slide").is_none());
    }

    #[test]
    fn contains_is_inclusive() {
        let doc = MemoryDocument::new();
        let outer = doc.append(doc.body(), "div", &[]);
        let inner = doc.append(outer, "span", &[]);
        assert!(doc.contains(&outer, &inner));
        assert!(doc.contains(&inner, &inner));
        assert!(!doc.contains(&inner, &outer));
    }

    #[test]
    fn set_class_is_idempotent() {
        let doc = MemoryDocument::new();
        let el = doc.append(doc.body(), "div", &[]);
        doc.set_class(&el, "show", true);
        doc.set_class(&el, "show", true);
        assert_eq!(doc.describe(el), "div.show");
        doc.set_class(&el, "show", false);
        assert!(!doc.has_class(&el, "show"));
    }

    #[test]
    fn blur_only_clears_own_focus() {
        let doc = MemoryDocument::new();
        let a = doc.append(doc.body(), "a", &[]);
        let b = doc.append(doc.body(), "b", &[]);
        doc.focus(&a);
        doc.blur(&b);
        assert_eq!(doc.focused(), Some(a));
        doc.blur(&a);
        assert_eq!(doc.focused(), None);
    }

    #[test]
    fn smooth_scrolls_are_recorded() {
        let doc = MemoryDocument::from_layout(&Layout::default());
        let contact = doc.element_by_id("contact").unwrap();
        doc.smooth_scroll_into_view(&contact);
        assert_eq!(doc.scroll_y(), 2400.0);
        doc.smooth_scroll_to_top();
        assert_eq!(doc.scroll_y(), 0.0);
        assert_eq!(
            doc.scroll_requests(),
            vec![ScrollRequest::IntoView(contact), ScrollRequest::Top]
        );
    }

    #[test]
    fn layout_without_hero_has_no_slides() {
        let layout = Layout {
            hero: HeroKind::None,
            ..Layout::default()
        };
        let doc = MemoryDocument::from_layout(&layout);
        assert!(doc.query(".hero-slideshow").is_none());
        assert!(doc.query(".page-banner").is_none());
    }

    #[test]
    fn layout_parses_from_toml() {
        let layout = Layout::from_toml(
            r#"
hero = "banner"
slides = 0
countdown = "2027-01-01"

[[menus]]
label = "About"
links = ["Team"]
"#,
        )
        .unwrap();
        assert_eq!(layout.hero, HeroKind::Banner);
        assert_eq!(layout.menus.len(), 1);
        assert_eq!(layout.countdown.as_deref(), Some("2027-01-01"));
        // Unspecified fields keep defaults
        assert!(layout.back_to_top);
    }

    #[test]
    fn layout_rejects_unknown_fields() {
        assert!(Layout::from_toml("slidez = 3\n").is_err());
    }

    #[test]
    fn manual_runtime_fires_in_due_order() {
        let mut rt: ManualRuntime<NodeId> = ManualRuntime::new(0.0);
        let slow = rt.set_interval(5000);
        let fast = rt.set_interval(1000);

        let mut fired = Vec::new();
        while let Some(id) = rt.fire_next_due(5000.0) {
            fired.push(id);
        }
        assert_eq!(fired.iter().filter(|&&id| id == fast).count(), 5);
        assert_eq!(fired.iter().filter(|&&id| id == slow).count(), 1);
        // Ties at 5000ms resolve by creation order
        assert_eq!(&fired[4..], &[slow, fast]);
        assert_eq!(rt.now_ms(), 5000.0);
    }

    #[test]
    fn manual_runtime_clear_and_unobserve() {
        let mut rt: ManualRuntime<NodeId> = ManualRuntime::new(0.0);
        let id = rt.set_interval(10);
        rt.clear_interval(id);
        assert_eq!(rt.active_timers(), 0);
        assert!(rt.fire_next_due(1000.0).is_none());

        let observer = rt.observe(&[NodeId(1), NodeId(2)], &ObserverOptions::with_threshold(0.5));
        rt.unobserve(observer, &NodeId(1));
        assert!(!rt.is_observed(&NodeId(1)));
        assert_eq!(rt.observers_of(&NodeId(2)).len(), 1);
    }
}
