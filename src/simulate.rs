//! Scripted runs against the headless page.
//!
//! A [`Simulation`] owns a [`Site`] mounted on a [`MemoryDocument`] and a
//! [`ManualRuntime`], and plays the browser's part: it moves the viewport,
//! delivers pointer and keyboard events, reports intersections and advances
//! the clock. [`Script`]s describe a run in TOML:
//!
//! ```toml
//! start = "2026-11-01T08:00:00Z"
//!
//! [[step]]
//! action = "scroll"
//! y = 400
//!
//! [[step]]
//! action = "click"
//! target = ".has-submenu .nav-link"
//!
//! [[step]]
//! action = "intersect"
//! target = ".timeline-item"
//! ratio = 0.5
//!
//! [[step]]
//! action = "advance"
//! ms = 12000
//! ```
//!
//! Targets are selectors resolved against the document at the time the step
//! runs; the first match is used.

use crate::config::BehaviorConfig;
use crate::countdown::{CountdownError, parse_target};
use crate::dom::{Dispatch, Document, Event, IntersectionEntry, Key, Runtime};
use crate::memory::{Layout, ManualRuntime, MemoryDocument, NodeId};
use crate::site::Site;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulateError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Step {step}: no element matches {selector:?}")]
    NoMatch { step: usize, selector: String },
    #[error("Step {step}: cannot advance the clock by {ms} ms")]
    InvalidAdvance { step: usize, ms: f64 },
    #[error("Invalid script start time: {0}")]
    Start(#[from] CountdownError),
}

/// One scripted interaction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Scroll { y: f64 },
    Click { target: String },
    Key { target: String, key: String },
    PointerEnter { target: String },
    PointerLeave { target: String },
    Hide,
    Show,
    Intersect { target: String, ratio: f64 },
    Advance { ms: f64 },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Wall-clock time the page loads at. Defaults to the Unix epoch.
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_toml(source: &str) -> Result<Self, SimulateError> {
        Ok(toml::from_str(source)?)
    }

    /// Start time in epoch milliseconds.
    pub fn start_ms(&self) -> Result<f64, SimulateError> {
        match &self.start {
            Some(raw) => Ok(parse_target(raw)?.timestamp_millis() as f64),
            None => Ok(0.0),
        }
    }
}

pub struct Simulation {
    site: Site<MemoryDocument, ManualRuntime<NodeId>>,
    config: BehaviorConfig,
}

impl Simulation {
    pub fn new(layout: &Layout, config: &BehaviorConfig, now_ms: f64) -> Self {
        Self::from_document(MemoryDocument::from_layout(layout), config, now_ms)
    }

    pub fn from_document(doc: MemoryDocument, config: &BehaviorConfig, now_ms: f64) -> Self {
        Self {
            site: Site::mount(doc, ManualRuntime::new(now_ms), config),
            config: config.clone(),
        }
    }

    pub fn site(&self) -> &Site<MemoryDocument, ManualRuntime<NodeId>> {
        &self.site
    }

    pub fn document(&self) -> &MemoryDocument {
        self.site.document()
    }

    /// First element matching `selector`.
    pub fn find(&self, selector: &str) -> Option<NodeId> {
        self.document().query(selector)
    }

    /// Dispatch, then report any scroll the handlers caused as a scroll event.
    fn deliver(&mut self, event: Event<NodeId>) -> Dispatch {
        let before = self.document().scroll_y();
        let dispatch = self.site.dispatch(event);
        if self.document().scroll_y() != before {
            self.site.dispatch(Event::Scroll);
        }
        dispatch
    }

    pub fn scroll_to(&mut self, y: f64) {
        self.document().set_scroll_y(y);
        self.site.dispatch(Event::Scroll);
    }

    pub fn click(&mut self, target: NodeId) -> Dispatch {
        self.deliver(Event::Click { target })
    }

    pub fn key(&mut self, target: NodeId, key: Key) -> Dispatch {
        self.deliver(Event::KeyDown { target, key })
    }

    pub fn pointer_enter(&mut self, target: NodeId) {
        self.deliver(Event::PointerEnter { target });
    }

    pub fn pointer_leave(&mut self, target: NodeId) {
        self.deliver(Event::PointerLeave { target });
    }

    pub fn set_page_hidden(&mut self, hidden: bool) {
        self.deliver(Event::VisibilityChange { hidden });
    }

    /// Report that `ratio` of `target` is visible to every observer still
    /// tracking it. Returns how many entries were delivered.
    pub fn intersect(&mut self, target: NodeId, ratio: f64) -> usize {
        let observers = self.site.runtime().observers_of(&target);
        for (observer, options) in &observers {
            let intersecting = if options.threshold > 0.0 {
                ratio >= options.threshold
            } else {
                ratio > 0.0
            };
            self.deliver(Event::Intersection(IntersectionEntry {
                observer: *observer,
                target,
                ratio,
                intersecting,
            }));
        }
        observers.len()
    }

    /// Move the clock forward, firing every interval that falls due in order.
    /// The clock never moves backwards: negative or non-finite spans do nothing.
    pub fn advance(&mut self, ms: f64) -> usize {
        if !ms.is_finite() || ms < 0.0 {
            tracing::warn!(ms, "ignoring clock advance");
            return 0;
        }
        let until = self.site.runtime().now_ms() + ms;
        let mut fired = 0;
        while let Some(timer) = self.site.runtime_mut().fire_next_due(until) {
            self.deliver(Event::Tick(timer));
            fired += 1;
        }
        self.site.runtime_mut().set_now(until);
        fired
    }

    fn resolve(&self, step: usize, selector: &str) -> Result<NodeId, SimulateError> {
        self.find(selector).ok_or_else(|| SimulateError::NoMatch {
            step,
            selector: selector.to_string(),
        })
    }

    pub fn run_step(&mut self, index: usize, step: &Step) -> Result<(), SimulateError> {
        tracing::debug!(index, ?step, "running step");
        match step {
            Step::Scroll { y } => self.scroll_to(*y),
            Step::Click { target } => {
                let target = self.resolve(index, target)?;
                self.click(target);
            }
            Step::Key { target, key } => {
                let target = self.resolve(index, target)?;
                self.key(target, parse_key(key));
            }
            Step::PointerEnter { target } => {
                let target = self.resolve(index, target)?;
                self.pointer_enter(target);
            }
            Step::PointerLeave { target } => {
                let target = self.resolve(index, target)?;
                self.pointer_leave(target);
            }
            Step::Hide => self.set_page_hidden(true),
            Step::Show => self.set_page_hidden(false),
            Step::Intersect { target, ratio } => {
                let target = self.resolve(index, target)?;
                if self.intersect(target, *ratio) == 0 {
                    tracing::debug!(index, "intersect target is not observed");
                }
            }
            Step::Advance { ms } => {
                if !ms.is_finite() || *ms < 0.0 {
                    return Err(SimulateError::InvalidAdvance {
                        step: index,
                        ms: *ms,
                    });
                }
                self.advance(*ms);
            }
        }
        Ok(())
    }

    pub fn run(&mut self, script: &Script) -> Result<(), SimulateError> {
        for (index, step) in script.steps.iter().enumerate() {
            self.run_step(index + 1, step)?;
        }
        tracing::info!(steps = script.steps.len(), "script finished");
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        let doc = self.document();
        let site = &self.site;
        let classes = &self.config.classes;
        let selectors = &self.config.selectors;

        let header = doc.query(&selectors.header).map(|header| HeaderSnapshot {
            scrolled: doc.has_class(&header, &classes.header_scrolled),
            solid: doc.has_class(&header, &classes.header_solid),
        });

        Snapshot {
            now_ms: site.runtime().now_ms(),
            scroll_y: doc.scroll_y(),
            mounted: site.mounted(),
            slideshow: site.slideshow().map(|slideshow| SlideshowSnapshot {
                current: slideshow.current(),
                slides: slideshow.len(),
                running: slideshow.is_running(),
                visible: doc
                    .query_all(&selectors.slides)
                    .iter()
                    .enumerate()
                    .filter(|(_, slide)| doc.has_class(slide, &classes.slide_visible))
                    .map(|(i, _)| i)
                    .collect(),
            }),
            header,
            timeline: site.timeline().map(|timeline| TimelineSnapshot {
                revealed: timeline.revealed(),
                pending: timeline.pending(),
            }),
            submenus: site.submenus().map(|menus| SubmenuSnapshot {
                menus: menus.len(),
                open: menus.open_index(),
            }),
            back_to_top_shown: site
                .back_to_top()
                .map(|control| doc.has_class(control.button(), &classes.back_to_top_shown)),
            countdown: site.countdown().map(|countdown| CountdownSnapshot {
                fields: countdown.remaining().fields(),
                running: countdown.is_running(),
                target_ms: countdown.target_ms(),
            }),
            focused: doc.focused().map(|node| doc.describe(node)),
            scroll_requests: doc.scroll_requests().len(),
            active_timers: site.runtime().active_timers(),
        }
    }
}

/// Accept `"Space"` alongside DOM key names.
fn parse_key(raw: &str) -> Key {
    match raw {
        "Space" => Key::Space,
        other => Key::from_dom(other),
    }
}

/// Serializable view of every component after a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub now_ms: f64,
    pub scroll_y: f64,
    pub mounted: Vec<&'static str>,
    pub slideshow: Option<SlideshowSnapshot>,
    pub header: Option<HeaderSnapshot>,
    pub timeline: Option<TimelineSnapshot>,
    pub submenus: Option<SubmenuSnapshot>,
    pub back_to_top_shown: Option<bool>,
    pub countdown: Option<CountdownSnapshot>,
    pub focused: Option<String>,
    pub scroll_requests: usize,
    pub active_timers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideshowSnapshot {
    pub current: usize,
    pub slides: usize,
    pub running: bool,
    /// Indices of slides carrying the visible class.
    pub visible: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeaderSnapshot {
    pub scrolled: bool,
    pub solid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimelineSnapshot {
    pub revealed: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubmenuSnapshot {
    pub menus: usize,
    pub open: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountdownSnapshot {
    pub fields: [String; 4],
    pub running: bool,
    pub target_ms: Option<i64>,
}
