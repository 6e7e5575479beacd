//! # Stagehand
//!
//! Interactive behaviors for a static conference site, written once and run
//! in two hosts: compiled to wasm and mounted in the browser, or driven
//! headlessly by tests and the `stagehand simulate` command.
//!
//! # Behaviors
//!
//! | Module | Behavior |
//! |--------|----------|
//! | [`slideshow`] | Hero slides, indicator dots and captions on a pausable timer |
//! | [`header`] | Header "scrolled" (scroll offset) and "solid" (hero visibility) states |
//! | [`reveal`] | One-shot reveal of timeline items as they scroll into view |
//! | [`submenu`] | Single-open navigation dropdowns with Escape and outside-click dismissal |
//! | [`scroll`] | Back-to-top button and the smooth-scrolling contact link |
//! | [`countdown`] | Days/hours/minutes/seconds to the event |
//!
//! # Plumbing
//!
//! | Module | Role |
//! |--------|------|
//! | [`dom`] | The host seam: `Document` and `Runtime` traits, events, listeners |
//! | [`site`] | Mounts every present behavior and routes events to it |
//! | [`config`] | `stagehand.toml` loading, merging over stock defaults, validation |
//! | [`selector`] | The CSS selector subset used by the headless document and config checks |
//! | [`memory`] | Headless document, page layouts and a manually driven clock |
//! | [`simulate`] | Scripted runs and state snapshots |
//! | [`output`] | CLI output formatting and the HTML run report |
//! | `web` | Browser host over `web-sys` (wasm32 only) |
//! | `logging` | `tracing-subscriber` setup for the CLI (native only) |
//!
//! # Design Decisions
//!
//! ## One Seam, Two Hosts
//!
//! Controllers never name `web_sys` types. They are generic over
//! [`dom::Document`] and [`dom::Runtime`], so the exact code that runs in the
//! browser is the code the test suite exercises against
//! [`memory::MemoryDocument`]. Timers and intersection observers are
//! registrations that hand back ids; their firings come back in as
//! [`dom::Event`]s and are routed by id.
//!
//! ## Absent Markup Is Not an Error
//!
//! A page without a slideshow simply has no slideshow controller. Mounting
//! never fails; malformed data such as a non-numeric indicator index or an
//! unparseable countdown date is logged and ignored.
//!
//! ## State Shaped to Its Invariants
//!
//! - The open submenu is one `Option<usize>`, so two can never be open.
//! - Pending timeline items are a set that only shrinks.
//! - Starting the slideshow always clears its previous timer first.

pub mod config;
pub mod countdown;
pub mod dom;
pub mod header;
pub mod memory;
pub mod output;
pub mod reveal;
pub mod scroll;
pub mod selector;
pub mod simulate;
pub mod site;
pub mod slideshow;
pub mod submenu;

#[cfg(not(target_arch = "wasm32"))]
pub mod logging;

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
pub(crate) mod test_helpers;
