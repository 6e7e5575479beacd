//! Shared test utilities.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = mount_site(&fixture_layout());
//! assert_eq!(marked_positions(site.document(), ".slide", "visible"), vec![0]);
//! ```

use std::path::{Path, PathBuf};

use crate::config::BehaviorConfig;
use crate::dom::Document;
use crate::memory::{Layout, ManualRuntime, MemoryDocument, NodeId};
use crate::site::Site;

pub type TestSite = Site<MemoryDocument, ManualRuntime<NodeId>>;

/// Path of a file under `fixtures/`.
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}

/// The conference page described by `fixtures/layout.toml`.
pub fn fixture_layout() -> Layout {
    let source = std::fs::read_to_string(fixture_path("layout.toml")).unwrap();
    Layout::from_toml(&source).unwrap()
}

/// Mount every behavior on `layout` with stock config at the epoch.
pub fn mount_site(layout: &Layout) -> TestSite {
    Site::mount(
        MemoryDocument::from_layout(layout),
        ManualRuntime::new(0.0),
        &BehaviorConfig::default(),
    )
}

/// Positions, among the elements matching `selector`, of those carrying `class`.
pub fn marked_positions(doc: &MemoryDocument, selector: &str, class: &str) -> Vec<usize> {
    doc.query_all(selector)
        .iter()
        .enumerate()
        .filter(|(_, node)| doc.has_class(node, class))
        .map(|(i, _)| i)
        .collect()
}
