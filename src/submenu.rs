//! Navigation dropdowns.
//!
//! Each menu root owns a toggle control and a submenu panel. The open menu
//! is a single `Option<usize>` rather than one flag per root, so "at most
//! one open" holds by construction: opening a root first closes whichever
//! one the option points at.
//!
//! Closed: toggle `aria-expanded="false"`, panel `display: none`.
//! Open: toggle `aria-expanded="true"`, panel `display: block`.

use crate::config::BehaviorConfig;
use crate::dom::Document;

#[derive(Debug, Clone)]
struct MenuRoot<E> {
    root: E,
    toggle: E,
    panel: E,
}

#[derive(Debug)]
pub struct SubmenuController<E> {
    roots: Vec<MenuRoot<E>>,
    open: Option<usize>,
    focusable: String,
}

impl<E: Clone + PartialEq> SubmenuController<E> {
    /// Collect menu roots and force every one closed, whatever the markup
    /// says. Roots missing a toggle or panel are skipped.
    pub fn mount<D: Document<Element = E>>(doc: &D, config: &BehaviorConfig) -> Option<Self> {
        let selectors = &config.selectors;
        let roots: Vec<MenuRoot<E>> = doc
            .query_all(&selectors.menu_roots)
            .into_iter()
            .filter_map(|root| {
                let toggle = doc.query_in(&root, &selectors.menu_toggle)?;
                let panel = doc.query_in(&root, &selectors.submenu)?;
                Some(MenuRoot {
                    root,
                    toggle,
                    panel,
                })
            })
            .collect();
        if roots.is_empty() {
            return None;
        }

        let controller = Self {
            roots,
            open: None,
            focusable: selectors.submenu_focusable.clone(),
        };
        for menu in &controller.roots {
            set_expanded(doc, menu, false);
        }
        Some(controller)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn open_index(&self) -> Option<usize> {
        self.open
    }

    pub fn toggle_element(&self, index: usize) -> Option<&E> {
        self.roots.get(index).map(|menu| &menu.toggle)
    }

    /// Open a closed root (closing the open one) or close an open root.
    pub fn toggle<D: Document<Element = E>>(&mut self, doc: &D, index: usize) {
        let Some(menu) = self.roots.get(index) else {
            return;
        };
        if self.open == Some(index) {
            set_expanded(doc, menu, false);
            self.open = None;
            tracing::debug!(index, "submenu closed");
            return;
        }

        if let Some(previous) = self.open.take() {
            set_expanded(doc, &self.roots[previous], false);
        }
        set_expanded(doc, menu, true);
        self.open = Some(index);
        if let Some(first) = doc.query_in(&menu.panel, &self.focusable) {
            doc.focus(&first);
        }
        tracing::debug!(index, "submenu opened");
    }

    /// Escape inside a root: close it and hand focus back to its toggle.
    pub fn escape<D: Document<Element = E>>(&mut self, doc: &D, index: usize) {
        let Some(menu) = self.roots.get(index) else {
            return;
        };
        set_expanded(doc, menu, false);
        if self.open == Some(index) {
            self.open = None;
        }
        doc.focus(&menu.toggle);
    }

    /// Close the open root if `target` lies outside it. Returns whether
    /// anything closed.
    pub fn dismiss_outside<D: Document<Element = E>>(&mut self, doc: &D, target: &E) -> bool {
        let Some(index) = self.open else {
            return false;
        };
        let menu = &self.roots[index];
        if doc.contains(&menu.root, target) {
            return false;
        }
        set_expanded(doc, menu, false);
        self.open = None;
        tracing::debug!(index, "submenu dismissed by outside click");
        true
    }

    /// Route a document click: toggles first, then outside dismissal.
    pub fn on_click<D: Document<Element = E>>(&mut self, doc: &D, target: &E) -> bool {
        match self
            .roots
            .iter()
            .position(|menu| doc.contains(&menu.toggle, target))
        {
            Some(index) => {
                self.toggle(doc, index);
                true
            }
            None => self.dismiss_outside(doc, target),
        }
    }

    /// Index of the root containing `target`.
    pub fn root_containing<D: Document<Element = E>>(&self, doc: &D, target: &E) -> Option<usize> {
        self.roots
            .iter()
            .position(|menu| doc.contains(&menu.root, target))
    }
}

fn set_expanded<D: Document>(doc: &D, menu: &MenuRoot<D::Element>, expanded: bool) {
    doc.set_attribute(
        &menu.toggle,
        "aria-expanded",
        if expanded { "true" } else { "false" },
    );
    doc.set_display(&menu.panel, if expanded { "block" } else { "none" });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Layout, MemoryDocument, NodeId};

    fn mounted() -> (MemoryDocument, SubmenuController<NodeId>) {
        let doc = MemoryDocument::from_layout(&Layout::default());
        let menus = SubmenuController::mount(&doc, &BehaviorConfig::default()).unwrap();
        (doc, menus)
    }

    fn expanded(doc: &MemoryDocument) -> Vec<bool> {
        doc.query_all(".has-submenu .nav-link")
            .iter()
            .map(|t| doc.attribute(t, "aria-expanded").as_deref() == Some("true"))
            .collect()
    }

    #[test]
    fn mount_resets_markup_to_closed() {
        let (doc, menus) = mounted();
        assert_eq!(menus.len(), 2);
        assert_eq!(expanded(&doc), vec![false, false]);
        for panel in doc.query_all(".submenu") {
            assert_eq!(doc.display(panel).as_deref(), Some("none"));
        }
    }

    #[test]
    fn opening_moves_focus_into_submenu() {
        let (doc, mut menus) = mounted();
        menus.toggle(&doc, 0);
        assert_eq!(menus.open_index(), Some(0));
        let focused = doc.focused().unwrap();
        assert_eq!(doc.describe(focused), "a[href=#program]");
        let panel = doc.query(".submenu").unwrap();
        assert_eq!(doc.display(panel).as_deref(), Some("block"));
    }

    #[test]
    fn opening_second_closes_first() {
        let (doc, mut menus) = mounted();
        menus.toggle(&doc, 0);
        menus.toggle(&doc, 1);
        assert_eq!(menus.open_index(), Some(1));
        assert_eq!(expanded(&doc), vec![false, true]);
    }

    #[test]
    fn toggling_open_root_closes_it() {
        let (doc, mut menus) = mounted();
        menus.toggle(&doc, 1);
        menus.toggle(&doc, 1);
        assert_eq!(menus.open_index(), None);
        assert_eq!(expanded(&doc), vec![false, false]);
    }

    #[test]
    fn escape_returns_focus_to_toggle() {
        let (doc, mut menus) = mounted();
        menus.toggle(&doc, 0);
        menus.escape(&doc, 0);
        assert_eq!(menus.open_index(), None);
        assert_eq!(doc.focused(), menus.toggle_element(0).copied());
        assert_eq!(expanded(&doc), vec![false, false]);
    }

    #[test]
    fn click_outside_dismisses() {
        let (doc, mut menus) = mounted();
        menus.toggle(&doc, 0);
        let slide = doc.query(".slide").unwrap();
        assert!(menus.on_click(&doc, &slide));
        assert_eq!(menus.open_index(), None);
    }

    #[test]
    fn click_inside_open_submenu_keeps_it_open() {
        let (doc, mut menus) = mounted();
        menus.toggle(&doc, 0);
        let link = doc.query(".submenu a").unwrap();
        assert!(!menus.on_click(&doc, &link));
        assert_eq!(menus.open_index(), Some(0));
    }

    #[test]
    fn click_on_toggle_routes_to_toggle() {
        let (doc, mut menus) = mounted();
        let toggle = *menus.toggle_element(1).unwrap();
        assert!(menus.on_click(&doc, &toggle));
        assert_eq!(menus.open_index(), Some(1));
        assert_eq!(menus.root_containing(&doc, &toggle), Some(1));
    }

    #[test]
    fn roots_without_panel_are_skipped() {
        let doc = MemoryDocument::new();
        let center = doc.append(doc.body(), "div", &["nav-center"]);
        let root = doc.append(center, "div", &["has-submenu"]);
        doc.append(root, "button", &["nav-link"]);
        assert!(SubmenuController::mount(&doc, &BehaviorConfig::default()).is_none());
    }
}
