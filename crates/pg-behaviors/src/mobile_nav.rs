//! Collapsible mobile navigation: injected toggle, outside-click and link-click closing.

use crate::config::ClassConfig;
use crate::config::ToggleConfig;
use pg_dom::Document;
use pg_dom::NodeId;

/// Snapshot of the navigation panel as the stylesheet and assistive tech see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavState {
    pub open: bool,
    pub aria_expanded: Option<String>,
    pub glyph: String,
}

impl NavState {
    /// Class, `aria-expanded` and glyph all describe the same state.
    pub fn is_consistent(&self, toggle: &ToggleConfig) -> bool {
        let expected_aria = if self.open { "true" } else { "false" };
        let expected_glyph = if self.open {
            &toggle.open_glyph
        } else {
            &toggle.closed_glyph
        };
        self.aria_expanded.as_deref().unwrap_or("false") == expected_aria
            && self.glyph == *expected_glyph
    }
}

#[derive(Debug, Clone)]
pub struct MobileNav {
    toggle: NodeId,
    navbar: NodeId,
    open_class: String,
    open_glyph: String,
    closed_glyph: String,
}

impl MobileNav {
    /// Builds the toggle control and appends it as the header's last child.
    pub fn install(
        document: &mut Document,
        header: NodeId,
        navbar: NodeId,
        toggle_config: &ToggleConfig,
        classes: &ClassConfig,
    ) -> Self {
        let toggle = document.create_element("div");
        document.set_attribute(toggle, "class", toggle_config.class.clone());
        document.set_attribute(toggle, "aria-label", toggle_config.label.clone());
        document.set_attribute(toggle, "aria-expanded", "false");
        document.set_text_content(toggle, toggle_config.closed_glyph.clone());
        document.append_child(header, toggle);

        let nav = Self {
            toggle,
            navbar,
            open_class: classes.nav_open.clone(),
            open_glyph: toggle_config.open_glyph.clone(),
            closed_glyph: toggle_config.closed_glyph.clone(),
        };
        if nav.is_open(document) {
            nav.sync(document, true);
        }
        nav
    }

    pub fn toggle_control(&self) -> NodeId {
        self.toggle
    }

    pub fn navbar(&self) -> NodeId {
        self.navbar
    }

    pub fn is_open(&self, document: &Document) -> bool {
        document.has_class(self.navbar, &self.open_class)
    }

    /// Flips the panel. Returns the new open state.
    pub fn toggle(&self, document: &mut Document) -> bool {
        let open = document.toggle_class(self.navbar, &self.open_class);
        self.sync(document, open);
        tracing::debug!(open, "navigation toggled");
        open
    }

    pub fn close(&self, document: &mut Document) {
        document.remove_class(self.navbar, &self.open_class);
        self.sync(document, false);
    }

    /// Document-level click: closes unless the click landed in the panel or on the toggle.
    pub fn handle_outside_click(&self, document: &mut Document, target: Option<NodeId>) -> bool {
        let inside = target.is_some_and(|target| {
            document.contains(self.navbar, target) || document.contains(self.toggle, target)
        });
        if inside || !self.is_open(document) {
            return false;
        }

        self.close(document);
        tracing::debug!("navigation closed by outside click");
        true
    }

    pub fn state(&self, document: &Document) -> NavState {
        NavState {
            open: self.is_open(document),
            aria_expanded: document
                .attribute(self.toggle, "aria-expanded")
                .map(str::to_owned),
            glyph: document.text_content(self.toggle),
        }
    }

    fn sync(&self, document: &mut Document, open: bool) {
        let glyph = if open {
            &self.open_glyph
        } else {
            &self.closed_glyph
        };
        if document.text_content(self.toggle) != *glyph {
            document.set_text_content(self.toggle, glyph.clone());
        }
        let expanded = if open { "true" } else { "false" };
        if document.attribute(self.toggle, "aria-expanded") != Some(expanded) {
            document.set_attribute(self.toggle, "aria-expanded", expanded);
        }
    }
}
