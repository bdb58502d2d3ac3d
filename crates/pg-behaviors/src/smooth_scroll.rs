//! Same-page anchor routing with smooth scrolling and fragment replacement.

use pg_css::SelectorList;
use pg_dom::NodeId;
use pg_host::Event;
use pg_host::Page;
use pg_host::ScrollBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorOutcome {
    /// A smooth scroll toward `target` was requested and the fragment replaced.
    Scrolled { target: NodeId },
    /// The fragment names no element; nothing moved.
    Unresolved,
}

#[derive(Debug, Clone, Default)]
pub struct SmoothScrollRouter {
    anchors: Vec<NodeId>,
}

impl SmoothScrollRouter {
    pub fn install(page: &Page, selector: &SelectorList) -> Self {
        Self {
            anchors: selector.select_all(&page.document),
        }
    }

    pub fn anchors(&self) -> &[NodeId] {
        &self.anchors
    }

    /// Intercepts a click on `anchor`: cancels the jump and scrolls smoothly instead.
    pub fn handle_click(&self, page: &mut Page, anchor: NodeId, event: &mut Event) -> AnchorOutcome {
        event.prevent_default();

        let fragment = page
            .document
            .attribute(anchor, "href")
            .and_then(|href| href.strip_prefix('#'))
            .unwrap_or_default()
            .to_owned();
        let Some(target) = page.document.get_element_by_id(&fragment) else {
            tracing::debug!(%fragment, "anchor target not found");
            return AnchorOutcome::Unresolved;
        };

        let top = page.document.offset_top(target);
        page.viewport.scroll_to(top, ScrollBehavior::Smooth);
        page.history.replace_fragment(&fragment);
        tracing::debug!(%fragment, top, "smooth scroll requested");
        AnchorOutcome::Scrolled { target }
    }
}
