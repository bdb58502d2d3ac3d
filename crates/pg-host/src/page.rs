//! Page loading pipeline: markup → styles → layout → viewport.

use crate::history::History;
use crate::viewport::Viewport;
use pg_core::PageResult;
use pg_css::CssParser;
use pg_css::StyleSheet;
use pg_dom::Document;
use pg_html::HtmlParser;
use pg_layout::LayoutEngine;

pub const DEFAULT_PAGE_URL: &str = "http://localhost/";

/// Environment feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// `'loading' in HTMLImageElement.prototype`.
    pub native_lazy_loading: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            native_lazy_loading: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageOptions {
    pub url: String,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub capabilities: Capabilities,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            url: DEFAULT_PAGE_URL.to_owned(),
            viewport_width: 1280.0,
            viewport_height: 720.0,
            capabilities: Capabilities::default(),
        }
    }
}

/// Loaded page: the rendered document plus the host services around it.
#[derive(Debug, Clone)]
pub struct Page {
    pub document: Document,
    pub stylesheet: StyleSheet,
    pub viewport: Viewport,
    pub history: History,
    pub capabilities: Capabilities,
    layout_revision: Option<u64>,
}

impl Page {
    pub fn load(markup: &str, options: PageOptions) -> PageResult<Self> {
        let document = HtmlParser.parse(markup);
        let mut stylesheet = StyleSheet::empty();
        for source in document.style_sources() {
            stylesheet.extend(CssParser.parse(source));
        }
        Self::from_document(document, stylesheet, options)
    }

    pub fn from_document(
        document: Document,
        stylesheet: StyleSheet,
        options: PageOptions,
    ) -> PageResult<Self> {
        let history = History::parse(&options.url)?;
        let mut page = Self {
            document,
            stylesheet,
            viewport: Viewport::new(options.viewport_width, options.viewport_height),
            history,
            capabilities: options.capabilities,
            layout_revision: None,
        };
        page.relayout();
        tracing::debug!(
            url = %page.history.current(),
            title = page.document.title(),
            rules = page.stylesheet.rule_count(),
            document_height = page.viewport.document_height(),
            "page loaded"
        );
        Ok(page)
    }

    /// Recomputes every layout box and the scrollable extent.
    pub fn relayout(&mut self) {
        let tree = LayoutEngine.compute(&mut self.document, &self.stylesheet, self.viewport.width());
        self.viewport.set_document_height(tree.height);
        self.layout_revision = Some(self.document.revision());
    }

    /// Relayouts only if the document changed since the last layout. Returns true if it ran.
    pub fn relayout_if_dirty(&mut self) -> bool {
        if self.layout_revision == Some(self.document.revision()) {
            return false;
        }
        self.relayout();
        true
    }

    /// Applies a new viewport size. Returns true when the scroll offset had to be clamped.
    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        let before = self.viewport.scroll_y();
        self.viewport.resize(width, height);
        self.relayout();
        self.viewport.scroll_y() != before
    }
}

#[cfg(test)]
mod tests {
    use super::Page;
    use super::PageOptions;

    const MARKUP: &str = r#"
        <html><head><title>Folio</title>
        <style>section { height: 500px; } .navbar.active { height: 200px; }</style></head>
        <body><header class="header"><nav class="navbar"></nav></header>
        <section id="home"></section><section id="work"></section></body></html>
    "#;

    #[test]
    fn load_runs_style_and_layout() {
        let options = PageOptions {
            viewport_height: 400.0,
            ..PageOptions::default()
        };
        let page = match Page::load(MARKUP, options) {
            Ok(page) => page,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(page.document.title(), "Folio");
        assert_eq!(page.viewport.document_height(), 1000.0);
        assert_eq!(page.viewport.max_scroll(), 600.0);
    }

    #[test]
    fn resize_reports_a_clamped_offset() {
        let mut page = match Page::load(MARKUP, PageOptions::default()) {
            Ok(page) => page,
            Err(error) => panic!("{error}"),
        };
        page.viewport.user_scroll_to(280.0);
        assert!(!page.resize(1280.0, 600.0));
        assert!(page.resize(1280.0, 900.0));
        assert_eq!(page.viewport.scroll_y(), 100.0);
    }

    #[test]
    fn class_changes_mark_layout_dirty() {
        let mut page = match Page::load(MARKUP, PageOptions::default()) {
            Ok(page) => page,
            Err(error) => panic!("{error}"),
        };
        assert!(!page.relayout_if_dirty());

        let navbar = page.document.elements().into_iter().find(|node| {
            page.document.has_class(*node, "navbar")
        });
        if let Some(navbar) = navbar {
            page.document.add_class(navbar, "active");
        }
        assert!(page.relayout_if_dirty());
        assert_eq!(page.viewport.document_height(), 1200.0);
    }

    #[test]
    fn invalid_url_is_reported() {
        let result = Page::load(
            "",
            PageOptions {
                url: "not a url".to_owned(),
                ..PageOptions::default()
            },
        );
        assert_eq!(result.err().map(|error| error.code()), Some("host.invalid_url"));
    }
}
