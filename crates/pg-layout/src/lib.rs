//! Block-flow layout: resolves styles and writes document-relative boxes.

use pg_css::CssParser;
use pg_css::SelectorList;
use pg_css::Specificity;
use pg_css::StyleSheet;
use pg_css::parse_px;
use pg_dom::Document;
use pg_dom::LayoutBox;
use pg_dom::NodeId;
use pg_dom::NodeKind;

pub const LINE_HEIGHT: f32 = 20.0;
pub const CHAR_WIDTH: f32 = 8.0;

const NON_RENDERED_TAGS: &[&str] = &[
    "head", "script", "style", "title", "meta", "link", "template", "noscript",
];

/// Simplified layout tree root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutTree {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ComputedStyle {
    hidden: bool,
    height: Option<f32>,
    min_height: Option<f32>,
    margin_top: f32,
    margin_bottom: f32,
}

impl ComputedStyle {
    fn apply(&mut self, name: &str, value: &str) {
        match name {
            "display" => self.hidden = value.eq_ignore_ascii_case("none"),
            "height" => self.height = parse_px(value),
            "min-height" => self.min_height = parse_px(value),
            "margin-top" => self.margin_top = parse_px(value).unwrap_or(0.0),
            "margin-bottom" => self.margin_bottom = parse_px(value).unwrap_or(0.0),
            "margin" => {
                let parts = value.split_whitespace().collect::<Vec<_>>();
                let top = parts.first().and_then(|part| parse_px(part));
                let bottom = parts.get(2).or(parts.first()).and_then(|part| parse_px(part));
                self.margin_top = top.unwrap_or(0.0);
                self.margin_bottom = bottom.unwrap_or(0.0);
            }
            _ => {}
        }
    }
}

struct CompiledRule<'a> {
    selector: SelectorList,
    order: usize,
    declarations: &'a [pg_css::Declaration],
}

/// Computes visual layout from DOM and styles.
#[derive(Debug, Default)]
pub struct LayoutEngine;

impl LayoutEngine {
    /// Lays out every element and returns the document extent.
    pub fn compute(
        &self,
        document: &mut Document,
        stylesheet: &StyleSheet,
        viewport_width: f32,
    ) -> LayoutTree {
        let width = viewport_width.max(CHAR_WIDTH);
        let rules = compile_rules(stylesheet);
        let root = document.root();
        let mut pass = LayoutPass {
            rules: &rules,
            width,
        };
        let height = pass.layout_children(document, root, 0.0);
        tracing::debug!(width, height, nodes = document.node_count(), "layout computed");

        LayoutTree { width, height }
    }
}

fn compile_rules(stylesheet: &StyleSheet) -> Vec<CompiledRule<'_>> {
    stylesheet
        .rules
        .iter()
        .enumerate()
        .filter_map(|(order, rule)| match SelectorList::parse(&rule.selector) {
            Ok(selector) => Some(CompiledRule {
                selector,
                order,
                declarations: &rule.declarations,
            }),
            Err(error) => {
                tracing::debug!(%error, "skipping style rule");
                None
            }
        })
        .collect()
}

struct LayoutPass<'r, 'a> {
    rules: &'r [CompiledRule<'a>],
    width: f32,
}

impl LayoutPass<'_, '_> {
    fn computed_style(&self, document: &Document, node: NodeId) -> ComputedStyle {
        let mut matched: Vec<(Specificity, usize, &[pg_css::Declaration])> = self
            .rules
            .iter()
            .filter_map(|rule| {
                rule.selector
                    .matching_specificity(document, node)
                    .map(|specificity| (specificity, rule.order, rule.declarations))
            })
            .collect();
        matched.sort_by(|left, right| (left.0, left.1).cmp(&(right.0, right.1)));

        let mut style = ComputedStyle::default();
        for (_, _, declarations) in matched {
            for declaration in declarations {
                style.apply(&declaration.name, &declaration.value);
            }
        }

        if let Some(inline) = document.attribute(node, "style") {
            for declaration in CssParser.parse_inline(inline) {
                style.apply(&declaration.name, &declaration.value);
            }
        }

        let tag = document.tag_name(node).unwrap_or_default();
        if NON_RENDERED_TAGS.contains(&tag) || document.has_attribute(node, "hidden") {
            style.hidden = true;
        }
        if tag == "img" && style.height.is_none() {
            style.height = document
                .attribute(node, "height")
                .and_then(|height| height.trim().parse::<f32>().ok());
        }

        style
    }

    /// Stacks the children of `parent` starting at `top`; returns the consumed height.
    fn layout_children(&mut self, document: &mut Document, parent: NodeId, top: f32) -> f32 {
        let mut cursor = top;
        for child in document.children(parent).to_vec() {
            cursor += match document.kind(child) {
                Some(NodeKind::Text(text)) => self.text_height(text),
                Some(NodeKind::Element(_)) => self.layout_element(document, child, cursor),
                _ => 0.0,
            };
        }
        cursor - top
    }

    fn layout_element(&mut self, document: &mut Document, node: NodeId, top: f32) -> f32 {
        let style = self.computed_style(document, node);
        if style.hidden {
            collapse_subtree(document, node, top);
            return 0.0;
        }

        let box_top = top + style.margin_top;
        let natural = self.layout_children(document, node, box_top);
        let height = style
            .height
            .unwrap_or(natural)
            .max(style.min_height.unwrap_or(0.0))
            .max(0.0);
        document.set_layout_box(node, LayoutBox {
            top: box_top,
            height,
        });

        style.margin_top + height + style.margin_bottom
    }

    fn text_height(&self, text: &str) -> f32 {
        let chars = text.split_whitespace().map(|word| word.chars().count() + 1).sum::<usize>();
        if chars == 0 {
            return 0.0;
        }
        let per_line = (self.width / CHAR_WIDTH).floor().max(1.0);
        (chars as f32 / per_line).ceil() * LINE_HEIGHT
    }
}

fn collapse_subtree(document: &mut Document, node: NodeId, top: f32) {
    document.set_unrendered(node, top);
    for descendant in document.descendants(node) {
        document.set_unrendered(descendant, top);
    }
}

#[cfg(test)]
mod tests {
    use super::LINE_HEIGHT;
    use super::LayoutEngine;
    use pg_css::CssParser;
    use pg_css::query_selector;
    use pg_dom::Document;
    use pg_html::HtmlParser;

    fn laid_out(html: &str, css: &str) -> (Document, super::LayoutTree) {
        let mut doc = HtmlParser.parse(html);
        let sheet = CssParser.parse(css);
        let tree = LayoutEngine.compute(&mut doc, &sheet, 800.0);
        (doc, tree)
    }

    fn top_and_height(doc: &Document, selector: &str) -> Option<(f32, f32)> {
        let node = match query_selector(doc, selector) {
            Ok(node) => node?,
            Err(error) => panic!("{error}"),
        };
        Some((doc.offset_top(node), doc.offset_height(node)))
    }

    #[test]
    fn empty_document_has_no_height() {
        let (_, tree) = laid_out("", "");
        assert_eq!(tree.height, 0.0);
        assert_eq!(tree.width, 800.0);
    }

    #[test]
    fn sections_stack_with_explicit_heights() {
        let (doc, tree) = laid_out(
            "<section id=a></section><section id=b></section><section id=c style='height: 50px'></section>",
            "section { height: 300px; }",
        );
        assert_eq!(top_and_height(&doc, "#a"), Some((0.0, 300.0)));
        assert_eq!(top_and_height(&doc, "#b"), Some((300.0, 300.0)));
        assert_eq!(top_and_height(&doc, "#c"), Some((600.0, 50.0)));
        assert_eq!(tree.height, 650.0);
    }

    #[test]
    fn specificity_beats_source_order() {
        let (doc, _) = laid_out(
            "<div id=hero class=panel></div>",
            "#hero { height: 120px; } .panel { height: 40px; }",
        );
        assert_eq!(top_and_height(&doc, ".panel"), Some((0.0, 120.0)));
    }

    #[test]
    fn margins_offset_boxes_and_hidden_elements_collapse() {
        let (doc, tree) = laid_out(
            "<head><title>x</title></head><div class=a>text</div><div class=b hidden>gone</div><div class=c></div>",
            ".a { margin: 10px 0 30px; } .c { height: 5px; }",
        );
        assert_eq!(top_and_height(&doc, ".a"), Some((10.0, LINE_HEIGHT)));
        assert_eq!(top_and_height(&doc, ".b"), Some((60.0, 0.0)));
        assert_eq!(top_and_height(&doc, ".c"), Some((60.0, 5.0)));
        assert_eq!(tree.height, 65.0);

        let rendered = |selector: &str| match query_selector(&doc, selector) {
            Ok(node) => node.map(|node| doc.is_rendered(node)),
            Err(error) => panic!("{error}"),
        };
        assert_eq!(rendered(".a"), Some(true));
        assert_eq!(rendered(".b"), Some(false));
        assert_eq!(rendered("title"), Some(false));
    }

    #[test]
    fn long_text_wraps_to_multiple_lines() {
        let words = "word ".repeat(40);
        let (doc, _) = laid_out(&format!("<p>{words}</p>"), "");
        // 200 chars at 100 chars per line.
        assert_eq!(top_and_height(&doc, "p"), Some((0.0, 2.0 * LINE_HEIGHT)));
    }

    #[test]
    fn image_height_attribute_is_used() {
        let (doc, _) = laid_out("<img loading=lazy height=240 data-src=/a.png>", "");
        assert_eq!(top_and_height(&doc, "img"), Some((0.0, 240.0)));
    }
}
