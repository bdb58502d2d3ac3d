//! Selector parsing and matching against `pg_dom` documents.
//!
//! Supported: type, universal, class, id and attribute selectors (`=`, `^=`,
//! `$=`, `*=`, `~=`, `|=`), descendant and child combinators, selector lists.

use pg_core::PageError;
use pg_core::PageResult;
use pg_dom::Document;
use pg_dom::NodeId;

/// `(ids, classes + attributes, types)` ordered like the cascade orders them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity(pub u32, pub u32, pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributeOperator {
    Equals,
    Prefix,
    Suffix,
    Substring,
    Includes,
    DashMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeSelector {
    name: String,
    test: Option<(AttributeOperator, String)>,
}

impl AttributeSelector {
    fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        let Some((operator, expected)) = &self.test else {
            return true;
        };
        let expected = expected.as_str();

        match operator {
            AttributeOperator::Equals => actual == expected,
            AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(expected),
            AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(expected),
            AttributeOperator::Substring => !expected.is_empty() && actual.contains(expected),
            AttributeOperator::Includes => actual
                .split_ascii_whitespace()
                .any(|token| token == expected),
            AttributeOperator::DashMatch => {
                actual == expected
                    || actual
                        .strip_prefix(expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CompoundSelector {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeSelector>,
}

impl CompoundSelector {
    fn matches(&self, document: &Document, node: NodeId) -> bool {
        let Some(element) = document.element(node) else {
            return false;
        };

        if self
            .tag
            .as_deref()
            .is_some_and(|tag| !element.tag_name().eq_ignore_ascii_case(tag))
        {
            return false;
        }

        self.ids
            .iter()
            .all(|id| element.attribute("id") == Some(id.as_str()))
            && self.classes.iter().all(|class| element.has_class(class))
            && self
                .attributes
                .iter()
                .all(|attribute| attribute.matches(element.attribute(&attribute.name)))
    }

    fn specificity(&self) -> Specificity {
        Specificity(
            self.ids.len() as u32,
            (self.classes.len() + self.attributes.len()) as u32,
            u32::from(self.tag.is_some()),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    /// Each compound paired with the combinator linking it to the previous one.
    parts: Vec<(Combinator, CompoundSelector)>,
}

impl ComplexSelector {
    fn matches(&self, document: &Document, node: NodeId) -> bool {
        self.parts
            .len()
            .checked_sub(1)
            .is_some_and(|last| self.matches_from(document, node, last))
    }

    fn matches_from(&self, document: &Document, node: NodeId, index: usize) -> bool {
        let (combinator, compound) = &self.parts[index];
        if !compound.matches(document, node) {
            return false;
        }
        if index == 0 {
            return true;
        }

        match combinator {
            Combinator::Child => document
                .parent(node)
                .is_some_and(|parent| self.matches_from(document, parent, index - 1)),
            Combinator::Descendant => document
                .ancestors(node)
                .any(|ancestor| self.matches_from(document, ancestor, index - 1)),
        }
    }

    fn specificity(&self) -> Specificity {
        self.parts
            .iter()
            .map(|(_, compound)| compound.specificity())
            .fold(Specificity::default(), |acc, next| {
                Specificity(acc.0 + next.0, acc.1 + next.1, acc.2 + next.2)
            })
    }
}

/// Comma-separated group of selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    source: String,
    selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn parse(input: &str) -> PageResult<Self> {
        let mut selectors = Vec::new();
        for part in split_selector_list(input) {
            selectors.push(Parser::new(input, part).parse_complex()?);
        }

        Ok(Self {
            source: input.trim().to_owned(),
            selectors,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, document: &Document, node: NodeId) -> bool {
        self.selectors
            .iter()
            .any(|selector| selector.matches(document, node))
    }

    /// Highest specificity among the selectors in the list that match `node`.
    pub fn matching_specificity(&self, document: &Document, node: NodeId) -> Option<Specificity> {
        self.selectors
            .iter()
            .filter(|selector| selector.matches(document, node))
            .map(ComplexSelector::specificity)
            .max()
    }

    /// Matching elements in tree order.
    pub fn select_all(&self, document: &Document) -> Vec<NodeId> {
        document
            .elements()
            .into_iter()
            .filter(|node| self.matches(document, *node))
            .collect()
    }

    pub fn select_first(&self, document: &Document) -> Option<NodeId> {
        document
            .elements()
            .into_iter()
            .find(|node| self.matches(document, *node))
    }
}

pub fn query_selector_all(document: &Document, selector: &str) -> PageResult<Vec<NodeId>> {
    Ok(SelectorList::parse(selector)?.select_all(document))
}

pub fn query_selector(document: &Document, selector: &str) -> PageResult<Option<NodeId>> {
    Ok(SelectorList::parse(selector)?.select_first(document))
}

fn split_selector_list(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote = None;
    let mut depth = 0_u32;
    let mut start = 0_usize;

    for (idx, ch) in input.char_indices() {
        match (quote, ch) {
            (Some(open), _) if ch == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '[') => depth = depth.saturating_add(1),
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&input[start..idx]);
                start = idx + ch.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

struct Parser<'a> {
    full: &'a str,
    chars: Vec<char>,
    idx: usize,
}

impl<'a> Parser<'a> {
    fn new(full: &'a str, part: &str) -> Self {
        Self {
            full,
            chars: part.trim().chars().collect(),
            idx: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> PageError {
        PageError::unsupported_selector(self.full.trim(), reason)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).copied()
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.idx;
        while self.peek().is_some_and(char::is_whitespace) {
            self.idx += 1;
        }
        self.idx > start
    }

    fn parse_complex(mut self) -> PageResult<ComplexSelector> {
        if self.chars.is_empty() {
            return Err(self.error("empty selector"));
        }

        let mut parts = Vec::new();
        let mut combinator = Combinator::Descendant;
        loop {
            let compound = self.parse_compound()?;
            parts.push((combinator, compound));

            let saw_ws = self.skip_ws();
            let Some(next) = self.peek() else {
                break;
            };

            combinator = match next {
                '>' => {
                    self.idx += 1;
                    self.skip_ws();
                    Combinator::Child
                }
                '+' | '~' => return Err(self.error(format!("combinator `{next}` is not supported"))),
                _ if saw_ws => Combinator::Descendant,
                other => return Err(self.error(format!("unexpected `{other}`"))),
            };

            if self.peek().is_none() {
                return Err(self.error("selector ends with a combinator"));
            }
        }

        Ok(ComplexSelector { parts })
    }

    fn parse_compound(&mut self) -> PageResult<CompoundSelector> {
        let mut compound = CompoundSelector::default();
        let start = self.idx;

        match self.peek() {
            Some('*') => self.idx += 1,
            Some(ch) if is_ident_start(ch) => compound.tag = Some(self.parse_ident()?.to_ascii_lowercase()),
            _ => {}
        }

        while let Some(ch) = self.peek() {
            match ch {
                '.' => {
                    self.idx += 1;
                    compound.classes.push(self.parse_ident()?);
                }
                '#' => {
                    self.idx += 1;
                    compound.ids.push(self.parse_ident()?);
                }
                '[' => {
                    self.idx += 1;
                    compound.attributes.push(self.parse_attribute()?);
                }
                ':' => return Err(self.error("pseudo-classes are not supported")),
                _ => break,
            }
        }

        if self.idx == start {
            return Err(self.error("expected a simple selector"));
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> PageResult<String> {
        let start = self.idx;
        while self.peek().is_some_and(is_ident_char) {
            self.idx += 1;
        }
        if self.idx == start {
            return Err(self.error("expected an identifier"));
        }
        Ok(self.chars[start..self.idx].iter().collect())
    }

    fn parse_attribute(&mut self) -> PageResult<AttributeSelector> {
        self.skip_ws();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_ws();

        let operator = match self.peek() {
            Some(']') => {
                self.idx += 1;
                return Ok(AttributeSelector { name, test: None });
            }
            Some('=') => {
                self.idx += 1;
                AttributeOperator::Equals
            }
            Some(prefix @ ('^' | '$' | '*' | '~' | '|')) => {
                if self.chars.get(self.idx + 1) != Some(&'=') {
                    return Err(self.error(format!("expected `=` after `{prefix}`")));
                }
                self.idx += 2;
                match prefix {
                    '^' => AttributeOperator::Prefix,
                    '$' => AttributeOperator::Suffix,
                    '*' => AttributeOperator::Substring,
                    '~' => AttributeOperator::Includes,
                    _ => AttributeOperator::DashMatch,
                }
            }
            _ => return Err(self.error("malformed attribute selector")),
        };

        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.idx += 1;
                let start = self.idx;
                while self.peek().is_some_and(|ch| ch != quote) {
                    self.idx += 1;
                }
                if self.peek().is_none() {
                    return Err(self.error("unterminated string"));
                }
                let value = self.chars[start..self.idx].iter().collect();
                self.idx += 1;
                value
            }
            _ => self.parse_ident()?,
        };

        self.skip_ws();
        if self.peek() != Some(']') {
            return Err(self.error("expected `]`"));
        }
        self.idx += 1;

        Ok(AttributeSelector {
            name,
            test: Some((operator, value)),
        })
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '-' || !ch.is_ascii()
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '-' || !ch.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::SelectorList;
    use super::Specificity;
    use super::query_selector;
    use super::query_selector_all;
    use pg_html::HtmlParser;

    const PAGE: &str = r##"
        <header class="header">
          <nav class="navbar">
            <a href="#home">Home</a>
            <a href="#about" class="cta primary">About</a>
          </nav>
        </header>
        <section id="home"><img loading="lazy" data-src="/a.png"><img src="/b.png"></section>
        <section id="about"><div class="container"><a href="https://example.com">x</a></div></section>
        <section><p>no id</p></section>
    "##;

    #[test]
    fn selects_by_attribute_prefix_and_presence() {
        let doc = HtmlParser.parse(PAGE);
        let anchors = query_selector_all(&doc, r##"a[href^="#"]"##);
        assert_eq!(anchors.map(|nodes| nodes.len()), Ok(2));

        let sections = query_selector_all(&doc, "section[id]");
        assert_eq!(sections.map(|nodes| nodes.len()), Ok(2));

        let lazy = query_selector_all(&doc, r#"img[loading="lazy"]"#);
        assert_eq!(lazy.map(|nodes| nodes.len()), Ok(1));
    }

    #[test]
    fn descendant_and_child_combinators() {
        let doc = HtmlParser.parse(PAGE);
        assert_eq!(query_selector_all(&doc, ".navbar a").map(|n| n.len()), Ok(2));
        assert_eq!(query_selector_all(&doc, ".header > a").map(|n| n.len()), Ok(0));
        assert_eq!(query_selector_all(&doc, ".header > .navbar > a").map(|n| n.len()), Ok(2));
        assert_eq!(query_selector_all(&doc, "section .container a").map(|n| n.len()), Ok(1));
    }

    #[test]
    fn first_match_is_in_tree_order() {
        let doc = HtmlParser.parse(PAGE);
        match query_selector(&doc, "section, .header") {
            Ok(first) => assert_eq!(first.and_then(|node| doc.tag_name(node)), Some("header")),
            Err(error) => panic!("{error}"),
        }
    }

    #[test]
    fn compound_classes_must_all_match() {
        let doc = HtmlParser.parse(PAGE);
        assert_eq!(query_selector_all(&doc, "a.cta.primary").map(|n| n.len()), Ok(1));
        assert_eq!(query_selector_all(&doc, "a.cta.secondary").map(|n| n.len()), Ok(0));
        assert_eq!(query_selector_all(&doc, r#"a[class~="primary"]"#).map(|n| n.len()), Ok(1));
    }

    #[test]
    fn specificity_counts_ids_classes_and_types() {
        let doc = HtmlParser.parse(PAGE);
        let list = match SelectorList::parse("section#about .container, div") {
            Ok(list) => list,
            Err(error) => panic!("{error}"),
        };
        let container = match query_selector(&doc, ".container") {
            Ok(Some(container)) => container,
            Ok(None) => panic!("no .container"),
            Err(error) => panic!("{error}"),
        };
        assert_eq!(
            list.matching_specificity(&doc, container),
            Some(Specificity(1, 1, 1))
        );
    }

    #[test]
    fn rejects_unsupported_syntax() {
        for selector in ["a:hover", "h1 + p", "a >", "[href", "", "a[href^]"] {
            let error = SelectorList::parse(selector).err();
            assert_eq!(
                error.as_ref().map(|error| error.code()),
                Some("css.unsupported_selector"),
                "{selector}"
            );
        }
    }
}
