//! CSS stylesheet model, declaration parsing and selector matching.

mod selector;

pub use selector::SelectorList;
pub use selector::Specificity;
pub use selector::query_selector;
pub use selector::query_selector_all;

/// Single `name: value` pair with normalized whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
}

/// Style rule compiled from source CSS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub selector: String,
    pub declarations: Vec<Declaration>,
}

impl StyleRule {
    pub fn declaration(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|declaration| declaration.name == name)
            .map(|declaration| declaration.value.as_str())
    }
}

/// Style rules compiled from source CSS, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSheet {
    pub rules: Vec<StyleRule>,
}

impl StyleSheet {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn extend(&mut self, other: StyleSheet) {
        self.rules.extend(other.rules);
    }
}

/// Parses CSS source text.
#[derive(Debug, Default)]
pub struct CssParser;

impl CssParser {
    pub fn parse(&self, input: &str) -> StyleSheet {
        let mut sheet = StyleSheet::empty();
        collect_rules(&strip_comments(input), &mut sheet.rules);
        sheet
    }

    /// Parses the body of a `style` attribute.
    pub fn parse_inline(&self, input: &str) -> Vec<Declaration> {
        parse_declarations(&strip_comments(input))
    }
}

/// Walks `prelude { body }` blocks; grouping at-rules are flattened into `out`.
fn collect_rules(input: &str, out: &mut Vec<StyleRule>) {
    for (prelude, body) in RuleBlocks::new(input) {
        let selector = prelude.split_whitespace().collect::<Vec<_>>().join(" ");
        if selector.starts_with('@') {
            if is_grouping_at_rule(&selector) {
                collect_rules(body, out);
            }
            continue;
        }

        let declarations = parse_declarations(body);
        if !selector.is_empty() && !declarations.is_empty() {
            out.push(StyleRule {
                selector,
                declarations,
            });
        }
    }
}

struct RuleBlocks<'a> {
    input: &'a str,
    cursor: usize,
}

impl<'a> RuleBlocks<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, cursor: 0 }
    }
}

impl<'a> Iterator for RuleBlocks<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.input.get(self.cursor..)?;
        let skipped = rest.len() - rest.trim_start_matches(|ch: char| ch.is_whitespace() || ch == ';').len();
        let start = self.cursor + skipped;

        let open = find_top_level(self.input, start, b'{')?;
        let close = block_end(self.input, open)?;
        self.cursor = close + 1;
        Some((&self.input[start..open], &self.input[open + 1..close]))
    }
}

/// Tracks string literals, escapes and bracket nesting while walking CSS bytes.
#[derive(Debug, Default)]
struct Scanner {
    quote: Option<u8>,
    escape: bool,
    paren_depth: u32,
    bracket_depth: u32,
}

impl Scanner {
    /// Feeds one byte; returns true when the byte is structural (outside strings).
    fn feed(&mut self, byte: u8) -> bool {
        if let Some(quote) = self.quote {
            if self.escape {
                self.escape = false;
            } else if byte == b'\\' {
                self.escape = true;
            } else if byte == quote {
                self.quote = None;
            }
            return false;
        }

        match byte {
            b'\'' | b'"' => {
                self.quote = Some(byte);
                return false;
            }
            b'(' => self.paren_depth = self.paren_depth.saturating_add(1),
            b')' => self.paren_depth = self.paren_depth.saturating_sub(1),
            b'[' => self.bracket_depth = self.bracket_depth.saturating_add(1),
            b']' => self.bracket_depth = self.bracket_depth.saturating_sub(1),
            _ => {}
        }
        true
    }

    fn at_top_level(&self) -> bool {
        self.paren_depth == 0 && self.bracket_depth == 0
    }
}

/// Finds the first `needle` outside strings, parentheses and brackets.
fn find_top_level(input: &str, from: usize, needle: u8) -> Option<usize> {
    let mut scanner = Scanner::default();
    input
        .as_bytes()
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, byte)| scanner.feed(**byte) && **byte == needle && scanner.at_top_level())
        .map(|(idx, _)| idx)
}

/// Index of the `}` closing the block opened at `open`.
fn block_end(input: &str, open: usize) -> Option<usize> {
    let mut scanner = Scanner::default();
    let mut nesting = 0_u32;
    for (idx, byte) in input.bytes().enumerate().skip(open) {
        if !scanner.feed(byte) {
            continue;
        }
        if byte == b'{' {
            nesting += 1;
        } else if byte == b'}' {
            nesting = nesting.saturating_sub(1);
            if nesting == 0 {
                return Some(idx);
            }
        }
    }
    None
}

fn is_grouping_at_rule(prelude: &str) -> bool {
    let name = prelude[1..]
        .split(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '-'))
        .next()
        .unwrap_or_default();
    ["media", "supports", "layer", "document"]
        .iter()
        .any(|group| name.eq_ignore_ascii_case(group))
}

fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut scanner = Scanner::default();
    let mut rest = input;
    while let Some(ch) = rest.chars().next() {
        if scanner.quote.is_none() && rest.starts_with("/*") {
            rest = rest[2..].split_once("*/").map_or("", |(_, after)| after);
            continue;
        }
        if ch.is_ascii() {
            scanner.feed(ch as u8);
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

fn parse_declarations(input: &str) -> Vec<Declaration> {
    split_top_level(input, b';')
        .into_iter()
        .filter_map(|item| {
            let item = item.trim();
            let colon = find_top_level(item, 0, b':')?;
            let name = item[..colon].trim().to_ascii_lowercase();
            let value = item[colon + 1..].trim();
            let value = normalize_value(value.strip_suffix("!important").unwrap_or(value));
            (!name.is_empty() && !name.contains(char::is_whitespace) && !value.is_empty())
                .then_some(Declaration { name, value })
        })
        .collect()
}

fn split_top_level(input: &str, delimiter: u8) -> Vec<&str> {
    let mut scanner = Scanner::default();
    let cuts = input
        .bytes()
        .enumerate()
        .filter(|(_, byte)| scanner.feed(*byte) && *byte == delimiter && scanner.at_top_level())
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();

    let mut start = 0;
    let mut parts = Vec::with_capacity(cuts.len() + 1);
    for cut in cuts {
        parts.push(&input[start..cut]);
        start = cut + 1;
    }
    parts.push(&input[start..]);
    parts
}

/// Collapses whitespace runs outside string literals.
fn normalize_value(input: &str) -> String {
    let mut scanner = Scanner::default();
    let mut out = String::with_capacity(input.len());
    for ch in input.trim().chars() {
        let structural = if ch.is_ascii() {
            scanner.feed(ch as u8)
        } else {
            scanner.quote.is_none()
        };
        if structural && ch.is_whitespace() {
            if !out.ends_with(' ') {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Parses a CSS length in pixels. Unitless zero is accepted.
pub fn parse_px(value: &str) -> Option<f32> {
    let trimmed = value.trim();
    if let Some(number) = trimmed.strip_suffix("px") {
        return number.trim().parse::<f32>().ok().filter(|px| px.is_finite());
    }

    trimmed
        .parse::<f32>()
        .ok()
        .filter(|number| *number == 0.0)
}

#[cfg(test)]
mod tests {
    use super::CssParser;
    use super::StyleSheet;
    use super::parse_px;

    fn sheet(source: &str) -> StyleSheet {
        CssParser.parse(source)
    }

    #[test]
    fn rules_keep_source_order() {
        let parsed = sheet("body { color: red; } .card { padding: 8px; }");
        let selectors: Vec<&str> = parsed.rules.iter().map(|rule| rule.selector.as_str()).collect();
        assert_eq!(selectors, ["body", ".card"]);
        assert_eq!(parsed.rules[0].declaration("color"), Some("red"));
        assert_eq!(parsed.rules[1].declaration("padding"), Some("8px"));
    }

    #[test]
    fn comments_and_empty_blocks_vanish() {
        let parsed = sheet("/* x */ p { font-size: 14px; } bad-rule {} div { }");
        assert_eq!(parsed.rule_count(), 1);
        assert_eq!(parsed.rules[0].selector, "p");
    }

    #[test]
    fn media_blocks_are_flattened_and_font_face_is_skipped() {
        let parsed = sheet(
            "@font-face { font-family: x; } @media screen and (max-width: 768px) { .navbar { display: none; } .navbar.active { display: block; } }",
        );
        assert_eq!(parsed.rule_count(), 2);
        assert_eq!(parsed.rules[1].selector, ".navbar.active");
        assert_eq!(parsed.rules[1].declaration("display"), Some("block"));
    }

    #[test]
    fn string_contents_are_opaque() {
        let parsed = sheet(
            r#".icon { background-image: url("data:image/svg+xml;utf8,/*<svg></svg>*/"); color: red; }"#,
        );
        let Some(rule) = parsed.rules.first() else {
            panic!("rule");
        };
        assert_eq!(
            rule.declaration("background-image"),
            Some(r#"url("data:image/svg+xml;utf8,/*<svg></svg>*/")"#)
        );
        assert_eq!(rule.declaration("color"), Some("red"));
    }

    #[test]
    fn inline_style_lowercases_names_and_drops_important() {
        let declarations = CssParser.parse_inline("height: 300px !important; HEIGHT : 320px");
        let pairs: Vec<(&str, &str)> = declarations
            .iter()
            .map(|declaration| (declaration.name.as_str(), declaration.value.as_str()))
            .collect();
        assert_eq!(pairs, [("height", "300px"), ("height", "320px")]);
    }

    #[test]
    fn pixel_lengths() {
        assert_eq!(parse_px("120px"), Some(120.0));
        assert_eq!(parse_px(" 0 "), Some(0.0));
        assert_eq!(parse_px("2em"), None);
        assert_eq!(parse_px("12"), None);
    }
}
