//! HTML tokenization and tree construction.

use pg_dom::Document;
use pg_dom::NodeId;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "title"];

/// Parses raw HTML into a DOM document.
#[derive(Debug, Default)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn parse(&self, input: &str) -> Document {
        let mut builder = TreeBuilder::new();
        let mut lexer = Lexer::new(input);
        while let Some(token) = lexer.next_token() {
            builder.push(token, &mut lexer);
        }
        builder.document
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StartTag {
    name: String,
    attributes: Vec<(String, String)>,
    self_closing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    Start(StartTag),
    End(String),
}

/// Byte cursor over the markup. Comments, doctypes and processing instructions never surface as tokens.
struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a [u8] {
        self.input.as_bytes().get(self.pos..).unwrap_or_default()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<u8> {
        self.rest().first().copied()
    }

    fn eat(&mut self, prefix: &[u8]) -> bool {
        if self.rest().starts_with(prefix) {
            self.pos += prefix.len();
            return true;
        }
        false
    }

    /// Moves past the next `needle`, or to the end when there is none.
    fn skip_past(&mut self, needle: &[u8]) {
        self.pos = match find(self.rest(), needle) {
            Some(offset) => self.pos + offset + needle.len(),
            None => self.input.len(),
        };
    }

    fn take_while(&mut self, keep: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        let len = self.rest().iter().take_while(|byte| keep(**byte)).count();
        self.pos += len;
        &self.input[start..self.pos]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(|byte| byte.is_ascii_whitespace());
    }

    fn next_token(&mut self) -> Option<Token<'a>> {
        while !self.at_end() {
            if self.peek() != Some(b'<') {
                return Some(Token::Text(self.take_while(|byte| byte != b'<')));
            }
            if self.eat(b"<!--") {
                self.skip_past(b"-->");
                continue;
            }
            if self.eat(b"<?") {
                self.skip_past(b">");
                continue;
            }
            if self.eat(b"<!") {
                self.skip_past(b">");
                continue;
            }

            let checkpoint = self.pos;
            if let Some(token) = self.tag() {
                return Some(token);
            }
            // A `<` that does not open a tag is literal text.
            self.pos = checkpoint + 1;
            return Some(Token::Text("<"));
        }
        None
    }

    fn tag(&mut self) -> Option<Token<'a>> {
        self.eat(b"<");
        let closing = self.eat(b"/");
        let name = self
            .take_while(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b':'))
            .to_ascii_lowercase();
        if name.is_empty() {
            return None;
        }

        let mut tag = StartTag {
            name,
            attributes: Vec::new(),
            self_closing: false,
        };
        loop {
            self.skip_whitespace();
            match self.peek()? {
                b'>' => {
                    self.pos += 1;
                    break;
                }
                b'/' => {
                    self.pos += 1;
                    tag.self_closing = true;
                    continue;
                }
                _ => tag.self_closing = false,
            }

            let attr = self
                .take_while(|byte| !byte.is_ascii_whitespace() && !matches!(byte, b'=' | b'>' | b'/'))
                .to_ascii_lowercase();
            if attr.is_empty() {
                self.pos += 1;
                continue;
            }
            self.skip_whitespace();
            let value = if self.eat(b"=") {
                self.skip_whitespace();
                decode_entities(self.attribute_value()?)
            } else {
                String::new()
            };
            tag.attributes.push((attr, value));
        }

        Some(if closing {
            Token::End(tag.name)
        } else {
            Token::Start(tag)
        })
    }

    fn attribute_value(&mut self) -> Option<&'a str> {
        match self.peek()? {
            quote @ (b'"' | b'\'') => {
                self.pos += 1;
                let value = self.take_while(|byte| byte != quote);
                self.eat(&[quote]).then_some(value)
            }
            _ => Some(self.take_while(|byte| !byte.is_ascii_whitespace() && byte != b'>')),
        }
    }

    /// Consumes everything up to and including `</name ...>`, returning the body.
    fn raw_text(&mut self, name: &str) -> &'a str {
        let start = self.pos;
        while !self.at_end() {
            let rest = self.rest();
            let closes = rest.starts_with(b"</")
                && rest
                    .get(2..2 + name.len())
                    .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name.as_bytes()))
                && rest
                    .get(2 + name.len())
                    .is_none_or(|byte| byte.is_ascii_whitespace() || matches!(*byte, b'>' | b'/'));
            if closes {
                let body = &self.input[start..self.pos];
                self.skip_past(b">");
                return body;
            }
            self.pos += 1;
        }
        &self.input[start..]
    }
}

struct TreeBuilder {
    document: Document,
    open: Vec<(NodeId, String)>,
}

impl TreeBuilder {
    fn new() -> Self {
        let document = Document::empty();
        let root = document.root();
        Self {
            document,
            open: vec![(root, String::new())],
        }
    }

    fn current(&self) -> NodeId {
        self.open
            .last()
            .map_or_else(|| self.document.root(), |(node, _)| *node)
    }

    fn push(&mut self, token: Token<'_>, lexer: &mut Lexer<'_>) {
        match token {
            Token::Text(raw) => self.insert_text(raw),
            Token::End(name) => self.close(&name),
            Token::Start(tag) => {
                let node = self.document.create_element(&tag.name);
                for (name, value) in tag.attributes {
                    if !self.document.has_attribute(node, &name) {
                        self.document.set_attribute(node, &name, value);
                    }
                }
                let parent = self.current();
                self.document.append_child(parent, node);

                if tag.self_closing {
                    return;
                }
                if RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
                    let body = lexer.raw_text(&tag.name);
                    self.raw_text_body(node, &tag.name, body);
                } else if !VOID_ELEMENTS.contains(&tag.name.as_str()) {
                    self.open.push((node, tag.name));
                }
            }
        }
    }

    fn raw_text_body(&mut self, node: NodeId, name: &str, body: &str) {
        match name {
            "style" => self.document.push_style_source(body),
            "title" => {
                let title = decode_entities(body)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ");
                if title.is_empty() {
                    return;
                }
                if self.document.title().is_empty() {
                    self.document.set_title(title.clone());
                }
                self.document.set_text_content(node, title);
            }
            _ => {}
        }
    }

    fn insert_text(&mut self, raw: &str) {
        if raw.trim().is_empty() {
            return;
        }
        let text = self.document.create_text(decode_entities(raw));
        let parent = self.current();
        self.document.append_child(parent, text);
    }

    /// Closes the nearest open `name` and everything nested in it. Stray end tags are ignored.
    fn close(&mut self, name: &str) {
        if let Some(position) = self.open.iter().rposition(|(_, open)| open == name) {
            if position > 0 {
                self.open.truncate(position);
            }
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let decoded = tail
            .find(';')
            .filter(|end| *end <= 9)
            .and_then(|end| Some((entity(&tail[..end])?, end)));
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity(name: &str) -> Option<char> {
    let named = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '\u{a9}',
        "times" => '\u{d7}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            return char::from_u32(code);
        }
    };
    Some(named)
}
