//! Tolerant tag scanner over exported chapter HTML.
//!
//! The exporter emits well-formed but oddly wrapped markup (`</b\n    >`,
//! attributes split over lines), so tags are matched by pattern and
//! element boundaries are found by depth counting on the tag name only.
//! Nothing here fails: unmatched tags are ignored, unclosed elements run
//! to the end of the fragment.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<![^>]*>|<\s*(/)?\s*([A-Za-z][A-Za-z0-9]*)([^<>]*?)(/)?\s*>").unwrap()
});
static NBSP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)&nbsp;").unwrap());
static SPACE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").unwrap());
static BLANK_LINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());
static WS_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "hr", "img", "input", "link", "meta", "source", "wbr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Open,
    Close,
    /// Void or self-closing tag (`<br>`, `<br />`, `<img ... />`).
    Empty,
    Text,
    /// Comments and doctype declarations.
    Other,
}

#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Lowercased tag name; empty for text and `Other`.
    pub name: String,
    pub raw: &'a str,
    pub start: usize,
    pub end: usize,
}

impl Token<'_> {
    pub fn is_blank_text(&self) -> bool {
        self.kind == TokenKind::Text && self.raw.trim().is_empty()
    }

    fn is_bold_open(&self) -> bool {
        self.kind == TokenKind::Open && (self.name == "b" || self.name == "strong")
    }
}

pub fn tokenize(html: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    for caps in TAG_RE.captures_iter(html) {
        let Some(m) = caps.get(0) else { continue };
        if m.start() > cursor {
            tokens.push(text_token(html, cursor, m.start()));
        }
        let (kind, name) = match caps.get(2) {
            None => (TokenKind::Other, String::new()),
            Some(name) => {
                let name = name.as_str().to_ascii_lowercase();
                let kind = if caps.get(1).is_some() {
                    TokenKind::Close
                } else if caps.get(4).is_some() || VOID_TAGS.contains(&name.as_str()) {
                    TokenKind::Empty
                } else {
                    TokenKind::Open
                };
                (kind, name)
            }
        };
        tokens.push(Token {
            kind,
            name,
            raw: m.as_str(),
            start: m.start(),
            end: m.end(),
        });
        cursor = m.end();
    }

    if cursor < html.len() {
        tokens.push(text_token(html, cursor, html.len()));
    }
    tokens
}

fn text_token(html: &str, start: usize, end: usize) -> Token<'_> {
    Token {
        kind: TokenKind::Text,
        name: String::new(),
        raw: &html[start..end],
        start,
        end,
    }
}

/// Index of the token closing the element opened at `open`, counting only
/// tags with the same name.
pub fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let name = &tokens[open].name;
    let mut depth = 0usize;
    for (idx, token) in tokens.iter().enumerate().skip(open) {
        if &token.name != name {
            continue;
        }
        match token.kind {
            TokenKind::Open => depth += 1,
            TokenKind::Close => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// An element (or a run of text) sliced out of a fragment.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    /// Tag name, `None` for text and comments.
    pub name: Option<&'a str>,
    pub outer: &'a str,
    pub inner: &'a str,
    pub start: usize,
    pub end: usize,
}

impl<'a> Node<'a> {
    pub fn is(&self, tag: &str) -> bool {
        self.name.is_some_and(|n| n.eq_ignore_ascii_case(tag))
    }

    pub fn text(&self) -> String {
        flatten_text(self.inner)
    }

    /// True when the element renders no text (e.g. `<p><br /></p>`,
    /// `<p><em> </em></p>`, `<p>&nbsp;</p>`).
    pub fn is_blank(&self) -> bool {
        self.text().is_empty()
    }

    /// Name of the first child tag, ignoring leading whitespace.
    pub fn lead_tag(&self) -> Option<String> {
        tokenize(self.inner)
            .into_iter()
            .find(|t| !t.is_blank_text())
            .filter(|t| t.kind == TokenKind::Open || t.kind == TokenKind::Empty)
            .map(|t| t.name)
    }

    /// True when the element's content is a single `<tag>` child
    /// (whitespace aside), as in `<p><em>Monster Level: 3</em></p>`.
    pub fn wraps(&self, tag: &str) -> bool {
        let tokens = tokenize(self.inner);
        let Some(first) = tokens.iter().position(|t| !t.is_blank_text()) else {
            return false;
        };
        if tokens[first].kind != TokenKind::Open || tokens[first].name != tag {
            return false;
        }
        match matching_close(&tokens, first) {
            Some(close) => tokens[close + 1..].iter().all(Token::is_blank_text),
            None => false,
        }
    }

    /// The leading bold label and the markup after it:
    /// `<p><b>Ammunition:</b> 1 boulder</p>` → `("Ammunition:", " 1 boulder")`.
    pub fn lead_bold(&self) -> Option<(String, &'a str)> {
        let inner = self.inner;
        let tokens = tokenize(inner);
        let first = tokens.iter().position(|t| !t.is_blank_text())?;
        if !tokens[first].is_bold_open() {
            return None;
        }
        let close = matching_close(&tokens, first)?;
        let label = flatten_text(&inner[tokens[first].end..tokens[close].start]);
        Some((label, &inner[tokens[close].end..]))
    }
}

/// Depth-0 elements and text runs of a fragment, in order.
pub fn top_level_nodes(fragment: &str) -> Vec<Node<'_>> {
    let tokens = tokenize(fragment);
    let mut nodes = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        match token.kind {
            TokenKind::Open => {
                let (end, inner_end, next) = match matching_close(&tokens, i) {
                    Some(close) => (tokens[close].end, tokens[close].start, close + 1),
                    None => (fragment.len(), fragment.len(), tokens.len()),
                };
                nodes.push(Node {
                    name: Some(tag_name(fragment, token)),
                    outer: &fragment[token.start..end],
                    inner: &fragment[token.end..inner_end],
                    start: token.start,
                    end,
                });
                i = next;
            }
            TokenKind::Empty => {
                nodes.push(Node {
                    name: Some(tag_name(fragment, token)),
                    outer: token.raw,
                    inner: "",
                    start: token.start,
                    end: token.end,
                });
                i += 1;
            }
            TokenKind::Text | TokenKind::Other => {
                nodes.push(Node {
                    name: None,
                    outer: token.raw,
                    inner: token.raw,
                    start: token.start,
                    end: token.end,
                });
                i += 1;
            }
            // stray close tag
            TokenKind::Close => i += 1,
        }
    }

    nodes
}

/// Every `<tag>` element in the fragment, at any depth, in document order.
pub fn find_elements<'a>(fragment: &'a str, tag: &str) -> Vec<Node<'a>> {
    let tokens = tokenize(fragment);
    tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.kind == TokenKind::Open && t.name == tag)
        .map(|(i, open)| {
            let (end, inner_end) = match matching_close(&tokens, i) {
                Some(close) => (tokens[close].end, tokens[close].start),
                None => (fragment.len(), fragment.len()),
            };
            Node {
                name: Some(tag_name(fragment, open)),
                outer: &fragment[open.start..end],
                inner: &fragment[open.end..inner_end],
                start: open.start,
                end,
            }
        })
        .collect()
}

/// Tag name as written in the source, so `Node` borrows instead of owning.
fn tag_name<'a>(fragment: &'a str, token: &Token) -> &'a str {
    let raw = &fragment[token.start..token.end];
    let body = raw.trim_start_matches(|c: char| c == '<' || c == '/' || c.is_whitespace());
    let len = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    &body[..len]
}

/// Plain-text rendering of a markup fragment.
///
/// Line breaks become `\n`, a paragraph boundary becomes a blank line, a
/// cell boundary becomes ` | ` and a new table row starts a new line. All
/// other tags are dropped and `&nbsp;` becomes a space. Space runs and
/// blank-line runs are collapsed. Applying it twice changes nothing.
pub fn strip_to_text(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    // whitespace seen after a `</p>` or `</td>`, dropped if the matching
    // opening tag follows
    let mut held = String::new();
    let mut pending: Option<&'static str> = None;

    for token in tokenize(fragment) {
        match token.kind {
            TokenKind::Text if pending.is_some() && token.is_blank_text() => {
                held.push_str(token.raw);
            }
            TokenKind::Text => {
                flush(&mut out, &mut held, &mut pending);
                out.push_str(token.raw);
            }
            TokenKind::Empty if token.name == "br" => {
                if pending.is_some() {
                    held.push('\n');
                } else {
                    out.push('\n');
                }
            }
            TokenKind::Open if pending.is_some_and(|p| p == token.name) => {
                out.push_str(if token.name == "p" { "\n\n" } else { " | " });
                held.clear();
                pending = None;
            }
            TokenKind::Close if token.name == "p" || token.name == "td" => {
                flush(&mut out, &mut held, &mut pending);
                pending = Some(if token.name == "p" { "p" } else { "td" });
            }
            TokenKind::Open if token.name == "tr" => {
                flush(&mut out, &mut held, &mut pending);
                out.push('\n');
            }
            _ => flush(&mut out, &mut held, &mut pending),
        }
    }
    flush(&mut out, &mut held, &mut pending);

    let text = NBSP_RE.replace_all(&out, " ");
    let text = SPACE_RUN_RE.replace_all(&text, " ");
    let text = BLANK_LINES_RE.replace_all(&text, "\n\n");
    text.trim().to_string()
}

fn flush(out: &mut String, held: &mut String, pending: &mut Option<&'static str>) {
    out.push_str(held);
    held.clear();
    *pending = None;
}

/// Single-line plain text: [`strip_to_text`] with every whitespace run
/// collapsed to one space.
pub fn flatten_text(fragment: &str) -> String {
    collapse_whitespace(&strip_to_text(fragment))
}

pub fn collapse_whitespace(s: &str) -> String {
    WS_RUN_RE.replace_all(s, " ").trim().to_string()
}
