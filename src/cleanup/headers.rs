use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::parser::markup::{matching_close, tokenize, Token, TokenKind};

static BOLD_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(h[1-6])><b>([^<]+)</b></(h[1-6])>").unwrap());
static PLAIN_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(h[1-6])>([^<]+)</(h[1-6])>").unwrap());
static STYLE_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\s+style\s*=\s*"([^"]*)""#).unwrap());

const BRANDED: &[&str] = &["h2", "h3", "h4"];

/// Uppercase the text of `<hN><b>text</b></hN>` and `<hN>text</hN>`.
pub fn uppercase(html: &str) -> String {
    let html = BOLD_HEADER_RE.replace_all(html, |caps: &Captures| {
        if caps[1] != caps[3] {
            return caps[0].to_string();
        }
        format!("<{0}><b>{1}</b></{0}>", &caps[1], caps[2].to_uppercase())
    });
    PLAIN_HEADER_RE
        .replace_all(&html, |caps: &Captures| {
            if caps[1] != caps[3] {
                return caps[0].to_string();
            }
            format!("<{0}>{1}</{0}>", &caps[1], caps[2].to_uppercase())
        })
        .into_owned()
}

/// Give unlinked `h2`–`h4` headings the branding colour, appended to any
/// style they already carry.
pub fn brand(html: &str, color: &str) -> String {
    let marker = color.trim().trim_end_matches(';').trim_end();
    rewrite_open_tags(html, |tokens, i| {
        let token = &tokens[i];
        if !BRANDED.contains(&token.name.as_str()) || contains_anchor(tokens, i) {
            return None;
        }
        let existing = style_of(token.raw).unwrap_or_default();
        if existing.contains(marker) {
            return None;
        }
        let style = if existing.trim().is_empty() {
            color.to_string()
        } else {
            format!("{}; {color}", existing.trim_end_matches([';', ' ']))
        };
        Some(with_style(token.raw, Some(&style)))
    })
}

/// Drop inline styles from paragraphs; on `h2`–`h4` keep nothing but the
/// branding colour, and not even that on linked headings.
pub fn strip_styles(html: &str, color: &str) -> String {
    rewrite_open_tags(html, |tokens, i| {
        let token = &tokens[i];
        let style = if token.name == "p" {
            None
        } else if BRANDED.contains(&token.name.as_str()) {
            (!contains_anchor(tokens, i)).then_some(color)
        } else {
            return None;
        };
        let rewritten = with_style(token.raw, style);
        (rewritten != token.raw).then_some(rewritten)
    })
}

/// Replace opening tags for which `rewrite` returns a new tag.
fn rewrite_open_tags<F>(html: &str, mut rewrite: F) -> String
where
    F: FnMut(&[Token], usize) -> Option<String>,
{
    let tokens = tokenize(html);
    let mut out = String::with_capacity(html.len() + 64);
    let mut cursor = 0;
    for i in 0..tokens.len() {
        if tokens[i].kind != TokenKind::Open {
            continue;
        }
        if let Some(tag) = rewrite(&tokens, i) {
            out.push_str(&html[cursor..tokens[i].start]);
            out.push_str(&tag);
            cursor = tokens[i].end;
        }
    }
    out.push_str(&html[cursor..]);
    out
}

fn contains_anchor(tokens: &[Token], open: usize) -> bool {
    let end = matching_close(tokens, open).unwrap_or(tokens.len());
    tokens[open + 1..end]
        .iter()
        .any(|t| t.kind == TokenKind::Open && t.name == "a")
}

fn style_of(tag: &str) -> Option<String> {
    STYLE_ATTR_RE.captures(tag).map(|c| c[1].to_string())
}

/// `tag` with its `style` attribute set to `style`, or removed for `None`.
fn with_style(tag: &str, style: Option<&str>) -> String {
    let bare = STYLE_ATTR_RE.replace(tag, "");
    let Some(style) = style else {
        return bare.into_owned();
    };
    // after `<` and the tag name
    let name_end = bare
        .char_indices()
        .skip(1)
        .find(|(_, c)| !c.is_ascii_alphanumeric())
        .map_or(bare.len(), |(i, _)| i);
    format!(
        "{} style=\"{style}\"{}",
        &bare[..name_end],
        &bare[name_end..]
    )
}
