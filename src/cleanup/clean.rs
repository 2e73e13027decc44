//! Normalize exported chapter markup: drop styling attributes and empty
//! elements, give every heading a single bold run, separate block elements
//! with line breaks and tidy whitespace.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::parser::markup::{find_elements, top_level_nodes};

static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s+(?:class|style|id|lang)="[^"]*""#).unwrap());
static NBSP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)&nbsp;?").unwrap());
static COLGROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<colgroup\b[^>]*>.*?</colgroup\s*>").unwrap());
static BR_ONLY_P_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<p(?:\s[^>]*)?>\s*<br\s*/?>\s*</p>\s*").unwrap());
static EMPTY_P_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<p(?:\s[^>]*)?>\s*</p>\s*").unwrap());
static EMPTY_INLINE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["a", "b", "em", "span", "i"]
        .iter()
        .map(|tag| Regex::new(&format!(r"(?i)<{tag}(?:\s[^>]*)?>\s*</{tag}\s*>")).unwrap())
        .collect()
});
static NESTED_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"(?i)<b\s*>\s*<b\s*>").unwrap(), "<b>"),
        (Regex::new(r"(?i)</b\s*>\s*</b\s*>").unwrap(), "</b>"),
        (Regex::new(r"(?i)<strong\s*>\s*<strong\s*>").unwrap(), "<strong>"),
        (Regex::new(r"(?i)</strong\s*>\s*</strong\s*>").unwrap(), "</strong>"),
    ]
});
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(h[1-4])>(.*?)</(h[1-4])>").unwrap());
static BOLD_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?(?:b|strong)\s*>").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static BREAK_BEFORE_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"</p>\s*<p>").unwrap(), "</p>\n<br />\n<p>"),
        (Regex::new(r"(?i)</table>\s*<p>").unwrap(), "</table>\n<br />\n<p>"),
        (Regex::new(r"(?i)</p>\s*<table>").unwrap(), "</p>\n<br />\n<table>"),
        (Regex::new(r"(?i)</p>\s*<ul>").unwrap(), "</p>\n<br />\n<ul>"),
    ]
});
static EXTRA_NEWLINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

pub fn clean(html: &str) -> String {
    let html = ATTR_RE.replace_all(html, "");
    let html = NBSP_RE.replace_all(&html, " ");
    let html = COLGROUP_RE.replace_all(&html, "");
    let html = BR_ONLY_P_RE.replace_all(&html, "");
    let html = EMPTY_P_RE.replace_all(&html, "");

    let html = until_stable(html.into_owned(), |s| {
        EMPTY_INLINE_RES
            .iter()
            .fold(s.to_string(), |acc, re| re.replace_all(&acc, "").into_owned())
    });
    let html = EMPTY_P_RE.replace_all(&html, "").into_owned();
    let html = until_stable(html, |s| {
        NESTED_RES
            .iter()
            .fold(s.to_string(), |acc, (re, to)| re.replace_all(&acc, *to).into_owned())
    });
    let html = normalize_headings(&html);

    let html = BREAK_BEFORE_RES
        .iter()
        .fold(html, |acc, (re, to)| re.replace_all(&acc, *to).into_owned());
    let html = unwrap_cell_paragraphs(&html);

    let html = html
        .split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    let html = EXTRA_NEWLINES_RE.replace_all(&html, "\n\n").into_owned();

    until_stable(html, |s| EMPTY_P_RE.replace_all(s, "").into_owned())
}

fn until_stable(mut s: String, step: impl Fn(&str) -> String) -> String {
    loop {
        let next = step(&s);
        if next == s {
            return s;
        }
        s = next;
    }
}

/// `<h2>Battering <b>RAM</b></h2>` → `<h2><b>Battering RAM</b></h2>`.
fn normalize_headings(html: &str) -> String {
    HEADING_RE
        .replace_all(html, |caps: &Captures| {
            let (open, close) = (&caps[1], &caps[3]);
            if !open.eq_ignore_ascii_case(close) {
                return caps[0].to_string();
            }
            let text = BOLD_TAG_RE.replace_all(&caps[2], "");
            let text = WS_RE.replace_all(&text, " ");
            format!("<{open}><b>{}</b></{close}>", text.trim())
        })
        .into_owned()
}

/// `<td><p>2</p></td>` → `<td>2</td>` when the paragraph is the cell's only
/// content.
fn unwrap_cell_paragraphs(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;

    for td in find_elements(html, "td") {
        if td.start < cursor || !td.wraps("p") {
            continue;
        }
        let Some(p) = top_level_nodes(td.inner).into_iter().find(|n| n.is("p")) else {
            continue;
        };
        let Some(open_len) = td.outer.find('>').map(|i| i + 1) else {
            continue;
        };
        let close = &td.outer[open_len + td.inner.len()..];

        out.push_str(&html[cursor..td.start]);
        out.push_str(&td.outer[..open_len]);
        out.push_str(p.inner);
        out.push_str(close);
        cursor = td.end;
    }
    out.push_str(&html[cursor..]);
    out
}
