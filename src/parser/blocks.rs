use super::markup::{self, TokenKind};

/// Heading levels entries are filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    H2,
    H3,
}

impl HeadingLevel {
    pub fn tag(self) -> &'static str {
        match self {
            HeadingLevel::H2 => "h2",
            HeadingLevel::H3 => "h3",
        }
    }
}

/// One entry's heading and the markup up to the next same-level heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub heading: String,
    pub body: &'a str,
}

/// Split a chapter into heading-delimited blocks.
///
/// Text before the first heading is dropped. Headings of other levels stay
/// inside the body. A heading with no text ends the previous body without
/// starting a block of its own.
pub fn split_blocks(html: &str, level: HeadingLevel) -> Vec<Block<'_>> {
    let tag = level.tag();
    let tokens = markup::tokenize(html);

    // (heading text, body start, heading start)
    let mut headings: Vec<(String, usize, usize)> = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token.kind == TokenKind::Open && token.name == tag {
            let close = markup::matching_close(&tokens, i);
            let (inner_end, body_start) = match close {
                Some(c) => (tokens[c].start, tokens[c].end),
                None => (html.len(), html.len()),
            };
            let text = markup::flatten_text(&html[token.end..inner_end]);
            headings.push((text, body_start, token.start));
            i = close.map_or(tokens.len(), |c| c + 1);
            continue;
        }
        i += 1;
    }

    let mut blocks = Vec::with_capacity(headings.len());
    for (idx, (text, body_start, _)) in headings.iter().enumerate() {
        if text.is_empty() {
            continue;
        }
        let body_end = headings
            .get(idx + 1)
            .map_or(html.len(), |(_, _, next_start)| *next_start);
        blocks.push(Block {
            heading: text.clone(),
            body: &html[*body_start..body_end],
        });
    }
    blocks
}
