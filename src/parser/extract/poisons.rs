use serde::Serialize;

use super::{without, Record};
use crate::parser::blocks::{split_blocks, Block, HeadingLevel};
use crate::parser::markup::{collapse_whitespace, find_elements, flatten_text, Node};
use crate::parser::names::display_name;

#[derive(Debug, Clone, Serialize)]
pub struct Poison {
    #[serde(skip)]
    pub name: String,
    pub tags: String,
    pub description: String,
    pub content: String,
}

impl Record for Poison {
    fn name(&self) -> &str {
        &self.name
    }
}

pub fn extract(html: &str) -> Vec<Poison> {
    split_blocks(html, HeadingLevel::H3)
        .iter()
        .map(parse_block)
        .collect()
}

fn parse_block(block: &Block) -> Poison {
    let ems = outermost(find_elements(block.body, "em"));
    let tags = ems.first().map(Node::text).unwrap_or_default();

    // italic phrases after the tag line are the poison's delivery and onset
    let mut parts: Vec<String> = ems
        .iter()
        .skip(1)
        .map(Node::text)
        .filter(|t| !t.is_empty())
        .map(|t| if t.ends_with('.') { t } else { format!("{t}.") })
        .collect();
    parts.push(flatten_text(&without(block.body, &ems)));

    Poison {
        name: display_name(&block.heading),
        tags,
        description: collapse_whitespace(&parts.join(" ")),
        content: block.body.trim().to_string(),
    }
}

fn outermost(nodes: Vec<Node>) -> Vec<Node> {
    let mut kept: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if kept.last().is_some_and(|prev| node.start < prev.end) {
            continue;
        }
        kept.push(node);
    }
    kept
}
