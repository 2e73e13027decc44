use serde::Serialize;
use tracing::debug;

use super::{description_markup, first_em_text, Record};
use crate::parser::blocks::{split_blocks, Block, HeadingLevel};
use crate::parser::fields::inline_value;
use crate::parser::markup::strip_to_text;
use crate::parser::names::display_name;

#[derive(Debug, Clone, Serialize)]
pub struct Armor {
    #[serde(skip)]
    pub name: String,
    pub tags: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub base: String,
    pub subcategory: &'static str,
    pub content: String,
    pub description: String,
}

impl Record for Armor {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Tag-line category to armor type, first match wins.
const TYPES: &[(&str, &str)] = &[
    ("SHIELD", "shield"),
    ("MEDIUM", "medium"),
    ("LIGHT", "light"),
    ("HEAVY", "heavy"),
];

pub fn extract(html: &str) -> Vec<Armor> {
    split_blocks(html, HeadingLevel::H3)
        .iter()
        .map(parse_block)
        .collect()
}

fn parse_block(block: &Block) -> Armor {
    let tags = first_em_text(block.body);
    let base = inline_value(block.body, "Base");
    let rest = description_markup(block.body, &["Base"], false);
    debug!(heading = %block.heading, base = %base, "armor block");

    let base_html = if base.is_empty() {
        String::new()
    } else {
        format!("<p><b>Base: </b>{base}</p>")
    };
    let content = match (base_html.is_empty(), rest.is_empty()) {
        (false, false) => format!("{base_html}<br />{rest}"),
        (false, true) => base_html,
        _ => rest.clone(),
    };

    let body_text = strip_to_text(&rest);
    let description = match (base.is_empty(), body_text.is_empty()) {
        (false, false) => format!("Base: {base}.\n\n{body_text}"),
        (false, true) => format!("Base: {base}."),
        _ => body_text,
    };

    Armor {
        name: display_name(&block.heading),
        kind: type_from_tags(&tags).to_string(),
        tags,
        base,
        subcategory: "armor",
        content,
        description,
    }
}

/// `Armor, Medium, Uncommon` → `medium`. The category must follow `Armor,`
/// or sit between commas.
pub fn type_from_tags(tags: &str) -> &'static str {
    let upper = tags.to_uppercase();
    TYPES
        .iter()
        .find(|(word, _)| {
            upper.contains(&format!("ARMOR, {word}")) || upper.contains(&format!(", {word},"))
        })
        .map_or("", |(_, kind)| kind)
}
