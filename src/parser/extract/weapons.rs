use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::{description_markup, first_em_text, Record};
use crate::parser::blocks::{split_blocks, Block, HeadingLevel};
use crate::parser::fields::{extract_fields, Rule};
use crate::parser::markup::strip_to_text;
use crate::parser::names::display_name;

static DICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+d\d+(?:\+\d+)?)\s+(.+)$").unwrap());
static COMPOUND_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,\s*(?:and\s+)?|\s+and\s+").unwrap());
static DICE_START_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+d\d+").unwrap());
static FIRST_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(\w+)\]").unwrap());

const FIELDS: &[(&str, Rule)] = &[
    ("range", Rule::Inline("Range")),
    ("apc", Rule::Inline("APC")),
    ("damage", Rule::Inline("Damage")),
];

const STAT_LABELS: &[&str] = &["Range", "APC", "Damage"];

#[derive(Debug, Clone, Serialize)]
pub struct Weapon {
    #[serde(skip)]
    pub name: String,
    pub apc: String,
    pub tags: String,
    pub range: String,
    pub damage: String,
    pub attribute: String,
    pub damage_type: String,
    pub subcategory: &'static str,
    pub content: String,
    pub description: String,
}

impl Record for Weapon {
    fn name(&self) -> &str {
        &self.name
    }
}

pub fn extract(html: &str) -> Vec<Weapon> {
    split_blocks(html, HeadingLevel::H3)
        .iter()
        .filter(|b| is_weapon(b))
        .map(parse_block)
        .collect()
}

/// The weapons chapter also carries an `ACTIONS` heading and an animated
/// weapon's creature stat block; neither is a weapon.
fn is_weapon(block: &Block) -> bool {
    if block.heading.eq_ignore_ascii_case("ACTIONS") {
        return false;
    }
    if block.body.contains("Monster Level:") {
        debug!(heading = %block.heading, "skipping creature stat block");
        return false;
    }
    true
}

fn parse_block(block: &Block) -> Weapon {
    let mut fields = extract_fields(block.body, FIELDS);
    let tags = first_em_text(block.body);
    let damage = parse_damage(&fields.take("damage"));
    let damage_type = FIRST_TYPE_RE
        .captures(&damage)
        .map(|c| c[1].to_string())
        .unwrap_or_default();
    let content = description_markup(block.body, STAT_LABELS, true);
    let description = strip_to_text(&content);

    Weapon {
        name: display_name(&block.heading),
        apc: fields.take("apc"),
        attribute: attribute_from_tags(&tags).to_string(),
        tags,
        range: fields.take("range"),
        damage,
        damage_type,
        subcategory: "weapon",
        content,
        description,
    }
}

/// Canonical dice notation for a damage line.
///
/// `1d8+2 sharp` → `1d8+2[sharp]`,
/// `1d4 fire, 1d4 cold, and 1d4 lightning` → `1d4[fire]+1d4[cold]+1d4[lightning]`,
/// `1d8+2 fire, lightning, or cold` → `1d8+2[fire, lightning, or cold]`.
pub fn parse_damage(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    // one roll, a choice of types
    if text.contains(" or ") && !text.contains(" and ") {
        if let Some(caps) = DICE_RE.captures(text) {
            return format!("{}[{}]", &caps[1], caps[2].trim());
        }
    }

    compound_parts(text)
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match DICE_RE.captures(part) {
            Some(caps) => format!("{}[{}]", &caps[1], caps[2].trim()),
            None => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join("+")
}

/// Split at `,`/`and` separators that are followed by another roll;
/// other commas belong to a type list (`1d6 fire, cold`).
fn compound_parts(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for sep in COMPOUND_SPLIT_RE.find_iter(text) {
        if DICE_START_RE.is_match(&text[sep.end()..]) {
            parts.push(&text[start..sep.start()]);
            start = sep.end();
        }
    }
    parts.push(&text[start..]);
    parts
}

pub fn attribute_from_tags(tags: &str) -> &'static str {
    let upper = tags.to_uppercase();
    let has = |s: &str| upper.contains(s);

    if has("STR OR DEX") || has("DEX OR STR") {
        return "strength or dexterity";
    }
    if has("STR WEAPON") && !has("DEX WEAPON") && !has(" OR ") {
        return "strength";
    }
    if has("DEX WEAPON") && !has("STR WEAPON") && !has(" OR ") {
        return "dexterity";
    }
    if has("CHA WEAPON") {
        return "charisma";
    }
    if has("STR") {
        "strength"
    } else if has("DEX") {
        "dexterity"
    } else if has("CHA") {
        "charisma"
    } else {
        ""
    }
}
