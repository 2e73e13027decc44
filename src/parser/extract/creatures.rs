//! Creature stat blocks (`<h2>` per creature).
//!
//! A stat block opens with `<p><em>Monster Level: N</em></p>` and a size
//! line, carries an attribute table and defense lines, then lists its
//! features, actions and reactions under marker paragraphs. Narrative
//! sections of the chapter share the heading level and are skipped.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::{first_em_text, Record};
use crate::parser::blocks::{split_blocks, Block, HeadingLevel};
use crate::parser::fields::{extract_fields, inline_value, leading_int, Rule};
use crate::parser::markup::{find_elements, flatten_text, Node};
use crate::parser::names::display_name;
use crate::parser::sections::{cluster_sections, nodes_of, SectionKind};

static LEVEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Monster Level:\s*(\d+)$").unwrap());
static DEFENSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\+\d+\s+vs\s+([^.<]+)").unwrap());
static MODIFIER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\+(\d+)\s+vs").unwrap());
static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:Ranged|Reach|Thrown)\s+\d+\s*ft").unwrap());

const FIELDS: &[(&str, Rule)] = &[
    ("strength", Rule::Cell("STR")),
    ("dexterity", Rule::Cell("DEX")),
    ("endurance", Rule::Cell("END")),
    ("awareness", Rule::Cell("AWR")),
    ("intellect", Rule::Cell("INT")),
    ("charisma", Rule::Cell("CHA")),
    ("reflexes", Rule::Defense("Ref")),
    ("fortitude", Rule::Defense("Fort")),
    ("anticipation", Rule::Defense("Ant")),
    ("logic", Rule::Defense("Log")),
    ("willpower", Rule::Defense("Will")),
    ("hp", Rule::Inline("Hit Points")),
    ("armor_rating", Rule::Inline("Armor Rating")),
    ("speed", Rule::Inline("Speed")),
    ("immune", Rule::Paragraph("Immune")),
    ("vulnerable", Rule::Paragraph("Vulnerable")),
    ("resist", Rule::Paragraph("Resist")),
    ("dr", Rule::Paragraph("DR")),
    ("senses", Rule::Paragraph("Senses")),
    ("traits", Rule::Paragraph("Traits")),
    ("skills", Rule::Paragraph("Skills")),
];

/// A named feature or reaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trait {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Action {
    pub name: String,
    pub effect: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defense: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Creature {
    #[serde(skip)]
    pub name: String,
    pub description: String,
    pub category: &'static str,
    pub level: String,
    pub size: String,
    pub tags: String,
    pub token: String,
    pub hp: String,
    pub armor_rating: String,
    pub dr: String,
    pub immune: String,
    pub resist: String,
    pub vulnerable: String,
    pub speed: String,
    pub senses: String,
    pub traits: String,
    pub strength: String,
    pub dexterity: String,
    pub endurance: String,
    pub anticipation: String,
    pub reflexes: String,
    pub awareness: String,
    pub intellect: String,
    pub logic: String,
    pub willpower: String,
    pub charisma: String,
    pub fortitude: String,
    pub action_description: String,
    pub features: Vec<Trait>,
    pub actions: Vec<Action>,
    pub reactions: Vec<Trait>,
    pub content: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub skills: String,
}

impl Record for Creature {
    fn name(&self) -> &str {
        &self.name
    }
}

pub fn extract(html: &str) -> Vec<Creature> {
    split_blocks(html, HeadingLevel::H2)
        .iter()
        .filter(|b| is_stat_block(b))
        .map(parse_block)
        .collect()
}

fn is_stat_block(block: &Block) -> bool {
    let keep = block.body.contains("Monster Level") || block.body.contains("Hit Points");
    if !keep {
        debug!(heading = %block.heading, "skipping narrative section");
    }
    keep
}

fn parse_block(block: &Block) -> Creature {
    let body = block.body;
    let mut fields = extract_fields(body, FIELDS);

    let italic_lines: Vec<String> = find_elements(body, "p")
        .iter()
        .filter(|p| p.wraps("em"))
        .map(Node::text)
        .collect();
    let level = italic_lines
        .iter()
        .find_map(|line| LEVEL_RE.captures(line).map(|c| c[1].to_string()))
        .unwrap_or_default();
    let (size, tags) = italic_lines
        .get(1)
        .map(|line| match line.split_once('.') {
            Some((size, tags)) => (size.trim().to_string(), tags.trim().to_string()),
            None => (line.trim().to_string(), String::new()),
        })
        .unwrap_or_default();

    let sections = cluster_sections(body);
    let action_description = nodes_of(&sections, SectionKind::Actions)
        .find(|n| n.is("p") && n.wraps("em"))
        .map(Node::text)
        .unwrap_or_default();
    let features = named_paragraphs(nodes_of(&sections, SectionKind::Features))
        .map(|(name, rest)| Trait {
            name,
            description: flatten_text(rest),
        })
        .collect();
    let actions = named_paragraphs(nodes_of(&sections, SectionKind::Actions))
        .map(|(name, rest)| parse_action(name, rest))
        .collect();
    let reactions = named_paragraphs(nodes_of(&sections, SectionKind::Reactions))
        .map(|(name, rest)| Trait {
            name,
            description: flatten_text(rest),
        })
        .collect();

    Creature {
        name: display_name(&block.heading),
        description: String::new(),
        category: "Creatures",
        level,
        size,
        tags,
        token: String::new(),
        hp: leading_int(&fields.take("hp")).unwrap_or_default(),
        armor_rating: leading_int(&fields.take("armor_rating")).unwrap_or_default(),
        dr: fields.take("dr"),
        immune: fields.take("immune"),
        resist: fields.take("resist"),
        vulnerable: fields.take("vulnerable"),
        speed: fields.take("speed"),
        senses: fields.take("senses"),
        traits: fields.take("traits"),
        strength: fields.take("strength"),
        dexterity: fields.take("dexterity"),
        endurance: fields.take("endurance"),
        anticipation: fields.take("anticipation"),
        reflexes: fields.take("reflexes"),
        awareness: fields.take("awareness"),
        intellect: fields.take("intellect"),
        logic: fields.take("logic"),
        willpower: fields.take("willpower"),
        charisma: fields.take("charisma"),
        fortitude: fields.take("fortitude"),
        action_description,
        features,
        actions,
        reactions,
        content: body.trim().to_string(),
        skills: fields.take("skills"),
    }
}

/// Paragraphs led by a bold `Name.`, as (name, markup after the label).
fn named_paragraphs<'s, 'a: 's>(
    nodes: impl Iterator<Item = &'s Node<'a>> + 's,
) -> impl Iterator<Item = (String, &'a str)> + 's {
    nodes.filter(|n| n.is("p")).filter_map(|p| {
        let (label, rest) = p.lead_bold()?;
        let name = label.strip_suffix('.')?.trim();
        (!name.is_empty()).then(|| (name.to_string(), rest))
    })
}

fn parse_action(name: String, rest: &str) -> Action {
    let kind = Some(first_em_text(rest)).filter(|t| !t.is_empty());
    let damage = Some(inline_value(rest, "Hit")).filter(|d| !d.is_empty());
    let defense = DEFENSE_RE
        .captures(rest)
        .map(|c| flatten_text(&c[1]))
        .filter(|d| !d.is_empty());
    let modifier = defense
        .as_ref()
        .and_then(|_| MODIFIER_RE.captures(rest))
        .map(|c| c[1].to_string());
    let range = RANGE_RE.find(rest).map(|m| flatten_text(m.as_str()));

    Action {
        name,
        effect: flatten_text(rest),
        kind,
        damage,
        defense,
        modifier,
        range,
    }
}
