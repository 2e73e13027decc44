use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::Record;
use crate::parser::blocks::{split_blocks, Block, HeadingLevel};
use crate::parser::fields::{extract_fields, inline_value, label_matches, Rule};
use crate::parser::markup::{find_elements, top_level_nodes, Node};
use crate::parser::names::display_name;

static HIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+d\d+)\s*(\w+)").unwrap());

/// Bold labels that mark a paragraph as a stat line rather than prose.
pub const STAT_LABELS: &[&str] = &[
    "Range",
    "Ammunition",
    "Reload",
    "AOE",
    "Heft",
    "Speed",
    "HP",
    "AR",
    "REF",
    "FORT",
    "Resist",
    "Immune",
    "DR",
    "DT",
    "Vulnerable",
];

const FIELDS: &[(&str, Rule)] = &[
    ("ammunition", Rule::Paragraph("Ammunition")),
    ("reload", Rule::Paragraph("Reload")),
    ("area_of_effect", Rule::Paragraph("AOE")),
    ("heft", Rule::Paragraph("Heft")),
    ("speed", Rule::Paragraph("Speed")),
    ("hp", Rule::Paragraph("HP")),
    ("armor_rating", Rule::Paragraph("AR")),
    ("reflexes", Rule::Paragraph("REF")),
    ("fortitude", Rule::Paragraph("FORT")),
    ("resist", Rule::Paragraph("Resist")),
    ("immune", Rule::Paragraph("Immune")),
    ("damage_reduction", Rule::Paragraph("DR")),
    ("damage_threshold", Rule::Paragraph("DT")),
    ("range", Rule::Paragraph("Range")),
];

#[derive(Debug, Clone, Serialize)]
pub struct SiegeAction {
    pub name: &'static str,
    pub range: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub defense: &'static str,
    pub damage: String,
    pub damage_type: String,
    pub effect: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiegeWeapon {
    #[serde(skip)]
    pub name: String,
    pub description: String,
    pub ammunition: String,
    pub reload: String,
    pub area_of_effect: String,
    // existing store files spell it this way
    #[serde(rename = "helf")]
    pub heft: String,
    pub speed: String,
    pub hp: String,
    pub armor_rating: String,
    pub reflexes: String,
    pub fortitude: String,
    pub resist: String,
    pub immune: String,
    pub damage_reduction: String,
    pub damage_threshold: String,
    pub subcategory: &'static str,
    pub actions: Vec<SiegeAction>,
    pub content: String,
}

impl Record for SiegeWeapon {
    fn name(&self) -> &str {
        &self.name
    }
}

pub fn extract(html: &str) -> Vec<SiegeWeapon> {
    split_blocks(html, HeadingLevel::H2)
        .iter()
        .map(parse_block)
        .collect()
}

fn parse_block(block: &Block) -> SiegeWeapon {
    let mut fields = extract_fields(block.body, FIELDS);
    let action = attack(block.body, fields.take("range"));

    SiegeWeapon {
        name: display_name(&block.heading),
        description: description(block.body),
        ammunition: fields.take("ammunition"),
        reload: fields.take("reload"),
        area_of_effect: fields.take("area_of_effect"),
        heft: fields.take("heft"),
        speed: fields.take("speed"),
        hp: fields.take("hp"),
        armor_rating: fields.take("armor_rating"),
        reflexes: fields.take("reflexes"),
        fortitude: fields.take("fortitude"),
        resist: fields.take("resist"),
        immune: fields.take("immune"),
        damage_reduction: fields.take("damage_reduction"),
        damage_threshold: fields.take("damage_threshold"),
        subcategory: "siege",
        actions: vec![action],
        content: block.body.trim().to_string(),
    }
}

fn is_stat_label(label: &str) -> bool {
    STAT_LABELS.iter().any(|stat| label_matches(label, stat))
}

/// The opening paragraph, unless the block opens straight into its stats.
fn description(body: &str) -> String {
    let Some(first) = top_level_nodes(body)
        .into_iter()
        .find(|n| !n.outer.trim().is_empty())
    else {
        return String::new();
    };
    if !first.is("p") {
        return String::new();
    }
    match first.lead_bold() {
        Some((label, _)) if is_stat_label(&label) => String::new(),
        _ => first.text(),
    }
}

fn has_stat_label(p: &Node) -> bool {
    find_elements(p.inner, "b")
        .iter()
        .any(|b| is_stat_label(&b.text()))
}

/// The weapon's attack: the last prose paragraph of the block.
fn attack(body: &str, range: String) -> SiegeAction {
    let mut action = SiegeAction {
        name: "Attack",
        range,
        kind: "Siege Weapon",
        defense: "AR",
        damage: String::new(),
        damage_type: String::new(),
        effect: String::new(),
    };

    let paragraphs = find_elements(body, "p");
    let Some((p, effect)) = paragraphs
        .iter()
        .rev()
        .filter(|p| !has_stat_label(p))
        .map(|p| (p, p.text()))
        .find(|(_, text)| !text.is_empty())
    else {
        return action;
    };

    let lower = effect.to_lowercase();
    if lower.contains("vs fort") || lower.contains("vs the fort") {
        action.defense = "FORT";
    }
    if let Some(caps) = HIT_RE.captures(&inline_value(p.inner, "Hit")) {
        action.damage = caps[1].to_string();
        action.damage_type = caps[2].to_lowercase();
    }
    action.effect = effect;
    action
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAM: &str = "<h2><b>BATTERING RAM</b></h2>\n\
        <p>A heavy log slung from a frame.</p>\n\
        <p><b>Range:</b> Melee</p>\n\
        <p><b>Reload</b> 1 action</p>\n\
        <p><b>Heft:</b> 4 crew</p>\n\
        <p><b>HP:</b> 60</p>\n\
        <p><b>AR:</b> 12</p>\n\
        <p><b>FORT:</b> 18</p>\n\
        <p><b>Attack.</b> Make an attack vs the FORT of a structure. <b>Hit:</b> 4d10 Blunt damage.</p>\n";

    #[test]
    fn battering_ram() {
        let w = &extract(RAM)[0];
        assert_eq!(w.name, "Battering Ram");
        assert_eq!(w.description, "A heavy log slung from a frame.");
        assert_eq!(w.reload, "1 action");
        assert_eq!(w.heft, "4 crew");
        assert_eq!(w.hp, "60");
        assert_eq!(w.armor_rating, "12");
        assert_eq!(w.fortitude, "18");
        assert_eq!(w.ammunition, "");

        let a = &w.actions[0];
        assert_eq!(a.range, "Melee");
        assert_eq!(a.defense, "FORT");
        assert_eq!(a.damage, "4d10");
        assert_eq!(a.damage_type, "blunt");
        assert!(a.effect.starts_with("Attack. Make an attack"));
    }

    #[test]
    fn stat_first_block_has_no_description() {
        let html = "<h2><b>CART</b></h2><p><b>Speed:</b> 20 ft</p><p>Rolls along.</p>";
        let w = &extract(html)[0];
        assert_eq!(w.description, "");
        assert_eq!(w.speed, "20 ft");
        assert_eq!(w.actions[0].effect, "Rolls along.");
        assert_eq!(w.actions[0].defense, "AR");
    }

    #[test]
    fn no_prose_defaults_action() {
        let html = "<h2><b>POST</b></h2><p><b>HP:</b> 5</p>";
        let a = &extract(html)[0].actions[0];
        assert_eq!(a.effect, "");
        assert_eq!(a.damage, "");
        assert_eq!(a.defense, "AR");
    }

    #[test]
    fn serialized_keys() {
        let w = &extract(RAM)[0];
        let json = serde_json::to_value(w).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "description",
                "ammunition",
                "reload",
                "area_of_effect",
                "helf",
                "speed",
                "hp",
                "armor_rating",
                "reflexes",
                "fortitude",
                "resist",
                "immune",
                "damage_reduction",
                "damage_threshold",
                "subcategory",
                "actions",
                "content"
            ]
        );
        assert_eq!(json["actions"][0]["type"], "Siege Weapon");
    }

    #[test]
    fn every_fixture_stat_label_is_known() {
        let html = std::fs::read_to_string("tests/fixtures/siege.html").unwrap();
        for p in find_elements(&html, "p") {
            if let Some((label, _)) = p.lead_bold() {
                let label = label.trim_end_matches(':').trim();
                if label.ends_with('.') {
                    continue;
                }
                assert!(is_stat_label(label), "unknown stat label {label:?}");
            }
        }
    }

    #[test]
    fn fixture_chapter() {
        let html = std::fs::read_to_string("tests/fixtures/siege.html").unwrap();
        let weapons = extract(&html);
        let names: Vec<&str> = weapons.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Ballista", "Trebuchet"]);
        assert_eq!(weapons[0].ammunition, "1 bolt");
        assert_eq!(weapons[0].actions[0].damage, "3d10");
        assert_eq!(weapons[0].actions[0].damage_type, "sharp");
        assert_eq!(weapons[0].actions[0].range, "300 ft");
        assert_eq!(weapons[1].area_of_effect, "10 ft radius");
        assert_eq!(weapons[1].immune, "poison, psychic");
        assert_eq!(weapons[1].actions[0].defense, "AR");
    }
}
