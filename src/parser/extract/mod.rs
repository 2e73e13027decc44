pub mod armor;
pub mod creatures;
pub mod items;
pub mod poisons;
pub mod siege;
pub mod weapons;

use serde::Serialize;
use serde_json::Value;

use super::fields::led_by;
use super::markup::{self, top_level_nodes, Node};
use crate::error::{Error, Result};

/// A typed compendium entry. The name is the store key and is not part of
/// the serialized value.
pub trait Record: Serialize {
    fn name(&self) -> &str;
}

/// A record ready for the store: its key and its JSON value.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    pub value: Value,
}

impl Entry {
    pub fn from_record<R: Record>(record: &R) -> Result<Self> {
        let value = serde_json::to_value(record).map_err(|source| Error::Serialize {
            name: record.name().to_string(),
            source,
        })?;
        Ok(Entry {
            name: record.name().to_string(),
            value,
        })
    }
}

pub fn to_entries<R: Record>(records: &[R]) -> Result<Vec<Entry>> {
    records.iter().map(Entry::from_record).collect()
}

/// Flattened text of the first `<em>` in the block: the tag line.
pub fn first_em_text(body: &str) -> String {
    markup::find_elements(body, "em")
        .first()
        .map(|em| em.text())
        .unwrap_or_default()
}

/// `body` with the given elements cut out. Elements nested inside an
/// earlier one are covered by it.
pub fn without(body: &str, nodes: &[Node]) -> String {
    let mut out = String::with_capacity(body.len());
    let mut cursor = 0;
    for node in nodes {
        if node.start < cursor {
            continue;
        }
        out.push_str(&body[cursor..node.start]);
        cursor = node.end;
    }
    out.push_str(&body[cursor..]);
    out
}

/// Description markup of an equipment block: the body without its tag
/// paragraph, without paragraphs led by one of `stat_labels`, without blank
/// paragraphs and (optionally) tables. Runs of line breaks collapse to one,
/// leading and trailing breaks are dropped, and the remaining elements are
/// joined one per line.
pub fn description_markup(body: &str, stat_labels: &[&str], drop_tables: bool) -> String {
    let mut tag_line_seen = false;
    let mut kept: Vec<Node> = Vec::new();

    for node in top_level_nodes(body) {
        if node.name.is_none() {
            if node.outer.trim().is_empty() {
                continue;
            }
        } else if node.is("p") {
            if !tag_line_seen && node.lead_tag().as_deref() == Some("em") {
                tag_line_seen = true;
                continue;
            }
            if stat_labels.iter().any(|label| led_by(&node, label).is_some()) {
                continue;
            }
            if node.is_blank() {
                continue;
            }
        } else if drop_tables && node.is("table") {
            continue;
        } else if node.is("br") && kept.last().map_or(true, |prev| prev.is("br")) {
            continue;
        }
        kept.push(node);
    }

    while kept.last().is_some_and(|n| n.is("br")) {
        kept.pop();
    }

    kept.iter()
        .map(|n| n.outer.trim())
        .collect::<Vec<_>>()
        .join("\n")
}
