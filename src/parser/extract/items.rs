use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use super::{without, Record};
use crate::parser::blocks::{split_blocks, Block, HeadingLevel};
use crate::parser::markup::{find_elements, strip_to_text};
use crate::parser::names::display_name;

/// A magic item or potion.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    #[serde(skip)]
    pub name: String,
    pub tags: String,
    pub description: String,
    pub content: String,
}

impl Record for Item {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Items of every source in order. A name seen in an earlier source (or
/// earlier in the same one) is not taken again.
pub fn extract_all<'a>(sources: impl IntoIterator<Item = &'a str>) -> Vec<Item> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for html in sources {
        for item in split_blocks(html, HeadingLevel::H3).iter().map(parse_block) {
            if seen.insert(item.name.clone()) {
                items.push(item);
            } else {
                debug!(name = %item.name, "duplicate heading, keeping first");
            }
        }
    }
    items
}

#[cfg(test)]
fn extract(html: &str) -> Vec<Item> {
    extract_all([html])
}

fn parse_block(block: &Block) -> Item {
    let tag_line = find_elements(block.body, "p")
        .into_iter()
        .find(|p| p.wraps("em"));

    let (tags, description) = match tag_line {
        Some(p) => (p.text(), strip_to_text(&without(block.body, &[p]))),
        None => (String::new(), strip_to_text(block.body)),
    };

    Item {
        name: display_name(&block.heading),
        tags,
        description,
        content: block.body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_line_and_description() {
        let html = "<h3><b>AMULET OF THIRST</b></h3>\n<p><em>Item, Amulet, Rare</em></p>\n<br />\n<p>Drink deep.</p>\n";
        let item = &extract(html)[0];
        assert_eq!(item.name, "Amulet Of Thirst");
        assert_eq!(item.tags, "Item, Amulet, Rare");
        assert_eq!(item.description, "Drink deep.");
        assert_eq!(
            item.content,
            "<p><em>Item, Amulet, Rare</em></p>\n<br />\n<p>Drink deep.</p>"
        );
    }

    #[test]
    fn italic_inside_text_is_not_the_tag_line() {
        let html = "<h3><b>ODD</b></h3><p>An <em>odd</em> thing.</p>";
        let item = &extract(html)[0];
        assert_eq!(item.tags, "");
        assert_eq!(item.description, "An odd thing.");
    }

    #[test]
    fn repeated_heading_keeps_first() {
        let html = "<h3><b>ROPE</b></h3><p>first</p><h3><b>ROPE</b></h3><p>second</p>";
        let items = extract(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "first");
    }

    #[test]
    fn repeat_across_sources_keeps_first() {
        let a = "<h3><b>TONIC</b></h3><p>from items</p>";
        let b = "<h3><b>TONIC</b></h3><p>from potions</p><h3><b>SALVE</b></h3><p>s</p>";
        let items = extract_all([a, b]);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Tonic", "Salve"]);
        assert_eq!(items[0].description, "from items");
    }

    #[test]
    fn fixture_chapters() {
        let items_html = std::fs::read_to_string("tests/fixtures/items.html").unwrap();
        let potions_html = std::fs::read_to_string("tests/fixtures/potions.html").unwrap();
        let items = extract_all([items_html.as_str(), potions_html.as_str()]);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Amulet Of Thirst", "Bag Of Holding", "Clearblood Elixir", "Hero's Draught"]
        );
        assert_eq!(items[1].tags, "Item, Wondrous, Uncommon");
        assert_eq!(items[1].description, "Holds much.\n\nWeighs little.");
        assert_eq!(items[2].tags, "Potion, Common");
    }
}
