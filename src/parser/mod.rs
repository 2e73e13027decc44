pub mod blocks;
pub mod extract;
pub mod fields;
pub mod markup;
pub mod names;
pub mod sections;

use crate::error::Result;
use extract::{to_entries, Entry};

/// The chapter converters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Armor,
    Weapons,
    Items,
    Poisons,
    Creatures,
    Siege,
}

impl Kind {
    /// Store category the entries are filed under.
    pub fn category(self) -> &'static str {
        match self {
            Kind::Armor | Kind::Weapons | Kind::Items | Kind::Poisons => "Equipment",
            Kind::Creatures => "Creatures",
            Kind::Siege => "Siege",
        }
    }

    /// Plural noun for messages (`no poisons extracted from ...`).
    pub fn noun(self) -> &'static str {
        match self {
            Kind::Armor => "armor",
            Kind::Weapons => "weapons",
            Kind::Items => "items",
            Kind::Poisons => "poisons",
            Kind::Creatures => "creatures",
            Kind::Siege => "siege weapons",
        }
    }

    /// Blocks → fields → records → store entries, over every source in order.
    pub fn extract(self, sources: &[&str]) -> Result<Vec<Entry>> {
        let each = sources.iter().copied();
        match self {
            Kind::Armor => to_entries(&each.flat_map(extract::armor::extract).collect::<Vec<_>>()),
            Kind::Weapons => {
                to_entries(&each.flat_map(extract::weapons::extract).collect::<Vec<_>>())
            }
            Kind::Items => to_entries(&extract::items::extract_all(each)),
            Kind::Poisons => {
                to_entries(&each.flat_map(extract::poisons::extract).collect::<Vec<_>>())
            }
            Kind::Creatures => {
                to_entries(&each.flat_map(extract::creatures::extract).collect::<Vec<_>>())
            }
            Kind::Siege => to_entries(&each.flat_map(extract::siege::extract).collect::<Vec<_>>()),
        }
    }
}
