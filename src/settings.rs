use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::parser::Kind;

pub const DEFAULT_LINK_BASE: &str = "https://app.roll20.net/compendium/mythcraft/Equipment:";
pub const DEFAULT_BRANDING_COLOR: &str = "color: rgb(23, 67, 69);";

/// Run settings: built-in defaults, then `compendium.toml` in the current
/// directory if present, then `COMPENDIUM_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Root holding the `html/` and `json/` directories.
    pub workspace: PathBuf,
    /// Prefix of index heading links; the slug is appended.
    pub link_base: String,
    /// Inline style given to unlinked headings.
    pub branding_color: String,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("workspace", ".")?
            .set_default("link_base", DEFAULT_LINK_BASE)?
            .set_default("branding_color", DEFAULT_BRANDING_COLOR)?
            .add_source(File::with_name("compendium").required(false))
            .add_source(Environment::with_prefix("COMPENDIUM"))
            .build()?
            .try_deserialize()
    }

    pub fn html_dir(&self) -> PathBuf {
        self.workspace.join("html")
    }

    pub fn json_dir(&self) -> PathBuf {
        self.workspace.join("json")
    }

    /// Conventional chapter exports a converter reads.
    pub fn default_inputs(&self, kind: Kind) -> Vec<PathBuf> {
        let html = self.html_dir();
        let files: &[&str] = match kind {
            Kind::Armor => &["Chapter 7 Armor.html"],
            Kind::Weapons => &["Chapter 7 Weapons.html"],
            Kind::Items => &["Chapter 7 Items.html", "Chapter 7 Potions.html"],
            Kind::Poisons => &["Chapter 6 - Poisons.html"],
            Kind::Creatures => &["Chapter 10 - Creatures.html"],
            Kind::Siege => &["Chapter 6 - Siege Weapons.html"],
        };
        files.iter().map(|f| html.join(f)).collect()
    }

    /// Conventional store file a converter merges into.
    pub fn default_output(&self, kind: Kind) -> PathBuf {
        match kind {
            Kind::Armor => self.json_dir().join("equipment_armor.json"),
            Kind::Weapons => self.json_dir().join("equipment_weapons.json"),
            Kind::Items => self.json_dir().join("equipment_items.json"),
            Kind::Poisons => self.json_dir().join("equipment_poisons.json"),
            Kind::Creatures => self.json_dir().join("creatures_chapter_10.json"),
            // siege has always lived beside its chapter
            Kind::Siege => self.html_dir().join("siege.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file_or_env() {
        let settings = Settings::load().unwrap();
        assert_eq!(settings.link_base, DEFAULT_LINK_BASE);
        assert_eq!(settings.branding_color, DEFAULT_BRANDING_COLOR);
    }

    fn at(workspace: &str) -> Settings {
        Settings {
            workspace: PathBuf::from(workspace),
            link_base: DEFAULT_LINK_BASE.to_string(),
            branding_color: DEFAULT_BRANDING_COLOR.to_string(),
        }
    }

    #[test]
    fn workspace_dirs() {
        let settings = at("/data/ws");
        assert_eq!(settings.html_dir(), PathBuf::from("/data/ws/html"));
        assert_eq!(settings.json_dir(), PathBuf::from("/data/ws/json"));
    }

    #[test]
    fn conventional_paths() {
        let settings = at("ws");
        assert_eq!(
            settings.default_inputs(Kind::Items),
            vec![
                PathBuf::from("ws/html/Chapter 7 Items.html"),
                PathBuf::from("ws/html/Chapter 7 Potions.html")
            ]
        );
        assert_eq!(
            settings.default_output(Kind::Creatures),
            PathBuf::from("ws/json/creatures_chapter_10.json")
        );
        assert_eq!(settings.default_output(Kind::Siege), PathBuf::from("ws/html/siege.json"));
    }
}
