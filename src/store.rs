//! The JSON compendium store: `{"pagesByCategory": {<category>: {<name>: <record>}}}`.
//!
//! Key order is kept as loaded, so merging unchanged entries rewrites the
//! same bytes. Keys and categories the converters don't know about are
//! carried through untouched.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::parser::extract::Entry;
use crate::parser::names::repaired_possessive;

const ROOT_KEY: &str = "pagesByCategory";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeSummary {
    pub written: usize,
    pub removed: usize,
}

#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    doc: Map<String, Value>,
}

impl Store {
    /// Load the store at `path`. A missing or blank file starts empty.
    pub fn open(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(source) => {
                return Err(Error::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let doc = if text.trim().is_empty() {
            debug!(path = %path.display(), "starting empty store");
            Map::new()
        } else {
            let value: Value =
                serde_json::from_str(&text).map_err(|source| Error::StoreCorrupt {
                    path: path.to_path_buf(),
                    source,
                })?;
            match value {
                Value::Object(map) => map,
                _ => {
                    return Err(Error::StoreShape {
                        path: path.to_path_buf(),
                        key: "(root)".to_string(),
                    })
                }
            }
        };

        Ok(Store {
            path: path.to_path_buf(),
            doc,
        })
    }

    /// Entries of one category, if the category exists.
    pub fn category(&self, name: &str) -> Option<&Map<String, Value>> {
        self.doc.get(ROOT_KEY)?.get(name)?.as_object()
    }

    /// Upsert `entries` into `category` by name, then drop keys an older run
    /// stored with an unrepaired possessive (`X'S Y`) when the run wrote
    /// the repaired `X's Y`.
    pub fn merge(&mut self, category: &str, entries: Vec<Entry>) -> Result<MergeSummary> {
        let path = self.path.clone();
        let shape_err = |key: &str| Error::StoreShape {
            path: path.clone(),
            key: key.to_string(),
        };

        let categories = self
            .doc
            .entry(ROOT_KEY)
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| shape_err(ROOT_KEY))?;
        let pages = categories
            .entry(category)
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| shape_err(category))?;

        let new_names: HashSet<String> = entries.iter().map(|e| e.name.clone()).collect();
        let written = entries.len();
        for entry in entries {
            pages.insert(entry.name, entry.value);
        }

        let stale: Vec<String> = pages
            .keys()
            .filter(|key| !new_names.contains(*key))
            .filter(|key| new_names.contains(&repaired_possessive(key)))
            .cloned()
            .collect();
        for key in &stale {
            info!(key = %key, "removing stale possessive key");
            pages.shift_remove(key);
        }

        Ok(MergeSummary {
            written,
            removed: stale.len(),
        })
    }

    /// Serialized document: 2-space indent, no trailing newline.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.doc).map_err(|source| Error::Serialize {
            name: ROOT_KEY.to_string(),
            source,
        })
    }

    /// Replace the file on disk with the current document.
    pub fn save(&self) -> Result<()> {
        let json = self.to_json()?;
        write_atomic(&self.path, &json)?;
        debug!(path = %self.path.display(), bytes = json.len(), "store written");
        Ok(())
    }
}

/// Write `contents` to a temp file beside `path` and rename it over `path`,
/// creating parent directories first.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    // temp files are created owner-only; keep the target's mode instead
    let perms = match fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => new_file_permissions(),
    };
    if let Some(perms) = perms {
        tmp.as_file().set_permissions(perms).map_err(write_err)?;
    }
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(name: &str, value: Value) -> Entry {
        Entry {
            name: name.to_string(),
            value,
        }
    }

    fn keys(store: &Store, category: &str) -> Vec<String> {
        store.category(category).unwrap().keys().cloned().collect()
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(&dir.path().join("json/new.json")).unwrap();
        let summary = store
            .merge("Equipment", vec![entry("Rope", json!({"tags": ""}))])
            .unwrap();
        assert_eq!(summary, MergeSummary { written: 1, removed: 0 });
        store.save().unwrap();

        let text = fs::read_to_string(dir.path().join("json/new.json")).unwrap();
        assert_eq!(
            text,
            "{\n  \"pagesByCategory\": {\n    \"Equipment\": {\n      \"Rope\": {\n        \"tags\": \"\"\n      }\n    }\n  }\n}"
        );
    }

    #[test]
    fn rerun_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let entries = || {
            vec![
                entry("Zweihander", json!({"damage": "2d6[sharp]"})),
                entry("Axe", json!({"damage": "1d8[sharp]", "note": "ü½"})),
            ]
        };

        let mut store = Store::open(&path).unwrap();
        store.merge("Equipment", entries()).unwrap();
        store.save().unwrap();
        let first = fs::read(&path).unwrap();

        let mut store = Store::open(&path).unwrap();
        store.merge("Equipment", entries()).unwrap();
        store.save().unwrap();
        assert_eq!(fs::read(&path).unwrap(), first);
        assert!(String::from_utf8(first).unwrap().contains("ü½"));
    }

    #[test]
    fn stale_possessive_key_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(
            &path,
            r#"{"pagesByCategory": {"Equipment": {"Acidwalker'S Armor": {"base": "old"}, "Rope": {}}}}"#,
        )
        .unwrap();

        let mut store = Store::open(&path).unwrap();
        let summary = store
            .merge(
                "Equipment",
                vec![entry("Acidwalker's Armor", json!({"base": "Scale Mail"}))],
            )
            .unwrap();
        assert_eq!(summary, MergeSummary { written: 1, removed: 1 });
        assert_eq!(keys(&store, "Equipment"), vec!["Rope", "Acidwalker's Armor"]);
    }

    #[test]
    fn stale_trailing_possessive_key_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, r#"{"pagesByCategory": {"Equipment": {"Hero'S": {}}}}"#).unwrap();

        let mut store = Store::open(&path).unwrap();
        let summary = store
            .merge("Equipment", vec![entry("Hero's", json!({}))])
            .unwrap();
        assert_eq!(summary.removed, 1);
        assert_eq!(keys(&store, "Equipment"), vec!["Hero's"]);
    }

    #[cfg(unix)]
    #[test]
    fn save_keeps_existing_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{}").unwrap();
        for mode in [0o644, 0o640] {
            fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
            let mut store = Store::open(&path).unwrap();
            store.merge("Equipment", vec![entry("Rope", json!({}))]).unwrap();
            store.save().unwrap();
            let saved = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(saved, mode);
        }
    }

    #[cfg(unix)]
    #[test]
    fn new_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("json/new.json");
        write_atomic(&path, "{}").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn disjoint_runs_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = Store::open(&path).unwrap();
        store.merge("Equipment", vec![entry("A", json!({}))]).unwrap();
        store.save().unwrap();

        let mut store = Store::open(&path).unwrap();
        store
            .merge("Equipment", vec![entry("B", json!({})), entry("C", json!({}))])
            .unwrap();
        assert_eq!(keys(&store, "Equipment"), vec!["A", "B", "C"]);
    }

    #[test]
    fn upsert_overwrites_in_place() {
        let mut store = Store::open(Path::new("does/not/exist.json")).unwrap();
        store
            .merge("Siege", vec![entry("Ram", json!({"hp": "10"})), entry("Cart", json!({}))])
            .unwrap();
        store.merge("Siege", vec![entry("Ram", json!({"hp": "60"}))]).unwrap();
        assert_eq!(keys(&store, "Siege"), vec!["Ram", "Cart"]);
        assert_eq!(store.category("Siege").unwrap()["Ram"]["hp"], "60");
    }

    #[test]
    fn other_categories_and_keys_survive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(
            &path,
            r#"{"version": 2, "pagesByCategory": {"Spells": {"Fireball": {}}}}"#,
        )
        .unwrap();

        let mut store = Store::open(&path).unwrap();
        store.merge("Equipment", vec![entry("Rope", json!({}))]).unwrap();
        let json: Value = serde_json::from_str(&store.to_json().unwrap()).unwrap();
        assert_eq!(json["version"], 2);
        assert!(json["pagesByCategory"]["Spells"]["Fireball"].is_object());
        assert!(json["pagesByCategory"]["Equipment"]["Rope"].is_object());
    }

    #[test]
    fn corrupt_store_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Store::open(&path).unwrap_err(),
            Error::StoreCorrupt { .. }
        ));
    }

    #[test]
    fn non_object_category_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, r#"{"pagesByCategory": {"Equipment": []}}"#).unwrap();

        let mut store = Store::open(&path).unwrap();
        let err = store.merge("Equipment", vec![]).unwrap_err();
        match err {
            Error::StoreShape { key, .. } => assert_eq!(key, "Equipment"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_object_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            Store::open(&path).unwrap_err(),
            Error::StoreShape { .. }
        ));
    }
}
