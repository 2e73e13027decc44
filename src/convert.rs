//! One converter run: read the chapter export(s), extract entries, merge
//! them into the store and write it back.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::parser::Kind;
use crate::store::{MergeSummary, Store};

/// How a converter treats an input that is missing or blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Missing {
    Fatal,
    /// Read the chapter from standard input instead.
    Stdin,
    /// Warn and go on with the other inputs.
    Skip,
}

fn missing_policy(kind: Kind) -> Missing {
    match kind {
        Kind::Armor | Kind::Weapons => Missing::Stdin,
        Kind::Items => Missing::Skip,
        Kind::Poisons | Kind::Creatures | Kind::Siege => Missing::Fatal,
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub kind: Kind,
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub kind: Kind,
    pub output: PathBuf,
    pub summary: MergeSummary,
}

impl Report {
    /// `Added/updated 12 armor entries in equipment_armor.json`
    pub fn line(&self) -> String {
        let file = self
            .output
            .file_name()
            .map_or_else(|| self.output.display().to_string(), |f| f.to_string_lossy().into_owned());
        let mut line = format!(
            "Added/updated {} {} entries in {}",
            self.summary.written,
            self.kind.noun(),
            file
        );
        if self.summary.removed > 0 {
            line.push_str(&format!(
                " (removed {} stale duplicate keys)",
                self.summary.removed
            ));
        }
        line
    }
}

/// Text of `path`, or `None` when it does not exist or holds only whitespace.
fn read_nonblank(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) if text.trim().is_empty() => Ok(None),
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(Error::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Chapter sources for a job as (label, markup).
fn load_sources(job: &Job, stdin: &mut dyn Read) -> Result<Vec<(String, String)>> {
    let policy = missing_policy(job.kind);
    let mut sources = Vec::with_capacity(job.inputs.len());

    for path in &job.inputs {
        if let Some(text) = read_nonblank(path)? {
            info!(path = %path.display(), bytes = text.len(), "loaded chapter");
            sources.push((path.display().to_string(), text));
            continue;
        }
        match policy {
            Missing::Skip => warn!(path = %path.display(), "input missing or empty, skipping"),
            Missing::Fatal => return Err(Error::MissingInput { path: path.clone() }),
            Missing::Stdin => {
                info!(path = %path.display(), "input missing or empty, reading stdin");
                let mut text = String::new();
                stdin
                    .read_to_string(&mut text)
                    .map_err(|source| Error::Read {
                        path: PathBuf::from("<stdin>"),
                        source,
                    })?;
                if text.trim().is_empty() {
                    return Err(Error::MissingInput { path: path.clone() });
                }
                sources.push(("<stdin>".to_string(), text));
            }
        }
    }
    Ok(sources)
}

pub fn run(job: &Job, stdin: &mut dyn Read) -> Result<Report> {
    let sources = load_sources(job, stdin)?;
    let markup: Vec<&str> = sources.iter().map(|(_, text)| text.as_str()).collect();
    let entries = job.kind.extract(&markup)?;

    if entries.is_empty() {
        let source_name = if sources.is_empty() {
            job.inputs
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            sources
                .iter()
                .map(|(label, _)| label.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        return Err(Error::NoEntries {
            kind: job.kind.noun(),
            source_name,
        });
    }
    info!(kind = job.kind.noun(), count = entries.len(), "extracted entries");

    let mut store = Store::open(&job.output)?;
    let summary = store.merge(job.kind.category(), entries)?;
    store.save()?;

    Ok(Report {
        kind: job.kind,
        output: job.output.clone(),
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ARMOR: &str = "<h3><b>IRON BREASTPLATE</b></h3><p><em>Armor, Heavy, Common, Essence 5</em></p><p><b>Base: </b>Plate</p><p>A sturdy plate.</p>";

    fn job(kind: Kind, inputs: Vec<PathBuf>, output: PathBuf) -> Job {
        Job {
            kind,
            inputs,
            output,
        }
    }

    #[test]
    fn armor_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("armor.html");
        let output = dir.path().join("json/equipment_armor.json");
        fs::write(&input, ARMOR).unwrap();

        let report = run(&job(Kind::Armor, vec![input], output.clone()), &mut std::io::empty()).unwrap();
        assert_eq!(report.summary.written, 1);
        assert_eq!(
            report.line(),
            "Added/updated 1 armor entries in equipment_armor.json"
        );

        let store = Store::open(&output).unwrap();
        let armor = &store.category("Equipment").unwrap()["Iron Breastplate"];
        assert_eq!(armor["type"], "heavy");
        assert_eq!(armor["description"], "Base: Plate.\n\nA sturdy plate.");
    }

    #[test]
    fn armor_falls_back_to_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.json");
        let mut stdin = Cursor::new(ARMOR.as_bytes());

        let report = run(
            &job(Kind::Armor, vec![dir.path().join("missing.html")], output),
            &mut stdin,
        )
        .unwrap();
        assert_eq!(report.summary.written, 1);
    }

    #[test]
    fn blank_stdin_is_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            &job(
                Kind::Weapons,
                vec![dir.path().join("missing.html")],
                dir.path().join("out.json"),
            ),
            &mut Cursor::new(b"  \n".as_slice()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingInput { .. }));
    }

    #[test]
    fn poisons_missing_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("poisons.html");
        fs::write(&input, "\n\n").unwrap();
        let err = run(
            &job(Kind::Poisons, vec![input], dir.path().join("out.json")),
            &mut Cursor::new(ARMOR.as_bytes()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingInput { .. }));
    }

    #[test]
    fn zero_extraction_is_fatal_and_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("siege.html");
        let output = dir.path().join("siege.json");
        fs::write(&input, "<p>No headings here.</p>").unwrap();

        let err = run(&job(Kind::Siege, vec![input], output.clone()), &mut std::io::empty())
            .unwrap_err();
        match &err {
            Error::NoEntries { kind, .. } => assert_eq!(*kind, "siege weapons"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("no siege weapons extracted from "));
        assert!(!output.exists());
    }

    #[test]
    fn items_skip_missing_potions() {
        let dir = tempfile::tempdir().unwrap();
        let items = dir.path().join("items.html");
        fs::write(&items, "<h3><b>ROPE</b></h3><p><em>Item, Common</em></p><p>50 ft.</p>").unwrap();
        let output = dir.path().join("items.json");

        let report = run(
            &job(Kind::Items, vec![items, dir.path().join("potions.html")], output),
            &mut std::io::empty(),
        )
        .unwrap();
        assert_eq!(report.summary.written, 1);
    }

    #[test]
    fn items_with_no_inputs_at_all() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            &job(
                Kind::Items,
                vec![dir.path().join("a.html"), dir.path().join("b.html")],
                dir.path().join("items.json"),
            ),
            &mut std::io::empty(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NoEntries { kind: "items", .. }));
    }

    #[test]
    fn creatures_merge_with_existing_store() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("creatures.html");
        let output = dir.path().join("creatures.json");
        fs::write(
            &output,
            r#"{"pagesByCategory": {"Creatures": {"Old Ghost": {"level": "1"}}}}"#,
        )
        .unwrap();
        fs::write(
            &input,
            "<h2><b>CAVE BAT</b></h2><p><em>Monster Level: 1</em></p><p><b>Hit Points</b> 4</p>",
        )
        .unwrap();

        run(&job(Kind::Creatures, vec![input], output.clone()), &mut std::io::empty()).unwrap();
        let store = Store::open(&output).unwrap();
        let keys: Vec<&String> = store.category("Creatures").unwrap().keys().collect();
        assert_eq!(keys, vec!["Old Ghost", "Cave Bat"]);
    }

    #[test]
    fn removed_keys_are_reported() {
        let report = Report {
            kind: Kind::Weapons,
            output: PathBuf::from("json/equipment_weapons.json"),
            summary: MergeSummary {
                written: 3,
                removed: 1,
            },
        };
        assert_eq!(
            report.line(),
            "Added/updated 3 weapons entries in equipment_weapons.json (removed 1 stale duplicate keys)"
        );
    }
}
