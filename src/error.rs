use std::path::PathBuf;

/// Fatal conditions of a converter run. Field-level misses are not errors;
/// they read as empty strings.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("input not found or empty: {}", path.display())]
    MissingInput { path: PathBuf },
    #[error("no {kind} extracted from {source_name}")]
    NoEntries {
        kind: &'static str,
        source_name: String,
    },
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("store {} is not valid JSON", path.display())]
    StoreCorrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("store {}: `{key}` is not a JSON object", path.display())]
    StoreShape { path: PathBuf, key: String },
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("not an .html file: {}", path.display())]
    NotHtml { path: PathBuf },
    #[error("no .html files in {}", dir.display())]
    NoHtmlFiles { dir: PathBuf },
    #[error("no <h2> section `{section}` in {}", path.display())]
    SectionNotFound { section: String, path: PathBuf },
    #[error("failed to serialize entry `{name}`")]
    Serialize {
        name: String,
        source: serde_json::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
