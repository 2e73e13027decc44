//! Cosmetic rewrites of chapter exports, applied in place to one `.html`
//! file or every `.html` file of a directory.

pub mod clean;
pub mod document;
pub mod headers;
pub mod index;

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::store::write_atomic;

#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: usize,
    pub changed: Vec<PathBuf>,
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
}

/// `target` itself when it is an `.html` file, or the directory's `.html`
/// files in name order.
pub fn html_targets(target: &Path) -> Result<Vec<PathBuf>> {
    if target.is_file() {
        if !is_html(target) {
            return Err(Error::NotHtml {
                path: target.to_path_buf(),
            });
        }
        return Ok(vec![target.to_path_buf()]);
    }
    if !target.is_dir() {
        return Err(Error::NotFound {
            path: target.to_path_buf(),
        });
    }

    let read_err = |source| Error::Read {
        path: target.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(target).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() && is_html(&path) {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(Error::NoHtmlFiles {
            dir: target.to_path_buf(),
        });
    }
    files.sort();
    Ok(files)
}

/// Run `transform` over every file, rewriting the ones it changes.
pub fn run_batch<F>(files: &[PathBuf], mut transform: F) -> Result<BatchReport>
where
    F: FnMut(&Path, &str) -> Result<String>,
{
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut report = BatchReport::default();
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        pb.set_message(name.clone());

        let html = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.clone(),
            source,
        })?;
        let updated = transform(path, &html)?;
        if updated != html {
            write_atomic(path, &updated)?;
            pb.suspend(|| println!("Updated: {name}"));
            report.changed.push(path.clone());
        } else {
            debug!(file = %name, "unchanged");
        }
        report.processed += 1;
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(
        processed = report.processed,
        changed = report.changed.len(),
        "batch done"
    );
    Ok(report)
}
