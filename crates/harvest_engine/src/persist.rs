use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use thiserror::Error;

use harvest_core::{FailedUrl, LinkTracker};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the output directory exists; create it if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    // Writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Appends every tracked pair as a `source -> target` line. The file is
/// never truncated here: repeated runs accumulate history.
pub fn append_links(path: &Path, tracker: &LinkTracker) -> Result<(), PersistError> {
    if tracker.is_empty() {
        return Ok(());
    }
    let mut buffer = String::new();
    for link in tracker.entries() {
        buffer.push_str(&link.source_url);
        buffer.push_str(" -> ");
        buffer.push_str(&link.target_url);
        buffer.push('\n');
    }
    append_text(path, &buffer)
}

/// Appends the failure audit trail as `url, pass N, reason` lines.
pub fn append_failed_urls(path: &Path, failures: &[FailedUrl]) -> Result<(), PersistError> {
    if failures.is_empty() {
        return Ok(());
    }
    let mut buffer = String::new();
    for failure in failures {
        buffer.push_str(&format!(
            "{}, pass {}, {}\n",
            failure.url, failure.pass, failure.reason
        ));
    }
    append_text(path, &buffer)
}

fn append_text(path: &Path, text: &str) -> Result<(), PersistError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())?;
    file.sync_all()?;
    Ok(())
}
