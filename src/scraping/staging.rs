//! Staging file bridging a scrape run and the next index build.
//!
//! The file is a CSV with a header row and the columns
//! `node_id, node_name, rank, title, link, scrape_time, extra, page_url`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::scraping::error::ScrapingError;
use crate::scraping::types::TrendEntry;

/// Write entries to the staging file.
///
/// Nothing is written when `entries` is empty. The file is written next to its
/// final location and renamed into place.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_staging(path: &Path, entries: &[TrendEntry]) -> Result<bool, ScrapingError> {
    if entries.is_empty() {
        return Ok(false);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path);
    {
        let mut writer = csv::Writer::from_path(&tmp)?;
        for entry in entries {
            writer.serialize(entry)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;

    Ok(true)
}

/// Read the staging file.
///
/// Returns `None` when the file does not exist.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or decoded.
pub fn read_staging(path: &Path) -> Result<Option<Vec<TrendEntry>>, ScrapingError> {
    if !path.exists() {
        return Ok(None);
    }

    let mut reader = csv::Reader::from_path(path)?;
    let entries = reader
        .deserialize::<TrendEntry>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(entries))
}

/// Whether the staging file exists and holds at least one record.
#[must_use]
pub fn has_staged_records(path: &Path) -> bool {
    matches!(read_staging(path), Ok(Some(entries)) if !entries.is_empty())
}

/// Delete the staging file if it exists.
///
/// # Errors
/// Returns an error if the file exists but cannot be removed.
pub fn remove_staging(path: &Path) -> Result<(), ScrapingError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsString::from)
        .unwrap_or_else(|| "staging.csv".into());
    name.push(".tmp");
    path.with_file_name(name)
}
