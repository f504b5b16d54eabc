//! Persist the deduplicated catalog as an indented JSON array.
//!
//! The file is replaced wholesale on every run. The JSON is written to a
//! sibling `.tmp` file and renamed over the target, so a failed write
//! leaves the previous artifact untouched.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::models::CatalogRecord;

/// Write `records` to `path`, creating the parent directory if needed.
pub fn write_catalog(path: &Path, records: &[CatalogRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let tmp = tmp_path(path);
    if let Err(e) = std::fs::write(&tmp, json.as_bytes()) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("Failed to write {}", tmp.display()));
    }

    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
    }

    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PublishedYear, Source};
    use tempfile::TempDir;

    fn record(id: &str, title: &str) -> CatalogRecord {
        CatalogRecord {
            id: id.to_string(),
            source: Source::Openlibrary,
            title: title.to_string(),
            authors: vec!["Frank Herbert".to_string()],
            description: String::new(),
            categories: vec![],
            identifiers: serde_json::Map::new(),
            published_year: Some(PublishedYear::Year(1965)),
            thumbnail: None,
        }
    }

    #[test]
    fn creates_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data").join("books.json");

        write_catalog(&path, &[record("openlibrary:1", "Dune")]).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("[\n"));
        let parsed: Vec<CatalogRecord> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed[0].title, "Dune");
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn existing_directory_is_fine_and_content_replaced() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("books.json");

        write_catalog(&path, &[record("openlibrary:1", "Dune"), record("openlibrary:2", "Emma")])
            .unwrap();
        write_catalog(&path, &[record("openlibrary:3", "Beloved")]).unwrap();

        let parsed: Vec<CatalogRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, "openlibrary:3");
    }

    #[test]
    fn failed_temp_write_keeps_previous_catalog() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("books.json");
        write_catalog(&path, &[record("openlibrary:1", "Dune")]).unwrap();
        let before = std::fs::read(&path).unwrap();

        // A directory squatting on the temp name makes the write fail.
        std::fs::create_dir(tmp_path(&path)).unwrap();
        let result = write_catalog(&path, &[record("openlibrary:2", "Emma")]);

        assert!(result.is_err());
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn unwritable_parent_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let result = write_catalog(&blocker.join("books.json"), &[record("openlibrary:1", "Dune")]);
        assert!(result.is_err());
    }
}
