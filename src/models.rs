//! Core data models used throughout LIRIA's catalog pipeline.
//!
//! These types represent the provider-agnostic book records that flow from
//! the connectors through deduplication and into the persisted catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which external catalog a record came from.
///
/// The serialized value doubles as the provider tag in [`CatalogRecord::id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// OpenLibrary search (key-value document provider).
    Openlibrary,
    /// Google Books volumes (volume-metadata provider).
    GoogleBooks,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Openlibrary => "openlibrary",
            Source::GoogleBooks => "google_books",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Publication date as each provider reports it.
///
/// OpenLibrary gives an integer year; Google Books gives a raw date string
/// (`"1965"`, `"1965-08"`, `"1965-08-01"`). The two are never reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublishedYear {
    Year(i64),
    Date(String),
}

/// Normalized, provider-agnostic book record.
///
/// Serialized with camelCase keys; this is the element type of the
/// persisted `books.json` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    /// `<provider-tag>:<provider-native-id>`.
    pub id: String,
    pub source: Source,
    pub title: String,
    pub authors: Vec<String>,
    pub description: String,
    pub categories: Vec<String>,
    /// Provider-specific auxiliary identifiers, kept opaque.
    pub identifiers: serde_json::Map<String, serde_json::Value>,
    pub published_year: Option<PublishedYear>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl CatalogRecord {
    /// A record with a blank title never reaches the persisted catalog.
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Authors joined for display, or `"Unknown Author"`.
    pub fn author_line(&self) -> String {
        if self.authors.is_empty() {
            "Unknown Author".to_string()
        } else {
            self.authors.join(", ")
        }
    }
}

/// A record paired with an optional relevance score.
///
/// Produced by the search and recommendation commands; `score` is only set
/// when the candidates were ranked by embedding similarity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: CatalogRecord,
    #[serde(rename = "similarityScore", skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl From<CatalogRecord> for ScoredRecord {
    fn from(record: CatalogRecord) -> Self {
        Self {
            record,
            score: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str) -> CatalogRecord {
        CatalogRecord {
            id: "openlibrary:OL1W".to_string(),
            source: Source::Openlibrary,
            title: title.to_string(),
            authors: vec![],
            description: String::new(),
            categories: vec![],
            identifiers: serde_json::Map::new(),
            published_year: Some(PublishedYear::Year(1965)),
            thumbnail: None,
        }
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(record("Dune")).unwrap();
        assert_eq!(json["source"], "openlibrary");
        assert_eq!(json["publishedYear"], 1965);
        assert!(json.get("thumbnail").is_none());
    }

    #[test]
    fn published_date_stays_a_string() {
        let mut rec = record("Dune");
        rec.source = Source::GoogleBooks;
        rec.published_year = Some(PublishedYear::Date("1965-08".to_string()));
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["source"], "google_books");
        assert_eq!(json["publishedYear"], "1965-08");
    }

    #[test]
    fn blank_title_detection() {
        assert!(record("Dune").has_title());
        assert!(!record("").has_title());
        assert!(!record("   ").has_title());
    }

    #[test]
    fn source_display_honors_width() {
        assert_eq!(format!("[{:<16}]", Source::Openlibrary), "[openlibrary     ]");
        assert_eq!(format!("{}", Source::GoogleBooks), "google_books");
    }

    #[test]
    fn author_line_defaults() {
        let mut rec = record("Dune");
        assert_eq!(rec.author_line(), "Unknown Author");
        rec.authors = vec!["Frank Herbert".into(), "Brian Herbert".into()];
        assert_eq!(rec.author_line(), "Frank Herbert, Brian Herbert");
    }
}
