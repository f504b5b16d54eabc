//! OpenLibrary connector.
//!
//! Queries the OpenLibrary search endpoint (`/search.json?q=..&limit=..`)
//! and maps each entry of its `docs` array into a [`CatalogRecord`].
//!
//! # Field mapping
//!
//! | Record field | OpenLibrary field |
//! |--------------|-------------------|
//! | `title` | `title` |
//! | `authors` | `author_name` |
//! | `categories` | `subject` |
//! | `description` | always empty; search results carry none |
//! | `identifiers` | `key`, `isbn` |
//! | `publishedYear` | `first_publish_year` |
//! | `thumbnail` | `cover_i` as a covers.openlibrary.org URL |
//!
//! The native id is `key` with its `/works/` or `/books/` prefix removed,
//! falling back to `cover_edition_key`, the first `edition_key`, the first
//! ISBN, and finally the raw title.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::OpenLibraryConfig;
use crate::error::FetchError;
use crate::http;
use crate::identity::{derive_id, IdentityCandidates};
use crate::models::{CatalogRecord, PublishedYear, Source};
use crate::traits::{clamp_page_size, CatalogConnector};

/// Response envelope. `docs` is required: its absence means the endpoint
/// changed shape and the fetch fails.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    docs: Vec<serde_json::Value>,
}

/// One search document as returned by OpenLibrary.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpenLibraryDoc {
    pub key: Option<String>,
    pub title: Option<String>,
    #[serde(deserialize_with = "http::null_as_default")]
    pub author_name: Vec<String>,
    #[serde(deserialize_with = "http::null_as_default")]
    pub subject: Vec<String>,
    #[serde(deserialize_with = "http::null_as_default")]
    pub isbn: Vec<String>,
    pub cover_edition_key: Option<String>,
    #[serde(deserialize_with = "http::null_as_default")]
    pub edition_key: Vec<String>,
    pub first_publish_year: Option<i64>,
    pub cover_i: Option<i64>,
}

pub struct OpenLibraryConnector {
    client: reqwest::Client,
    config: OpenLibraryConfig,
}

impl OpenLibraryConnector {
    pub fn new(client: reqwest::Client, config: OpenLibraryConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl CatalogConnector for OpenLibraryConnector {
    fn source(&self) -> Source {
        Source::Openlibrary
    }

    fn search_url(&self) -> &str {
        &self.config.search_url
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogRecord>, FetchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FetchError::EmptyQuery);
        }

        let limit = clamp_page_size(limit, self.max_page_size());
        let params = [("q", query.to_string()), ("limit", limit.to_string())];
        let body = http::get_text(&self.client, &self.config.search_url, &params).await?;

        let envelope: SearchResponse = serde_json::from_str(&body)?;
        let docs: Vec<OpenLibraryDoc> = http::decode_records(self.source().as_str(), envelope.docs);

        Ok(docs.into_iter().map(normalize_doc).collect())
    }
}

/// Map one OpenLibrary document into a [`CatalogRecord`].
pub fn normalize_doc(doc: OpenLibraryDoc) -> CatalogRecord {
    let title = doc.title.as_deref().unwrap_or_default().trim().to_string();
    let native_key = doc.key.as_deref().map(strip_key_prefix);
    let alternate = doc
        .cover_edition_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .or_else(|| doc.edition_key.first().map(String::as_str));

    let id = derive_id(
        Source::Openlibrary,
        IdentityCandidates {
            primary: native_key,
            alternate,
            isbns: &doc.isbn,
            title: &title,
        },
    );

    let mut identifiers = serde_json::Map::new();
    if let Some(key) = &doc.key {
        identifiers.insert("key".to_string(), serde_json::Value::from(key.clone()));
    }
    if !doc.isbn.is_empty() {
        identifiers.insert("isbn".to_string(), serde_json::Value::from(doc.isbn.clone()));
    }

    CatalogRecord {
        id,
        source: Source::Openlibrary,
        title,
        authors: doc.author_name,
        description: String::new(),
        categories: doc
            .subject
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        identifiers,
        published_year: doc.first_publish_year.map(PublishedYear::Year),
        thumbnail: doc
            .cover_i
            .map(|id| format!("https://covers.openlibrary.org/b/id/{}-L.jpg", id)),
    }
}

fn strip_key_prefix(key: &str) -> &str {
    key.trim_start_matches("/works/")
        .trim_start_matches("/books/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> OpenLibraryDoc {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn normalizes_full_doc() {
        let rec = normalize_doc(doc(json!({
            "key": "/works/OL893415W",
            "title": " Dune ",
            "author_name": ["Frank Herbert"],
            "subject": ["Science fiction", "Arrakis"],
            "isbn": ["9780441013593"],
            "first_publish_year": 1965,
            "cover_i": 11481354
        })));

        assert_eq!(rec.id, "openlibrary:OL893415W");
        assert_eq!(rec.source, Source::Openlibrary);
        assert_eq!(rec.title, "Dune");
        assert_eq!(rec.authors, vec!["Frank Herbert"]);
        assert_eq!(rec.categories, vec!["Science fiction", "Arrakis"]);
        assert_eq!(rec.description, "");
        assert_eq!(rec.identifiers["key"], "/works/OL893415W");
        assert_eq!(rec.identifiers["isbn"], json!(["9780441013593"]));
        assert_eq!(rec.published_year, Some(PublishedYear::Year(1965)));
        assert_eq!(
            rec.thumbnail.as_deref(),
            Some("https://covers.openlibrary.org/b/id/11481354-L.jpg")
        );
    }

    #[test]
    fn missing_fields_degrade_to_defaults() {
        let rec = normalize_doc(doc(json!({ "title": "Untitled Notes" })));
        assert_eq!(rec.id, "openlibrary:Untitled Notes");
        assert!(rec.authors.is_empty());
        assert!(rec.categories.is_empty());
        assert!(rec.identifiers.is_empty());
        assert_eq!(rec.published_year, None);
        assert_eq!(rec.thumbnail, None);
    }

    #[test]
    fn id_uses_edition_key_when_key_missing() {
        let rec = normalize_doc(doc(json!({
            "title": "Dune",
            "cover_edition_key": "OL26242482M",
            "isbn": ["9780441013593"]
        })));
        assert_eq!(rec.id, "openlibrary:OL26242482M");

        let rec = normalize_doc(doc(json!({
            "title": "Dune",
            "edition_key": ["OL1M", "OL2M"]
        })));
        assert_eq!(rec.id, "openlibrary:OL1M");
    }

    #[test]
    fn id_uses_isbn_when_keys_missing() {
        let rec = normalize_doc(doc(json!({
            "title": "Dune",
            "isbn": ["9780441013593", "0441013597"]
        })));
        assert_eq!(rec.id, "openlibrary:9780441013593");
    }

    #[test]
    fn title_fallback_id_uses_trimmed_title() {
        let rec = normalize_doc(doc(json!({ "title": " Dune " })));
        assert_eq!(rec.id, "openlibrary:Dune");
        assert_eq!(rec.title, "Dune");
    }

    #[test]
    fn null_lists_are_read_as_empty() {
        let rec = normalize_doc(doc(json!({
            "key": "/works/OL1W",
            "title": "Dune",
            "author_name": null,
            "subject": null,
            "isbn": null,
            "edition_key": null
        })));
        assert_eq!(rec.id, "openlibrary:OL1W");
        assert!(rec.authors.is_empty());
        assert!(rec.categories.is_empty());
        assert!(!rec.identifiers.contains_key("isbn"));
    }

    #[test]
    fn books_prefix_is_stripped() {
        assert_eq!(strip_key_prefix("/books/OL1M"), "OL1M");
        assert_eq!(strip_key_prefix("OL1W"), "OL1W");
    }

    #[test]
    fn envelope_without_docs_is_rejected() {
        let result: Result<SearchResponse, _> = serde_json::from_str(r#"{"numFound": 0}"#);
        assert!(result.is_err());
    }
}
