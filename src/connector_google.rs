//! Google Books connector.
//!
//! Queries the volumes endpoint (`/books/v1/volumes?q=..&maxResults=..`)
//! and maps each entry of its `items` array into a [`CatalogRecord`],
//! reading bibliographic fields from the nested `volumeInfo`.
//!
//! Google omits `items` entirely when a query has no hits, so only the
//! `kind` marker is required of the envelope.
//!
//! # Environment Variables
//!
//! - `GOOGLE_BOOKS_API_KEY` (name configurable) — optional, sent as `key`
//!   for a higher quota.
//! - `USE_GOOGLE_BOOKS` — overrides `providers.google_books.enabled`.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use crate::config::GoogleBooksConfig;
use crate::error::FetchError;
use crate::http;
use crate::identity::{derive_id, IdentityCandidates};
use crate::models::{CatalogRecord, PublishedYear, Source};
use crate::traits::{clamp_page_size, CatalogConnector};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct VolumesResponse {
    kind: String,
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

/// One volume as returned by Google Books.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GoogleVolume {
    pub id: Option<String>,
    #[serde(deserialize_with = "http::null_as_default")]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VolumeInfo {
    pub title: Option<String>,
    #[serde(deserialize_with = "http::null_as_default")]
    pub authors: Vec<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "string_or_seq")]
    pub categories: Vec<String>,
    #[serde(deserialize_with = "http::null_as_default")]
    pub industry_identifiers: Vec<IndustryIdentifier>,
    pub published_date: Option<String>,
    pub image_links: Option<ImageLinks>,
}

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
#[serde(default)]
pub struct IndustryIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub identifier: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageLinks {
    pub thumbnail: Option<String>,
    pub small_thumbnail: Option<String>,
}

/// Accept `"Fiction"` as well as `["Fiction"]`; `null` reads as empty.
fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
        None => Vec::new(),
    })
}

pub struct GoogleBooksConnector {
    client: reqwest::Client,
    config: GoogleBooksConfig,
}

impl GoogleBooksConnector {
    pub fn new(client: reqwest::Client, config: GoogleBooksConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl CatalogConnector for GoogleBooksConnector {
    fn source(&self) -> Source {
        Source::GoogleBooks
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
        let mut params = vec![("q", query.to_string()), ("maxResults", limit.to_string())];
        if let Some(key) = self.config.api_key() {
            params.push(("key", key));
        }

        let body = http::get_text(&self.client, &self.config.search_url, &params).await?;

        let envelope: VolumesResponse = serde_json::from_str(&body)?;
        let volumes: Vec<GoogleVolume> =
            http::decode_records(self.source().as_str(), envelope.items);

        Ok(volumes.into_iter().map(normalize_volume).collect())
    }
}

/// Map one Google Books volume into a [`CatalogRecord`].
pub fn normalize_volume(volume: GoogleVolume) -> CatalogRecord {
    let info = volume.volume_info;
    let title = info.title.as_deref().unwrap_or_default().trim().to_string();
    let isbns = isbn_list(&info.industry_identifiers);

    let id = derive_id(
        Source::GoogleBooks,
        IdentityCandidates {
            primary: volume.id.as_deref(),
            alternate: None,
            isbns: &isbns,
            title: &title,
        },
    );

    let mut identifiers = serde_json::Map::new();
    if let Some(native) = &volume.id {
        identifiers.insert("id".to_string(), serde_json::Value::from(native.clone()));
    }
    if !info.industry_identifiers.is_empty() {
        identifiers.insert(
            "industryIdentifiers".to_string(),
            serde_json::to_value(&info.industry_identifiers).unwrap_or_default(),
        );
    }

    let thumbnail = info
        .image_links
        .and_then(|links| links.thumbnail.or(links.small_thumbnail));

    CatalogRecord {
        id,
        source: Source::GoogleBooks,
        title,
        authors: info.authors,
        description: info.description.unwrap_or_default().trim().to_string(),
        categories: info
            .categories
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect(),
        identifiers,
        published_year: info.published_date.map(PublishedYear::Date),
        thumbnail,
    }
}

/// ISBN-13 identifiers first, then ISBN-10.
fn isbn_list(identifiers: &[IndustryIdentifier]) -> Vec<String> {
    let of_kind = |kind: &str| {
        identifiers
            .iter()
            .filter(|i| i.kind == kind && !i.identifier.trim().is_empty())
            .map(|i| i.identifier.trim().to_string())
            .collect::<Vec<_>>()
    };

    let mut isbns = of_kind("ISBN_13");
    isbns.extend(of_kind("ISBN_10"));
    isbns
}
