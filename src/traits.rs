//! The connector seam between the pipeline and the catalog providers.
//!
//! Each provider implements [`CatalogConnector`]. A connector owns its
//! request shape, its declared response shape, and the mapping of that
//! shape into [`CatalogRecord`]s, so a provider schema change surfaces at
//! the connector boundary as a [`FetchError::Decode`].
//!
//! ```text
//!  query ──▶ ┌────────────────────┐ ──▶ Vec<CatalogRecord>
//!            │ CatalogConnector   │
//!            │  OpenLibrary       │
//!            │  GoogleBooks       │
//!            └────────────────────┘
//! ```

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::{CatalogRecord, Source};

/// A book catalog search provider.
#[async_trait]
pub trait CatalogConnector: Send + Sync {
    /// The provenance tag stamped on every record this connector returns.
    fn source(&self) -> Source;

    /// Largest page size the provider is asked for; larger requests are clamped.
    fn max_page_size(&self) -> usize {
        20
    }

    /// The search endpoint queried by this connector.
    fn search_url(&self) -> &str;

    /// Search the provider and return its results, normalized.
    ///
    /// `limit` is clamped to [`max_page_size`](CatalogConnector::max_page_size).
    /// Records that cannot be decoded individually are skipped; only a
    /// transport failure, a non-success status or a malformed response
    /// envelope produces an error.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogRecord>, FetchError>;
}

/// Clamp a requested page size into `1..=max`.
pub fn clamp_page_size(limit: usize, max: usize) -> usize {
    limit.clamp(1, max.max(1))
}
