//! Catalog fetcher.
//!
//! Issues one query to every configured connector concurrently and waits
//! for all of them to settle. Each provider's result is kept as a typed
//! [`ProviderOutcome`], so "returned nothing" and "failed" stay distinct
//! in the run report. A failing provider never affects the others.

use anyhow::Result;

use crate::config::Config;
use crate::connector_google::GoogleBooksConnector;
use crate::connector_openlibrary::OpenLibraryConnector;
use crate::error::FetchError;
use crate::http;
use crate::models::{CatalogRecord, Source};
use crate::traits::CatalogConnector;

/// What one provider produced for one query.
#[derive(Debug)]
pub enum ProviderOutcome {
    Fetched(Vec<CatalogRecord>),
    Failed(FetchError),
}

impl ProviderOutcome {
    pub fn fetched_count(&self) -> usize {
        match self {
            ProviderOutcome::Fetched(records) => records.len(),
            ProviderOutcome::Failed(_) => 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ProviderOutcome::Failed(_))
    }
}

/// Per-provider outcomes for one query, in connector order.
#[derive(Debug)]
pub struct QueryOutcome {
    pub query: String,
    pub providers: Vec<(Source, ProviderOutcome)>,
}

impl QueryOutcome {
    /// All fetched records in connector order; failed providers contribute none.
    pub fn into_records(self) -> impl Iterator<Item = CatalogRecord> {
        self.providers
            .into_iter()
            .flat_map(|(_, outcome)| match outcome {
                ProviderOutcome::Fetched(records) => records,
                ProviderOutcome::Failed(_) => Vec::new(),
            })
    }
}

/// Build the enabled connectors in pipeline order: OpenLibrary, then
/// Google Books.
pub fn build_connectors(config: &Config) -> Result<Vec<Box<dyn CatalogConnector>>> {
    let client = http::build_client(&config.http)?;
    let mut connectors: Vec<Box<dyn CatalogConnector>> = Vec::new();

    if config.providers.openlibrary.enabled {
        connectors.push(Box::new(OpenLibraryConnector::new(
            client.clone(),
            config.providers.openlibrary.clone(),
        )));
    }
    if config.providers.google_books.is_enabled() {
        connectors.push(Box::new(GoogleBooksConnector::new(
            client,
            config.providers.google_books.clone(),
        )));
    }

    Ok(connectors)
}

/// Query every connector concurrently with `limit` results each.
///
/// Failures are logged as warnings and recorded in the outcome; this
/// function itself never fails.
pub async fn fetch_query(
    connectors: &[Box<dyn CatalogConnector>],
    query: &str,
    limit: usize,
) -> QueryOutcome {
    let searches = connectors.iter().map(|connector| async move {
        let source = connector.source();
        let outcome = match connector.search(query, limit).await {
            Ok(records) => ProviderOutcome::Fetched(records),
            Err(e) => {
                tracing::warn!(provider = %source, query, error = %e, "provider query failed");
                ProviderOutcome::Failed(e)
            }
        };
        (source, outcome)
    });

    let providers = futures::future::join_all(searches).await;

    QueryOutcome {
        query: query.to_string(),
        providers,
    }
}
