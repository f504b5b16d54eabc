//! Ingestion run orchestration.
//!
//! Drives one run: for each configured query, in order, fetch every
//! provider concurrently, fold the results into a [`Deduplicator`], and
//! report the per-query counts. When all queries are done the collection
//! is written by the [`sink`](crate::sink), replacing the previous file.
//!
//! Queries are strictly sequential; only the provider fetches within one
//! query overlap.

use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;
use crate::dedup::{AdmissionStats, Deduplicator};
use crate::fetch::{self, ProviderOutcome, QueryOutcome};
use crate::models::Source;
use crate::sink;
use crate::traits::CatalogConnector;

/// Per-provider line of a query report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReport {
    pub source: Source,
    pub fetched: usize,
    pub failed: Option<String>,
}

/// What one query contributed to the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryReport {
    pub query: String,
    pub providers: Vec<ProviderReport>,
    pub admitted: AdmissionStats,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub queries: Vec<QueryReport>,
    pub total_unique: usize,
    pub output: PathBuf,
}

impl IngestSummary {
    pub fn failed_providers(&self) -> usize {
        self.queries
            .iter()
            .flat_map(|q| &q.providers)
            .filter(|p| p.failed.is_some())
            .count()
    }
}

/// Run the full ingestion with connectors built from `config`.
pub async fn run_ingest(config: &Config) -> Result<IngestSummary> {
    let connectors = fetch::build_connectors(config)?;
    run_ingest_with(config, &connectors).await
}

/// Run the full ingestion against the given connectors.
pub async fn run_ingest_with(
    config: &Config,
    connectors: &[Box<dyn CatalogConnector>],
) -> Result<IngestSummary> {
    let providers: Vec<&str> = connectors.iter().map(|c| c.source().as_str()).collect();
    println!(
        "ingest {} queries from {} ({})",
        config.ingest.queries.len(),
        providers.join(", "),
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );

    let mut dedup = Deduplicator::new();
    let mut reports = Vec::with_capacity(config.ingest.queries.len());

    for query in &config.ingest.queries {
        let outcome = fetch::fetch_query(connectors, query, config.ingest.max_results).await;
        let report = accumulate(&mut dedup, outcome);
        print_query_report(&report);
        reports.push(report);
    }

    let totals = dedup.totals();
    tracing::debug!(
        accepted = totals.accepted,
        blank_title = totals.blank_title,
        duplicate = totals.duplicate,
        "deduplication finished"
    );

    let total_unique = dedup.len();
    let records = dedup.into_records();
    sink::write_catalog(&config.output.path, &records)?;

    let summary = IngestSummary {
        queries: reports,
        total_unique,
        output: config.output.path.clone(),
    };

    println!("total unique books: {}", summary.total_unique);
    if summary.failed_providers() > 0 {
        println!("failed provider queries: {}", summary.failed_providers());
    }
    println!("wrote {}", summary.output.display());

    Ok(summary)
}

/// Fold one query's outcome into the run accumulator.
fn accumulate(dedup: &mut Deduplicator, outcome: QueryOutcome) -> QueryReport {
    let providers = outcome
        .providers
        .iter()
        .map(|(source, provider)| ProviderReport {
            source: *source,
            fetched: provider.fetched_count(),
            failed: match provider {
                ProviderOutcome::Failed(e) => Some(e.to_string()),
                ProviderOutcome::Fetched(_) => None,
            },
        })
        .collect();

    let query = outcome.query.clone();
    let admitted = dedup.extend(outcome.into_records());

    QueryReport {
        query,
        providers,
        admitted,
    }
}

fn print_query_report(report: &QueryReport) {
    println!("query \"{}\"", report.query);
    for provider in &report.providers {
        match &provider.failed {
            Some(err) => println!("  {}: failed ({})", provider.source, err),
            None => println!("  {}: {} fetched", provider.source, provider.fetched),
        }
    }
    println!("  new unique: {}", report.admitted.accepted);
}
