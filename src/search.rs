//! Live catalog search.
//!
//! Queries the providers directly (no persisted catalog involved) and
//! shapes the results for display: weak records are filtered out,
//! collections and anthologies sink below individual works, and entries
//! sharing a title and author line are collapsed.
//!
//! This is deliberately looser than the ingest deduplication, which only
//! collapses exact id collisions.

use anyhow::{bail, Result};
use std::collections::HashSet;

use crate::config::Config;
use crate::fetch;
use crate::models::{CatalogRecord, ScoredRecord};
use crate::traits::CatalogConnector;

/// Lowercase title fragments marking a collection rather than a single work.
const COLLECTION_KEYWORDS: &[&str] = &[
    "megapack",
    "collection",
    "anthology",
    "box set",
    "boxset",
    "best of",
    "best-of",
    "compilation",
    "omnibus",
    "complete",
    "boxed set",
];

/// Search both providers for `query` and return at most `limit` records.
pub async fn search_catalog(
    connectors: &[Box<dyn CatalogConnector>],
    query: &str,
    limit: usize,
) -> Result<Vec<CatalogRecord>> {
    let query = query.trim();
    if query.is_empty() {
        bail!("query string cannot be empty");
    }
    if limit == 0 {
        return Ok(Vec::new());
    }

    let outcome = fetch::fetch_query(connectors, query, limit).await;
    let records: Vec<CatalogRecord> = outcome.into_records().collect();

    let mut shaped = dedupe_by_title_author(order_individual_first(filter_quality(records)));
    shaped.truncate(limit);
    Ok(shaped)
}

/// CLI entry point for `liria search`.
pub async fn run_search(config: &Config, query: &str, limit: usize, json: bool) -> Result<()> {
    let connectors = fetch::build_connectors(config)?;
    let records = search_catalog(&connectors, query, limit).await?;
    let results: Vec<ScoredRecord> = records.into_iter().map(ScoredRecord::from).collect();
    print_results(&results, json)
}

/// Print results as a JSON array or as a numbered listing.
pub fn print_results(results: &[ScoredRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        let rec = &result.record;
        match result.score {
            Some(score) => println!("{}. [{:.3}] {}", i + 1, score, rec.title),
            None => println!("{}. {}", i + 1, rec.title),
        }
        println!("    by: {}", rec.author_line());
        println!("    id: {}", rec.id);
        if !rec.categories.is_empty() {
            println!("    categories: {}", rec.categories.join(", "));
        }
        if !rec.description.is_empty() {
            println!("    {}", snippet(&rec.description, 160));
        }
    }

    Ok(())
}

/// Keep records with a real title and either a description or topics.
pub fn filter_quality(records: Vec<CatalogRecord>) -> Vec<CatalogRecord> {
    records
        .into_iter()
        .filter(|r| r.title.trim().chars().count() >= 2)
        .filter(|r| r.description.trim().chars().count() >= 10 || !r.categories.is_empty())
        .collect()
}

pub fn is_collection(title: &str) -> bool {
    let lower = title.to_lowercase();
    COLLECTION_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Stable partition: individual works first, collections after.
pub fn order_individual_first(mut records: Vec<CatalogRecord>) -> Vec<CatalogRecord> {
    records.sort_by_key(|r| is_collection(&r.title));
    records
}

/// Collapse records sharing a lowercase `title|authors` key, first wins.
pub fn dedupe_by_title_author(records: Vec<CatalogRecord>) -> Vec<CatalogRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| {
            let key = format!(
                "{}|{}",
                r.title.trim().to_lowercase(),
                r.author_line().trim().to_lowercase()
            );
            seen.insert(key)
        })
        .collect()
}

fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
