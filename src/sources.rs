use anyhow::Result;

use crate::config::Config;
use crate::models::Source;

/// One row of the `liria sources` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub source: Source,
    pub enabled: bool,
    pub search_url: String,
}

pub fn get_sources(config: &Config) -> Vec<SourceStatus> {
    vec![
        SourceStatus {
            source: Source::Openlibrary,
            enabled: config.providers.openlibrary.enabled,
            search_url: config.providers.openlibrary.search_url.clone(),
        },
        SourceStatus {
            source: Source::GoogleBooks,
            enabled: config.providers.google_books.is_enabled(),
            search_url: config.providers.google_books.search_url.clone(),
        },
    ]
}

pub fn list_sources(config: &Config) -> Result<()> {
    println!("{:<16} {:<10} URL", "PROVIDER", "STATUS");
    for status in get_sources(config) {
        let state = if status.enabled { "ENABLED" } else { "DISABLED" };
        println!("{:<16} {:<10} {}", status.source, state, status.search_url);
    }

    if config.providers.google_books.is_enabled() && config.providers.google_books.api_key().is_none() {
        println!(
            "note: {} not set, google_books runs on the anonymous quota",
            config.providers.google_books.api_key_env
        );
    }

    Ok(())
}
