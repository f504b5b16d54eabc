//! # LIRIA
//!
//! Book catalog ingestion for the LIRIA recommendation app.
//!
//! LIRIA queries two public book catalogs (OpenLibrary and Google Books),
//! normalizes their heterogeneous records into one [`CatalogRecord`]
//! shape, deduplicates them by a derived identity key, and writes the
//! result to `data/books.json`. The same connectors back a live search
//! and an embedding-ranked recommendation command.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌──────────────┐   ┌────────────┐
//! │  Connectors  │──▶│ Normalize  │──▶│ Deduplicator │──▶│    Sink    │
//! │ OL / Google  │   │ + identity │   │ first wins   │   │ books.json │
//! └──────────────┘   └────────────┘   └──────────────┘   └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! liria                          # run the ingest with built-in queries
//! liria search "dune" --limit 5  # live search across both catalogs
//! liria recommend "space opera"  # similarity-ranked picks
//! liria sources                  # provider status
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`connector_openlibrary`] | OpenLibrary connector |
//! | [`connector_google`] | Google Books connector |
//! | [`identity`] | Identity-key fallback chain |
//! | [`fetch`] | Concurrent per-query fetching |
//! | [`dedup`] | Run-scoped deduplication |
//! | [`sink`] | JSON catalog output |
//! | [`ingest`] | Ingest run orchestration |
//! | [`search`] | Live search |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`recommend`] | Similarity-ranked recommendations |
//!
//! [`CatalogRecord`]: models::CatalogRecord

pub mod config;
pub mod connector_google;
pub mod connector_openlibrary;
pub mod dedup;
pub mod embedding;
pub mod error;
pub mod fetch;
pub mod http;
pub mod identity;
pub mod ingest;
pub mod models;
pub mod recommend;
pub mod search;
pub mod sink;
pub mod sources;
pub mod traits;
