//! Similarity-ranked recommendations.
//!
//! Pulls a wider candidate pool through the live search, embeds the query
//! and every candidate, and orders candidates by cosine similarity. When
//! embeddings are unavailable the candidates come back unranked.

use anyhow::Result;

use crate::config::Config;
use crate::embedding::{self, cosine_similarity, DisabledProvider, EmbeddingProvider};
use crate::fetch;
use crate::models::{CatalogRecord, ScoredRecord};
use crate::search;
use crate::traits::CatalogConnector;

/// Candidates fetched per requested recommendation.
const CANDIDATE_FACTOR: usize = 3;

/// Recommend at most `limit` records for `query`, ranked by `embedder`.
pub async fn recommend(
    connectors: &[Box<dyn CatalogConnector>],
    embedder: &dyn EmbeddingProvider,
    query: &str,
    limit: usize,
) -> Result<Vec<ScoredRecord>> {
    let candidates =
        search::search_catalog(connectors, query, limit.saturating_mul(CANDIDATE_FACTOR)).await?;
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let mut ranked = match score_candidates(embedder, query, &candidates).await {
        Ok(scores) => rank(candidates, scores),
        Err(e) => {
            tracing::warn!(
                provider = embedder.name(),
                error = %e,
                "embedding unavailable, returning unranked results"
            );
            candidates.into_iter().map(ScoredRecord::from).collect()
        }
    };

    ranked.truncate(limit);
    Ok(ranked)
}

/// CLI entry point for `liria recommend`.
pub async fn run_recommend(config: &Config, query: &str, limit: usize, json: bool) -> Result<()> {
    let connectors = fetch::build_connectors(config)?;
    let embedder = embedding::create_provider(&config.embedding).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "embedding provider not configured");
        Box::new(DisabledProvider) as Box<dyn EmbeddingProvider>
    });
    tracing::debug!(provider = embedder.name(), model = embedder.model(), "ranking candidates");

    let results = recommend(&connectors, embedder.as_ref(), query, limit).await?;
    search::print_results(&results, json)
}

async fn score_candidates(
    embedder: &dyn EmbeddingProvider,
    query: &str,
    candidates: &[CatalogRecord],
) -> Result<Vec<f32>> {
    let query_vec = embedding::embed_one(embedder, query).await?;

    let texts: Vec<String> = candidates.iter().map(embedding_text).collect();
    let vectors = embedder.embed(&texts).await?;

    Ok(vectors
        .iter()
        .map(|v| cosine_similarity(&query_vec, v))
        .collect())
}

/// The text embedded for a candidate: its description, or its title.
fn embedding_text(record: &CatalogRecord) -> String {
    if record.description.trim().is_empty() {
        record.title.clone()
    } else {
        record.description.clone()
    }
}

/// Pair candidates with scores and sort by descending score.
///
/// Candidates without a matching score get `0.0`.
fn rank(candidates: Vec<CatalogRecord>, scores: Vec<f32>) -> Vec<ScoredRecord> {
    let mut scored: Vec<ScoredRecord> = candidates
        .into_iter()
        .enumerate()
        .map(|(i, record)| ScoredRecord {
            record,
            score: Some(scores.get(i).copied().unwrap_or(0.0)),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .unwrap_or(0.0)
            .total_cmp(&a.score.unwrap_or(0.0))
    });
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;
    use async_trait::async_trait;

    /// Maps a text to a fixed vector by keyword.
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn name(&self) -> &str {
            "keyword"
        }
        fn model(&self) -> &str {
            "keyword"
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| if t.contains("desert") { vec![1.0, 0.0] } else { vec![0.0, 1.0] })
                .collect())
        }
    }

    fn record(id: &str, title: &str, description: &str) -> CatalogRecord {
        CatalogRecord {
            id: id.to_string(),
            source: Source::GoogleBooks,
            title: title.to_string(),
            authors: vec![],
            description: description.to_string(),
            categories: vec![],
            identifiers: serde_json::Map::new(),
            published_year: None,
            thumbnail: None,
        }
    }

    #[test]
    fn rank_sorts_descending_and_fills_missing() {
        let ranked = rank(
            vec![record("a", "A", ""), record("b", "B", ""), record("c", "C", "")],
            vec![0.2, 0.9],
        );
        let ids: Vec<&str> = ranked.iter().map(|r| r.record.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(ranked[2].score, Some(0.0));
    }

    #[tokio::test]
    async fn score_candidates_uses_the_provider() {
        let candidates = vec![
            record("a", "Emma", ""),
            record("b", "Dune", "A desert planet"),
        ];
        let scores = score_candidates(&KeywordEmbedder, "desert", &candidates)
            .await
            .unwrap();
        assert!((scores[1] - 1.0).abs() < 1e-6);
        assert!(scores[0].abs() < 1e-6);

        let ranked = rank(candidates, scores);
        assert_eq!(ranked[0].record.id, "b");
    }

    #[tokio::test]
    async fn disabled_provider_fails_scoring() {
        let candidates = vec![record("a", "Emma", "")];
        assert!(score_candidates(&DisabledProvider, "desert", &candidates)
            .await
            .is_err());
    }

    #[test]
    fn embedding_text_falls_back_to_title() {
        assert_eq!(embedding_text(&record("a", "Dune", "")), "Dune");
        assert_eq!(embedding_text(&record("a", "Dune", "Spice")), "Spice");
    }
}
