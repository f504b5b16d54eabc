//! Embedding providers used to rank recommendation candidates.
//!
//! [`EmbeddingProvider::embed`] turns a batch of texts into vectors, one per
//! text and in input order. Backends:
//! - **[`OpenAIProvider`]**: one batched call to an OpenAI-compatible
//!   `/v1/embeddings` endpoint.
//! - **[`GeminiProvider`]**: one `models/<model>:embedContent` call per text.
//! - **[`DisabledProvider`]**: always fails, so callers fall back to
//!   unranked results.
//!
//! # Provider Selection
//!
//! `embedding.provider` (overridden by `EMBEDDING_PROVIDER`) names the
//! backend. `"auto"` picks Gemini when `GEMINI_API_KEY` is set, else OpenAI
//! when `OPENAI_API_KEY` is set, else disabled.
//!
//! # Retry Strategy
//!
//! Both HTTP backends share [`send_with_retry`]:
//! - HTTP 429 and 5xx → retry
//! - other 4xx → fail immediately
//! - network errors → retry
//! - backoff 1s, 2s, 4s, ... capped at 32s

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::EmbeddingConfig;

pub const OPENAI_DEFAULT_MODEL: &str = "text-embedding-3-small";
pub const OPENAI_DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/embeddings";
pub const GEMINI_DEFAULT_MODEL: &str = "embedding-001";
pub const GEMINI_DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short backend name for logs (`"openai"`, `"gemini"`, `"disabled"`).
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// Embed `texts`, returning one vector per text in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embed a single text.
pub async fn embed_one(provider: &dyn EmbeddingProvider, text: &str) -> Result<Vec<f32>> {
    provider
        .embed(&[text.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Empty embedding response"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Disabled,
    OpenAI,
    Gemini,
}

/// Resolve the backend from the configured name, an optional override and
/// which API keys are present.
pub fn select_kind(
    configured: &str,
    env_override: Option<&str>,
    has_gemini_key: bool,
    has_openai_key: bool,
) -> Result<ProviderKind> {
    let name = env_override
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| configured.trim().to_lowercase());

    Ok(match name.as_str() {
        "disabled" => ProviderKind::Disabled,
        "openai" => ProviderKind::OpenAI,
        "gemini" => ProviderKind::Gemini,
        "auto" if has_gemini_key => ProviderKind::Gemini,
        "auto" if has_openai_key => ProviderKind::OpenAI,
        "auto" => ProviderKind::Disabled,
        other => bail!("Unknown embedding provider: {}", other),
    })
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Create the provider selected by `config` and the environment.
///
/// Fails when the selected backend's API key is missing.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    let gemini_key = env_non_empty("GEMINI_API_KEY");
    let openai_key = env_non_empty("OPENAI_API_KEY");
    let kind = select_kind(
        &config.provider,
        env_non_empty("EMBEDDING_PROVIDER").as_deref(),
        gemini_key.is_some(),
        openai_key.is_some(),
    )?;

    match kind {
        ProviderKind::Disabled => Ok(Box::new(DisabledProvider)),
        ProviderKind::OpenAI => {
            let key = openai_key
                .ok_or_else(|| anyhow!("OPENAI_API_KEY is required for OpenAI embeddings"))?;
            let mut config = config.clone();
            if config.model.is_none() {
                config.model = env_non_empty("OPENAI_EMBEDDING_MODEL");
            }
            Ok(Box::new(OpenAIProvider::new(&config, key)?))
        }
        ProviderKind::Gemini => {
            let key = gemini_key
                .ok_or_else(|| anyhow!("GEMINI_API_KEY is required for Gemini embeddings"))?;
            let mut config = config.clone();
            if config.model.is_none() {
                config.model = env_non_empty("GEMINI_EMBEDDING_MODEL");
            }
            if config.endpoint.is_none() {
                config.endpoint = env_non_empty("GEMINI_BASE_URL");
            }
            Ok(Box::new(GeminiProvider::new(&config, key)?))
        }
    }
}

// ============ Disabled Provider ============

pub struct DisabledProvider;

#[async_trait]
impl EmbeddingProvider for DisabledProvider {
    fn name(&self) -> &str {
        "disabled"
    }
    fn model(&self) -> &str {
        "none"
    }
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        bail!("Embedding provider is disabled")
    }
}

// ============ OpenAI Provider ============

/// OpenAI embeddings, or any endpoint speaking the same protocol.
pub struct OpenAIProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    dims: Option<usize>,
    max_retries: u32,
}

impl OpenAIProvider {
    pub fn new(config: &EmbeddingConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            client: embedding_client(config)?,
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| OPENAI_DEFAULT_ENDPOINT.to_string()),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string()),
            api_key,
            dims: config.dims,
            max_retries: config.max_retries,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    data: Vec<OpenAIEmbedding>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbedding {
    index: Option<usize>,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = send_with_retry(self.max_retries, || {
            self.client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
        })
        .await?;

        let parsed: OpenAIResponse = response.json().await?;
        let vectors = order_by_index(parsed.data, texts.len())?;
        check_dims(&vectors, self.dims)?;
        Ok(vectors)
    }
}

/// Sort `data[]` by `index` (position when absent) and check the count.
fn order_by_index(data: Vec<OpenAIEmbedding>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        bail!(
            "Invalid embedding response: expected {} embeddings, got {}",
            expected,
            data.len()
        );
    }

    let mut indexed: Vec<(usize, Vec<f32>)> = data
        .into_iter()
        .enumerate()
        .map(|(position, item)| (item.index.unwrap_or(position), item.embedding))
        .collect();
    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

// ============ Gemini Provider ============

/// Google Gemini embeddings. The API takes one content per call, so a
/// batch costs one request per text.
pub struct GeminiProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
    dims: Option<usize>,
    max_retries: u32,
}

impl GeminiProvider {
    pub fn new(config: &EmbeddingConfig, api_key: String) -> Result<Self> {
        let base = config
            .endpoint
            .clone()
            .unwrap_or_else(|| GEMINI_DEFAULT_BASE_URL.to_string());
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| GEMINI_DEFAULT_MODEL.to_string());

        Ok(Self {
            client: embedding_client(config)?,
            url: format!("{}/models/{}:embedContent", base.trim_end_matches('/'), model),
            model,
            api_key,
            dims: config.dims,
            max_retries: config.max_retries,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    embedding: Option<GeminiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbedding {
    #[serde(alias = "values", default)]
    value: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for text in texts {
            let body = serde_json::json!({ "content": { "parts": [{ "text": text }] } });
            let response = send_with_retry(self.max_retries, || {
                self.client
                    .post(&self.url)
                    .query(&[("key", self.api_key.as_str())])
                    .json(&body)
            })
            .await?;

            let parsed: GeminiResponse = response.json().await?;
            match parsed.embedding {
                Some(e) if !e.value.is_empty() => vectors.push(e.value),
                _ => bail!("Gemini returned no embedding value"),
            }
        }

        check_dims(&vectors, self.dims)?;
        Ok(vectors)
    }
}

// ============ Shared plumbing ============

fn embedding_client(config: &EmbeddingConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?)
}

/// Send the request built by `build`, retrying transient failures.
async fn send_with_retry<F>(max_retries: u32, build: F) -> Result<reqwest::Response>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            // 1s, 2s, 4s, ...
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        match build().send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }

                let body_text = response.text().await.unwrap_or_default();
                if status.as_u16() == 429 || status.is_server_error() {
                    tracing::debug!(attempt, %status, "embedding request will be retried");
                    last_err = Some(anyhow!("Embedding API error {}: {}", status, body_text));
                    continue;
                }
                bail!("Embedding API error {}: {}", status, body_text);
            }
            Err(e) => {
                tracing::debug!(attempt, error = %e, "embedding request will be retried");
                last_err = Some(e.into());
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("Embedding failed after retries")))
}

fn check_dims(vectors: &[Vec<f32>], dims: Option<usize>) -> Result<()> {
    if let Some(dims) = dims {
        if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
            bail!("Embedding has {} dimensions, expected {}", bad.len(), dims);
        }
    }
    Ok(())
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` for empty vectors, vectors
/// of different lengths, or zero vectors.
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
