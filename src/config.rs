use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Path used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./config/liria.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_queries")]
    pub queries: Vec<String>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            queries: default_queries(),
            max_results: default_max_results(),
        }
    }
}

fn default_queries() -> Vec<String> {
    [
        "science fiction",
        "fantasy",
        "mystery",
        "thriller",
        "romance",
        "historical fiction",
        "literary fiction",
        "horror",
        "biography",
        "philosophy",
        "poetry",
        "young adult",
    ]
    .iter()
    .map(|q| q.to_string())
    .collect()
}
fn default_max_results() -> usize {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("data/books.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_http_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    format!("liria/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openlibrary: OpenLibraryConfig,
    #[serde(default)]
    pub google_books: GoogleBooksConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenLibraryConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_openlibrary_url")]
    pub search_url: String,
}

impl Default for OpenLibraryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            search_url: default_openlibrary_url(),
        }
    }
}

fn default_openlibrary_url() -> String {
    "https://openlibrary.org/search.json".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GoogleBooksConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_google_url")]
    pub search_url: String,
    /// Name of the environment variable holding an optional API key.
    #[serde(default = "default_google_key_env")]
    pub api_key_env: String,
}

impl Default for GoogleBooksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            search_url: default_google_url(),
            api_key_env: default_google_key_env(),
        }
    }
}

impl GoogleBooksConfig {
    /// Whether the provider should be queried, honoring `USE_GOOGLE_BOOKS`.
    pub fn is_enabled(&self) -> bool {
        match std::env::var("USE_GOOGLE_BOOKS") {
            Ok(v) => matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"),
            Err(_) => self.enabled,
        }
    }

    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

fn default_enabled() -> bool {
    true
}
fn default_google_url() -> String {
    "https://www.googleapis.com/books/v1/volumes".to_string()
}
fn default_google_key_env() -> String {
    "GOOGLE_BOOKS_API_KEY".to_string()
}

/// `[embedding]`: the recommendation ranker.
///
/// `provider` is `"auto"`, `"disabled"`, `"openai"` or `"gemini"`; the
/// `EMBEDDING_PROVIDER` environment variable overrides it. Unset `model`
/// and `endpoint` fall back to per-provider defaults.
#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Expected vector length; responses of another length are rejected.
    #[serde(default)]
    pub dims: Option<usize>,
    /// OpenAI embeddings URL, or the Gemini API base URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            endpoint: None,
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "auto".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

const EMBEDDING_PROVIDERS: &[&str] = &["auto", "disabled", "openai", "gemini"];

/// Load the configuration at `path`.
///
/// When `path` is the default location and no file exists there, the
/// built-in defaults are used so the ingest run needs no arguments. An
/// explicitly chosen path must exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG_PATH) {
        tracing::debug!("no config at {}, using defaults", path.display());
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

/// Parse and validate a TOML configuration document.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate ingest
    if config.ingest.max_results == 0 {
        bail!("ingest.max_results must be >= 1");
    }
    if config.ingest.queries.is_empty() {
        bail!("ingest.queries must contain at least one query");
    }
    if config.ingest.queries.iter().any(|q| q.trim().is_empty()) {
        bail!("ingest.queries must not contain blank queries");
    }

    // Validate http
    if config.http.timeout_secs == 0 {
        bail!("http.timeout_secs must be >= 1");
    }

    // Validate providers
    if !config.providers.openlibrary.enabled && !config.providers.google_books.is_enabled() {
        bail!("at least one catalog provider must be enabled");
    }

    // Validate embedding
    if config.embedding.dims == Some(0) {
        bail!("embedding.dims must be > 0 when set");
    }
    if config.embedding.timeout_secs == 0 {
        bail!("embedding.timeout_secs must be >= 1");
    }
    let provider = config.embedding.provider.trim().to_lowercase();
    if !EMBEDDING_PROVIDERS.contains(&provider.as_str()) {
        bail!(
            "Unknown embedding provider: '{}'. Must be one of: {}.",
            config.embedding.provider,
            EMBEDDING_PROVIDERS.join(", ")
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.ingest.max_results, 20);
        assert_eq!(config.output.path, PathBuf::from("data/books.json"));
        assert_eq!(config.http.timeout_secs, 10);
        assert!(config.providers.openlibrary.enabled);
        assert!(!config.ingest.queries.is_empty());
        assert_eq!(config.embedding.provider, "auto");
        assert_eq!(config.embedding.endpoint, None);
    }

    #[test]
    fn overrides_are_read() {
        let config = parse_config(
            r#"
[ingest]
queries = ["dune"]
max_results = 5

[output]
path = "out/catalog.json"

[providers.openlibrary]
search_url = "http://localhost:1234/search.json"
"#,
        )
        .unwrap();
        assert_eq!(config.ingest.queries, vec!["dune".to_string()]);
        assert_eq!(config.ingest.max_results, 5);
        assert_eq!(config.output.path, PathBuf::from("out/catalog.json"));
        assert_eq!(
            config.providers.openlibrary.search_url,
            "http://localhost:1234/search.json"
        );
    }

    #[test]
    fn rejects_zero_max_results() {
        let err = parse_config("[ingest]\nmax_results = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_results"));
    }

    #[test]
    fn rejects_blank_query() {
        let err = parse_config("[ingest]\nqueries = [\"fantasy\", \"  \"]\n").unwrap_err();
        assert!(err.to_string().contains("blank"));
    }

    #[test]
    fn accepts_gemini_embedding_section() {
        let config = parse_config(
            "[embedding]\nprovider = \"gemini\"\nendpoint = \"http://localhost:9/v1beta\"\n",
        )
        .unwrap();
        assert_eq!(config.embedding.provider, "gemini");
        assert_eq!(config.embedding.model, None);
        assert_eq!(
            config.embedding.endpoint.as_deref(),
            Some("http://localhost:9/v1beta")
        );
    }

    #[test]
    fn rejects_zero_embedding_dims() {
        let err = parse_config("[embedding]\nprovider = \"openai\"\ndims = 0\n").unwrap_err();
        assert!(err.to_string().contains("embedding.dims"));
    }

    #[test]
    fn rejects_unknown_embedding_provider() {
        let err = parse_config("[embedding]\nprovider = \"cohere\"\n").unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(load_config(&missing).is_err());
    }
}
