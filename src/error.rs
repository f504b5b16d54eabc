//! Typed failures of a single provider fetch.
//!
//! A [`FetchError`] never aborts a run: the fetcher records it as the
//! provider's outcome for that query and moves on.

/// Errors that can occur while querying one catalog provider.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("query must not be empty")]
    EmptyQuery,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}
