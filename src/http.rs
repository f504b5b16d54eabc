//! Shared HTTP plumbing for the catalog connectors.

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::error::FetchError;

/// Build the client shared by all connectors in a run.
///
/// Requests time out after `timeout_secs`; a hung provider fails its own
/// fetch instead of stalling the query.
pub fn build_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(client)
}

/// GET `url` with `params` and return the body as text.
///
/// Non-success statuses become [`FetchError::Status`] carrying the first
/// 200 characters of the body.
pub async fn get_text(
    client: &reqwest::Client,
    url: &str,
    params: &[(&str, String)],
) -> Result<String, FetchError> {
    let resp = client.get(url).query(params).send().await?;

    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            body: text.chars().take(200).collect(),
        });
    }

    Ok(text)
}

/// Field deserializer that reads an explicit `null` as the type's default.
///
/// Providers send `"author_name": null` as readily as omitting the key.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode each raw record independently, skipping the ones that don't fit.
pub fn decode_records<T: serde::de::DeserializeOwned>(
    provider: &str,
    raw: Vec<serde_json::Value>,
) -> Vec<T> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(i, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(provider, index = i, error = %e, "skipping undecodable record");
                None
            }
        })
        .collect()
}
