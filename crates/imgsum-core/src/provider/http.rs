//! Request plumbing shared by the HTTP backends.

use crate::error::{ProviderError, ProviderResult};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build a client, or fall back to the default one if TLS setup fails.
pub(crate) fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {e}");
            reqwest::Client::new()
        })
}

/// Send a request and decode a JSON body, mapping every failure to a
/// [`ProviderError`] tagged with the provider name.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> ProviderResult<T> {
    let resp = request.send().await.map_err(|e| ProviderError::Request {
        provider: provider.to_string(),
        message: e.to_string(),
        status_code: None,
    })?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(ProviderError::Request {
            provider: provider.to_string(),
            message: format!("HTTP {status}: {text}"),
            status_code: Some(status.as_u16()),
        });
    }

    resp.json().await.map_err(|e| ProviderError::InvalidResponse {
        provider: provider.to_string(),
        message: e.to_string(),
    })
}

/// Trim generated text and reject an empty result.
pub(crate) fn non_empty(provider: &str, text: &str) -> ProviderResult<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ProviderError::InvalidResponse {
            provider: provider.to_string(),
            message: "empty response, no content generated".to_string(),
        });
    }
    Ok(text.to_string())
}

/// Request timeout from the `timeout_seconds` setting.
pub(crate) fn timeout_from(seconds: Option<u64>, default: Duration) -> Duration {
    seconds
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
        .unwrap_or(default)
}
