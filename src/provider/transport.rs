//! HTTP transport shared by the provider adapters.

use crate::error::ProviderError;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Build an HTTP client with timeout applied.
pub fn build_http_client(timeout: Duration) -> reqwest::Client {
    // Fall back to reqwest defaults if builder creation fails for any reason.
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// POST `body` as JSON and decode a JSON response of type `R`.
///
/// Non-2xx statuses are classified by [`ProviderError::from_status`]; bodies
/// that fail to decode become `MalformedResponse`.
pub async fn post_json<B, R>(
    http: &reqwest::Client,
    url: &str,
    headers: &[(&'static str, String)],
    body: &B,
) -> Result<R, ProviderError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let mut req = http.post(url).json(body);
    for (name, value) in headers {
        req = req.header(*name, value);
    }

    let response = req.send().await?;
    let status = response.status();
    debug!(url, status = status.as_u16(), "provider responded");
    if !status.is_success() {
        let retry_after_secs = parse_retry_after_secs(response.headers());
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::from_status(
            status.as_u16(),
            body,
            retry_after_secs,
        ));
    }

    let raw = response.text().await?;
    serde_json::from_str(&raw)
        .map_err(|e| ProviderError::malformed(format!("failed to decode response body: {e}")))
}

/// Parse a `Retry-After` header given either as delay seconds or an HTTP-date.
pub fn parse_retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(seconds);
    }
    let when = httpdate::parse_http_date(value).ok()?;
    Some(
        when.duration_since(SystemTime::now())
            .map(|d| d.as_secs())
            .unwrap_or(0),
    )
}
