//! Shared HTTP plumbing for provider adapters.
//!
//! Every helper returns `Option`: a provider failure is "no data", never an
//! error the caller has to handle.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use screenlens_shared::{Result, ScreenlensError};

/// User-Agent string for provider requests.
const USER_AGENT: &str = concat!("screenlens/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Build the client shared by all adapters. Timeouts are set per request.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(|e| ScreenlensError::Network(format!("failed to build HTTP client: {e}")))
}

/// GET `url` with query parameters and decode a JSON body into `T`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
    timeout: Duration,
    provider: &str,
) -> Option<T> {
    let response = send(client, url, query, timeout, provider).await?;
    match response.json::<T>().await {
        Ok(body) => Some(body),
        Err(e) => {
            debug!(provider, url, error = %e, "unexpected response shape");
            None
        }
    }
}

/// GET `url` with query parameters and return the body as text.
pub(crate) async fn get_text(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
    timeout: Duration,
    provider: &str,
) -> Option<String> {
    let response = send(client, url, query, timeout, provider).await?;
    match response.text().await {
        Ok(body) => Some(body),
        Err(e) => {
            debug!(provider, url, error = %e, "failed to read response body");
            None
        }
    }
}

async fn send(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
    timeout: Duration,
    provider: &str,
) -> Option<reqwest::Response> {
    let response = match client.get(url).query(query).timeout(timeout).send().await {
        Ok(r) => r,
        Err(e) => {
            debug!(provider, url, error = %e, "request failed");
            return None;
        }
    };

    let status = response.status();
    if !status.is_success() {
        debug!(provider, url, %status, "non-success status");
        return None;
    }
    Some(response)
}

/// Trim and drop empty strings.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Strip trailing slashes so paths can be appended with `format!`.
pub(crate) fn normalize_base(base: impl Into<String>) -> String {
    base.into().trim_end_matches('/').to_string()
}
