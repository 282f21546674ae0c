// src/fetch/mod.rs

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::error::AnalysisError;

/// Bound on the whole request, connection time included. A planning page
/// slower than this is reported as unreachable.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(25);

/// Some planning hosts refuse requests without a browser-looking agent.
const USER_AGENT: &str = "Mozilla/5.0";

/// HTTP client for planning pages: bounded wait, browser-style user agent,
/// redirects followed under reqwest's default policy.
pub fn build_client() -> Client {
    Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Fetch `url` and return the response body as text.
///
/// Failures are classified, never retried: transport trouble (timeout, DNS,
/// refused connection, redirect loop) maps to [`AnalysisError::Network`],
/// a 5xx answer to [`AnalysisError::UpstreamUnavailable`] and any other
/// non-success status to [`AnalysisError::UpstreamClientError`].
pub async fn fetch_page_text(client: &Client, url: &str) -> Result<String, AnalysisError> {
    debug!(%url, "fetching planning page");

    let resp = client.get(url).send().await.map_err(|e| {
        warn!(%url, error = %e, "fetch failed before a response arrived");
        AnalysisError::Network {
            detail: e.to_string(),
        }
    })?;

    let status = resp.status();
    if status.is_server_error() {
        warn!(%url, status = status.as_u16(), "planning source unavailable");
        return Err(AnalysisError::UpstreamUnavailable {
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        warn!(%url, status = status.as_u16(), "planning source rejected the request");
        return Err(AnalysisError::UpstreamClientError {
            status: status.as_u16(),
        });
    }

    resp.text().await.map_err(|e| AnalysisError::Network {
        detail: e.to_string(),
    })
}
