// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::HttpConfig;

/// Create the shared HTTP client used by every outbound call.
pub fn create_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Reduce a response to its status, failing on non-2xx.
///
/// The returned error carries the status and the start of the body.
pub async fn expect_success(response: reqwest::Response) -> std::result::Result<u16, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(status.as_u16());
    }
    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    Err(format!("HTTP {}: {}", status.as_u16(), snippet.trim()))
}
