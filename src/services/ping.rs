// src/services/ping.rs

//! Sitemap ping endpoints.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ChannelOutcome, IndexingConfig};
use crate::services::IndexingChannel;
use crate::utils::get_domain;
use crate::utils::http::expect_success;

/// `GET {endpoint}?sitemap=<sitemap url>`.
///
/// The URL being notified is ignored; engines recrawl the sitemap instead.
pub struct SitemapPing {
    client: Client,
    endpoint: String,
    sitemap_url: String,
}

impl SitemapPing {
    pub fn new(client: Client, endpoint: impl Into<String>, sitemap_url: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            sitemap_url: sitemap_url.into(),
        }
    }

    /// One ping channel per configured endpoint.
    pub fn from_config(client: Client, config: &IndexingConfig, sitemap_url: &str) -> Vec<Self> {
        config
            .ping_endpoints
            .iter()
            .map(|endpoint| Self::new(client.clone(), endpoint, sitemap_url))
            .collect()
    }
}

#[async_trait]
impl IndexingChannel for SitemapPing {
    fn name(&self) -> String {
        let host = get_domain(&self.endpoint).unwrap_or_else(|| self.endpoint.clone());
        format!("ping:{host}")
    }

    async fn notify(&self, _url: &str) -> Result<ChannelOutcome> {
        let url = Url::parse_with_params(&self.endpoint, &[("sitemap", &self.sitemap_url)])?;
        let response = self.client.get(url).send().await?;
        let status = expect_success(response)
            .await
            .map_err(|e| AppError::indexing(self.name(), e))?;
        Ok(ChannelOutcome::Submitted { status })
    }
}
