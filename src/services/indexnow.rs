// src/services/indexnow.rs

//! IndexNow submission.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{ChannelOutcome, Config};
use crate::services::IndexingChannel;
use crate::utils::http::expect_success;

/// IndexNow endpoint with the key read from the environment.
pub struct IndexNow {
    client: Client,
    endpoint: String,
    key: Option<String>,
    key_env: String,
    host: Option<String>,
}

impl IndexNow {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        key: Option<String>,
        host: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            key: key.filter(|k| !k.trim().is_empty()),
            key_env: String::new(),
            host,
        }
    }

    /// Key from `indexing.indexnow_key_env`, host from `site.base_url`.
    pub fn from_config(client: Client, config: &Config) -> Self {
        let key_env = &config.indexing.indexnow_key_env;
        let mut indexnow = Self::new(
            client,
            &config.indexing.indexnow_url,
            std::env::var(key_env).ok(),
            config.site.host(),
        );
        indexnow.key_env = key_env.clone();
        indexnow
    }

    fn skipped(&self) -> ChannelOutcome {
        let reason = if self.key_env.is_empty() {
            "no IndexNow key".to_string()
        } else {
            format!("{} not set", self.key_env)
        };
        ChannelOutcome::Skipped { reason }
    }

    /// POST one batch of URLs as `{host, key, urlList}`.
    pub async fn submit_batch(&self, urls: &[String]) -> Result<ChannelOutcome> {
        let Some(key) = &self.key else {
            return Ok(self.skipped());
        };
        if urls.is_empty() {
            return Ok(ChannelOutcome::Skipped {
                reason: "no article URLs in sitemap".into(),
            });
        }
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| AppError::indexing(self.name(), "site base_url has no host"))?;

        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "host": host, "key": key, "urlList": urls }))
            .send()
            .await?;
        let status = expect_success(response)
            .await
            .map_err(|e| AppError::indexing(self.name(), e))?;
        log::info!("[indexing] indexnow: batch of {} URLs accepted", urls.len());
        Ok(ChannelOutcome::Submitted { status })
    }
}

#[async_trait]
impl IndexingChannel for IndexNow {
    fn name(&self) -> String {
        "indexnow".into()
    }

    async fn notify(&self, url: &str) -> Result<ChannelOutcome> {
        let Some(key) = &self.key else {
            return Ok(self.skipped());
        };
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", url), ("key", key.as_str())])
            .send()
            .await?;
        let status = expect_success(response)
            .await
            .map_err(|e| AppError::indexing(self.name(), e))?;
        Ok(ChannelOutcome::Submitted { status })
    }
}
