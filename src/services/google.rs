// src/services/google.rs

//! Google service-account auth, Indexing API and Search Console.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::form_urlencoded::byte_serialize;

use crate::error::{AppError, Result};
use crate::models::{ChannelOutcome, IndexingConfig};
use crate::services::IndexingChannel;
use crate::utils::http::expect_success;

const JWT_BEARER: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".into()
}

/// The fields of a service-account key file this tool needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ServiceAccount {
    /// Load the key file; `Ok(None)` when it does not exist.
    pub async fn load(path: &std::path::Path) -> Result<Option<Self>> {
        match tokio::fs::read_to_string(path).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Signed RS256 assertion for `scope`.
    pub fn assertion(&self, scope: &str) -> Result<String> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            iss: &self.client_email,
            scope,
            aud: &self.token_uri,
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &key,
        )?)
    }

    /// Exchange a signed assertion for an OAuth access token.
    pub async fn access_token(&self, client: &Client, scope: &str) -> Result<String> {
        let assertion = self.assertion(scope)?;
        let response = client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER), ("assertion", assertion.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            let message = expect_success(response).await.err().unwrap_or_default();
            return Err(AppError::auth(format!("token exchange failed: {message}")));
        }
        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

/// Google Indexing API `URL_UPDATED` notification.
pub struct GoogleIndexing {
    client: Client,
    credentials: PathBuf,
    publish_url: String,
    scope: String,
}

impl GoogleIndexing {
    pub fn new(client: Client, credentials: PathBuf, config: &IndexingConfig) -> Self {
        Self {
            client,
            credentials,
            publish_url: config.google_publish_url.clone(),
            scope: config.google_indexing_scope.clone(),
        }
    }
}

#[async_trait]
impl IndexingChannel for GoogleIndexing {
    fn name(&self) -> String {
        "google-indexing".into()
    }

    async fn notify(&self, url: &str) -> Result<ChannelOutcome> {
        let Some(account) = ServiceAccount::load(&self.credentials).await? else {
            return Ok(ChannelOutcome::Skipped {
                reason: format!("no service account at {}", self.credentials.display()),
            });
        };
        let token = account.access_token(&self.client, &self.scope).await?;

        let response = self
            .client
            .post(&self.publish_url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "url": url, "type": "URL_UPDATED" }))
            .send()
            .await?;
        let status = expect_success(response)
            .await
            .map_err(|e| AppError::indexing(self.name(), e))?;
        Ok(ChannelOutcome::Submitted { status })
    }
}

/// Search Console sitemap submission (`PUT sites/{site}/sitemaps/{sitemap}`).
pub struct SearchConsole {
    client: Client,
    credentials: PathBuf,
    api_base: String,
    scope: String,
    site_url: String,
}

impl SearchConsole {
    pub fn new(
        client: Client,
        credentials: PathBuf,
        config: &IndexingConfig,
        site_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            credentials,
            api_base: config.search_console_url.trim_end_matches('/').to_string(),
            scope: config.search_console_scope.clone(),
            site_url: site_url.into(),
        }
    }

    fn endpoint(&self, sitemap_url: &str) -> String {
        let encode = |s: &str| byte_serialize(s.as_bytes()).collect::<String>();
        format!(
            "{}/sites/{}/sitemaps/{}",
            self.api_base,
            encode(&self.site_url),
            encode(sitemap_url)
        )
    }
}

#[async_trait]
impl IndexingChannel for SearchConsole {
    fn name(&self) -> String {
        "search-console".into()
    }

    async fn notify(&self, sitemap_url: &str) -> Result<ChannelOutcome> {
        let Some(account) = ServiceAccount::load(&self.credentials).await? else {
            return Ok(ChannelOutcome::Skipped {
                reason: format!("no service account at {}", self.credentials.display()),
            });
        };
        let token = account.access_token(&self.client, &self.scope).await?;

        let response = self
            .client
            .put(self.endpoint(sitemap_url))
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_LENGTH, 0)
            .send()
            .await?;
        let status = expect_success(response)
            .await
            .map_err(|e| AppError::indexing(self.name(), e))?;
        Ok(ChannelOutcome::Submitted { status })
    }
}
