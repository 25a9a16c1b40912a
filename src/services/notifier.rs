// src/services/notifier.rs

//! Concurrent, independently settled indexing fan-out.

use std::path::Path;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;

use crate::error::Result;
use crate::models::{ChannelOutcome, ChannelReport, Config, IndexingReport, PathsConfig};
use crate::services::{GoogleIndexing, IndexNow, SitemapPing};

/// One external indexer.
///
/// `Ok(Skipped)` means the channel is not configured. Any `Err` is recorded
/// as a failure for this channel only.
#[async_trait]
pub trait IndexingChannel: Send + Sync {
    fn name(&self) -> String;

    async fn notify(&self, url: &str) -> Result<ChannelOutcome>;
}

/// Runs every channel for a URL and collects a per-channel report.
pub struct IndexingNotifier {
    channels: Vec<Box<dyn IndexingChannel>>,
}

impl IndexingNotifier {
    pub fn new(channels: Vec<Box<dyn IndexingChannel>>) -> Self {
        Self { channels }
    }

    /// Google Indexing API, IndexNow and one ping per configured endpoint.
    pub fn from_config(config: &Config, root: &Path, client: Client) -> Self {
        let credentials = PathsConfig::resolve(root, &config.paths.credentials_file);
        let sitemap_url = config.site.sitemap_url(&config.paths.sitemap_file);

        let mut channels: Vec<Box<dyn IndexingChannel>> = vec![
            Box::new(GoogleIndexing::new(
                client.clone(),
                credentials,
                &config.indexing,
            )),
            Box::new(IndexNow::from_config(client.clone(), config)),
        ];
        channels.extend(
            SitemapPing::from_config(client, &config.indexing, &sitemap_url)
                .into_iter()
                .map(|ping| Box::new(ping) as Box<dyn IndexingChannel>),
        );
        Self::new(channels)
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Notify every channel about `url`. Never fails.
    pub async fn notify(&self, url: &str) -> IndexingReport {
        let results = join_all(self.channels.iter().map(|channel| async move {
            let name = channel.name();
            let result = channel.notify(url).await;
            (name, result)
        }))
        .await;

        let channels = results
            .into_iter()
            .map(|(channel, result)| {
                let outcome = settle(&channel, url, result);
                ChannelReport { channel, outcome }
            })
            .collect();

        IndexingReport {
            url: url.to_string(),
            channels,
        }
    }
}

/// Turn a channel result into a logged outcome.
pub(crate) fn settle(channel: &str, url: &str, result: Result<ChannelOutcome>) -> ChannelOutcome {
    let outcome = result.unwrap_or_else(|e| ChannelOutcome::Failed {
        error: e.to_string(),
    });
    match &outcome {
        ChannelOutcome::Submitted { .. } => log::info!("[indexing] {channel}: {outcome} for {url}"),
        ChannelOutcome::Skipped { .. } => log::warn!("[indexing] {channel}: {outcome}"),
        ChannelOutcome::Failed { .. } => log::error!("[indexing] {channel}: {outcome} for {url}"),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Fixed {
        name: &'static str,
        outcome: Option<ChannelOutcome>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl IndexingChannel for Fixed {
        fn name(&self) -> String {
            self.name.to_string()
        }

        async fn notify(&self, _url: &str) -> Result<ChannelOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome
                .clone()
                .ok_or_else(|| AppError::indexing(self.name, "connection refused"))
        }
    }

    #[tokio::test]
    async fn test_one_failure_does_not_hide_others() {
        let calls = Arc::new(AtomicUsize::new(0));
        let channel = |name, outcome| {
            Box::new(Fixed {
                name,
                outcome,
                calls: calls.clone(),
            }) as Box<dyn IndexingChannel>
        };
        let notifier = IndexingNotifier::new(vec![
            channel("a", None),
            channel("b", Some(ChannelOutcome::Submitted { status: 200 })),
            channel("c", Some(ChannelOutcome::Skipped { reason: "no key".into() })),
        ]);

        let report = notifier.notify("https://example.com/articles/x.html").await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(report.url, "https://example.com/articles/x.html");
        assert_eq!((report.submitted(), report.skipped(), report.failed()), (1, 1, 1));
        assert!(matches!(report.outcome("a"), Some(ChannelOutcome::Failed { .. })));
    }

    #[tokio::test]
    async fn test_from_config_without_credentials_or_key() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.indexing.indexnow_key_env = "PUBLISHER_TEST_UNSET_KEY".into();
        config.indexing.ping_endpoints = vec!["http://127.0.0.1:1/ping".into()];
        let client = crate::utils::http::create_client(&config.http).unwrap();

        let notifier = IndexingNotifier::from_config(&config, tmp.path(), client);
        assert_eq!(
            notifier.channel_names(),
            vec!["google-indexing", "indexnow", "ping:127.0.0.1"]
        );

        let report = notifier.notify("https://www.eplnewshub.com/articles/x.html").await;
        assert_eq!(report.skipped(), 2);
        assert_eq!(report.failed(), 1);
    }
}
