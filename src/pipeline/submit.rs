// src/pipeline/submit.rs

//! Daily sitemap submission.

use std::path::Path;

use reqwest::Client;

use crate::error::Result;
use crate::models::{ChannelOutcome, ChannelReport, Config, IndexingReport, PathsConfig};
use crate::pipeline::sitemap::recent_article_urls;
use crate::services::notifier::settle;
use crate::services::{IndexNow, IndexingChannel, IndexingNotifier, SearchConsole, SitemapPing};
use crate::storage::SiteState;

const INDEXNOW_BATCH: &str = "indexnow-batch";

/// Submit the sitemap to Search Console and the ping endpoints, then send
/// the most recent article URLs to IndexNow in one batch.
///
/// Every channel settles on its own; the report is always returned.
pub async fn submit_sitemap(
    site: &dyn SiteState,
    config: &Config,
    root: &Path,
    client: Client,
) -> IndexingReport {
    let sitemap_url = config.site.sitemap_url(&config.paths.sitemap_file);
    let credentials = PathsConfig::resolve(root, &config.paths.credentials_file);
    log::info!("[submit] Submitting {sitemap_url}");

    let mut channels: Vec<Box<dyn IndexingChannel>> = vec![Box::new(SearchConsole::new(
        client.clone(),
        credentials,
        &config.indexing,
        format!("{}/", config.site.origin()),
    ))];
    channels.extend(
        SitemapPing::from_config(client.clone(), &config.indexing, &sitemap_url)
            .into_iter()
            .map(|ping| Box::new(ping) as Box<dyn IndexingChannel>),
    );
    let mut report = IndexingNotifier::new(channels).notify(&sitemap_url).await;

    let indexnow = IndexNow::from_config(client, config);
    let batch = indexnow_batch(site, config, &indexnow).await;
    report.channels.push(ChannelReport {
        channel: INDEXNOW_BATCH.into(),
        outcome: settle(INDEXNOW_BATCH, &sitemap_url, batch),
    });

    log::info!(
        "[submit] Done: {} submitted, {} skipped, {} failed",
        report.submitted(),
        report.skipped(),
        report.failed()
    );
    report
}

async fn indexnow_batch(
    site: &dyn SiteState,
    config: &Config,
    indexnow: &IndexNow,
) -> Result<ChannelOutcome> {
    let Some(xml) = site.read_sitemap().await? else {
        return Ok(ChannelOutcome::Skipped {
            reason: "no sitemap file".into(),
        });
    };
    let urls = recent_article_urls(
        &xml,
        config.site.origin(),
        config.indexing.recent_url_count,
    )?;
    indexnow.submit_batch(&urls).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalSite;
    use crate::utils::http::create_client;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_unconfigured_channels_skip_and_refused_pings_fail() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.indexing.indexnow_key_env = "PUBLISHER_TEST_UNSET_KEY".into();
        config.indexing.ping_endpoints = vec![
            "http://127.0.0.1:1/ping".into(),
            "http://localhost:1/ping".into(),
        ];
        let site = LocalSite::new(tmp.path(), &config.paths);
        let client = create_client(&config.http).unwrap();

        let report = submit_sitemap(&site, &config, tmp.path(), client).await;

        assert_eq!(report.url, "https://www.eplnewshub.com/sitemap.xml");
        assert!(matches!(
            report.outcome("search-console"),
            Some(ChannelOutcome::Skipped { .. })
        ));
        assert!(matches!(
            report.outcome(INDEXNOW_BATCH),
            Some(ChannelOutcome::Skipped { .. })
        ));
        assert_eq!(report.failed(), 2);
    }
}
