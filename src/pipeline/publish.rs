// src/pipeline/publish.rs

//! Publish executor.
//!
//! Each due descriptor runs through, strictly in order:
//! parse, move, SEO, cascade, sitemap, indexing, descriptor removal.
//! Descriptors are processed one at a time; a failure is recorded against
//! that descriptor only and the batch continues. A descriptor that cannot
//! be read or parsed stays in place; any other step failure is recorded on
//! the article and fails the run.

use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::models::{
    Config, IndexingReport, MoveOutcome, PublishFailure, PublishReport, PublishedArticle,
    ScheduledArticleDescriptor, ScheduledEntry, StepError,
};
use crate::pipeline::cascade::run_cascade;
use crate::pipeline::scan::scan_due;
use crate::pipeline::seo::apply_seo;
use crate::pipeline::sitemap::update_sitemap;
use crate::services::IndexingNotifier;
use crate::storage::SiteState;

pub struct Publisher<'a> {
    site: &'a dyn SiteState,
    config: &'a Config,
    notifier: &'a IndexingNotifier,
}

impl<'a> Publisher<'a> {
    pub fn new(site: &'a dyn SiteState, config: &'a Config, notifier: &'a IndexingNotifier) -> Self {
        Self {
            site,
            config,
            notifier,
        }
    }

    /// Publish everything due on `today`.
    ///
    /// Only a failure to list the scheduled area is returned as `Err`;
    /// per-descriptor failures land in the report.
    pub async fn run(&self, today: NaiveDate) -> Result<PublishReport> {
        let scan = scan_due(self.site, today).await?;
        let mut report = PublishReport {
            pending: scan.pending,
            ..PublishReport::default()
        };

        if scan.due.is_empty() {
            log::info!("[publish] Nothing to publish");
            return Ok(report);
        }

        for entry in &scan.due {
            match self.publish_one(entry, today).await {
                Ok(article) => report.published.push(article),
                Err(e) => {
                    log::error!("[publish] {} failed: {}", entry.file_name, e);
                    report.failures.push(PublishFailure {
                        descriptor: entry.file_name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        log::info!(
            "[publish] Done: {} published, {} failed, {} pending",
            report.published.len(),
            report.failures.len(),
            report.pending
        );
        Ok(report)
    }

    /// Run every step for one descriptor.
    ///
    /// Only reading or parsing the descriptor ends the item early. From the
    /// move onward each step is attempted whatever happened before it, its
    /// error recorded on the article, and the descriptor is removed at the
    /// end so a re-run never shifts the homepage a second time.
    async fn publish_one(&self, entry: &ScheduledEntry, today: NaiveDate) -> Result<PublishedArticle> {
        log::info!("[publish] Processing {}", entry.file_name);

        let json = self.site.read_descriptor(&entry.file_name).await?;
        let descriptor = ScheduledArticleDescriptor::parse(entry, &json)
            .map_err(|e| AppError::descriptor(&entry.file_name, e))?;
        let article_file = descriptor.article_file.as_str();

        let mut article = PublishedArticle {
            descriptor: entry.file_name.clone(),
            article_url: self.config.site.article_url(article_file),
            moved: None,
            slots_written: 0,
            sitemap: None,
            seo_injected: false,
            indexing: IndexingReport::default(),
            errors: Vec::new(),
        };

        match self.site.move_staged_article(article_file).await {
            Ok(MoveOutcome::Moved) => {
                log::info!("[move] {article_file} is live");
                article.moved = Some(MoveOutcome::Moved);
            }
            Ok(MoveOutcome::AlreadyMoved) => {
                log::warn!("[move] Staged {article_file} not found, assuming already moved");
                article.moved = Some(MoveOutcome::AlreadyMoved);
            }
            Err(e) => record(&mut article, "move", e),
        }

        match apply_seo(self.site, self.config, article_file, descriptor.release_date).await {
            Ok(injected) => article.seo_injected = injected,
            Err(e) => log::warn!("[seo] {article_file}: {e}"),
        }

        match run_cascade(self.site, &self.config.homepage, &descriptor.headline_html).await {
            Ok(written) => article.slots_written = written,
            Err(e) => record(&mut article, "cascade", e),
        }

        match update_sitemap(self.site, self.config, article_file, today).await {
            Ok(update) => article.sitemap = Some(update),
            Err(e) => record(&mut article, "sitemap", e),
        }

        article.indexing = self.notifier.notify(&article.article_url).await;

        self.site.remove_descriptor(&entry.file_name).await?;
        if article.is_complete() {
            log::info!("[publish] Published {}", article.article_url);
        } else {
            log::error!(
                "[publish] Published {} with {} failed step(s)",
                article.article_url,
                article.errors.len()
            );
        }
        Ok(article)
    }
}

fn record(article: &mut PublishedArticle, step: &'static str, error: AppError) {
    log::error!("[{step}] {}: {error}", article.descriptor);
    article.errors.push(StepError {
        step,
        error: error.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HttpConfig, IndexingConfig, PathsConfig, SitemapUpdate};
    use crate::pipeline::sitemap::parse_locs;
    use crate::services::{GoogleIndexing, IndexNow, IndexingChannel, SitemapPing};
    use crate::models::ChannelOutcome;
    use crate::storage::LocalSite;
    use crate::utils::http::create_client;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Accepts every URL and counts the calls.
    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl IndexingChannel for Counting {
        fn name(&self) -> String {
            "counting".into()
        }

        async fn notify(&self, _url: &str) -> Result<ChannelOutcome> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(ChannelOutcome::Submitted { status: 200 })
        }
    }

    fn counting() -> (IndexingNotifier, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let notifier = IndexingNotifier::new(vec![Box::new(Counting(calls.clone()))]);
        (notifier, calls)
    }

    fn three_slot_site(root: &Path) -> Config {
        let mut config = Config::default();
        config.homepage.slots = vec!["main_headline".into(), "headline1".into(), "headline2".into()];
        for (slot, content) in [("main_headline", "A"), ("headline1", "B"), ("headline2", "C")] {
            std::fs::write(root.join(format!("{slot}.html")), content).unwrap();
        }
        config
    }

    fn slots(root: &Path) -> Vec<String> {
        ["main_headline", "headline1", "headline2"]
            .iter()
            .map(|s| std::fs::read_to_string(root.join(format!("{s}.html"))).unwrap())
            .collect()
    }

    const SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>https://www.eplnewshub.com/</loc>
  </url>
</urlset>
"#;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn small_config() -> Config {
        let mut config = Config::default();
        config.homepage.slots = vec!["main_headline".into(), "headline1".into()];
        config
    }

    fn stage(root: &Path, descriptor: &str, json: &str, article: Option<&str>) {
        let scheduled = root.join("scheduled-articles");
        std::fs::create_dir_all(&scheduled).unwrap();
        std::fs::write(scheduled.join(descriptor), json).unwrap();
        if let Some(article) = article {
            std::fs::write(
                scheduled.join(article),
                "<html><head><title>T</title></head><body><p>x</p></body></html>",
            )
            .unwrap();
        }
    }

    fn descriptor_json(article: &str, headline: &str) -> String {
        serde_json::json!({ "articleFile": article, "headlineHtml": headline }).to_string()
    }

    fn quiet() -> IndexingNotifier {
        IndexingNotifier::new(Vec::new())
    }

    #[tokio::test]
    async fn test_end_to_end_single_descriptor() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        stage(root, "2024-01-01-test.json", &descriptor_json("test.html", "<div>NEW</div>"), Some("test.html"));
        std::fs::write(root.join("main_headline.html"), "<div>OLD</div>").unwrap();
        std::fs::write(root.join("sitemap.xml"), SITEMAP).unwrap();

        let config = small_config();
        let site = LocalSite::new(root, &config.paths);
        let notifier = quiet();
        let report = Publisher::new(&site, &config, &notifier).run(day(2)).await.unwrap();

        assert!(report.is_success());
        assert_eq!(report.published.len(), 1);
        let article = &report.published[0];
        assert_eq!(article.moved, Some(MoveOutcome::Moved));
        assert_eq!(article.sitemap, Some(SitemapUpdate::Appended));
        assert!(article.seo_injected);

        assert!(root.join("articles/test.html").exists());
        assert!(!root.join("scheduled-articles/test.html").exists());
        assert!(!root.join("scheduled-articles/2024-01-01-test.json").exists());
        assert_eq!(
            std::fs::read_to_string(root.join("main_headline.html")).unwrap(),
            "<div>NEW</div>"
        );
        assert_eq!(
            std::fs::read_to_string(root.join("headline1.html")).unwrap(),
            "<div>OLD</div>"
        );

        let xml = std::fs::read_to_string(root.join("sitemap.xml")).unwrap();
        let locs = parse_locs(&xml).unwrap();
        let hits = locs
            .iter()
            .filter(|l| l.as_str() == "https://www.eplnewshub.com/articles/test.html")
            .count();
        assert_eq!(hits, 1);
        assert!(xml.contains("<lastmod>2024-01-02</lastmod>"));
    }

    #[tokio::test]
    async fn test_malformed_descriptor_is_isolated() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        stage(root, "2024-01-01-a.json", &descriptor_json("a.html", "A"), Some("a.html"));
        stage(root, "2024-01-01-b.json", "{ this is not json", None);
        stage(root, "2024-01-01-c.json", &descriptor_json("c.html", "C"), Some("c.html"));
        std::fs::write(root.join("sitemap.xml"), SITEMAP).unwrap();

        let config = small_config();
        let site = LocalSite::new(root, &config.paths);
        let notifier = quiet();
        let report = Publisher::new(&site, &config, &notifier).run(day(1)).await.unwrap();

        assert!(!report.is_success());
        assert_eq!(report.published.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].descriptor, "2024-01-01-b.json");

        assert!(root.join("articles/a.html").exists());
        assert!(root.join("articles/c.html").exists());
        assert!(root.join("scheduled-articles/2024-01-01-b.json").exists());
        assert_eq!(std::fs::read_to_string(root.join("main_headline.html")).unwrap(), "C");
        assert_eq!(std::fs::read_to_string(root.join("headline1.html")).unwrap(), "A");

        let xml = std::fs::read_to_string(root.join("sitemap.xml")).unwrap();
        let locs = parse_locs(&xml).unwrap();
        assert!(locs.contains(&"https://www.eplnewshub.com/articles/a.html".to_string()));
        assert!(locs.contains(&"https://www.eplnewshub.com/articles/c.html".to_string()));
    }

    #[tokio::test]
    async fn test_failing_indexers_do_not_block_publish() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        stage(root, "2024-01-01-x.json", &descriptor_json("x.html", "X"), Some("x.html"));
        std::fs::write(root.join("sitemap.xml"), SITEMAP).unwrap();
        let credentials = root.join("google-service-account.json");
        std::fs::write(&credentials, "{ broken").unwrap();

        let client = create_client(&HttpConfig::default()).unwrap();
        let refused = IndexingConfig {
            ping_endpoints: vec!["http://127.0.0.1:1/ping".into()],
            ..IndexingConfig::default()
        };
        let channels: Vec<Box<dyn IndexingChannel>> = vec![
            Box::new(GoogleIndexing::new(client.clone(), credentials, &refused)),
            Box::new(IndexNow::new(
                client.clone(),
                "http://127.0.0.1:1/indexnow",
                Some("key".into()),
                Some("www.eplnewshub.com".into()),
            )),
            Box::new(SitemapPing::new(client, "http://127.0.0.1:1/ping", "https://www.eplnewshub.com/sitemap.xml")),
        ];
        let notifier = IndexingNotifier::new(channels);

        let config = small_config();
        let site = LocalSite::new(root, &config.paths);
        let report = Publisher::new(&site, &config, &notifier).run(day(1)).await.unwrap();

        assert!(report.is_success());
        let article = &report.published[0];
        assert_eq!(article.indexing.failed(), 3);
        assert_eq!(article.sitemap, Some(SitemapUpdate::Appended));
        assert!(root.join("articles/x.html").exists());
        assert!(!root.join("scheduled-articles/2024-01-01-x.json").exists());
    }

    #[tokio::test]
    async fn test_rerun_after_move_and_missing_sitemap() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        stage(root, "2024-01-01-y.json", &descriptor_json("y.html", "Y"), None);

        let config = small_config();
        let site = LocalSite::new(root, &config.paths);
        let notifier = quiet();
        let report = Publisher::new(&site, &config, &notifier).run(day(1)).await.unwrap();

        assert!(report.is_success());
        let article = &report.published[0];
        assert_eq!(article.moved, Some(MoveOutcome::AlreadyMoved));
        assert_eq!(article.sitemap, Some(SitemapUpdate::Missing));
        assert!(!article.seo_injected);
        assert_eq!(std::fs::read_to_string(root.join("main_headline.html")).unwrap(), "Y");
    }

    #[tokio::test]
    async fn test_nothing_due() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        stage(root, "2024-01-05-later.json", &descriptor_json("l.html", "L"), Some("l.html"));

        let config = small_config();
        let site = LocalSite::new(root, &PathsConfig::default());
        let notifier = quiet();
        let report = Publisher::new(&site, &config, &notifier).run(day(1)).await.unwrap();

        assert!(report.is_empty());
        assert!(report.is_success());
        assert_eq!(report.pending, 1);
        assert!(root.join("scheduled-articles/l.html").exists());
    }

    #[tokio::test]
    async fn test_legacy_sitemap_rerun_shifts_homepage_once() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let config = three_slot_site(root);
        stage(root, "2024-01-01-n.json", &descriptor_json("n.html", "NEW"), Some("n.html"));
        std::fs::write(
            root.join("sitemap.xml"),
            SITEMAP.replace(
                "<loc>https://www.eplnewshub.com/</loc>",
                "<loc>https://www.eplnewshub.com/search?a=1&b=2</loc>",
            ),
        )
        .unwrap();

        let site = LocalSite::new(root, &config.paths);
        let (notifier, calls) = counting();
        let publisher = Publisher::new(&site, &config, &notifier);

        let first = publisher.run(day(1)).await.unwrap();
        assert!(first.is_success());
        assert_eq!(first.published[0].sitemap, Some(SitemapUpdate::Appended));
        assert!(!root.join("scheduled-articles/2024-01-01-n.json").exists());

        let second = publisher.run(day(1)).await.unwrap();
        assert!(second.is_empty());

        assert_eq!(slots(root), vec!["NEW", "A", "B"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let xml = std::fs::read_to_string(root.join("sitemap.xml")).unwrap();
        assert_eq!(xml.matches("/articles/n.html</loc>").count(), 1);
    }

    #[tokio::test]
    async fn test_failed_sitemap_step_still_indexes_and_consumes_descriptor() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let config = three_slot_site(root);
        stage(root, "2024-01-01-n.json", &descriptor_json("n.html", "NEW"), Some("n.html"));
        std::fs::write(root.join("sitemap.xml"), "<urlset><url><loc>https://x/</loc></url>").unwrap();

        let site = LocalSite::new(root, &config.paths);
        let (notifier, calls) = counting();
        let publisher = Publisher::new(&site, &config, &notifier);

        let report = publisher.run(day(1)).await.unwrap();
        assert!(!report.is_success());
        assert!(report.failures.is_empty());
        let article = &report.published[0];
        assert_eq!(article.sitemap, None);
        assert_eq!(article.errors.len(), 1);
        assert_eq!(article.errors[0].step, "sitemap");
        assert_eq!(article.slots_written, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!root.join("scheduled-articles/2024-01-01-n.json").exists());

        assert!(publisher.run(day(1)).await.unwrap().is_empty());
        assert_eq!(slots(root), vec!["NEW", "A", "B"]);
    }

    #[tokio::test]
    async fn test_unreadable_scheduled_area_aborts_run() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        std::fs::write(root.join("scheduled-articles"), "not a directory").unwrap();

        let config = small_config();
        let site = LocalSite::new(root, &config.paths);
        let notifier = quiet();
        let result = Publisher::new(&site, &config, &notifier).run(day(1)).await;
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
