//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Public site identity
    #[serde(default)]
    pub site: SiteConfig,

    /// Where the site's files live, relative to the site root
    #[serde(default)]
    pub paths: PathsConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Search-engine notification endpoints
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Homepage slot layout and sidebar restyling rules
    #[serde(default)]
    pub homepage: HomepageConfig,

    /// Sitemap entry defaults and rebuild pages
    #[serde(default)]
    pub sitemap: SitemapConfig,

    /// Run lock behavior
    #[serde(default)]
    pub lock: LockConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.site.base_url)
            .map_err(|e| AppError::validation(format!("site.base_url: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(AppError::validation("site.base_url must be http(s)"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.homepage.slots.len() < 2 {
            return Err(AppError::validation(
                "homepage.slots needs at least two slots",
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for slot in &self.homepage.slots {
            if slot.trim().is_empty() || slot.contains(['/', '\\']) {
                return Err(AppError::validation(format!(
                    "homepage slot name {slot:?} is not a plain name"
                )));
            }
            if !seen.insert(slot.as_str()) {
                return Err(AppError::validation(format!(
                    "homepage slot {slot:?} listed twice"
                )));
            }
        }
        if self.homepage.sidebar_marker.trim().is_empty() {
            return Err(AppError::validation("homepage.sidebar_marker is empty"));
        }
        if self.sitemap.priority.parse::<f32>().is_err() {
            return Err(AppError::validation(format!(
                "sitemap.priority {:?} is not a number",
                self.sitemap.priority
            )));
        }
        for endpoint in self
            .indexing
            .ping_endpoints
            .iter()
            .chain([&self.indexing.google_publish_url, &self.indexing.indexnow_url])
        {
            url::Url::parse(endpoint)
                .map_err(|e| AppError::validation(format!("endpoint {endpoint:?}: {e}")))?;
        }
        Ok(())
    }
}

/// Public site identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Origin the site is served from, without trailing slash
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Name used in Open Graph tags
    #[serde(default = "defaults::site_name")]
    pub site_name: String,

    /// Twitter handle for card tags (omitted when empty)
    #[serde(default = "defaults::twitter_handle")]
    pub twitter_handle: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            site_name: defaults::site_name(),
            twitter_handle: defaults::twitter_handle(),
        }
    }
}

impl SiteConfig {
    /// Origin with any trailing slash removed.
    pub fn origin(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Public URL of a published article.
    pub fn article_url(&self, article_file: &str) -> String {
        format!("{}/articles/{}", self.origin(), article_file)
    }

    /// Public URL of the sitemap.
    pub fn sitemap_url(&self, sitemap_file: &str) -> String {
        let name = Path::new(sitemap_file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("sitemap.xml");
        format!("{}/{}", self.origin(), name)
    }

    /// Host part of the base URL.
    pub fn host(&self) -> Option<String> {
        crate::utils::get_domain(&self.base_url)
    }
}

/// Site file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Staging area for descriptors and their article files
    #[serde(default = "defaults::scheduled_dir")]
    pub scheduled_dir: String,

    /// Live articles directory
    #[serde(default = "defaults::articles_dir")]
    pub articles_dir: String,

    /// Directory holding the homepage slot fragments
    #[serde(default = "defaults::homepage_dir")]
    pub homepage_dir: String,

    /// Sitemap document
    #[serde(default = "defaults::sitemap_file")]
    pub sitemap_file: String,

    /// Google service-account key
    #[serde(default = "defaults::credentials_file")]
    pub credentials_file: String,

    /// Exclusive run lock
    #[serde(default = "defaults::lock_file")]
    pub lock_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            scheduled_dir: defaults::scheduled_dir(),
            articles_dir: defaults::articles_dir(),
            homepage_dir: defaults::homepage_dir(),
            sitemap_file: defaults::sitemap_file(),
            credentials_file: defaults::credentials_file(),
            lock_file: defaults::lock_file(),
        }
    }
}

impl PathsConfig {
    /// Resolve a configured path against the site root.
    pub fn resolve(root: &Path, configured: &str) -> PathBuf {
        let path = Path::new(configured);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for outgoing requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Search-engine notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Google Indexing API publish endpoint
    #[serde(default = "defaults::google_publish_url")]
    pub google_publish_url: String,

    /// OAuth scope for the Indexing API
    #[serde(default = "defaults::google_indexing_scope")]
    pub google_indexing_scope: String,

    /// Search Console API base, used for sitemap submission
    #[serde(default = "defaults::search_console_url")]
    pub search_console_url: String,

    /// OAuth scope for the Search Console API
    #[serde(default = "defaults::search_console_scope")]
    pub search_console_scope: String,

    /// IndexNow endpoint
    #[serde(default = "defaults::indexnow_url")]
    pub indexnow_url: String,

    /// Environment variable holding the IndexNow key
    #[serde(default = "defaults::indexnow_key_env")]
    pub indexnow_key_env: String,

    /// Sitemap ping endpoints, each called with `?sitemap=<url>`
    #[serde(default = "defaults::ping_endpoints")]
    pub ping_endpoints: Vec<String>,

    /// How many trailing article URLs the daily IndexNow batch submits
    #[serde(default = "defaults::recent_url_count")]
    pub recent_url_count: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            google_publish_url: defaults::google_publish_url(),
            google_indexing_scope: defaults::google_indexing_scope(),
            search_console_url: defaults::search_console_url(),
            search_console_scope: defaults::search_console_scope(),
            indexnow_url: defaults::indexnow_url(),
            indexnow_key_env: defaults::indexnow_key_env(),
            ping_endpoints: defaults::ping_endpoints(),
            recent_url_count: defaults::recent_url_count(),
        }
    }
}

/// Homepage slot layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomepageConfig {
    /// Slot names in cascade order; each is backed by `<name>.html`
    #[serde(default = "defaults::slots")]
    pub slots: Vec<String>,

    /// Slots whose name starts with this prefix use the sidebar card layout
    #[serde(default = "defaults::sidebar_prefix")]
    pub sidebar_prefix: String,

    /// CSS class identifying an already-restyled sidebar card
    #[serde(default = "defaults::sidebar_marker")]
    pub sidebar_marker: String,

    /// URL keyword to category label, first match wins
    #[serde(default = "defaults::categories")]
    pub categories: Vec<CategoryRule>,

    /// Label when no keyword matches
    #[serde(default = "defaults::default_category")]
    pub default_category: String,
}

impl Default for HomepageConfig {
    fn default() -> Self {
        Self {
            slots: defaults::slots(),
            sidebar_prefix: defaults::sidebar_prefix(),
            sidebar_marker: defaults::sidebar_marker(),
            categories: defaults::categories(),
            default_category: defaults::default_category(),
        }
    }
}

/// Mapping from URL keyword to category label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryRule {
    /// Substring to look for in the (lowercased) article URL
    pub keyword: String,

    /// Label shown on the sidebar card
    pub label: String,
}

/// Sitemap entry defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapConfig {
    #[serde(default = "defaults::changefreq")]
    pub changefreq: String,

    #[serde(default = "defaults::priority")]
    pub priority: String,

    /// Non-article pages listed first on a full rebuild
    #[serde(default = "defaults::pages")]
    pub pages: Vec<SitemapPage>,

    /// `lastmod` for pages other than the homepage on a full rebuild
    #[serde(default = "defaults::pages_lastmod")]
    pub pages_lastmod: String,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            changefreq: defaults::changefreq(),
            priority: defaults::priority(),
            pages: defaults::pages(),
            pages_lastmod: defaults::pages_lastmod(),
        }
    }
}

/// A main site page for the sitemap rebuild.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SitemapPage {
    /// Path from the site root, `/` for the homepage
    pub path: String,
    pub changefreq: String,
    pub priority: String,
}

/// Run lock behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// A lock older than this is considered abandoned
    #[serde(default = "defaults::stale_after_secs")]
    pub stale_after_secs: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: defaults::stale_after_secs(),
        }
    }
}

mod defaults {
    use super::{CategoryRule, SitemapPage};

    // Site defaults
    pub fn base_url() -> String {
        "https://www.eplnewshub.com".into()
    }
    pub fn site_name() -> String {
        "EPL News Hub".into()
    }
    pub fn twitter_handle() -> String {
        String::new()
    }

    // Path defaults
    pub fn scheduled_dir() -> String {
        "scheduled-articles".into()
    }
    pub fn articles_dir() -> String {
        "articles".into()
    }
    pub fn homepage_dir() -> String {
        ".".into()
    }
    pub fn sitemap_file() -> String {
        "sitemap.xml".into()
    }
    pub fn credentials_file() -> String {
        "google-service-account.json".into()
    }
    pub fn lock_file() -> String {
        ".publish.lock".into()
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; EPLNewsHubPublisher/0.1)".into()
    }
    pub fn timeout() -> u64 {
        10
    }

    // Indexing defaults
    pub fn google_publish_url() -> String {
        "https://indexing.googleapis.com/v3/urlNotifications:publish".into()
    }
    pub fn google_indexing_scope() -> String {
        "https://www.googleapis.com/auth/indexing".into()
    }
    pub fn search_console_url() -> String {
        "https://www.googleapis.com/webmasters/v3".into()
    }
    pub fn search_console_scope() -> String {
        "https://www.googleapis.com/auth/webmasters".into()
    }
    pub fn indexnow_url() -> String {
        "https://api.indexnow.org/indexnow".into()
    }
    pub fn indexnow_key_env() -> String {
        "INDEXNOW_KEY".into()
    }
    pub fn ping_endpoints() -> Vec<String> {
        vec![
            "https://www.google.com/ping".into(),
            "https://www.bing.com/ping".into(),
        ]
    }
    pub fn recent_url_count() -> usize {
        10
    }

    // Homepage defaults
    pub fn slots() -> Vec<String> {
        let mut slots = vec![
            "main_headline".to_string(),
            "main_subheadline1".to_string(),
            "main_subheadline2".to_string(),
            "main_subheadline3".to_string(),
        ];
        slots.extend((1..=12).map(|i| format!("headline{i}")));
        slots
    }
    pub fn sidebar_prefix() -> String {
        "main_subheadline".into()
    }
    pub fn sidebar_marker() -> String {
        "sidebar-story-card".into()
    }
    pub fn default_category() -> String {
        "PREMIER LEAGUE".into()
    }
    pub fn categories() -> Vec<CategoryRule> {
        [
            ("transfer", "TRANSFERS"),
            ("fpl", "FPL"),
            ("fantasy", "FPL"),
            ("injur", "INJURY NEWS"),
            ("preview", "MATCH PREVIEW"),
            ("prediction", "PREDICTIONS"),
            ("match-report", "MATCH REPORT"),
            ("-vs-", "MATCH REPORT"),
            ("tactical", "ANALYSIS"),
            ("analysis", "ANALYSIS"),
            ("manager", "MANAGERS"),
            ("champions-league", "CHAMPIONS LEAGUE"),
            ("world-cup", "INTERNATIONAL"),
        ]
        .into_iter()
        .map(|(keyword, label)| CategoryRule {
            keyword: keyword.to_string(),
            label: label.to_string(),
        })
        .collect()
    }

    // Sitemap defaults
    pub fn changefreq() -> String {
        "monthly".into()
    }
    pub fn priority() -> String {
        "0.6".into()
    }
    pub fn pages_lastmod() -> String {
        "2026-02-16".into()
    }
    pub fn pages() -> Vec<SitemapPage> {
        [
            ("/", "hourly", "1.0"),
            ("/news.html", "daily", "0.9"),
            ("/transfer-center.html", "daily", "0.9"),
            ("/stats.html", "daily", "0.9"),
            ("/articles.html", "daily", "0.8"),
            ("/epl-table.html", "daily", "0.8"),
            ("/epl_fixtures.html", "daily", "0.8"),
            ("/fpl.html", "daily", "0.9"),
            ("/fpl-ai-assistant.html", "daily", "0.9"),
            ("/membership.html", "monthly", "0.8"),
            ("/private_policy.html", "monthly", "0.3"),
            ("/terms.html", "monthly", "0.3"),
        ]
        .into_iter()
        .map(|(path, changefreq, priority)| SitemapPage {
            path: path.to_string(),
            changefreq: changefreq.to_string(),
            priority: priority.to_string(),
        })
        .collect()
    }

    // Lock defaults
    pub fn stale_after_secs() -> u64 {
        3600
    }
}
