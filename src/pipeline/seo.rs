//! Social/SEO meta injection for newly published articles.

use std::sync::LazyLock;

use chrono::NaiveDate;
use html_escape::encode_double_quoted_attribute as attr;
use scraper::{Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{Config, SiteConfig};
use crate::storage::SiteState;

static TITLE: LazyLock<Selector> = LazyLock::new(|| sel("title"));
static H1: LazyLock<Selector> = LazyLock::new(|| sel("h1"));
static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| sel(r#"meta[name="description"][content]"#));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| sel("p"));
static IMAGE: LazyLock<Selector> = LazyLock::new(|| sel("img[src]"));

fn sel(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

const DESCRIPTION_LIMIT: usize = 160;

/// Page facts the meta tags are built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleMeta {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub image_alt: String,
}

/// Whether the page already carries canonical/Open Graph/JSON-LD markup.
pub fn has_social_meta(html: &str) -> bool {
    html.contains("rel=\"canonical\"")
        || html.contains("og:type")
        || html.contains("application/ld+json")
}

/// Pull title, description and lead image out of an article page.
pub fn extract_meta(html: &str, site_name: &str) -> ArticleMeta {
    let document = Html::parse_document(html);
    let text = |el: scraper::ElementRef<'_>| {
        el.text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    };

    let suffix = format!(" | {site_name}");
    let title = document
        .select(&TITLE)
        .next()
        .map(text)
        .map(|t| t.replace(&suffix, "").trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| document.select(&H1).next().map(text))
        .unwrap_or_default();

    let description = document
        .select(&DESCRIPTION)
        .find_map(|m| m.value().attr("content"))
        .map(str::to_string)
        .or_else(|| {
            document
                .select(&PARAGRAPH)
                .map(text)
                .find(|t| !t.is_empty())
                .map(|t| truncate(&t, DESCRIPTION_LIMIT))
        })
        .unwrap_or_default();

    let image_el = document.select(&IMAGE).next();
    let image = image_el.and_then(|img| img.value().attr("src")).map(str::to_string);
    let image_alt = image_el
        .and_then(|img| img.value().attr("alt"))
        .filter(|a| !a.trim().is_empty())
        .map_or_else(|| title.clone(), str::to_string);

    ArticleMeta {
        title,
        description,
        image,
        image_alt,
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{cut}...")
}

/// Render the meta block inserted before `</head>`.
pub fn render_meta_tags(
    meta: &ArticleMeta,
    site: &SiteConfig,
    article_url: &str,
    published: NaiveDate,
) -> String {
    let image = meta.image.as_deref().and_then(|src| {
        Url::parse(article_url)
            .and_then(|base| base.join(src))
            .map(|u| u.to_string())
            .ok()
    });
    let published = format!("{}T10:00:00+00:00", published.format("%Y-%m-%d"));

    let mut tags = vec![
        "    <!-- Canonical URL -->".to_string(),
        format!("    <link rel=\"canonical\" href=\"{}\">", attr(article_url)),
        String::new(),
        "    <!-- Open Graph Meta Tags -->".to_string(),
        "    <meta property=\"og:type\" content=\"article\">".to_string(),
        format!("    <meta property=\"og:site_name\" content=\"{}\">", attr(&site.site_name)),
        format!("    <meta property=\"og:title\" content=\"{}\">", attr(&meta.title)),
        format!(
            "    <meta property=\"og:description\" content=\"{}\">",
            attr(&meta.description)
        ),
        format!("    <meta property=\"og:url\" content=\"{}\">", attr(article_url)),
    ];
    if let Some(image) = &image {
        tags.push(format!("    <meta property=\"og:image\" content=\"{}\">", attr(image)));
        tags.push(format!(
            "    <meta property=\"og:image:alt\" content=\"{}\">",
            attr(&meta.image_alt)
        ));
    }
    tags.push(format!(
        "    <meta property=\"article:published_time\" content=\"{published}\">"
    ));
    tags.push(format!(
        "    <meta property=\"article:author\" content=\"{}\">",
        attr(&site.site_name)
    ));

    tags.push(String::new());
    tags.push("    <!-- Twitter Card Meta Tags -->".to_string());
    tags.push("    <meta name=\"twitter:card\" content=\"summary_large_image\">".to_string());
    if !site.twitter_handle.is_empty() {
        tags.push(format!(
            "    <meta name=\"twitter:site\" content=\"{}\">",
            attr(&site.twitter_handle)
        ));
    }
    tags.push(format!("    <meta name=\"twitter:title\" content=\"{}\">", attr(&meta.title)));
    tags.push(format!(
        "    <meta name=\"twitter:description\" content=\"{}\">",
        attr(&meta.description)
    ));
    if let Some(image) = &image {
        tags.push(format!("    <meta name=\"twitter:image\" content=\"{}\">", attr(image)));
    }

    let mut block = tags.join("\n");
    block.push('\n');
    block
}

/// Insert `block` before the first `</head>` (case-insensitive).
fn insert_before_head_close(html: &str, block: &str) -> Option<String> {
    let at = html.to_ascii_lowercase().find("</head>")?;
    let mut out = String::with_capacity(html.len() + block.len());
    out.push_str(&html[..at]);
    out.push_str(block);
    out.push_str(&html[at..]);
    Some(out)
}

/// Add social meta tags to a live article that lacks them.
///
/// Returns whether the article was rewritten.
pub async fn apply_seo(
    site: &dyn SiteState,
    config: &Config,
    article_file: &str,
    published: NaiveDate,
) -> Result<bool> {
    let Some(html) = site.read_article(article_file).await? else {
        log::warn!("[seo] {article_file} not found in articles, skipping");
        return Ok(false);
    };
    if has_social_meta(&html) {
        log::debug!("[seo] {article_file} already has social meta");
        return Ok(false);
    }

    let article_url = config.site.article_url(article_file);
    let meta = extract_meta(&html, &config.site.site_name);
    let block = render_meta_tags(&meta, &config.site, &article_url, published);

    let Some(updated) = insert_before_head_close(&html, &block) else {
        log::warn!("[seo] {article_file} has no </head>, skipping");
        return Ok(false);
    };
    site.write_article(article_file, &updated).await?;
    log::info!("[seo] Added social meta to {article_file}");
    Ok(true)
}
