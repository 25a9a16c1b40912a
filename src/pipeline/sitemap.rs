// src/pipeline/sitemap.rs

//! Sitemap maintenance.
//!
//! - [`update_sitemap`]: append one article entry before `</urlset>`
//! - [`rebuild_sitemap`]: regenerate the whole document from disk
//! - [`recent_article_urls`]: trailing article URLs, for batch submission

use chrono::NaiveDate;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{AppError, Result};
use crate::models::{Config, SitemapEntry, SitemapUpdate};
use crate::storage::SiteState;
use crate::utils::article_date_from_name;

const URLSET_CLOSE: &str = "</urlset>";
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Every `<loc>` value in document order.
///
/// Fails if the document is not well-formed XML.
pub fn parse_locs(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut locs = Vec::new();
    let mut depth = 0usize;
    let mut current: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                if e.local_name().as_ref() == b"loc" {
                    current = Some(String::new());
                }
            }
            Event::End(e) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| AppError::sitemap("unbalanced closing tag"))?;
                if e.local_name().as_ref() == b"loc" {
                    if let Some(loc) = current.take() {
                        locs.push(loc.trim().to_string());
                    }
                }
            }
            Event::Text(t) => {
                if let Some(loc) = current.as_mut() {
                    loc.push_str(&t.unescape()?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(AppError::sitemap(format!("{depth} element(s) left open")));
    }
    Ok(locs)
}

/// Insert `entry` before the closing `</urlset>`.
///
/// Returns `None` when an entry with the same `<loc>` already exists. A
/// document the XML reader rejects (a bare `&` in a legacy entry, say) is
/// still extended; duplicates are then found by matching the rendered
/// `<loc>` element.
pub fn insert_entry(xml: &str, entry: &SitemapEntry) -> Result<Option<String>> {
    let listed = match parse_locs(xml) {
        Ok(locs) => locs.iter().any(|loc| loc == &entry.loc),
        Err(e) => {
            log::warn!("[sitemap] Sitemap is not well-formed ({e}), inserting as text");
            xml.contains(&format!("<loc>{}</loc>", escape(entry.loc.as_str())))
        }
    };
    if listed {
        return Ok(None);
    }

    let close = xml
        .rfind(URLSET_CLOSE)
        .ok_or_else(|| AppError::sitemap("no closing </urlset> tag"))?;
    let (head, tail) = xml.split_at(close);

    let mut out = String::with_capacity(xml.len() + 200);
    out.push_str(head.trim_end_matches([' ', '\t']));
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&entry.to_fragment("  "));
    out.push_str(tail);
    Ok(Some(out))
}

/// Add a newly published article to the sitemap.
///
/// A missing sitemap is not an error: the update is skipped.
pub async fn update_sitemap(
    site: &dyn SiteState,
    config: &Config,
    article_file: &str,
    today: NaiveDate,
) -> Result<SitemapUpdate> {
    let Some(xml) = site.read_sitemap().await? else {
        log::info!("[sitemap] No sitemap file, skipping");
        return Ok(SitemapUpdate::Missing);
    };

    let entry = SitemapEntry::new(
        config.site.article_url(article_file),
        today,
        &config.sitemap.changefreq,
        &config.sitemap.priority,
    );

    match insert_entry(&xml, &entry)? {
        Some(updated) => {
            site.write_sitemap(&updated).await?;
            log::info!("[sitemap] Added {}", entry.loc);
            Ok(SitemapUpdate::Appended)
        }
        None => {
            log::info!("[sitemap] {} already listed", entry.loc);
            Ok(SitemapUpdate::AlreadyPresent)
        }
    }
}

/// Counts from a full rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildSummary {
    pub pages: usize,
    pub articles: usize,
}

impl RebuildSummary {
    pub fn total(&self) -> usize {
        self.pages + self.articles
    }
}

/// Regenerate the sitemap from the configured pages and the articles on disk.
pub async fn rebuild_sitemap(
    site: &dyn SiteState,
    config: &Config,
    today: NaiveDate,
) -> Result<RebuildSummary> {
    let origin = config.site.origin();
    let today_str = today.format("%Y-%m-%d").to_string();

    let mut pages = Vec::new();
    for page in &config.sitemap.pages {
        if !site.page_exists(&page.path).await {
            log::debug!("[rebuild] Page {} not on disk, left out", page.path);
            continue;
        }
        let lastmod = if page.path == "/" {
            today_str.clone()
        } else {
            config.sitemap.pages_lastmod.clone()
        };
        pages.push(SitemapEntry {
            loc: format!("{origin}{}", page.path),
            lastmod,
            changefreq: page.changefreq.clone(),
            priority: page.priority.clone(),
        });
    }

    let articles: Vec<SitemapEntry> = site
        .list_articles()
        .await?
        .iter()
        .map(|file| {
            SitemapEntry::new(
                config.site.article_url(file),
                article_date_from_name(file).unwrap_or(today),
                &config.sitemap.changefreq,
                &config.sitemap.priority,
            )
        })
        .collect();

    let xml = render_sitemap(&pages, &articles)?;
    site.write_sitemap(&xml).await?;

    let summary = RebuildSummary {
        pages: pages.len(),
        articles: articles.len(),
    };
    log::info!(
        "[rebuild] Sitemap rebuilt: {} pages, {} articles, {} URLs",
        summary.pages,
        summary.articles,
        summary.total()
    );
    Ok(summary)
}

/// Serialize page and article entries as a complete sitemap document.
pub fn render_sitemap(pages: &[SitemapEntry], articles: &[SitemapEntry]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NS)]),
    ))?;

    writer.write_event(Event::Comment(BytesText::new(" Main Pages ")))?;
    for entry in pages {
        write_url(&mut writer, entry)?;
    }
    writer.write_event(Event::Comment(BytesText::new(" Articles ")))?;
    for entry in articles {
        write_url(&mut writer, entry)?;
    }

    writer.write_event(Event::End(BytesEnd::new("urlset")))?;

    let mut xml = String::from_utf8(writer.into_inner())
        .map_err(|e| AppError::sitemap(format!("rendered sitemap is not UTF-8: {e}")))?;
    xml.push('\n');
    Ok(xml)
}

fn write_url(writer: &mut Writer<Vec<u8>>, entry: &SitemapEntry) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("url")))?;
    write_text_element(writer, "loc", &entry.loc)?;
    write_text_element(writer, "lastmod", &entry.lastmod)?;
    write_text_element(writer, "changefreq", &entry.changefreq)?;
    write_text_element(writer, "priority", &entry.priority)?;
    writer.write_event(Event::End(BytesEnd::new("url")))?;
    Ok(())
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// The last `count` article URLs in the sitemap, oldest first.
pub fn recent_article_urls(xml: &str, origin: &str, count: usize) -> Result<Vec<String>> {
    let prefix = format!("{}/articles/", origin.trim_end_matches('/'));
    let articles: Vec<String> = parse_locs(xml)?
        .into_iter()
        .filter(|loc| loc.starts_with(&prefix))
        .collect();
    let skip = articles.len().saturating_sub(count);
    Ok(articles.into_iter().skip(skip).collect())
}
