//! Sidebar card restyling.
//!
//! Headline fragments are authored for the wide top slot. When one drops
//! into a `main_subheadline*` slot it is rebuilt with the compact sidebar
//! card markup. Fragments that already carry the marker class are left
//! alone, which makes the transform idempotent.

use std::borrow::Cow;
use std::sync::LazyLock;

use html_escape::{encode_double_quoted_attribute, encode_text};
use scraper::{ElementRef, Html, Selector};

use crate::models::{CategoryRule, HomepageConfig};

static LINK: LazyLock<Selector> = LazyLock::new(|| sel("a[href]"));
static IMAGE: LazyLock<Selector> = LazyLock::new(|| sel("img[src]"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| sel("h1, h2, h3"));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| sel("p"));
static TIME: LazyLock<Selector> = LazyLock::new(|| sel("time"));
static CLASSED: LazyLock<Selector> = LazyLock::new(|| sel("[class]"));

fn sel(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Sidebar layout rules, built from the homepage config.
#[derive(Debug, Clone)]
pub struct SidebarStyle {
    prefix: String,
    marker: String,
    categories: Vec<CategoryRule>,
    default_category: String,
}

/// Pieces of a story card pulled out of an arbitrary fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StoryCard {
    href: String,
    image_src: String,
    image_alt: String,
    title: String,
    excerpt: Option<String>,
    time: Option<CardTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CardTime {
    datetime: Option<String>,
    text: String,
}

impl SidebarStyle {
    pub fn from_config(config: &HomepageConfig) -> Self {
        Self {
            prefix: config.sidebar_prefix.clone(),
            marker: config.sidebar_marker.clone(),
            categories: config.categories.clone(),
            default_category: config.default_category.clone(),
        }
    }

    /// Whether content landing in `slot` must use the sidebar layout.
    pub fn is_sidebar_slot(&self, slot: &str) -> bool {
        !self.prefix.is_empty() && slot.starts_with(&self.prefix)
    }

    /// Whether the fragment already uses the sidebar card markup.
    pub fn is_styled(&self, html: &str) -> bool {
        let fragment = Html::parse_fragment(html);
        fragment
            .select(&CLASSED)
            .any(|el| el.value().classes().any(|c| c == self.marker))
    }

    /// Category label for an article URL, first keyword match wins.
    pub fn category_for(&self, href: &str) -> &str {
        let href = href.to_lowercase();
        self.categories
            .iter()
            .find(|rule| href.contains(&rule.keyword.to_lowercase()))
            .map_or(self.default_category.as_str(), |rule| rule.label.as_str())
    }

    /// Rebuild `html` as a sidebar card.
    ///
    /// Returns the input unchanged when it is already styled or lacks a
    /// link, an image or a heading.
    pub fn restyle<'a>(&self, html: &'a str) -> Cow<'a, str> {
        if self.is_styled(html) {
            return Cow::Borrowed(html);
        }
        match extract_card(html) {
            Some(card) => Cow::Owned(self.render(&card)),
            None => {
                log::debug!("[cascade] Fragment lacks link/image/heading, kept as-is");
                Cow::Borrowed(html)
            }
        }
    }

    /// Content as it should be written into `slot`.
    pub fn restyle_for<'a>(&self, slot: &str, html: &'a str) -> Cow<'a, str> {
        if self.is_sidebar_slot(slot) {
            self.restyle(html)
        } else {
            Cow::Borrowed(html)
        }
    }

    fn render(&self, card: &StoryCard) -> String {
        let category = self.category_for(&card.href);
        let mut out = String::new();
        out.push_str(&format!(
            "<a href=\"{}\" class=\"{}\" aria-label=\"Read full article: {}\">\n",
            encode_double_quoted_attribute(&card.href),
            encode_double_quoted_attribute(&self.marker),
            encode_double_quoted_attribute(&card.title),
        ));
        out.push_str(&format!(
            "    <img src=\"{}\" alt=\"{}\" loading=\"lazy\">\n",
            encode_double_quoted_attribute(&card.image_src),
            encode_double_quoted_attribute(&card.image_alt),
        ));
        out.push_str("    <div class=\"sidebar-story-body\">\n");
        out.push_str(&format!(
            "        <span class=\"sidebar-story-category\">{}</span>\n",
            encode_text(category)
        ));
        out.push_str(&format!(
            "        <h3 class=\"sidebar-story-title\">{}</h3>\n",
            encode_text(&card.title)
        ));
        if let Some(excerpt) = &card.excerpt {
            out.push_str(&format!(
                "        <p class=\"sidebar-story-excerpt\">{}</p>\n",
                encode_text(excerpt)
            ));
        }
        if let Some(time) = &card.time {
            match &time.datetime {
                Some(dt) => out.push_str(&format!(
                    "        <time datetime=\"{}\">{}</time>\n",
                    encode_double_quoted_attribute(dt),
                    encode_text(&time.text)
                )),
                None => out.push_str(&format!(
                    "        <time>{}</time>\n",
                    encode_text(&time.text)
                )),
            }
        }
        out.push_str("    </div>\n</a>\n");
        out
    }
}

fn extract_card(html: &str) -> Option<StoryCard> {
    let fragment = Html::parse_fragment(html);

    let href = fragment
        .select(&LINK)
        .find_map(|a| a.value().attr("href").map(str::trim).filter(|h| !h.is_empty()))?
        .to_string();
    let image = fragment.select(&IMAGE).find(|img| {
        img.value()
            .attr("src")
            .is_some_and(|src| !src.trim().is_empty())
    })?;
    let title = fragment
        .select(&HEADING)
        .map(text_of)
        .find(|t| !t.is_empty())?;

    let image_src = image.value().attr("src").unwrap_or_default().trim().to_string();
    let image_alt = image
        .value()
        .attr("alt")
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map_or_else(|| title.clone(), str::to_string);
    let excerpt = fragment
        .select(&PARAGRAPH)
        .map(text_of)
        .find(|t| !t.is_empty());
    let time = fragment.select(&TIME).next().map(|el| CardTime {
        datetime: el.value().attr("datetime").map(str::to_string),
        text: text_of(el),
    });

    Some(StoryCard {
        href,
        image_src,
        image_alt,
        title,
        excerpt,
        time,
    })
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
