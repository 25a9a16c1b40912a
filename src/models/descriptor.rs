//! Scheduled article descriptors.

use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;

use crate::error::DescriptorError;

static DESCRIPTOR_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})-.+\.json$").expect("descriptor pattern is valid")
});

/// A descriptor file found in the scheduled area, not yet read.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScheduledEntry {
    /// File name, e.g. `2024-01-01-title-race.json`
    pub file_name: String,

    /// Release gate taken from the file name
    pub release_date: NaiveDate,
}

impl ScheduledEntry {
    /// Recognise a descriptor file name (`YYYY-MM-DD-<slug>.json`).
    ///
    /// Anything else, including impossible calendar dates, is `None`.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let caps = DESCRIPTOR_NAME.captures(file_name)?;
        let release_date = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()?;
        Some(Self {
            file_name: file_name.to_string(),
            release_date,
        })
    }

    /// Whether the release date has arrived.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.release_date <= today
    }
}

/// Wire shape of a descriptor file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDescriptor {
    article_file: Option<String>,
    headline_html: Option<String>,
}

/// A validated descriptor, ready for the publish steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledArticleDescriptor {
    /// Descriptor file name
    pub file_name: String,

    pub release_date: NaiveDate,

    /// Staged article HTML, a plain file name
    pub article_file: String,

    /// Fragment placed in the top homepage slot
    pub headline_html: String,
}

impl ScheduledArticleDescriptor {
    /// Parse and validate descriptor JSON.
    pub fn parse(entry: &ScheduledEntry, json: &str) -> Result<Self, DescriptorError> {
        let raw: RawDescriptor = serde_json::from_str(json)?;

        let article_file = raw
            .article_file
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(DescriptorError::MissingField("articleFile"))?;
        let headline_html = raw
            .headline_html
            .filter(|s| !s.trim().is_empty())
            .ok_or(DescriptorError::MissingField("headlineHtml"))?;

        if !is_plain_file_name(&article_file) {
            return Err(DescriptorError::InvalidArticleFile(article_file));
        }

        Ok(Self {
            file_name: entry.file_name.clone(),
            release_date: entry.release_date,
            article_file,
            headline_html,
        })
    }
}

/// A single path component that cannot escape its directory.
fn is_plain_file_name(name: &str) -> bool {
    !name.contains(['/', '\\'])
        && name != "."
        && name != ".."
        && Path::new(name).file_name().is_some_and(|n| n == name)
}
