//! Run reports for publishing and indexing.

use std::fmt;

/// What a single indexing channel did for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    /// The endpoint accepted the request
    Submitted { status: u16 },
    /// Channel not configured (no credentials, no key)
    Skipped { reason: String },
    /// Request failed or was rejected
    Failed { error: String },
}

impl fmt::Display for ChannelOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitted { status } => write!(f, "submitted (HTTP {status})"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
            Self::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Outcome of one channel, labelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReport {
    pub channel: String,
    pub outcome: ChannelOutcome,
}

/// Per-channel results of notifying search engines about one URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexingReport {
    pub url: String,
    pub channels: Vec<ChannelReport>,
}

impl IndexingReport {
    pub fn submitted(&self) -> usize {
        self.count(|o| matches!(o, ChannelOutcome::Submitted { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ChannelOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ChannelOutcome::Failed { .. }))
    }

    /// Outcome for a named channel, if it ran.
    pub fn outcome(&self, channel: &str) -> Option<&ChannelOutcome> {
        self.channels
            .iter()
            .find(|c| c.channel == channel)
            .map(|c| &c.outcome)
    }

    fn count(&self, pred: impl Fn(&ChannelOutcome) -> bool) -> usize {
        self.channels.iter().filter(|c| pred(&c.outcome)).count()
    }
}

/// What happened to the staged article file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// Staged file absent; assumed moved by an earlier run
    AlreadyMoved,
}

/// What happened to the sitemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapUpdate {
    Appended,
    /// URL already listed
    AlreadyPresent,
    /// No sitemap file on disk
    Missing,
}

/// A publish step that failed for one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepError {
    pub step: &'static str,
    pub error: String,
}

/// One article whose publish steps were all attempted.
///
/// A step that failed leaves its field at `None`/`0` and adds a
/// [`StepError`].
#[derive(Debug, Clone)]
pub struct PublishedArticle {
    pub descriptor: String,
    pub article_url: String,
    pub moved: Option<MoveOutcome>,
    pub slots_written: usize,
    pub sitemap: Option<SitemapUpdate>,
    pub seo_injected: bool,
    pub indexing: IndexingReport,
    pub errors: Vec<StepError>,
}

impl PublishedArticle {
    /// True when every step succeeded.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A descriptor that could not be published.
#[derive(Debug, Clone)]
pub struct PublishFailure {
    pub descriptor: String,
    pub error: String,
}

/// Summary of a publish run.
#[derive(Debug, Clone, Default)]
pub struct PublishReport {
    pub published: Vec<PublishedArticle>,
    pub failures: Vec<PublishFailure>,
    /// Descriptors present but scheduled for a later date
    pub pending: usize,
}

impl PublishReport {
    /// True when no descriptor failed and no step failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.published.iter().all(PublishedArticle::is_complete)
    }

    /// True when nothing was due.
    pub fn is_empty(&self) -> bool {
        self.published.is_empty() && self.failures.is_empty()
    }
}
