// src/models/mod.rs

//! Domain models for the publisher.
//!
//! Configuration, scheduled descriptors, sitemap entries and run reports.

mod config;
mod descriptor;
mod report;
mod sitemap;

// Re-export all public types
pub use config::{
    CategoryRule, Config, HomepageConfig, HttpConfig, IndexingConfig, LockConfig, PathsConfig,
    SiteConfig, SitemapConfig, SitemapPage,
};
pub use descriptor::{ScheduledArticleDescriptor, ScheduledEntry};
pub use report::{
    ChannelOutcome, ChannelReport, IndexingReport, MoveOutcome, PublishFailure, PublishReport,
    PublishedArticle, SitemapUpdate, StepError,
};
pub use sitemap::SitemapEntry;
