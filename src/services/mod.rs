//! Outbound search-engine notification.
//!
//! Every external indexer is an [`IndexingChannel`]. The
//! [`IndexingNotifier`] runs a set of channels concurrently for one URL and
//! settles each independently:
//! - Google Indexing API and Search Console (`GoogleIndexing`, `SearchConsole`)
//! - IndexNow (`IndexNow`)
//! - Sitemap ping endpoints (`SitemapPing`)

mod google;
mod indexnow;
pub(crate) mod notifier;
mod ping;

pub use google::{GoogleIndexing, SearchConsole, ServiceAccount};
pub use indexnow::IndexNow;
pub use notifier::{IndexingChannel, IndexingNotifier};
pub use ping::SitemapPing;
