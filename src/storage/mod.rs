//! Site state abstractions.
//!
//! Everything the publisher mutates lives on disk under the site root:
//!
//! ```text
//! {root}/
//! ├── scheduled-articles/       # Descriptors + staged article files
//! │   ├── 2024-01-01-slug.json
//! │   └── slug.html
//! ├── articles/                 # Live articles
//! ├── main_headline.html        # Homepage slots, cascade order
//! ├── main_subheadline{1..3}.html
//! ├── headline{1..12}.html
//! ├── sitemap.xml
//! └── .publish.lock             # Held for the duration of a run
//! ```
//!
//! Pipeline code never touches paths directly; it goes through
//! [`SiteState`] so the cascade can be expressed as a snapshot plus a list
//! of writes.

pub mod local;
pub mod lock;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::MoveOutcome;
use crate::pipeline::cascade::{SlotSnapshot, SlotWrite};

// Re-export for convenience
pub use local::LocalSite;
pub use lock::RunLock;

/// Read/write access to the site's files.
#[async_trait]
pub trait SiteState: Send + Sync {
    /// File names in the scheduled area. A missing area is empty.
    async fn list_scheduled(&self) -> Result<Vec<String>>;

    /// Raw contents of a descriptor file.
    async fn read_descriptor(&self, file_name: &str) -> Result<String>;

    /// Delete a descriptor once its article is published.
    async fn remove_descriptor(&self, file_name: &str) -> Result<()>;

    /// Move a staged article into the live articles area.
    async fn move_staged_article(&self, article_file: &str) -> Result<MoveOutcome>;

    /// Live article HTML, `None` if absent.
    async fn read_article(&self, article_file: &str) -> Result<Option<String>>;

    /// Replace live article HTML.
    async fn write_article(&self, article_file: &str, html: &str) -> Result<()>;

    /// Live article file names, sorted.
    async fn list_articles(&self) -> Result<Vec<String>>;

    /// Read every slot before anything is written.
    async fn snapshot_slots(&self, slots: &[String]) -> Result<SlotSnapshot>;

    /// Apply cascade writes in order.
    async fn apply_slot_writes(&self, writes: &[SlotWrite]) -> Result<()>;

    /// Sitemap XML, `None` if the file does not exist.
    async fn read_sitemap(&self) -> Result<Option<String>>;

    /// Replace the sitemap.
    async fn write_sitemap(&self, xml: &str) -> Result<()>;

    /// Whether a site page exists (path relative to the root, leading `/` allowed).
    async fn page_exists(&self, page_path: &str) -> bool;
}
