//! Publishing pipeline.
//!
//! - `scan`: find due descriptors
//! - `publish`: run each descriptor through move, SEO, cascade, sitemap, indexing
//! - `cascade` / `sidebar`: homepage slot shift and sidebar card restyle
//! - `sitemap`: incremental insert and full rebuild
//! - `submit`: daily sitemap submission

pub mod cascade;
pub mod publish;
pub mod scan;
pub mod seo;
pub mod sidebar;
pub mod sitemap;
pub mod submit;

pub use cascade::{plan_cascade, run_cascade, SlotSnapshot, SlotWrite};
pub use publish::Publisher;
pub use scan::{scan_due, ScanResult};
pub use sitemap::{rebuild_sitemap, update_sitemap, RebuildSummary};
pub use submit::submit_sitemap;
