//! Local filesystem site state.
//!
//! All writes go through a temp file and a rename, so a crash never leaves
//! a half-written slot, article or sitemap behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{MoveOutcome, PathsConfig};
use crate::pipeline::cascade::{SlotSnapshot, SlotWrite};
use crate::storage::SiteState;

/// Site rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct LocalSite {
    root_dir: PathBuf,
    scheduled_dir: PathBuf,
    articles_dir: PathBuf,
    homepage_dir: PathBuf,
    sitemap_path: PathBuf,
}

impl LocalSite {
    /// Create a site rooted at `root_dir`, laid out per `paths`.
    pub fn new(root_dir: impl Into<PathBuf>, paths: &PathsConfig) -> Self {
        let root_dir = root_dir.into();
        Self {
            scheduled_dir: PathsConfig::resolve(&root_dir, &paths.scheduled_dir),
            articles_dir: PathsConfig::resolve(&root_dir, &paths.articles_dir),
            homepage_dir: PathsConfig::resolve(&root_dir, &paths.homepage_dir),
            sitemap_path: PathsConfig::resolve(&root_dir, &paths.sitemap_file),
            root_dir,
        }
    }

    /// Path of a homepage slot file.
    pub fn slot_path(&self, slot: &str) -> PathBuf {
        self.homepage_dir.join(format!("{slot}.html"))
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
        Self::ensure_dir(path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read a UTF-8 file, returning None if it doesn't exist.
    async fn read_optional(path: &Path) -> Result<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Sorted file names in a directory; a missing directory is empty.
    async fn list_files(dir: &Path) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl SiteState for LocalSite {
    async fn list_scheduled(&self) -> Result<Vec<String>> {
        Self::list_files(&self.scheduled_dir).await
    }

    async fn read_descriptor(&self, file_name: &str) -> Result<String> {
        Ok(tokio::fs::read_to_string(self.scheduled_dir.join(file_name)).await?)
    }

    async fn remove_descriptor(&self, file_name: &str) -> Result<()> {
        tokio::fs::remove_file(self.scheduled_dir.join(file_name)).await?;
        Ok(())
    }

    async fn move_staged_article(&self, article_file: &str) -> Result<MoveOutcome> {
        let from = self.scheduled_dir.join(article_file);
        let to = self.articles_dir.join(article_file);

        if !tokio::fs::try_exists(&from).await? {
            return Ok(MoveOutcome::AlreadyMoved);
        }
        tokio::fs::create_dir_all(&self.articles_dir).await?;

        match tokio::fs::rename(&from, &to).await {
            Ok(()) => Ok(MoveOutcome::Moved),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(MoveOutcome::AlreadyMoved),
            Err(e) => {
                // Different filesystems: fall back to copy + delete.
                log::debug!("[move] rename failed ({e}), copying {}", from.display());
                tokio::fs::copy(&from, &to).await?;
                tokio::fs::remove_file(&from).await?;
                Ok(MoveOutcome::Moved)
            }
        }
    }

    async fn read_article(&self, article_file: &str) -> Result<Option<String>> {
        Self::read_optional(&self.articles_dir.join(article_file)).await
    }

    async fn write_article(&self, article_file: &str, html: &str) -> Result<()> {
        Self::write_atomic(&self.articles_dir.join(article_file), html.as_bytes()).await
    }

    async fn list_articles(&self) -> Result<Vec<String>> {
        let mut names = Self::list_files(&self.articles_dir).await?;
        names.retain(|n| n.ends_with(".html"));
        Ok(names)
    }

    async fn snapshot_slots(&self, slots: &[String]) -> Result<SlotSnapshot> {
        let mut contents = Vec::with_capacity(slots.len());
        for slot in slots {
            let content = Self::read_optional(&self.slot_path(slot)).await?;
            contents.push((slot.clone(), content));
        }
        Ok(SlotSnapshot::new(contents))
    }

    async fn apply_slot_writes(&self, writes: &[SlotWrite]) -> Result<()> {
        for write in writes {
            Self::write_atomic(&self.slot_path(&write.slot), write.content.as_bytes()).await?;
        }
        Ok(())
    }

    async fn read_sitemap(&self) -> Result<Option<String>> {
        Self::read_optional(&self.sitemap_path).await
    }

    async fn write_sitemap(&self, xml: &str) -> Result<()> {
        Self::write_atomic(&self.sitemap_path, xml.as_bytes()).await
    }

    async fn page_exists(&self, page_path: &str) -> bool {
        let relative = page_path.trim_start_matches('/');
        if relative.is_empty() {
            return true;
        }
        tokio::fs::try_exists(self.root_dir.join(relative))
            .await
            .unwrap_or(false)
    }
}
