//! Exclusive run lock.
//!
//! Two overlapping publish runs would each snapshot the homepage slots and
//! then write, losing one cascade. The lock file is created with
//! `create_new`, so only one run can hold it; it is removed on drop.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

/// Held for the lifetime of a run.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Take the lock, replacing it if it is older than `stale_after`.
    pub async fn acquire(path: impl Into<PathBuf>, stale_after: Duration) -> Result<Self> {
        let path = path.into();
        match Self::create(&path).await {
            Ok(lock) => Ok(lock),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let age = Self::age(&path).await?;
                if age < stale_after {
                    return Err(AppError::Locked(format!(
                        "{} exists ({}s old); another run is in progress",
                        path.display(),
                        age.as_secs()
                    )));
                }

                log::warn!(
                    "[lock] Replacing stale lock {} ({}s old)",
                    path.display(),
                    age.as_secs()
                );
                fs::remove_file(&path).await?;
                Self::create(&path).await.map_err(|e| match e.kind() {
                    ErrorKind::AlreadyExists => {
                        AppError::Locked(format!("{} was retaken", path.display()))
                    }
                    _ => AppError::Io(e),
                })
            }
            Err(e) => Err(AppError::Io(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn create(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        let stamp = format!(
            "pid={} started={}\n",
            std::process::id(),
            Utc::now().to_rfc3339()
        );
        file.write_all(stamp.as_bytes()).await?;
        file.flush().await?;
        log::debug!("[lock] Acquired {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    async fn age(path: &Path) -> Result<Duration> {
        let modified = fs::metadata(path).await?.modified()?;
        Ok(SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO))
    }
}

// Drop cannot await, so release is a blocking remove.
impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::warn!("[lock] Failed to release {}: {}", self.path.display(), e);
        }
    }
}
