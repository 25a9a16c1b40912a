// src/pipeline/scan.rs

//! Scheduled descriptor scanning.

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::ScheduledEntry;
use crate::storage::SiteState;

/// What the scheduled area holds for a given day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Due descriptors in file-name order
    pub due: Vec<ScheduledEntry>,
    /// Descriptors dated after today
    pub pending: usize,
}

/// List descriptors released on or before `today`.
///
/// File names that are not `YYYY-MM-DD-<slug>.json` are ignored. A listing
/// error is returned as-is; nothing can be published without it.
pub async fn scan_due(site: &dyn SiteState, today: NaiveDate) -> Result<ScanResult> {
    let files = site.list_scheduled().await?;

    let mut result = ScanResult::default();
    for entry in files.iter().filter_map(|f| ScheduledEntry::from_file_name(f)) {
        if entry.is_due(today) {
            result.due.push(entry);
        } else {
            result.pending += 1;
        }
    }
    result.due.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    log::info!(
        "[scan] {} due, {} pending (today {})",
        result.due.len(),
        result.pending,
        today
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PathsConfig;
    use crate::storage::LocalSite;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_date_gate_and_order() {
        let tmp = TempDir::new().unwrap();
        let scheduled = tmp.path().join("scheduled-articles");
        std::fs::create_dir_all(&scheduled).unwrap();
        for name in [
            "2024-01-02-b.json",
            "2024-01-01-z.json",
            "2024-01-02-a.json",
            "2024-01-03-tomorrow.json",
            "2024-01-01-story.html",
            "notes.txt",
            "2024-02-30-bad-date.json",
        ] {
            std::fs::write(scheduled.join(name), "{}").unwrap();
        }
        let site = LocalSite::new(tmp.path(), &PathsConfig::default());

        let today = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let result = scan_due(&site, today).await.unwrap();
        let names: Vec<_> = result.due.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["2024-01-01-z.json", "2024-01-02-a.json", "2024-01-02-b.json"]
        );
        assert_eq!(result.pending, 1);
    }

    #[tokio::test]
    async fn test_missing_dir_is_nothing_to_do() {
        let tmp = TempDir::new().unwrap();
        let site = LocalSite::new(tmp.path(), &PathsConfig::default());
        let today = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(scan_due(&site, today).await.unwrap(), ScanResult::default());
    }

    #[tokio::test]
    async fn test_unreadable_dir_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("scheduled-articles"), "not a directory").unwrap();
        let site = LocalSite::new(tmp.path(), &PathsConfig::default());
        let today = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert!(scan_due(&site, today).await.is_err());
    }
}
