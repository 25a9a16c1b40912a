// src/pipeline/cascade.rs

//! Homepage slot cascade.
//!
//! Publishing a story pushes every homepage slot down one position: the new
//! headline lands in slot 0, slot `i` moves to slot `i + 1`, and the last
//! slot's content falls off. Planning works on a [`SlotSnapshot`] taken
//! before any write, so no move can observe an already-shifted slot.

use crate::error::Result;
use crate::models::HomepageConfig;
use crate::pipeline::sidebar::SidebarStyle;
use crate::storage::SiteState;

/// Contents of every slot, read before the cascade writes anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSnapshot {
    slots: Vec<(String, Option<String>)>,
}

impl SlotSnapshot {
    /// Slot names in cascade order with their content (`None` = no file).
    pub fn new(slots: Vec<(String, Option<String>)>) -> Self {
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.slots.get(index).map(|(name, _)| name.as_str())
    }

    pub fn content(&self, index: usize) -> Option<&str> {
        self.slots.get(index).and_then(|(_, c)| c.as_deref())
    }
}

/// One slot file to overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotWrite {
    pub slot: String,
    pub content: String,
}

/// Plan the writes that shift `snapshot` down by one and put `headline` on top.
///
/// A slot with no content produces no write, so the slot below it keeps
/// whatever it had.
pub fn plan_cascade(snapshot: &SlotSnapshot, headline: &str, style: &SidebarStyle) -> Vec<SlotWrite> {
    let Some(top) = snapshot.name(0) else {
        return Vec::new();
    };

    let mut writes = vec![SlotWrite {
        slot: top.to_string(),
        content: headline.to_string(),
    }];

    for i in 0..snapshot.len().saturating_sub(1) {
        let (Some(content), Some(target)) = (snapshot.content(i), snapshot.name(i + 1)) else {
            continue;
        };
        writes.push(SlotWrite {
            slot: target.to_string(),
            content: style.restyle_for(target, content).into_owned(),
        });
    }

    writes
}

/// Snapshot the configured slots, plan the cascade and apply it.
///
/// When the top slot already holds `headline` the homepage was cascaded
/// for this story by an earlier run, and nothing is written.
///
/// Returns the number of slot files written.
pub async fn run_cascade(
    site: &dyn SiteState,
    homepage: &HomepageConfig,
    headline: &str,
) -> Result<usize> {
    let snapshot = site.snapshot_slots(&homepage.slots).await?;
    if snapshot.content(0) == Some(headline) {
        log::warn!("[cascade] Top slot already holds this headline, not shifting again");
        return Ok(0);
    }
    let style = SidebarStyle::from_config(homepage);
    let writes = plan_cascade(&snapshot, headline, &style);

    site.apply_slot_writes(&writes).await?;
    log::info!("[cascade] Updated {} homepage slots", writes.len());
    Ok(writes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PathsConfig;
    use crate::storage::LocalSite;
    use tempfile::TempDir;

    fn toy(contents: &[Option<&str>]) -> SlotSnapshot {
        SlotSnapshot::new(
            contents
                .iter()
                .enumerate()
                .map(|(i, c)| (format!("slot{i}"), c.map(str::to_string)))
                .collect(),
        )
    }

    fn apply(snapshot: &SlotSnapshot, writes: &[SlotWrite]) -> Vec<Option<String>> {
        (0..snapshot.len())
            .map(|i| {
                let name = snapshot.name(i).unwrap();
                writes
                    .iter()
                    .rev()
                    .find(|w| w.slot == name)
                    .map(|w| w.content.clone())
                    .or_else(|| snapshot.content(i).map(str::to_string))
            })
            .collect()
    }

    fn style() -> SidebarStyle {
        SidebarStyle::from_config(&HomepageConfig::default())
    }

    #[test]
    fn test_three_slot_shift_drops_last() {
        let snapshot = toy(&[Some("A"), Some("B"), Some("C")]);
        let writes = plan_cascade(&snapshot, "N", &style());
        let after = apply(&snapshot, &writes);
        assert_eq!(
            after,
            vec![Some("N".into()), Some("A".into()), Some("B".into())]
        );
    }

    #[test]
    fn test_each_slot_gets_previous_original() {
        let original: Vec<String> = (0..16).map(|i| format!("story-{i}")).collect();
        let snapshot = toy(&original.iter().map(|s| Some(s.as_str())).collect::<Vec<_>>());
        let after = apply(&snapshot, &plan_cascade(&snapshot, "new", &style()));

        assert_eq!(after[0].as_deref(), Some("new"));
        for i in 0..15 {
            assert_eq!(after[i + 1].as_deref(), Some(original[i].as_str()));
        }
        assert!(!after.iter().any(|c| c.as_deref() == Some("story-15")));
    }

    #[test]
    fn test_missing_slot_produces_no_write() {
        let snapshot = toy(&[Some("A"), None, Some("C")]);
        let writes = plan_cascade(&snapshot, "N", &style());
        assert_eq!(
            writes,
            vec![
                SlotWrite { slot: "slot0".into(), content: "N".into() },
                SlotWrite { slot: "slot1".into(), content: "A".into() },
            ]
        );
    }

    #[test]
    fn test_empty_snapshot() {
        assert!(plan_cascade(&toy(&[]), "N", &style()).is_empty());
    }

    #[test]
    fn test_sidebar_target_is_restyled() {
        let headline = r#"<a href="/articles/a.html"><img src="a.jpg"><h2>Story A</h2></a>"#;
        let snapshot = SlotSnapshot::new(vec![
            ("main_headline".into(), Some(headline.into())),
            ("main_subheadline1".into(), Some("old".into())),
        ]);
        let writes = plan_cascade(&snapshot, "N", &style());
        assert_eq!(writes[1].slot, "main_subheadline1");
        assert!(writes[1].content.contains("sidebar-story-card"));
        assert!(writes[1].content.contains("Story A"));
    }

    #[tokio::test]
    async fn test_run_cascade_on_disk() {
        let tmp = TempDir::new().unwrap();
        let site = LocalSite::new(tmp.path(), &PathsConfig::default());
        let homepage = HomepageConfig {
            slots: vec!["a".into(), "b".into(), "c".into()],
            ..HomepageConfig::default()
        };
        for (slot, content) in [("a", "A"), ("b", "B"), ("c", "C")] {
            std::fs::write(tmp.path().join(format!("{slot}.html")), content).unwrap();
        }

        let written = run_cascade(&site, &homepage, "N").await.unwrap();
        assert_eq!(written, 3);

        let read = |slot: &str| std::fs::read_to_string(tmp.path().join(format!("{slot}.html"))).unwrap();
        assert_eq!(read("a"), "N");
        assert_eq!(read("b"), "A");
        assert_eq!(read("c"), "B");

        // Same headline again: already on top, nothing shifts
        assert_eq!(run_cascade(&site, &homepage, "N").await.unwrap(), 0);
        assert_eq!(read("a"), "N");
        assert_eq!(read("b"), "A");
        assert_eq!(read("c"), "B");
    }
}
