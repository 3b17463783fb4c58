//! Orphan grouping
//!
//! Quests the reference resolver could not attach to any chapter are not
//! dropped: orphans sharing a series id get one synthesized chapter per
//! series, the rest share a single catch-all chapter.

use std::collections::{BTreeMap, HashSet};

use crate::model::{Chapter, Quest};

/// Offset added to a series id to form its placeholder chapter id, chosen
/// far above the authored id range.
pub const ORPHAN_SERIES_OFFSET: i64 = 9000000000;

/// Sentinel id of the shared catch-all chapter for orphans without a series.
pub const UNGROUPED_CHAPTER_ID: i64 = 9999999999;

/// Title of the shared catch-all chapter.
pub const UNGROUPED_CHAPTER_TITLE: &str = "Other Quests";

/// Synthesize placeholder chapters for every quest no chapter references.
pub(crate) fn group_orphans(
    chapters: &mut BTreeMap<i64, Chapter>,
    quests: &mut BTreeMap<i64, Quest>,
    attached: &mut BTreeMap<i64, Vec<i64>>,
) {
    let referenced: HashSet<i64> = attached.values().flatten().copied().collect();

    // BTreeMap iteration keeps orphan lists sorted by quest id.
    let mut by_series: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
    let mut loose: Vec<i64> = Vec::new();
    for (&id, quest) in quests.iter() {
        if referenced.contains(&id) {
            continue;
        }
        match quest.series_id {
            Some(series) => by_series.entry(series).or_default().push(id),
            None => loose.push(id),
        }
    }

    for (series, ids) in by_series {
        let chapter_id = series + ORPHAN_SERIES_OFFSET;
        let title = ids
            .first()
            .and_then(|id| quests.get(id))
            .map(|quest| quest.title.clone())
            .unwrap_or_default();
        tracing::debug!(
            "synthesizing chapter {chapter_id} for series {series} ({} orphans)",
            ids.len()
        );
        chapters.insert(
            chapter_id,
            Chapter {
                id: chapter_id,
                title,
                code: None,
                entry_series: vec![series],
                tag: None,
                synthetic: true,
                quests: Vec::new(),
            },
        );
        for id in &ids {
            if let Some(quest) = quests.get_mut(id) {
                quest.chapter_id = Some(chapter_id);
            }
        }
        attached.insert(chapter_id, ids);
    }

    if !loose.is_empty() {
        tracing::debug!("grouping {} series-less orphans into the catch-all", loose.len());
        chapters.insert(
            UNGROUPED_CHAPTER_ID,
            Chapter {
                id: UNGROUPED_CHAPTER_ID,
                title: UNGROUPED_CHAPTER_TITLE.to_string(),
                code: None,
                entry_series: Vec::new(),
                tag: None,
                synthetic: true,
                quests: Vec::new(),
            },
        );
        for id in &loose {
            if let Some(quest) = quests.get_mut(id) {
                quest.chapter_id = Some(UNGROUPED_CHAPTER_ID);
            }
        }
        attached.insert(UNGROUPED_CHAPTER_ID, loose);
    }
}
