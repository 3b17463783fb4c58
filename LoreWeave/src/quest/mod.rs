//! Reference resolution for chapters and quests
//!
//! Source rows reference each other through ambiguous, sometimes-duplicated,
//! sometimes-missing numeric ids. Resolution runs four strictly ordered
//! phases - parse, instantiate, series-map, attach - then hands whatever is
//! left unconnected to the orphan grouper, so every quest ends up in exactly
//! one chapter.

pub mod orphans;

use std::collections::{BTreeMap, HashMap, HashSet};

use loredata::RecordSource;
use loredata::records::{ChapterRow, QuestRow, StepRow, TalkBlock, parse_row};

use crate::dialogue::{self, TalkLocator};
use crate::error::Result;
use crate::model::{Chapter, DialogueNode, Quest, Step};
use crate::npc;
use crate::render::TextRenderer;

/// Builds and owns the fully cross-linked chapter/quest set.
///
/// The four phases run once per store instance and cache their output
/// behind the `resolved` guard for the resolver's lifetime.
#[derive(Debug, Default)]
pub struct QuestResolver {
    /// Chapters in exposure order: authored ascending by id, then synthetic.
    chapters: Vec<Chapter>,
    /// Quest id to (chapter index, quest index) position.
    quest_index: HashMap<i64, (usize, usize)>,
    /// Role-id name table, seeded with the reserved system roles.
    npc_names: HashMap<i64, String>,
    /// Embedded talk definitions per quest, kept for lazy expansion.
    embedded_talks: HashMap<i64, Vec<TalkBlock>>,
    resolved: bool,
}

impl QuestResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the four resolution phases, once.
    pub fn resolve<S: RecordSource>(&mut self, store: &S, renderer: &TextRenderer) -> Result<()> {
        if self.resolved {
            return Ok(());
        }
        self.npc_names = npc::load_names(store, renderer)?;

        // Phase 1: parse chapter and quest rows.
        let mut chapters: BTreeMap<i64, Chapter> = BTreeMap::new();
        for (name, value) in store.get_all_records("chapter")? {
            let Some(row) = parse_row::<ChapterRow>("chapter", &name, &value) else {
                continue;
            };
            let title = renderer.render(store, row.title_hash)?.unwrap_or_default();
            let code = renderer.render_opt(store, row.code_hash)?;
            chapters.insert(
                row.id,
                Chapter {
                    id: row.id,
                    title,
                    code,
                    entry_series: row.entry_series,
                    tag: row.tag,
                    synthetic: false,
                    quests: Vec::new(),
                },
            );
        }
        let quest_rows = collect_quest_rows(store)?;

        // Phase 2: instantiate quests. Only embedded talk content expands
        // eagerly here; standalone talks stay lazy.
        let mut quests: BTreeMap<i64, Quest> = BTreeMap::new();
        for (source, row) in quest_rows {
            let quest = self.instantiate_quest(store, renderer, &source, &row)?;
            self.embedded_talks.insert(row.id, row.talks);
            quests.insert(quest.id, quest);
        }

        // Phase 3: series to chapter, declared entry series first
        // (authoritative), quest-carried pairs second (fallback).
        let mut series_to_chapter: HashMap<i64, i64> = HashMap::new();
        for chapter in chapters.values() {
            for &series in &chapter.entry_series {
                series_to_chapter.entry(series).or_insert(chapter.id);
            }
        }
        for quest in quests.values() {
            if let (Some(series), Some(chapter_id)) = (quest.series_id, quest.chapter_id) {
                series_to_chapter.entry(series).or_insert(chapter_id);
            }
        }
        for quest in quests.values_mut() {
            if quest.chapter_id.is_none()
                && let Some(series) = quest.series_id
                && let Some(&chapter_id) = series_to_chapter.get(&series)
            {
                quest.chapter_id = Some(chapter_id);
            }
        }

        // Phase 4: attach chapter-resolved quests, de-duplicated by id.
        // A quest with neither resolvable chapter nor series is not an
        // error; the orphan grouper picks it up below.
        let mut attached: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for quest in quests.values() {
            if let Some(chapter_id) = quest.chapter_id
                && chapters.contains_key(&chapter_id)
            {
                let list = attached.entry(chapter_id).or_default();
                if !list.contains(&quest.id) {
                    list.push(quest.id);
                }
            }
        }

        orphans::group_orphans(&mut chapters, &mut quests, &mut attached);
        self.finalize(chapters, quests, &attached);
        self.resolved = true;

        let quest_count: usize = self.chapters.iter().map(|c| c.quests.len()).sum();
        tracing::info!(
            "resolved {} chapters, {} quests",
            self.chapters.len(),
            quest_count
        );
        Ok(())
    }

    /// Chapters in exposure order, quests attached.
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Look up a resolved quest by id.
    pub fn quest(&self, id: i64) -> Option<&Quest> {
        let &(ci, qi) = self.quest_index.get(&id)?;
        self.chapters.get(ci)?.quests.get(qi)
    }

    /// Expand a step's pending talks into dialogue nodes, memoized per step.
    ///
    /// Unknown quest or step ids resolve to an empty slice, matching the
    /// missing-reference posture everywhere else.
    pub fn expand_step<S: RecordSource>(
        &mut self,
        store: &S,
        renderer: &TextRenderer,
        locator: &mut TalkLocator,
        quest_id: i64,
        step_id: i64,
    ) -> Result<&[DialogueNode]> {
        let Some(&(ci, qi)) = self.quest_index.get(&quest_id) else {
            return Ok(&[]);
        };
        let Some(si) = self.chapters[ci].quests[qi]
            .steps
            .iter()
            .position(|step| step.id == step_id)
        else {
            return Ok(&[]);
        };

        if !self.chapters[ci].quests[qi].steps[si].expanded {
            let embedded = self
                .embedded_talks
                .get(&quest_id)
                .cloned()
                .unwrap_or_default();
            let pending = self.chapters[ci].quests[qi].steps[si].pending_talks.clone();

            let mut nodes = Vec::new();
            for talk_id in pending {
                let lines = locator.lines(store, talk_id, &embedded)?;
                let Some(entry) = lines.first().map(|line| line.id) else {
                    continue;
                };
                let map = dialogue::build_node_map(&lines);
                let mut visited = HashSet::new();
                nodes.extend(dialogue::walk(
                    store,
                    renderer,
                    &self.npc_names,
                    entry,
                    &map,
                    &mut visited,
                )?);
            }

            let step = &mut self.chapters[ci].quests[qi].steps[si];
            step.nodes.extend(nodes);
            step.expanded = true;
        }

        Ok(&self.chapters[ci].quests[qi].steps[si].nodes)
    }

    fn instantiate_quest<S: RecordSource>(
        &self,
        store: &S,
        renderer: &TextRenderer,
        source: &str,
        row: &QuestRow,
    ) -> Result<Quest> {
        let title = renderer.render(store, row.title_hash)?.unwrap_or_default();
        let description = renderer
            .render_opt(store, row.desc_hash)?
            .unwrap_or_default();
        let mut steps = Vec::with_capacity(row.steps.len());
        for step_row in &row.steps {
            steps.push(self.instantiate_step(store, renderer, row, step_row)?);
        }
        Ok(Quest {
            id: row.id,
            title,
            description,
            chapter_id: row.chapter_id,
            chapter_title: None,
            series_id: row.series_id,
            tag: row.tag.clone(),
            steps,
            source: source.to_string(),
        })
    }

    fn instantiate_step<S: RecordSource>(
        &self,
        store: &S,
        renderer: &TextRenderer,
        quest_row: &QuestRow,
        step_row: &StepRow,
    ) -> Result<Step> {
        let title = renderer.render_opt(store, step_row.title_hash)?;
        let description = renderer.render_opt(store, step_row.desc_hash)?;

        let mut nodes = Vec::new();
        let mut pending = Vec::new();
        if let Some(start) = step_row.start_talk {
            match quest_row
                .talks
                .iter()
                .find(|talk| talk.id == start && !talk.lines.is_empty())
            {
                Some(talk) => {
                    let map = dialogue::build_node_map(&talk.lines);
                    let entry = talk.lines[0].id;
                    let mut visited = HashSet::new();
                    nodes = dialogue::walk(store, renderer, &self.npc_names, entry, &map, &mut visited)?;
                }
                None => pending.push(start),
            }
        }
        pending.extend(step_row.finish_talks.iter().copied());

        Ok(Step {
            id: step_row.id,
            title,
            description,
            nodes,
            pending_talks: pending,
            expanded: false,
        })
    }

    /// Move quests into their chapters and freeze the exposure order.
    fn finalize(
        &mut self,
        chapters: BTreeMap<i64, Chapter>,
        mut quests: BTreeMap<i64, Quest>,
        attached: &BTreeMap<i64, Vec<i64>>,
    ) {
        let (authored, synthetic): (Vec<Chapter>, Vec<Chapter>) = chapters
            .into_values()
            .partition(|chapter| !chapter.synthetic);

        let mut out = Vec::new();
        for mut chapter in authored.into_iter().chain(synthetic) {
            let mut ids = attached.get(&chapter.id).cloned().unwrap_or_default();
            ids.sort_unstable();
            for id in ids {
                if let Some(mut quest) = quests.remove(&id) {
                    quest.chapter_id = Some(chapter.id);
                    quest.chapter_title = Some(chapter.title.clone());
                    chapter.quests.push(quest);
                }
            }
            out.push(chapter);
        }

        self.quest_index.clear();
        for (ci, chapter) in out.iter().enumerate() {
            for (qi, quest) in chapter.quests.iter().enumerate() {
                self.quest_index.insert(quest.id, (ci, qi));
            }
        }
        self.chapters = out;
    }
}

/// Collect quest rows with duplicate-id precedence: the file whose stem
/// textually equals the quest id wins; otherwise first encountered stays.
fn collect_quest_rows<S: RecordSource>(store: &S) -> Result<Vec<(String, QuestRow)>> {
    let mut rows: Vec<(String, QuestRow)> = Vec::new();
    let mut by_id: HashMap<i64, usize> = HashMap::new();

    for (name, value) in store.get_all_records("quest")? {
        let Some(row) = parse_row::<QuestRow>("quest", &name, &value) else {
            continue;
        };
        if row.hidden {
            tracing::debug!("quest {} is permanently hidden; skipped", row.id);
            continue;
        }
        match by_id.get(&row.id) {
            Some(&idx) => {
                let canonical = name == row.id.to_string();
                let kept_canonical = rows[idx].0 == row.id.to_string();
                if canonical && !kept_canonical {
                    tracing::debug!(
                        "quest {} redefined by canonical file '{name}'; replacing '{}'",
                        row.id,
                        rows[idx].0
                    );
                    rows[idx] = (name, row);
                }
            }
            None => {
                by_id.insert(row.id, rows.len());
                rows.push((name, row));
            }
        }
    }
    Ok(rows)
}
