//! End-to-end resolution tests over an in-memory record store.

use loredata::MemoryStore;
use loreweave::quest::orphans::{
    ORPHAN_SERIES_OFFSET, UNGROUPED_CHAPTER_ID, UNGROUPED_CHAPTER_TITLE,
};
use loreweave::Codex;
use pretty_assertions::assert_eq;
use serde_json::json;

/// A small but complete world: two authored chapters, quests attached
/// directly, via series, and not at all, plus dialogue in both embedded
/// and standalone form.
fn world() -> MemoryStore {
    let mut store = MemoryStore::new();

    store.insert_text(1, "Dawn");
    store.insert_text(2, "Dusk");
    store.insert_text(10, "Find the gate");
    store.insert_text(11, "Ask around town");
    store.insert_text(12, "Return the key");
    store.insert_text(13, "Feed the cat");
    store.insert_text(14, "Stray errand");
    store.insert_text(15, "Another errand");
    store.insert_text(20, "Where is the gate?");
    store.insert_text(21, "Follow the river north.");
    store.insert_text(22, "Done already?");
    store.insert_text(30, "Old title");
    store.insert_text(31, "Canonical title");

    store.insert_record(
        "chapter/1",
        json!({"id": 1, "title_hash": 1, "entry_series": [100]}),
    );
    store.insert_record("chapter/2", json!({"id": 2, "title_hash": 2}));

    // Attached directly, with one embedded talk and one standalone talk.
    store.insert_record(
        "quest/10",
        json!({
            "id": 10, "title_hash": 10, "chapter_id": 1, "series_id": 100,
            "steps": [
                {"id": 1, "start_talk": 900},
                {"id": 2, "finish_talks": [901]}
            ],
            "talks": [
                {"id": 900, "lines": [
                    {"id": 50, "text_hash": 20, "role": -1, "next": [51]},
                    {"id": 51, "text_hash": 21}
                ]}
            ]
        }),
    );
    // Attached through the chapter's declared entry series.
    store.insert_record(
        "quest/11",
        json!({"id": 11, "title_hash": 11, "series_id": 100}),
    );
    // Quest 12 carries the (series, chapter) pair quest 13 needs.
    store.insert_record(
        "quest/12",
        json!({"id": 12, "title_hash": 12, "chapter_id": 2, "series_id": 200}),
    );
    store.insert_record(
        "quest/13",
        json!({"id": 13, "title_hash": 13, "series_id": 200}),
    );

    // Orphans: two share series 500, one sits alone in 501, two have none.
    store.insert_record("quest/20", json!({"id": 20, "title_hash": 14, "series_id": 500}));
    store.insert_record("quest/21", json!({"id": 21, "title_hash": 15, "series_id": 500}));
    store.insert_record("quest/22", json!({"id": 22, "title_hash": 14, "series_id": 501}));
    store.insert_record("quest/30", json!({"id": 30, "title_hash": 14}));
    store.insert_record("quest/31", json!({"id": 31, "title_hash": 15}));

    // Duplicate id 40: the legacy copy arrives first, the canonical file wins.
    store.insert_record("quest/legacy_40", json!({"id": 40, "title_hash": 30}));
    store.insert_record("quest/40", json!({"id": 40, "title_hash": 31}));

    // Never surfaces.
    store.insert_record("quest/50", json!({"id": 50, "title_hash": 14, "hidden": true}));

    store.insert_record(
        "talk/901",
        json!({"id": 901, "lines": [{"id": 60, "text_hash": 22, "role": -666}]}),
    );

    store
}

#[test]
fn test_every_quest_lands_in_exactly_one_chapter() {
    let mut codex = Codex::new(world());
    let chapters = codex.chapters().unwrap();

    let mut seen: Vec<i64> = chapters
        .iter()
        .flat_map(|c| c.quests.iter().map(|q| q.id))
        .collect();
    seen.sort_unstable();
    // Quest 50 is hidden; everything else surfaces exactly once.
    assert_eq!(seen, vec![10, 11, 12, 13, 20, 21, 22, 30, 31, 40]);
    assert!(chapters
        .iter()
        .flat_map(|c| &c.quests)
        .all(|q| q.chapter_id.is_some() && q.chapter_title.is_some()));
}

#[test]
fn test_attachment_precedence_direct_series_and_pair() {
    let mut codex = Codex::new(world());
    let chapters = codex.chapters().unwrap();

    let find = |id: i64| {
        chapters
            .iter()
            .find(|c| c.quests.iter().any(|q| q.id == id))
            .unwrap()
    };
    assert_eq!(find(10).id, 1);
    // Quest 11 reaches chapter 1 through its declared entry series.
    assert_eq!(find(11).id, 1);
    // Quest 13 reaches chapter 2 through the pair quest 12 carries.
    assert_eq!(find(13).id, 2);
}

#[test]
fn test_orphans_are_grouped_not_dropped() {
    let mut codex = Codex::new(world());
    let chapters = codex.chapters().unwrap();

    // 2 authored + series 500 + series 501 + catch-all.
    assert_eq!(chapters.len(), 5);

    let series_500 = chapters
        .iter()
        .find(|c| c.id == 500 + ORPHAN_SERIES_OFFSET)
        .unwrap();
    assert!(series_500.synthetic);
    // Titled after its first member.
    assert_eq!(series_500.title, "Stray errand");
    let ids: Vec<i64> = series_500.quests.iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![20, 21]);

    let catch_all = chapters.iter().find(|c| c.id == UNGROUPED_CHAPTER_ID).unwrap();
    assert_eq!(catch_all.title, UNGROUPED_CHAPTER_TITLE);
    // Quest 40 has neither chapter nor series, so it lands here too.
    let ids: Vec<i64> = catch_all.quests.iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![30, 31, 40]);

    // Authored chapters come first, synthetic ones after.
    let synth_start = chapters.iter().position(|c| c.synthetic).unwrap();
    assert!(chapters[synth_start..].iter().all(|c| c.synthetic));
    assert_eq!(synth_start, 2);
}

#[test]
fn test_three_series_orphans_and_two_loose_orphans() {
    let mut store = MemoryStore::new();
    store.insert_text(1, "First of the series");
    store.insert_text(2, "Loose");
    for id in [1, 2, 3] {
        store.insert_record(
            format!("quest/{id}"),
            json!({"id": id, "title_hash": 1, "series_id": 42}),
        );
    }
    store.insert_record("quest/8", json!({"id": 8, "title_hash": 2}));
    store.insert_record("quest/9", json!({"id": 9, "title_hash": 2}));

    let mut codex = Codex::new(store);
    let chapters = codex.chapters().unwrap();
    assert_eq!(chapters.len(), 2);

    let series = &chapters[0];
    assert_eq!(series.id, 42 + ORPHAN_SERIES_OFFSET);
    assert_eq!(series.quests.len(), 3);
    assert_eq!(series.title, "First of the series");

    let catch_all = &chapters[1];
    assert_eq!(catch_all.id, UNGROUPED_CHAPTER_ID);
    assert_eq!(catch_all.quests.len(), 2);
}

#[test]
fn test_canonical_file_wins_duplicate_ids() {
    let mut codex = Codex::new(world());
    let quest = codex.quest(40).unwrap().unwrap();
    assert_eq!(quest.title, "Canonical title");
    assert_eq!(quest.source, "40");
}

#[test]
fn test_embedded_start_talk_expands_at_resolve_time() {
    let mut codex = Codex::new(world());
    let quest = codex.quest(10).unwrap().unwrap();

    let step = &quest.steps[0];
    assert_eq!(step.nodes.len(), 2);
    // Role -1 renders as the default protagonist nickname.
    assert_eq!(step.nodes[0].speaker, "Adventurer");
    assert_eq!(step.nodes[0].text, "Where is the gate?");
    assert_eq!(step.nodes[1].text, "Follow the river north.");
}

#[test]
fn test_standalone_talks_expand_lazily_and_memoize() {
    let mut codex = Codex::new(world());

    // Untouched until asked.
    assert!(codex.quest(10).unwrap().unwrap().steps[1].nodes.is_empty());

    let first = codex.expand_step(10, 2).unwrap().len();
    assert_eq!(first, 1);
    let again = codex.expand_step(10, 2).unwrap();
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].text, "Done already?");
}

#[test]
fn test_resolution_is_idempotent() {
    let mut codex = Codex::new(world());
    let first: Vec<(i64, usize)> = codex
        .chapters()
        .unwrap()
        .iter()
        .map(|c| (c.id, c.quests.len()))
        .collect();
    let second: Vec<(i64, usize)> = codex
        .chapters()
        .unwrap()
        .iter()
        .map(|c| (c.id, c.quests.len()))
        .collect();
    assert_eq!(first, second);
}

#[test]
fn test_unknown_references_resolve_empty() {
    let mut codex = Codex::new(world());
    assert!(codex.quest(777).unwrap().is_none());
    assert!(codex.expand_step(777, 1).unwrap().is_empty());
    assert!(codex.expand_step(10, 777).unwrap().is_empty());
    assert!(codex.session(777).unwrap().is_none());
}

#[test]
fn test_sessions_resolve_through_the_facade() {
    let mut store = world();
    store.insert_text(40, "You up?");
    store.insert_text(41, "Yes.");
    store.insert_text(42, "No.");
    store.insert_record("npc/7", json!({"id": 7, "name_hash": 14}));
    store.insert_record(
        "message/5",
        json!([
            {"session_id": 5, "seq": 1, "kind": 1, "npc_id": 7, "text_hash": 40, "next_seq": 2},
            {"session_id": 5, "seq": 2, "kind": 2,
             "opt1_hash": 41, "opt1_goto": 1,
             "opt2_hash": 42, "opt2_goto": 3},
            {"session_id": 5, "seq": 3, "kind": 3}
        ]),
    );

    let mut codex = Codex::new(store);
    let session = codex.session(5).unwrap().unwrap();
    assert_eq!(session.npc_id, Some(7));
    assert!(session.ended);
    // The first choice jumps back to stage 1; cycles are legal here.
    let options = session.stages[&2].options.as_ref().unwrap();
    assert_eq!(options.choices[0].goto, 1);
}
