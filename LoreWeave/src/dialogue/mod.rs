//! Dialogue graph walking
//!
//! Expands a start line id into a branch/merge/cycle-safe tree of rendered
//! nodes. The asymmetry here is a product decision, not an accident: real
//! choice points nest as `options` children, plain linear continuation is
//! flattened into the parent list. Downstream formatting depends on it.

pub mod talks;

use std::collections::{HashMap, HashSet};

use loredata::RecordSource;
use loredata::records::DialogueRow;

use crate::error::Result;
use crate::model::{DialogueNode, NodeKind};
use crate::npc::ROLE_NARRATOR;
use crate::render::TextRenderer;

pub use talks::TalkLocator;

/// Index a talk's lines by line id for traversal.
pub(crate) fn build_node_map(lines: &[DialogueRow]) -> HashMap<i64, DialogueRow> {
    lines.iter().map(|line| (line.id, line.clone())).collect()
}

/// Walk the dialogue graph from `start_id`.
///
/// Returns the ordered node list for this path. Cycles, dangling links and
/// a zero start id all resolve to an empty list - source data legitimately
/// contains authored-but-unused references, so none of these raise. A line
/// whose text fails validation is pruned along with everything reachable
/// only through it.
pub(crate) fn walk<S: RecordSource>(
    store: &S,
    renderer: &TextRenderer,
    npc_names: &HashMap<i64, String>,
    start_id: i64,
    node_map: &HashMap<i64, DialogueRow>,
    visited: &mut HashSet<i64>,
) -> Result<Vec<DialogueNode>> {
    if start_id == 0 || visited.contains(&start_id) {
        return Ok(Vec::new());
    }
    let Some(row) = node_map.get(&start_id) else {
        return Ok(Vec::new());
    };
    visited.insert(start_id);

    let Some(text) = renderer.render(store, row.text_hash)? else {
        return Ok(Vec::new());
    };
    let speaker = resolve_speaker(store, renderer, npc_names, row)?;
    let kind = classify(row);

    let mut node = DialogueNode {
        kind,
        speaker,
        text,
        node_id: start_id,
        options: Vec::new(),
    };

    let edges: Vec<i64> = row.edges().collect();
    if edges.len() > 1 {
        // Branch point: each edge becomes a mutually exclusive child option.
        // Only the head of each sub-walk is attached; the shared visited set
        // keeps merged continuations from repeating across branches.
        for edge in edges {
            let mut sub = walk(store, renderer, npc_names, edge, node_map, visited)?;
            if !sub.is_empty() {
                node.options.push(sub.remove(0));
            }
        }
        Ok(vec![node])
    } else if let Some(&edge) = edges.first() {
        // Linear continuation stays flat.
        let mut nodes = vec![node];
        nodes.extend(walk(store, renderer, npc_names, edge, node_map, visited)?);
        Ok(nodes)
    } else {
        Ok(vec![node])
    }
}

/// Speaker precedence: role-id lookup in the NPC table (which includes the
/// seeded system roles), then the line's own name hash, then nothing.
fn resolve_speaker<S: RecordSource>(
    store: &S,
    renderer: &TextRenderer,
    npc_names: &HashMap<i64, String>,
    row: &DialogueRow,
) -> Result<String> {
    if let Some(role) = row.role
        && let Some(name) = npc_names.get(&role)
    {
        return Ok(name.clone());
    }
    if let Some(name) = renderer.render_opt(store, row.name_hash)? {
        return Ok(name);
    }
    Ok(String::new())
}

fn classify(row: &DialogueRow) -> NodeKind {
    if row.role == Some(ROLE_NARRATOR) {
        NodeKind::Narration
    } else if row.option {
        NodeKind::Option
    } else {
        NodeKind::Dialogue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loredata::MemoryStore;
    use serde_json::{Value, json};

    fn line(id: i64, text_hash: i64, next: &[i64]) -> DialogueRow {
        serde_json::from_value(json!({"id": id, "text_hash": text_hash, "next": next})).unwrap()
    }

    fn fixture(texts: &[(i64, &str)]) -> (MemoryStore, TextRenderer, HashMap<i64, String>) {
        let mut store = MemoryStore::new();
        for &(hash, text) in texts {
            store.insert_text(hash, text);
        }
        (store, TextRenderer::default(), HashMap::new())
    }

    fn run(
        store: &MemoryStore,
        renderer: &TextRenderer,
        names: &HashMap<i64, String>,
        start: i64,
        lines: &[DialogueRow],
    ) -> Vec<DialogueNode> {
        let map = build_node_map(lines);
        let mut visited = HashSet::new();
        walk(store, renderer, names, start, &map, &mut visited).unwrap()
    }

    #[test]
    fn test_linear_run_is_flattened() {
        let (store, renderer, names) = fixture(&[(1, "a"), (2, "b"), (3, "c")]);
        let lines = vec![line(10, 1, &[11]), line(11, 2, &[12]), line(12, 3, &[])];
        let nodes = run(&store, &renderer, &names, 10, &lines);
        assert_eq!(nodes.len(), 3);
        assert!(nodes.iter().all(|n| n.options.is_empty()));
    }

    #[test]
    fn test_branch_nests_options_under_one_node() {
        let (store, renderer, names) = fixture(&[(1, "q"), (2, "a"), (3, "b"), (4, "c")]);
        let lines = vec![
            line(10, 1, &[11, 12, 13]),
            line(11, 2, &[]),
            line(12, 3, &[]),
            line(13, 4, &[]),
        ];
        let nodes = run(&store, &renderer, &names, 10, &lines);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].options.len(), 3);
        assert!(nodes[0].options.iter().all(|o| o.options.is_empty()));
    }

    #[test]
    fn test_self_cycle_terminates_and_yields_node_once() {
        let (store, renderer, names) = fixture(&[(1, "loop")]);
        let lines = vec![line(10, 1, &[10])];
        let nodes = run(&store, &renderer, &names, 10, &lines);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].node_id, 10);
        assert!(nodes[0].options.is_empty());
    }

    #[test]
    fn test_invalid_text_prunes_node_and_continuation() {
        let (store, renderer, names) = fixture(&[(1, "[hidden] wip"), (2, "after")]);
        let lines = vec![line(10, 1, &[11]), line(11, 2, &[])];
        let nodes = run(&store, &renderer, &names, 10, &lines);
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_zero_and_dangling_starts_are_empty() {
        let (store, renderer, names) = fixture(&[(1, "a")]);
        let lines = vec![line(10, 1, &[])];
        assert!(run(&store, &renderer, &names, 0, &lines).is_empty());
        assert!(run(&store, &renderer, &names, 77, &lines).is_empty());
    }

    #[test]
    fn test_speaker_precedence_table_over_name_hash() {
        let mut store = MemoryStore::new();
        store.insert_text(1, "hello");
        store.insert_text(5, "Fallback Name");
        let renderer = TextRenderer::default();
        let mut names = HashMap::new();
        names.insert(42, "Tabled Name".to_string());

        let row: Value = json!({"id": 10, "text_hash": 1, "role": 42, "name_hash": 5});
        let with_role: DialogueRow = serde_json::from_value(row).unwrap();
        let no_role: DialogueRow =
            serde_json::from_value(json!({"id": 11, "text_hash": 1, "name_hash": 5})).unwrap();

        let nodes = run(&store, &renderer, &names, 10, &[with_role]);
        assert_eq!(nodes[0].speaker, "Tabled Name");
        let nodes = run(&store, &renderer, &names, 11, &[no_role]);
        assert_eq!(nodes[0].speaker, "Fallback Name");
    }

    #[test]
    fn test_narrator_role_classifies_as_narration() {
        let mut store = MemoryStore::new();
        store.insert_text(1, "The wind howls.");
        let renderer = TextRenderer::default();
        let mut names = HashMap::new();
        names.insert(ROLE_NARRATOR, String::new());

        let row: DialogueRow =
            serde_json::from_value(json!({"id": 10, "text_hash": 1, "role": ROLE_NARRATOR}))
                .unwrap();
        let nodes = run(&store, &renderer, &names, 10, &[row]);
        assert_eq!(nodes[0].kind, NodeKind::Narration);
        assert_eq!(nodes[0].speaker, "");
    }
}
