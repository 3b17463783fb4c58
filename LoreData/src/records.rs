//! Typed raw record shapes
//!
//! Source data is a pile of denormalized JSON rows. These are the half-dozen
//! shapes that actually occur, validated here at the store boundary rather
//! than deep inside the resolvers. Fields the data legitimately omits are
//! `Option` or defaulted; a row missing a required id or discriminator fails
//! deserialization and is skipped by the caller.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parse a raw JSON record into a typed row.
///
/// Malformed rows are logged at `warn` and dropped; one bad record must
/// never block the rest of the batch.
pub fn parse_row<T: DeserializeOwned>(kind: &str, name: &str, value: &Value) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(row) => Some(row),
        Err(e) => {
            tracing::warn!("skipping malformed {kind} record '{name}': {e}");
            None
        }
    }
}

/// A chapter definition row.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChapterRow {
    pub id: i64,
    pub title_hash: i64,
    /// Optional chapter code text (e.g. an act number string).
    #[serde(default)]
    pub code_hash: Option<i64>,
    /// Series ids this chapter declares as its entry points (authoritative).
    #[serde(default)]
    pub entry_series: Vec<i64>,
    /// Classification tag ("main", "side", "event", ...).
    #[serde(default)]
    pub tag: Option<String>,
}

/// A quest definition row.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuestRow {
    pub id: i64,
    pub title_hash: i64,
    #[serde(default)]
    pub desc_hash: Option<i64>,
    /// Chapter reference, frequently absent in source data.
    #[serde(default)]
    pub chapter_id: Option<i64>,
    /// Series reference, frequently absent in source data.
    #[serde(default)]
    pub series_id: Option<i64>,
    #[serde(default)]
    pub tag: Option<String>,
    /// Permanently-hidden rows never become quests.
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub steps: Vec<StepRow>,
    /// Talk definitions embedded directly in the quest file.
    #[serde(default)]
    pub talks: Vec<TalkBlock>,
}

/// One sub-objective row inside a quest.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StepRow {
    pub id: i64,
    #[serde(default)]
    pub title_hash: Option<i64>,
    #[serde(default)]
    pub desc_hash: Option<i64>,
    /// Talk started when the step begins; expanded eagerly when embedded.
    #[serde(default)]
    pub start_talk: Option<i64>,
    /// Talks referenced by finish conditions; resolved lazily on request.
    #[serde(default)]
    pub finish_talks: Vec<i64>,
}

/// A named bundle of dialogue lines, embedded in a quest file or stored
/// standalone under the talk tree.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TalkBlock {
    pub id: i64,
    #[serde(default)]
    pub lines: Vec<DialogueRow>,
}

/// One dialogue line row inside a talk.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DialogueRow {
    pub id: i64,
    pub text_hash: i64,
    /// Speaker display-name hash, used when the role is not in the NPC table.
    #[serde(default)]
    pub name_hash: Option<i64>,
    /// Role id into the NPC table. Negative ids are reserved system roles.
    #[serde(default)]
    pub role: Option<i64>,
    /// Marks a player-choice line.
    #[serde(default)]
    pub option: bool,
    /// Out-edges to following lines. Zeroes are authoring padding.
    #[serde(default)]
    pub next: Vec<i64>,
}

impl DialogueRow {
    /// Out-edges with the zero padding filtered away.
    pub fn edges(&self) -> impl Iterator<Item = i64> + '_ {
        self.next.iter().copied().filter(|&n| n != 0)
    }
}

/// An NPC definition row, the source of the role-id name table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NpcRow {
    pub id: i64,
    pub name_hash: i64,
}

/// Stage discriminator values carried on message rows.
pub const MESSAGE_KIND_NARRATION: i64 = 1;
pub const MESSAGE_KIND_CHOICE: i64 = 2;
pub const MESSAGE_KIND_TERMINAL: i64 = 3;

/// One flat message-session row.
///
/// Unlike dialogue lines, these carry no pointer arrays; stages reference
/// each other through explicit sequence-id jump targets.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageRow {
    pub session_id: i64,
    /// Sequence id of the stage this row belongs to.
    pub seq: i64,
    /// Stage discriminator: 1 narration, 2 player-choice, 3 terminal.
    pub kind: i64,
    #[serde(default)]
    pub npc_id: Option<i64>,
    #[serde(default)]
    pub text_hash: Option<i64>,
    /// Explicit jump target for narration stages.
    #[serde(default)]
    pub next_seq: Option<i64>,

    // Up to four independently-optional choice slots.
    #[serde(default)]
    pub opt1_hash: Option<i64>,
    #[serde(default)]
    pub opt1_goto: Option<i64>,
    #[serde(default)]
    pub opt2_hash: Option<i64>,
    #[serde(default)]
    pub opt2_goto: Option<i64>,
    #[serde(default)]
    pub opt3_hash: Option<i64>,
    #[serde(default)]
    pub opt3_goto: Option<i64>,
    #[serde(default)]
    pub opt4_hash: Option<i64>,
    #[serde(default)]
    pub opt4_goto: Option<i64>,
}

impl MessageRow {
    /// Choice slots that have both a text hash and a jump target, in slot order.
    pub fn choice_slots(&self) -> Vec<(i64, i64)> {
        [
            (self.opt1_hash, self.opt1_goto),
            (self.opt2_hash, self.opt2_goto),
            (self.opt3_hash, self.opt3_goto),
            (self.opt4_hash, self.opt4_goto),
        ]
        .into_iter()
        .filter_map(|(hash, goto)| Some((hash?, goto?)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quest_row_defaults() {
        let row: QuestRow =
            parse_row("quest", "1001", &json!({"id": 1001, "title_hash": 5})).unwrap();
        assert_eq!(row.id, 1001);
        assert!(!row.hidden);
        assert!(row.steps.is_empty());
        assert!(row.chapter_id.is_none());
    }

    #[test]
    fn test_missing_id_is_malformed() {
        let parsed: Option<QuestRow> = parse_row("quest", "bad", &json!({"title_hash": 5}));
        assert!(parsed.is_none());
    }

    #[test]
    fn test_dialogue_edges_filter_zero_padding() {
        let row: DialogueRow = parse_row(
            "line",
            "7",
            &json!({"id": 7, "text_hash": 1, "next": [0, 8, 0, 9]}),
        )
        .unwrap();
        assert_eq!(row.edges().collect::<Vec<_>>(), vec![8, 9]);
    }

    #[test]
    fn test_message_choice_slots_are_independent() {
        let row: MessageRow = parse_row(
            "message",
            "m",
            &json!({
                "session_id": 3, "seq": 2, "kind": 2,
                "opt1_hash": 10, "opt1_goto": 4,
                "opt3_hash": 11, "opt3_goto": 1
            }),
        )
        .unwrap();
        assert_eq!(row.choice_slots(), vec![(10, 4), (11, 1)]);
    }
}
