//! Resolved graph types
//!
//! Everything here is built once by the resolvers and handed out as
//! read-only views; downstream formatters and API layers never mutate it.
//! Text fields are already rendered and already validated - a record that
//! failed validation never produced a node.

use std::collections::BTreeMap;

use serde::Serialize;

/// A titled grouping of quests, authored or synthesized for orphans.
#[derive(Debug, Clone, Serialize)]
pub struct Chapter {
    pub id: i64,
    pub title: String,
    /// Optional chapter code text (e.g. an act number string).
    pub code: Option<String>,
    /// Series ids this chapter declares as entry points.
    pub entry_series: Vec<i64>,
    /// Classification tag ("main", "side", "event", ...).
    pub tag: Option<String>,
    /// True for placeholder chapters created by the orphan grouper.
    pub synthetic: bool,
    /// Quests attached to this chapter, ascending by id.
    pub quests: Vec<Quest>,
}

/// A single authored mission with an ordered sequence of steps.
#[derive(Debug, Clone, Serialize)]
pub struct Quest {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Resolved chapter reference; `None` only before orphan grouping.
    pub chapter_id: Option<i64>,
    pub chapter_title: Option<String>,
    pub series_id: Option<i64>,
    pub tag: Option<String>,
    pub steps: Vec<Step>,
    /// Source filename, used to break ties between duplicate quest ids.
    pub source: String,
}

/// One sub-objective within a quest, optionally carrying dialogue.
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Dialogue expanded so far: eager embedded content first, lazily
    /// resolved talks appended on request.
    pub nodes: Vec<DialogueNode>,
    /// Talk ids not yet expanded; resolved when dialogue is requested.
    pub pending_talks: Vec<i64>,
    /// Guard for the lazy expansion; set once per step.
    pub expanded: bool,
}

/// The kind of a dialogue node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    /// A spoken line.
    Dialogue,
    /// A mutually exclusive player choice.
    Option,
    /// A black-screen narration line.
    Narration,
}

/// One unit of rendered conversation.
///
/// `options` holds mutually exclusive branches only - plain linear
/// continuation is flattened into the parent list, never nested. Downstream
/// formatting depends on that distinction.
#[derive(Debug, Clone, Serialize)]
pub struct DialogueNode {
    pub kind: NodeKind,
    pub speaker: String,
    pub text: String,
    /// Id of the source record this node was rendered from.
    pub node_id: i64,
    pub options: Vec<DialogueNode>,
}

/// A branching conversation outside the quest system.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: i64,
    /// Principal NPC of the session, when any row names one.
    pub npc_id: Option<i64>,
    pub npc_name: String,
    /// Stages keyed by sequence id; iteration order is ascending.
    pub stages: BTreeMap<i64, Stage>,
    /// True once a terminal stage was seen.
    pub ended: bool,
}

/// One addressable point in a session's graph.
#[derive(Debug, Clone, Serialize)]
pub struct Stage {
    pub seq: i64,
    pub messages: Vec<Message>,
    pub options: Option<PlayerOptions>,
    /// Explicit jump target for narration stages.
    pub next_seq: Option<i64>,
    pub terminal: bool,
}

/// One rendered message within a stage.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// True when the row named an NPC; false for plain narration.
    pub from_npc: bool,
    pub text: String,
}

/// The choice block of a player-choice stage.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerOptions {
    /// Sequence id of the owning stage.
    pub seq: i64,
    pub choices: Vec<Choice>,
}

/// One selectable option; the jump target may point backward or sideways,
/// session graphs need not be acyclic.
#[derive(Debug, Clone, Serialize)]
pub struct Choice {
    pub text: String,
    pub goto: i64,
}
