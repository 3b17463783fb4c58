//! Message session resolution
//!
//! The alternate engine: flat conversation rows are grouped by session id
//! and sequence id into ordered, typed stages. Edges here are explicit
//! jump targets carried on choices (and `next_seq` for narration), so the
//! graph may contain cycles by design - no visited-set guard is applied.
//! Cycle-aware rendering, if needed, is a presentation-layer concern.

use std::collections::{BTreeMap, HashMap};

use loredata::RecordSource;
use loredata::records::{
    MESSAGE_KIND_CHOICE, MESSAGE_KIND_NARRATION, MESSAGE_KIND_TERMINAL, MessageRow, parse_row,
};
use serde_json::Value;

use crate::error::Result;
use crate::model::{Choice, Message, PlayerOptions, Session, Stage};
use crate::npc;
use crate::render::TextRenderer;

/// Builds sessions on demand, one per distinct session id.
#[derive(Debug, Default)]
pub struct SessionResolver {
    /// All message rows grouped by session id, loaded on first request.
    rows: Option<HashMap<i64, Vec<MessageRow>>>,
    /// Sessions built so far.
    sessions: HashMap<i64, Session>,
    /// Role-id name table, shared shape with the quest engine.
    npc_names: Option<HashMap<i64, String>>,
}

impl SessionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a session by id, building it on first access.
    pub fn resolve_session<S: RecordSource>(
        &mut self,
        store: &S,
        renderer: &TextRenderer,
        id: i64,
    ) -> Result<Option<&Session>> {
        if !self.sessions.contains_key(&id) {
            self.ensure_rows(store)?;
            if self.npc_names.is_none() {
                self.npc_names = Some(npc::load_names(store, renderer)?);
            }
            let rows = self
                .rows
                .as_ref()
                .and_then(|grouped| grouped.get(&id))
                .cloned();
            let Some(rows) = rows else {
                return Ok(None);
            };
            let session = self.build_session(store, renderer, id, &rows)?;
            self.sessions.insert(id, session);
        }
        Ok(self.sessions.get(&id))
    }

    fn ensure_rows<S: RecordSource>(&mut self, store: &S) -> Result<()> {
        if self.rows.is_some() {
            return Ok(());
        }
        let mut grouped: HashMap<i64, Vec<MessageRow>> = HashMap::new();
        let mut count = 0usize;
        for (name, value) in store.get_all_records("message")? {
            // Message files hold either a single row or a flat row array.
            let items: Vec<&Value> = match &value {
                Value::Array(items) => items.iter().collect(),
                other => vec![other],
            };
            for item in items {
                let Some(row) = parse_row::<MessageRow>("message", &name, item) else {
                    continue;
                };
                grouped.entry(row.session_id).or_default().push(row);
                count += 1;
            }
        }
        tracing::debug!("message rows loaded: {count} rows, {} sessions", grouped.len());
        self.rows = Some(grouped);
        Ok(())
    }

    fn build_session<S: RecordSource>(
        &self,
        store: &S,
        renderer: &TextRenderer,
        id: i64,
        rows: &[MessageRow],
    ) -> Result<Session> {
        let mut by_seq: BTreeMap<i64, Vec<&MessageRow>> = BTreeMap::new();
        for row in rows {
            by_seq.entry(row.seq).or_default().push(row);
        }

        // Principal NPC: the first row naming one, in sequence order.
        let npc_id = by_seq
            .values()
            .flatten()
            .find_map(|row| row.npc_id);
        let npc_name = npc_id
            .and_then(|npc| self.npc_names.as_ref()?.get(&npc))
            .cloned()
            .unwrap_or_default();

        let mut stages = BTreeMap::new();
        let mut ended = false;
        for (&seq, stage_rows) in &by_seq {
            // Stage kind is the first row's discriminator.
            match stage_rows[0].kind {
                kind @ (MESSAGE_KIND_NARRATION | MESSAGE_KIND_TERMINAL) => {
                    let terminal = kind == MESSAGE_KIND_TERMINAL;
                    let mut messages = Vec::new();
                    for row in stage_rows {
                        if let Some(text) = renderer.render_opt(store, row.text_hash)? {
                            messages.push(Message {
                                from_npc: row.npc_id.is_some(),
                                text,
                            });
                        }
                    }
                    let next_seq = if terminal {
                        None
                    } else {
                        stage_rows.iter().rev().find_map(|row| row.next_seq)
                    };
                    if terminal {
                        ended = true;
                    }
                    stages.insert(
                        seq,
                        Stage {
                            seq,
                            messages,
                            options: None,
                            next_seq,
                            terminal,
                        },
                    );
                }
                MESSAGE_KIND_CHOICE => {
                    // Slots merge across every row sharing the sequence id,
                    // in row order then slot order.
                    let mut choices = Vec::new();
                    for row in stage_rows {
                        for (hash, goto) in row.choice_slots() {
                            if let Some(text) = renderer.render(store, hash)? {
                                choices.push(Choice { text, goto });
                            }
                        }
                    }
                    stages.insert(
                        seq,
                        Stage {
                            seq,
                            messages: Vec::new(),
                            options: Some(PlayerOptions { seq, choices }),
                            next_seq: None,
                            terminal: false,
                        },
                    );
                }
                other => {
                    tracing::warn!("session {id} stage {seq} has unknown kind {other}; skipped");
                }
            }
        }

        Ok(Session {
            id,
            npc_id,
            npc_name,
            stages,
            ended,
        })
    }
}
