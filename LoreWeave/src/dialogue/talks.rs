//! Talk source location
//!
//! A talk reference on a quest step may be defined in two places: embedded
//! in the quest file itself, or as a standalone file under the talk tree.
//! Embedded definitions with actual lines win; the standalone lookup goes
//! through a talk-id to path map the store builds once.

use std::collections::HashMap;

use loredata::RecordSource;
use loredata::records::{DialogueRow, TalkBlock, parse_row};

use crate::error::Result;

/// Locates the dialogue-line records behind a talk reference id.
///
/// The global path map is fetched from the store on first standalone lookup
/// and kept for the locator's lifetime.
#[derive(Debug, Default)]
pub struct TalkLocator {
    path_map: Option<HashMap<i64, String>>,
}

impl TalkLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a talk reference to its line records.
    ///
    /// Precedence: an embedded talk with this id and a non-empty line list,
    /// then a standalone file registered in the path map. Neither matching
    /// resolves to no dialogue - many finish conditions reference talks that
    /// were authored but never wired up.
    pub fn lines<S: RecordSource>(
        &mut self,
        store: &S,
        talk_id: i64,
        embedded: &[TalkBlock],
    ) -> Result<Vec<DialogueRow>> {
        if let Some(talk) = embedded
            .iter()
            .find(|talk| talk.id == talk_id && !talk.lines.is_empty())
        {
            return Ok(talk.lines.clone());
        }

        if self.path_map.is_none() {
            let map = store.get_talk_path_map()?;
            tracing::debug!("talk path map fetched: {} talks", map.len());
            self.path_map = Some(map);
        }

        if let Some(path) = self.path_map.as_ref().and_then(|map| map.get(&talk_id))
            && let Some(value) = store.get_record(path)?
            && let Some(talk) = parse_row::<TalkBlock>("talk", path, &value)
        {
            return Ok(talk.lines);
        }

        Ok(Vec::new())
    }
}
