//! NPC name table
//!
//! Role ids on dialogue lines resolve through this table. The two reserved
//! system roles are seeded into it at load time so the walker consults one
//! table instead of carrying hard-coded display names.

use std::collections::HashMap;

use loredata::RecordSource;
use loredata::records::{NpcRow, parse_row};

use crate::error::Result;
use crate::render::TextRenderer;

/// Reserved role id for the protagonist; renders as the configured nickname.
pub const ROLE_PLAYER: i64 = -1;

/// Reserved role id for black-screen narration lines.
pub const ROLE_NARRATOR: i64 = -666;

/// Load the role-id name table and seed the reserved system roles.
pub(crate) fn load_names<S: RecordSource>(
    store: &S,
    renderer: &TextRenderer,
) -> Result<HashMap<i64, String>> {
    let mut names = HashMap::new();
    for (name, value) in store.get_all_records("npc")? {
        let Some(row) = parse_row::<NpcRow>("npc", &name, &value) else {
            continue;
        };
        if let Some(text) = renderer.render(store, row.name_hash)? {
            names.insert(row.id, text);
        }
    }
    names
        .entry(ROLE_PLAYER)
        .or_insert_with(|| renderer.nickname().to_string());
    // Narration carries no speaker name.
    names.entry(ROLE_NARRATOR).or_default();
    tracing::debug!("npc name table loaded: {} roles", names.len());
    Ok(names)
}
