//! # LoreWeave
//!
//! Reconstructs navigable narrative graphs from the flat, ID-keyed record
//! store exposed by [`loredata`].
//!
//! ## What it builds
//!
//! - **Chapters and quests** - four-phase reference resolution with orphan
//!   grouping, so every quest lands in exactly one chapter
//! - **Dialogue trees** - branch/merge/cycle-safe expansion of talk graphs,
//!   with choice points nested and linear runs flattened
//! - **Message sessions** - ordered stage graphs with explicit jump targets,
//!   where cycles are legal
//! - **Text rendering** - gender-variant and nickname substitution, markup
//!   stripping, placeholder-text filtering
//!
//! ## Quick Start
//!
//! ```no_run
//! use loredata::FileStore;
//! use loreweave::Codex;
//!
//! let store = FileStore::open("gamedata/")?;
//! let mut codex = Codex::new(store);
//!
//! for chapter in codex.chapters()? {
//!     println!("{}: {} quests", chapter.title, chapter.quests.len());
//! }
//! # Ok::<(), loreweave::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `loreweave` command-line binary

pub mod dialogue;
pub mod error;
pub mod model;
pub mod npc;
pub mod quest;
pub mod render;
pub mod session;

use loredata::RecordSource;

use dialogue::TalkLocator;
use quest::QuestResolver;
use session::SessionResolver;

// Re-exports for convenience
pub use error::{Error, Result};
pub use model::{Chapter, DialogueNode, NodeKind, Quest, Session, Stage, Step};
pub use render::{Gender, TextRenderer};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::model::{
        Chapter, Choice, DialogueNode, Message, NodeKind, PlayerOptions, Quest, Session, Stage,
        Step,
    };
    pub use crate::npc::{ROLE_NARRATOR, ROLE_PLAYER};
    pub use crate::render::{Gender, TextRenderer};
    pub use crate::Codex;
    pub use loredata::{FileStore, MemoryStore, RecordSource};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Facade over the resolvers, sharing one store and one renderer.
///
/// Each subsystem caches what it builds, so repeated queries are cheap and
/// return the same data. The store is the only fallible dependency; every
/// error surfacing from here means the store itself failed, never that the
/// data was merely incomplete.
pub struct Codex<S: RecordSource> {
    store: S,
    renderer: TextRenderer,
    quests: QuestResolver,
    talks: TalkLocator,
    sessions: SessionResolver,
}

impl<S: RecordSource> Codex<S> {
    /// Wrap a store with default rendering settings.
    pub fn new(store: S) -> Self {
        Self::with_renderer(store, TextRenderer::default())
    }

    /// Wrap a store with a configured renderer.
    pub fn with_renderer(store: S, renderer: TextRenderer) -> Self {
        Self {
            store,
            renderer,
            quests: QuestResolver::new(),
            talks: TalkLocator::new(),
            sessions: SessionResolver::new(),
        }
    }

    /// All chapters with their quests attached, resolving on first call.
    pub fn chapters(&mut self) -> Result<&[Chapter]> {
        self.quests.resolve(&self.store, &self.renderer)?;
        Ok(self.quests.chapters())
    }

    /// Look up a single quest by id.
    pub fn quest(&mut self, id: i64) -> Result<Option<&Quest>> {
        self.quests.resolve(&self.store, &self.renderer)?;
        Ok(self.quests.quest(id))
    }

    /// Expand one quest step's talks into dialogue nodes.
    pub fn expand_step(&mut self, quest_id: i64, step_id: i64) -> Result<&[DialogueNode]> {
        self.quests.resolve(&self.store, &self.renderer)?;
        self.quests.expand_step(
            &self.store,
            &self.renderer,
            &mut self.talks,
            quest_id,
            step_id,
        )
    }

    /// Resolve a message session by id.
    pub fn session(&mut self, id: i64) -> Result<Option<&Session>> {
        self.sessions.resolve_session(&self.store, &self.renderer, id)
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
