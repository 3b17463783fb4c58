//! Text rendering
//!
//! Resolves a localized string hash to final display text: gender-branch
//! selection, placeholder substitution, rich-text tag stripping. Source data
//! contains strings for hidden, test and unreleased content; the renderer
//! signals those so the owning node can be pruned instead of displayed.

use lazy_static::lazy_static;
use loredata::RecordSource;
use regex::{Captures, Regex};

use crate::error::Result;

lazy_static! {
    /// Gender branch: `{M#text}` / `{F#text}`.
    static ref GENDER_RE: Regex = Regex::new(r"\{([MF])#([^}]*)\}").unwrap();
    /// Rich-text markup: `<color=#abc>`, `</color>`, `<i>`, ...
    static ref TAG_RE: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// Markers that flag a string as not legitimate display text.
const INVALID_MARKERS: [&str; 3] = ["[test]", "[hidden]", "[unreleased]"];

/// Protagonist name placeholder.
const NICKNAME_TOKEN: &str = "{NICKNAME}";

/// Name used when the reader never picked one.
pub const DEFAULT_NICKNAME: &str = "Adventurer";

/// Protagonist gender, used to pick gender-branched text variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gender {
    Male,
    #[default]
    Female,
}

impl Gender {
    fn marker(self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

/// Renders localized string hashes into final display text.
///
/// Configuration only; the localization table itself stays in the record
/// store and is passed into each call.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    gender: Gender,
    nickname: String,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new(Gender::default(), DEFAULT_NICKNAME)
    }
}

impl TextRenderer {
    pub fn new(gender: Gender, nickname: impl Into<String>) -> Self {
        Self {
            gender,
            nickname: nickname.into(),
        }
    }

    /// The configured protagonist name.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Resolve a hash to display text.
    ///
    /// Returns `Ok(None)` when the hash is unknown, the string carries an
    /// invalid-content marker, or nothing is left after processing - the
    /// caller must discard whatever owns the text.
    pub fn render<S: RecordSource>(&self, store: &S, hash: i64) -> Result<Option<String>> {
        let Some(raw) = store.get_text(hash)? else {
            return Ok(None);
        };
        if Self::is_invalid(&raw) {
            tracing::debug!("text {hash} carries an invalid-content marker; pruned");
            return Ok(None);
        }
        let text = self.apply(&raw);
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(text))
    }

    /// Resolve an optional hash; `None` in, `None` out.
    pub fn render_opt<S: RecordSource>(
        &self,
        store: &S,
        hash: Option<i64>,
    ) -> Result<Option<String>> {
        match hash {
            Some(hash) => self.render(store, hash),
            None => Ok(None),
        }
    }

    /// Whether a raw string is flagged as hidden/test/unreleased content.
    fn is_invalid(raw: &str) -> bool {
        let lower = raw.to_lowercase();
        INVALID_MARKERS.iter().any(|marker| lower.contains(marker))
    }

    /// The processing pipeline: gender branches, placeholders, tag stripping.
    fn apply(&self, raw: &str) -> String {
        let marker = self.gender.marker();
        let gendered = GENDER_RE.replace_all(raw, |caps: &Captures<'_>| {
            if &caps[1] == marker {
                caps[2].to_string()
            } else {
                String::new()
            }
        });
        let named = gendered.replace(NICKNAME_TOKEN, &self.nickname);
        TAG_RE.replace_all(&named, "").into_owned()
    }
}
