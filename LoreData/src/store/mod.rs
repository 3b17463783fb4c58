//! Record store access
//!
//! Resolvers consume records through the [`RecordSource`] trait and never
//! touch the filesystem themselves. Two implementations are provided:
//! [`FileStore`] over a JSON data tree on disk, and [`MemoryStore`] for
//! embedding and tests.

mod file;
mod memory;

use std::collections::HashMap;

use serde_json::Value;

use crate::error::Result;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Read-only access to parsed records by logical path.
///
/// Logical paths use `/` separators and no extension (`"quest/1001"`).
/// All methods are memoized by implementations where loading is expensive;
/// the engine assumes at most one resolution pass is active per instance.
pub trait RecordSource {
    /// Fetch a single record, or `None` if it does not exist.
    fn get_record(&self, path: &str) -> Result<Option<Value>>;

    /// Fetch every record under a logical directory, recursively, as ordered
    /// `(filename, record)` pairs. The filename is the file stem and serves
    /// as the record's provenance marker.
    fn get_all_records(&self, dir: &str) -> Result<Vec<(String, Value)>>;

    /// Look up a raw localized string by hash.
    fn get_text(&self, hash: i64) -> Result<Option<String>>;

    /// The talk-id to logical-path map, built once by scanning the talk tree
    /// and reading each file's declared id.
    fn get_talk_path_map(&self) -> Result<HashMap<i64, String>>;
}

/// Read the declared `id` field out of a talk file record.
fn declared_talk_id(value: &Value) -> Option<i64> {
    value.get("id").and_then(Value::as_i64)
}
