//! In-memory record store
//!
//! Primary test double and embedding point for hosts that already hold the
//! records. Insertion order is the document order reported by
//! `get_all_records`.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::Result;

use super::{RecordSource, declared_talk_id};

/// A record store over records held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: IndexMap<String, Value>,
    texts: HashMap<i64, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under a logical path (`"quest/1001"`).
    pub fn insert_record(&mut self, path: impl Into<String>, value: Value) {
        self.records.insert(path.into(), value);
    }

    /// Insert a localized string under a hash.
    pub fn insert_text(&mut self, hash: i64, text: impl Into<String>) {
        self.texts.insert(hash, text.into());
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn stem(path: &str) -> String {
        path.rsplit('/').next().unwrap_or(path).to_string()
    }
}

impl RecordSource for MemoryStore {
    fn get_record(&self, path: &str) -> Result<Option<Value>> {
        Ok(self.records.get(path).cloned())
    }

    fn get_all_records(&self, dir: &str) -> Result<Vec<(String, Value)>> {
        let prefix = format!("{dir}/");
        Ok(self
            .records
            .iter()
            .filter(|(path, _)| path.starts_with(&prefix))
            .map(|(path, value)| (Self::stem(path), value.clone()))
            .collect())
    }

    fn get_text(&self, hash: i64) -> Result<Option<String>> {
        Ok(self.texts.get(&hash).cloned())
    }

    fn get_talk_path_map(&self) -> Result<HashMap<i64, String>> {
        let mut map = HashMap::new();
        for (path, value) in &self.records {
            if !path.starts_with("talk/") {
                continue;
            }
            if let Some(id) = declared_talk_id(value) {
                map.entry(id).or_insert_with(|| path.clone());
            } else {
                tracing::warn!("talk record '{path}' declares no id; ignored");
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_get_all_records_is_prefix_scoped_and_ordered() {
        let mut store = MemoryStore::new();
        store.insert_record("quest/20", json!({"id": 20}));
        store.insert_record("quest/sub/10", json!({"id": 10}));
        store.insert_record("chapter/1", json!({"id": 1}));

        let names: Vec<String> = store
            .get_all_records("quest")
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["20".to_string(), "10".to_string()]);
    }

    #[test]
    fn test_talk_path_map_reads_declared_ids() {
        let mut store = MemoryStore::new();
        store.insert_record("talk/a", json!({"id": 900, "lines": []}));
        store.insert_record("talk/b", json!({"lines": []}));

        let map = store.get_talk_path_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&900), Some(&"talk/a".to_string()));
    }
}
