//! File-backed record store
//!
//! Maps a data root directory of JSON files to logical record paths and
//! caches everything it reads for the lifetime of the store.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use crate::error::{Error, Result};

use super::{RecordSource, declared_talk_id};

/// Name of the localization table file at the data root.
const TEXT_MAP_FILE: &str = "textmap.json";

/// Logical directory holding standalone talk files.
const TALK_DIR: &str = "talk";

/// A record store over a JSON data tree on disk.
///
/// Single-threaded by design: caches live behind `RefCell` and resolution
/// is assumed to run one pass at a time per instance. A host embedding this
/// in a concurrent server must serialize access per instance.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    /// Parsed records by logical path.
    records: RefCell<HashMap<String, Value>>,
    /// Localization table, loaded on first text lookup.
    texts: RefCell<Option<HashMap<i64, String>>>,
    /// Talk-id to logical-path map, built on first request.
    talk_paths: RefCell<Option<HashMap<i64, String>>>,
}

impl FileStore {
    /// Open a store over a data root directory.
    ///
    /// # Errors
    /// Returns [`Error::RootNotFound`] if the directory does not exist.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(Error::RootNotFound(root));
        }
        Ok(Self {
            root,
            records: RefCell::new(HashMap::new()),
            texts: RefCell::new(None),
            talk_paths: RefCell::new(None),
        })
    }

    /// The data root this store reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_for(&self, path: &str) -> PathBuf {
        self.root.join(format!("{path}.json"))
    }

    /// Collect `(logical_path, stem)` pairs for every JSON file under a
    /// logical directory, ordered by path.
    fn list_dir(&self, dir: &str) -> Result<Vec<(String, String)>> {
        let base = self.root.join(dir);
        if !base.is_dir() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in WalkDir::new(&base).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            let path = entry.path();
            if !path.is_file() || path.extension().is_none_or(|e| e != "json") {
                continue;
            }
            let rel = path
                .strip_prefix(&self.root)
                .unwrap_or(path)
                .with_extension("");
            let logical = rel.to_string_lossy().replace('\\', "/");
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            entries.push((logical, stem));
        }
        entries.sort();
        Ok(entries)
    }

    fn load_text_map(&self) -> Result<HashMap<i64, String>> {
        let path = self.root.join(TEXT_MAP_FILE);
        if !path.is_file() {
            tracing::warn!("no {TEXT_MAP_FILE} at {}; all text lookups will miss", self.root.display());
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(&path)?;
        let parsed: HashMap<String, String> =
            serde_json::from_str(&raw).map_err(|e| Error::TextMapUnreadable(e.to_string()))?;

        let mut table = HashMap::with_capacity(parsed.len());
        for (key, text) in parsed {
            match key.parse::<i64>() {
                Ok(hash) => {
                    table.insert(hash, text);
                }
                Err(_) => tracing::warn!("skipping non-numeric text hash '{key}'"),
            }
        }
        tracing::debug!("text map loaded: {} entries", table.len());
        Ok(table)
    }

    fn build_talk_path_map(&self) -> Result<HashMap<i64, String>> {
        let mut map = HashMap::new();
        for (logical, stem) in self.list_dir(TALK_DIR)? {
            let Some(value) = self.get_record(&logical)? else {
                continue;
            };
            match declared_talk_id(&value) {
                Some(id) => {
                    if map.contains_key(&id) {
                        tracing::debug!("talk id {id} declared again by {logical}; keeping first");
                    } else {
                        map.insert(id, logical);
                    }
                }
                None => tracing::warn!("talk file '{stem}' declares no id; ignored"),
            }
        }
        tracing::debug!("talk path map built: {} talks", map.len());
        Ok(map)
    }
}

impl RecordSource for FileStore {
    fn get_record(&self, path: &str) -> Result<Option<Value>> {
        if let Some(value) = self.records.borrow().get(path) {
            return Ok(Some(value.clone()));
        }
        let file = self.file_for(path);
        if !file.is_file() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&file)?;
        let value: Value = serde_json::from_str(&raw).map_err(|e| Error::Json {
            path: file,
            source: e,
        })?;
        self.records
            .borrow_mut()
            .insert(path.to_string(), value.clone());
        Ok(Some(value))
    }

    fn get_all_records(&self, dir: &str) -> Result<Vec<(String, Value)>> {
        let mut records = Vec::new();
        for (logical, stem) in self.list_dir(dir)? {
            // Partial failure: one unparseable file never blocks the batch.
            match self.get_record(&logical) {
                Ok(Some(value)) => records.push((stem, value)),
                Ok(None) => {}
                Err(Error::Json { path, source }) => {
                    tracing::warn!("skipping unparseable record {}: {source}", path.display());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    fn get_text(&self, hash: i64) -> Result<Option<String>> {
        if self.texts.borrow().is_none() {
            let table = self.load_text_map()?;
            *self.texts.borrow_mut() = Some(table);
        }
        let texts = self.texts.borrow();
        Ok(texts
            .as_ref()
            .and_then(|table| table.get(&hash))
            .cloned())
    }

    fn get_talk_path_map(&self) -> Result<HashMap<i64, String>> {
        if self.talk_paths.borrow().is_none() {
            let map = self.build_talk_path_map()?;
            *self.talk_paths.borrow_mut() = Some(map);
        }
        Ok(self.talk_paths.borrow().clone().unwrap_or_default())
    }
}
