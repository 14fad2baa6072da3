//! Session-keyed spreadsheet cache.
//!
//! One entry per session under the key `gsheets_<session_id>`. An entry is
//! valid only while its timestamp equals the config's — equality, not
//! recency; the host bumps the token to start a new logical session.
//! Entries are never evicted.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Cached spreadsheet binding for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub id: String,
    pub timestamp: i64,
}

/// Cache key for a session id.
pub fn cache_key(session_id: &str) -> String {
    format!("gsheets_{}", session_id)
}

/// Storage for session → spreadsheet bindings.
///
/// Injectable so the locking and any future TTL policy stay isolated and
/// testable. `get`-then-`set` is only race-free under the export service's
/// session lock — that lock is in-process; concurrent processes sharing a
/// file store can still race.
pub trait SpreadsheetCache: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheEntry>;
    fn set(&self, key: &str, entry: &CacheEntry) -> Result<(), String>;
}

/// File-backed cache: one JSON file per key under
/// `<config_dir>/gridsheets/spreadsheets/`.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Cache rooted at the user config directory.
    pub fn new() -> Result<Self, String> {
        let dir = dirs::config_dir()
            .ok_or("Could not determine config directory")?
            .join("gridsheets")
            .join("spreadsheets");
        Ok(Self { dir })
    }

    /// Cache rooted at an explicit directory (tests, embeddings).
    pub fn at(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Session ids are host-supplied; keep the filename safe
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '-' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

impl SpreadsheetCache for FileCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        let contents = fs::read_to_string(self.path_for(key)).ok()?;
        serde_json::from_str(&contents).ok()
    }

    fn set(&self, key: &str, entry: &CacheEntry) -> Result<(), String> {
        fs::create_dir_all(&self.dir).map_err(|e| e.to_string())?;
        let json = serde_json::to_string_pretty(entry).map_err(|e| e.to_string())?;
        fs::write(self.path_for(key), json).map_err(|e| e.to_string())
    }
}

/// In-memory cache for tests and single-process embeddings.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpreadsheetCache for MemoryCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, entry: &CacheEntry) -> Result<(), String> {
        self.entries
            .lock()
            .map_err(|_| "cache lock poisoned".to_string())?
            .insert(key.to_string(), entry.clone());
        Ok(())
    }
}
