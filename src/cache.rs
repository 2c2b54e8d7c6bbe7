//! Translation Cache: the record of what was last synchronized
//!
//! One cache belongs to exactly one (source file, target file) pair. It remembers,
//! per key, the source value that was last translated and the translation produced
//! for it. Comparing the current source against it is how the diff engine tells a
//! changed string from an unchanged one.
//!
//! On disk a cache is a small JSON document:
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": {
//!     "fruit": { "sourceValue": "Apple", "targetValue": "Apfel" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

const CACHE_VERSION: u32 = 1;
const CACHE_FILE_PREFIX: &str = "transync-cache-";

/// Last known source/target pairing for one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub source_value: String,
    pub target_value: String,
}

impl CacheEntry {
    pub fn new(source_value: impl Into<String>, target_value: impl Into<String>) -> Self {
        CacheEntry {
            source_value: source_value.into(),
            target_value: target_value.into(),
        }
    }
}

/// Key-ordered mapping from string key to [`CacheEntry`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationCache {
    version: u32,
    entries: BTreeMap<String, CacheEntry>,
}

impl TranslationCache {
    pub fn new() -> Self {
        TranslationCache {
            version: CACHE_VERSION,
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn record(&mut self, key: &str, source_value: &str, target_value: &str) {
        self.entries
            .insert(key.to_owned(), CacheEntry::new(source_value, target_value));
    }

    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    /// Drop every entry whose key fails `keep`
    pub fn retain_keys(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|key, _| keep(key));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CacheEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Persistence for caches; one file per (source, target) pair
pub trait CacheStore: Send + Sync {
    /// `Ok(None)` when no cache exists yet
    fn read_cache(&self, path: &Path) -> SyncResult<Option<TranslationCache>>;

    fn write_cache(&self, path: &Path, cache: &TranslationCache) -> SyncResult<()>;
}

/// [`CacheStore`] backed by pretty-printed JSON files
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCacheStore;

impl CacheStore for JsonCacheStore {
    fn read_cache(&self, path: &Path) -> SyncResult<Option<TranslationCache>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SyncError::io(path, e)),
        };

        let cache: TranslationCache = serde_json::from_str(&content)
            .map_err(|e| SyncError::store(path, format!("malformed cache: {}", e)))?;
        if cache.version != CACHE_VERSION {
            return Err(SyncError::store(
                path,
                format!(
                    "unsupported cache version {} (expected {}); delete the file to regenerate it",
                    cache.version, CACHE_VERSION
                ),
            ));
        }
        Ok(Some(cache))
    }

    fn write_cache(&self, path: &Path, cache: &TranslationCache) -> SyncResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;
        }
        let mut text = serde_json::to_string_pretty(cache)
            .map_err(|e| SyncError::store(path, format!("failed to serialize cache: {}", e)))?;
        text.push('\n');
        fs::write(path, text).map_err(|e| SyncError::io(path, e))
    }
}

/// Cache file location for one (source, target) pair inside `cache_dir`
///
/// # Example
///
/// ```ignore
/// let path = cache_path_for(Path::new("cache"), Path::new("en/fruits.json"), Path::new("de/fruits.json"));
/// assert_eq!(path, PathBuf::from("cache/transync-cache-en_fruits.json__de_fruits.json.json"));
/// ```
pub fn cache_path_for(cache_dir: &Path, source: &Path, target: &Path) -> PathBuf {
    let name = format!(
        "{}{}__{}.json",
        CACHE_FILE_PREFIX,
        flatten_path(source),
        flatten_path(target)
    );
    cache_dir.join(name)
}

fn flatten_path(path: &Path) -> String {
    path.to_string_lossy()
        .trim_start_matches("./")
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_cache() -> TranslationCache {
        let mut cache = TranslationCache::new();
        cache.record("fruit", "Apple", "Apfel");
        cache.record("empty", "", "");
        cache.record("greeting", "Hello {name}", "Hallo {name}");
        cache
    }

    // ========== In-memory Tests ==========

    #[test]
    fn test_record_overwrites() {
        let mut cache = sample_cache();
        cache.record("fruit", "Pear", "Birne");
        assert_eq!(cache.get("fruit"), Some(&CacheEntry::new("Pear", "Birne")));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_retain_keys() {
        let mut cache = sample_cache();
        cache.retain_keys(|key| key != "empty");
        assert!(cache.get("empty").is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_iteration_is_key_ordered() {
        let cache = sample_cache();
        let keys: Vec<&str> = cache.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["empty", "fruit", "greeting"]);
    }

    // ========== Persistence Tests ==========

    #[test]
    fn test_json_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cache.json");
        let store = JsonCacheStore;

        store.write_cache(&path, &sample_cache()).unwrap();
        let loaded = store.read_cache(&path).unwrap();
        assert_eq!(loaded, Some(sample_cache()));
    }

    #[test]
    fn test_on_disk_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let mut cache = TranslationCache::new();
        cache.record("fruit", "Apple", "");
        JsonCacheStore.write_cache(&path, &cache).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["entries"]["fruit"]["sourceValue"], "Apple");
        assert_eq!(json["entries"]["fruit"]["targetValue"], "");
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let loaded = JsonCacheStore
            .read_cache(&dir.path().join("absent.json"))
            .unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_malformed_file_is_store_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{ not json").unwrap();
        match JsonCacheStore.read_cache(&path) {
            Err(SyncError::Store { message, .. }) => assert!(message.contains("malformed")),
            other => panic!("Expected Store error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_version_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, r#"{"version": 9, "entries": {}}"#).unwrap();
        assert!(JsonCacheStore.read_cache(&path).is_err());
    }

    // ========== Naming Tests ==========

    #[test]
    fn test_cache_path_per_pair() {
        let dir = Path::new("translate-cache");
        let de = cache_path_for(dir, Path::new("en/fruits.json"), Path::new("de/fruits.json"));
        let es = cache_path_for(dir, Path::new("en/fruits.json"), Path::new("es/fruits.json"));
        assert_eq!(
            de,
            PathBuf::from("translate-cache/transync-cache-en_fruits.json__de_fruits.json.json")
        );
        assert_ne!(de, es);
    }

    #[test]
    fn test_cache_path_strips_leading_dot_slash() {
        let path = cache_path_for(
            Path::new("c"),
            Path::new("./en.json"),
            Path::new("./de.json"),
        );
        assert_eq!(path, PathBuf::from("c/transync-cache-en.json__de.json.json"));
    }
}
