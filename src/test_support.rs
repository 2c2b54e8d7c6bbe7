//! In-memory stores for driver tests
//!
//! [`MemoryStore`] implements both [`ResourceStore`] and [`CacheStore`] and counts
//! every write, so tests can assert that a pass touched nothing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::cache::{CacheStore, TranslationCache};
use crate::error::SyncResult;
use crate::model::{StringEntry, TargetSet};
use crate::resource::{ResourceLocation, ResourceStore};

type Entries = Vec<(String, Option<String>)>;

#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<PathBuf, Entries>>,
    caches: Mutex<HashMap<PathBuf, TranslationCache>>,
    target_writes: AtomicUsize,
    cache_writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_file(&self, path: &str, entries: &[(&str, Option<&str>)]) {
        let entries = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect();
        self.files.lock().unwrap().insert(PathBuf::from(path), entries);
    }

    /// Shorthand for a file without null values
    pub fn put_strings(&self, path: &str, entries: &[(&str, &str)]) {
        let entries: Vec<(&str, Option<&str>)> =
            entries.iter().map(|(k, v)| (*k, Some(*v))).collect();
        self.put_file(path, &entries);
    }

    pub fn file(&self, path: &str) -> Option<Entries> {
        self.files.lock().unwrap().get(Path::new(path)).cloned()
    }

    pub fn put_cache(&self, path: &Path, cache: TranslationCache) {
        self.caches.lock().unwrap().insert(path.to_path_buf(), cache);
    }

    pub fn cache(&self, path: &Path) -> Option<TranslationCache> {
        self.caches.lock().unwrap().get(path).cloned()
    }

    pub fn target_writes(&self) -> usize {
        self.target_writes.load(Ordering::SeqCst)
    }

    pub fn cache_writes(&self) -> usize {
        self.cache_writes.load(Ordering::SeqCst)
    }

    pub fn total_writes(&self) -> usize {
        self.target_writes() + self.cache_writes()
    }
}

impl ResourceStore for MemoryStore {
    fn read_source(&self, location: &ResourceLocation) -> SyncResult<Option<Vec<StringEntry>>> {
        Ok(self.files.lock().unwrap().get(&location.path).map(|entries| {
            entries
                .iter()
                .map(|(k, v)| StringEntry::new(k.as_str(), v.clone().unwrap_or_default()))
                .collect()
        }))
    }

    fn read_target(&self, location: &ResourceLocation) -> SyncResult<Option<TargetSet>> {
        Ok(self.files.lock().unwrap().get(&location.path).map(|entries| {
            let mut set = TargetSet::new();
            for (k, v) in entries {
                set.insert(k, v.as_deref());
            }
            set
        }))
    }

    fn write_target(&self, location: &ResourceLocation, entries: &[StringEntry]) -> SyncResult<()> {
        self.target_writes.fetch_add(1, Ordering::SeqCst);
        let entries = entries
            .iter()
            .map(|e| (e.key.clone(), Some(e.value.clone())))
            .collect();
        self.files
            .lock()
            .unwrap()
            .insert(location.path.clone(), entries);
        Ok(())
    }
}

impl CacheStore for MemoryStore {
    fn read_cache(&self, path: &Path) -> SyncResult<Option<TranslationCache>> {
        Ok(self.cache(path))
    }

    fn write_cache(&self, path: &Path, cache: &TranslationCache) -> SyncResult<()> {
        self.cache_writes.fetch_add(1, Ordering::SeqCst);
        self.put_cache(path, cache.clone());
        Ok(())
    }
}
