//! Value types shared by the sync engine and its collaborators

use std::collections::HashMap;

/// One translatable unit read from a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringEntry {
    pub key: String,
    pub value: String,
}

impl StringEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        StringEntry {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One entry of an existing target file.
///
/// `value == None` is the explicit null marker: the translation was cleared on purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEntry {
    pub key: String,
    pub value: Option<String>,
}

impl TargetEntry {
    pub fn new(key: impl Into<String>, value: Option<&str>) -> Self {
        TargetEntry {
            key: key.into(),
            value: value.map(str::to_owned),
        }
    }
}

/// Ordered target entries with key lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSet {
    entries: Vec<TargetEntry>,
    index: HashMap<String, usize>,
}

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entry, keeping first-seen order
    pub fn insert(&mut self, key: &str, value: Option<&str>) {
        match self.index.get(key) {
            Some(&pos) => self.entries[pos].value = value.map(str::to_owned),
            None => {
                self.index.insert(key.to_owned(), self.entries.len());
                self.entries.push(TargetEntry::new(key, value));
            }
        }
    }

    /// `None` if the key is absent, `Some(None)` if it is explicitly null
    pub fn lookup(&self, key: &str) -> Option<Option<&str>> {
        self.index
            .get(key)
            .map(|&pos| self.entries[pos].value.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn entries(&self) -> &[TargetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<TargetEntry> for TargetSet {
    fn from_iter<I: IntoIterator<Item = TargetEntry>>(iter: I) -> Self {
        let mut set = TargetSet::new();
        for entry in iter {
            set.insert(&entry.key, entry.value.as_deref());
        }
        set
    }
}

/// One translated string returned by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub key: String,
    pub translated: String,
}

impl TranslationResult {
    pub fn new(key: impl Into<String>, translated: impl Into<String>) -> Self {
        TranslationResult {
            key: key.into(),
            translated: translated.into(),
        }
    }
}
