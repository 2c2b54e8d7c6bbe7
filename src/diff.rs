//! Diff Engine: decides what each key needs
//!
//! Every key in the union of source keys and existing target keys gets exactly one
//! [`SyncAction`]. The decision depends only on that key's current source value, its
//! cache entry and its current target value, so the plan is deterministic and
//! re-running the engine on unchanged inputs yields the same plan.

use std::collections::HashSet;

use crate::cache::TranslationCache;
use crate::model::{StringEntry, TargetSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncAction {
    /// Source, cache and target agree; nothing to do
    Skip,
    /// New, changed, or cleared in the target; send to the provider
    Translate,
    /// Empty source string; target becomes empty without a provider call
    BypassEmpty,
    /// Key no longer exists in the source; drop it from target and cache
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAction {
    pub key: String,
    pub action: SyncAction,
}

/// The classified action list for one (source, target) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    /// Source keys in source order, then removed keys in target order
    pub actions: Vec<KeyAction>,
    /// No cache existed; the driver seeds one instead of translating
    pub cache_missing: bool,
}

impl SyncPlan {
    pub fn count(&self, action: SyncAction) -> usize {
        self.actions.iter().filter(|a| a.action == action).count()
    }

    pub fn keys(&self, action: SyncAction) -> impl Iterator<Item = &str> {
        self.actions
            .iter()
            .filter(move |a| a.action == action)
            .map(|a| a.key.as_str())
    }

    pub fn action_for(&self, key: &str) -> Option<SyncAction> {
        self.actions
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.action)
    }

    /// True when a cache exists and every key is `Skip`
    pub fn is_up_to_date(&self) -> bool {
        !self.cache_missing && self.actions.iter().all(|a| a.action == SyncAction::Skip)
    }
}

/// Classify every key
///
/// Rules, first match wins, for each source key:
///
/// 1. no cache at all → `Translate` (and the plan is flagged `cache_missing`)
/// 2. empty source → `BypassEmpty`, unless cache and target already agree on empty
/// 3. absent from cache, or cached source differs → `Translate`
/// 4. target value absent or null → `Translate`
/// 5. otherwise → `Skip`
///
/// Keys found only in the target are `Remove`.
pub fn classify(
    source: &[StringEntry],
    target: &TargetSet,
    cache: Option<&TranslationCache>,
) -> SyncPlan {
    let mut actions = Vec::with_capacity(source.len());
    let mut seen = HashSet::with_capacity(source.len());

    for entry in source {
        if !seen.insert(entry.key.as_str()) {
            continue;
        }
        let action = match cache {
            None => SyncAction::Translate,
            Some(cache) => classify_key(entry, target.lookup(&entry.key), cache),
        };
        actions.push(KeyAction {
            key: entry.key.clone(),
            action,
        });
    }

    for entry in target.entries() {
        if !seen.contains(entry.key.as_str()) {
            actions.push(KeyAction {
                key: entry.key.clone(),
                action: SyncAction::Remove,
            });
        }
    }

    SyncPlan {
        actions,
        cache_missing: cache.is_none(),
    }
}

fn classify_key(
    entry: &StringEntry,
    current_target: Option<Option<&str>>,
    cache: &TranslationCache,
) -> SyncAction {
    let cached = cache.get(&entry.key);
    let source_unchanged = cached.is_some_and(|c| c.source_value == entry.value);

    if entry.value.is_empty() {
        if source_unchanged && current_target == Some(Some("")) {
            return SyncAction::Skip;
        }
        return SyncAction::BypassEmpty;
    }
    if !source_unchanged {
        return SyncAction::Translate;
    }
    match current_target {
        Some(Some(_)) => SyncAction::Skip,
        // Cleared or deleted downstream: retranslate rather than trust the cached target
        Some(None) | None => SyncAction::Translate,
    }
}
