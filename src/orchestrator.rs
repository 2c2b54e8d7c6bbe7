//! Translation Orchestrator: one translation pass for one target language
//!
//! Collects every `Translate` key into a single batch, protects placeholders,
//! calls the provider once, and merges the results into a fresh target set and
//! cache. Inputs are borrowed and never mutated: on any provider failure the
//! caller still holds the untouched previous state and nothing gets written.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::cache::TranslationCache;
use crate::diff::{SyncAction, SyncPlan};
use crate::error::{SyncError, SyncResult};
use crate::matcher::{InterpolationMatcher, Placeholder};
use crate::model::{StringEntry, TargetSet};
use crate::mt::{ServiceArgs, ServiceError, TranslationService};

/// Languages and provider settings for one pass
#[derive(Debug, Clone, Copy)]
pub struct PassContext<'a> {
    /// Provider id, as selected by the user
    pub service_id: &'a str,
    pub service_config: Option<&'a str>,
    pub src_lng: &'a str,
    pub target_lng: &'a str,
    pub matcher: &'a InterpolationMatcher,
}

/// Per-action tallies for the run summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncCounts {
    /// Strings sent to the provider
    pub translated: usize,
    /// Empty strings written without a provider call
    pub bypassed: usize,
    /// Translated or bypassed keys that were absent from the previous target
    pub added: usize,
    /// Translated or bypassed keys that already existed in the previous target (null included)
    pub updated: usize,
    /// Keys dropped because they left the source
    pub removed: usize,
}

/// Result of a successful pass, ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationOutcome {
    /// Complete target contents, in source order
    pub target: Vec<StringEntry>,
    pub cache: TranslationCache,
    pub counts: SyncCounts,
    /// Keys whose placeholders did not survive translation intact
    pub placeholder_warnings: Vec<String>,
}

/// Execute `plan` against `service`
///
/// The provider is invoked at most once, and not at all when no key needs translation.
///
/// # Arguments
///
/// * `plan` - Per-key actions from [`classify`](crate::diff::classify)
/// * `source` - Source strings, in document order
/// * `target` - Current target contents
/// * `cache` - Cache loaded for this (source, target) pair
/// * `service` - Provider to call; may be `None` when the plan translates nothing
/// * `ctx` - Languages, matcher and service id of the pass
///
/// # Returns
///
/// The new target, the new cache and the counts for the summary lines. Nothing is
/// written here.
///
/// # Errors
///
/// * `SyncError::Service` - If the provider fails or omits a requested key
pub async fn translate_plan(
    plan: &SyncPlan,
    source: &[StringEntry],
    target: &TargetSet,
    cache: &TranslationCache,
    service: Option<&dyn TranslationService>,
    ctx: &PassContext<'_>,
) -> SyncResult<TranslationOutcome> {
    let actions: HashMap<&str, SyncAction> = plan
        .actions
        .iter()
        .map(|a| (a.key.as_str(), a.action))
        .collect();

    let mut request = Vec::new();
    let mut placeholders: HashMap<&str, Vec<Placeholder>> = HashMap::new();
    for entry in source {
        if actions.get(entry.key.as_str()) != Some(&SyncAction::Translate)
            || placeholders.contains_key(entry.key.as_str())
        {
            continue;
        }
        let extraction = ctx.matcher.extract(&entry.value);
        request.push(StringEntry::new(entry.key.clone(), extraction.stripped));
        placeholders.insert(entry.key.as_str(), extraction.placeholders);
    }

    let mut translated = if request.is_empty() {
        HashMap::new()
    } else {
        let service = service.ok_or_else(|| {
            SyncError::config(format!(
                "'{}' has strings to translate but no service was provided",
                ctx.target_lng
            ))
        })?;
        invoke(service, &request, ctx).await?
    };

    let mut counts = SyncCounts {
        translated: request.len(),
        ..SyncCounts::default()
    };
    let mut new_cache = cache.clone();
    let mut new_target = Vec::with_capacity(source.len());
    let mut placeholder_warnings = Vec::new();
    let mut written = HashSet::new();

    for entry in source {
        let key = entry.key.as_str();
        if !written.insert(key) {
            continue;
        }
        let value = match actions.get(key).copied() {
            Some(SyncAction::Translate) => {
                let raw = translated.remove(key).unwrap_or_default();
                let tokens = placeholders.get(key).map(Vec::as_slice).unwrap_or_default();
                let reinsertion = ctx.matcher.reinsert(&raw, tokens);
                if !reinsertion.is_clean() {
                    warn!(
                        key,
                        target_lng = ctx.target_lng,
                        missing = ?reinsertion.missing,
                        unexpected = reinsertion.unexpected,
                        "placeholder mismatch after translation"
                    );
                    placeholder_warnings.push(key.to_string());
                }
                tally(&mut counts, target, key);
                new_cache.record(key, &entry.value, &reinsertion.value);
                reinsertion.value
            }
            Some(SyncAction::BypassEmpty) => {
                counts.bypassed += 1;
                tally(&mut counts, target, key);
                new_cache.record(key, &entry.value, "");
                String::new()
            }
            _ => target
                .lookup(key)
                .flatten()
                .unwrap_or_default()
                .to_string(),
        };
        new_target.push(StringEntry::new(key, value));
    }

    for key in plan.keys(SyncAction::Remove) {
        counts.removed += 1;
        new_cache.remove(key);
    }
    new_cache.retain_keys(|key| written.contains(key));

    debug!(
        target_lng = ctx.target_lng,
        ?counts,
        "translation pass merged"
    );

    Ok(TranslationOutcome {
        target: new_target,
        cache: new_cache,
        counts,
        placeholder_warnings,
    })
}

/// Count `key` as added or updated
fn tally(counts: &mut SyncCounts, previous: &TargetSet, key: &str) {
    if previous.contains_key(key) {
        counts.updated += 1;
    } else {
        counts.added += 1;
    }
}

/// Call the provider once and index its answer by key, insisting on full coverage
async fn invoke(
    service: &dyn TranslationService,
    request: &[StringEntry],
    ctx: &PassContext<'_>,
) -> SyncResult<HashMap<String, String>> {
    let service_error = |source: ServiceError| SyncError::Service {
        service: ctx.service_id.to_string(),
        target_lng: ctx.target_lng.to_string(),
        source,
    };

    let args = ServiceArgs {
        strings: request,
        src_lng: ctx.src_lng,
        target_lng: ctx.target_lng,
        service_config: ctx.service_config,
        matcher: ctx.matcher,
    };
    debug!(
        service = service.provider_name(),
        inputs = request.len(),
        "invoking translation service"
    );
    let results = service
        .translate_strings(&args)
        .await
        .map_err(service_error)?;

    let mut by_key: HashMap<String, String> = results
        .into_iter()
        .map(|r| (r.key, r.translated))
        .collect();
    if let Some(missing) = request.iter().find(|r| !by_key.contains_key(&r.key)) {
        return Err(service_error(ServiceError::IncompleteResult {
            key: missing.key.clone(),
        }));
    }
    by_key.retain(|key, _| request.iter().any(|r| &r.key == key));
    Ok(by_key)
}
