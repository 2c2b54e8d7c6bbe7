//! Sync Driver: one pass per (source, target language) pair
//!
//! ```text
//! LoadState ─> Diff ─┬─> NoOp       (cache present, every key Skip)
//!                    ├─> CacheSeed  (no cache: write one, translate nothing)
//!                    └─> Translate ─> Persist (target first, then cache)
//! ```
//!
//! Every pass is described by an explicit [`SyncPass`]; the driver keeps no state
//! between passes apart from the lazily constructed providers.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{CacheStore, JsonCacheStore, TranslationCache};
use crate::diff::{SyncAction, classify};
use crate::error::{SyncError, SyncResult};
use crate::matcher::InterpolationMatcher;
use crate::model::{StringEntry, TargetSet};
use crate::mt::{ServiceError, ServiceRegistry, validate_locale};
use crate::orchestrator::{PassContext, SyncCounts, translate_plan};
use crate::resource::{FileResourceStore, ResourceLocation, ResourceStore};

/// Everything one pass needs to know
#[derive(Debug, Clone)]
pub struct SyncPass {
    pub source: ResourceLocation,
    pub target: ResourceLocation,
    pub cache_path: PathBuf,
    pub src_lng: String,
    pub target_lng: String,
    /// Provider id in the [`ServiceRegistry`]
    pub service: String,
    pub service_config: Option<String>,
    pub matcher: InterpolationMatcher,
}

impl SyncPass {
    /// Reject a pass that cannot possibly succeed, before any file is read
    pub fn validate(&self) -> SyncResult<()> {
        ServiceRegistry::validate(&self.service)?;
        check_locale(&self.src_lng)?;
        check_locale(&self.target_lng)?;
        if self.source.path == self.target.path {
            return Err(SyncError::config(format!(
                "target file '{}' is the source file",
                self.target.path.display()
            )));
        }
        Ok(())
    }
}

fn check_locale(code: &str) -> SyncResult<()> {
    validate_locale(code).map_err(|e| match e {
        ServiceError::Config(message) => SyncError::Config(message),
        other => SyncError::config(other.to_string()),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing changed; no file was written
    UpToDate,
    /// No cache existed; a fresh one was written and the target left alone
    CacheSeeded,
    Translated(SyncCounts),
}

/// What a finished pass did, with the summary lines for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub target: PathBuf,
    pub target_lng: String,
    pub outcome: SyncOutcome,
    pub lines: Vec<String>,
}

pub struct SyncDriver {
    services: ServiceRegistry,
    resources: Arc<dyn ResourceStore>,
    caches: Arc<dyn CacheStore>,
}

impl Default for SyncDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncDriver {
    /// Driver backed by JSON files on disk
    pub fn new() -> Self {
        SyncDriver {
            services: ServiceRegistry::new(),
            resources: Arc::new(FileResourceStore),
            caches: Arc::new(JsonCacheStore),
        }
    }

    pub fn with_resource_store(mut self, resources: Arc<dyn ResourceStore>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_cache_store(mut self, caches: Arc<dyn CacheStore>) -> Self {
        self.caches = caches;
        self
    }

    /// Providers constructed so far
    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// Run one pass
    ///
    /// # Errors
    ///
    /// * `SyncError::Config` - If the pass is invalid or the provider cannot be built
    /// * `SyncError::Service` - If the provider fails; nothing is written
    /// * `SyncError::Store` / `SyncError::Io` - If a file cannot be read or written
    pub async fn sync(&mut self, pass: &SyncPass) -> SyncResult<SyncReport> {
        pass.validate()?;
        info!(
            source = %pass.source.path.display(),
            target_file = %pass.target.path.display(),
            target_lng = %pass.target_lng,
            "starting sync pass"
        );

        let source = self.resources.read_source(&pass.source)?.unwrap_or_default();
        let target = self.resources.read_target(&pass.target)?.unwrap_or_default();
        let cache = self.caches.read_cache(&pass.cache_path)?;
        debug!(
            source_keys = source.len(),
            target_keys = target.len(),
            cached = cache.as_ref().map(TranslationCache::len),
            "state loaded"
        );

        let plan = classify(&source, &target, cache.as_ref());
        let Some(cache) = cache else {
            return self.seed_cache(pass, &source, &target);
        };
        if plan.is_up_to_date() {
            debug!(target_file = %pass.target.path.display(), "nothing to do");
            return Ok(self.report(
                pass,
                SyncOutcome::UpToDate,
                vec![format!(
                    "Target is up-to-date: '{}'",
                    pass.target.path.display()
                )],
            ));
        }

        let pending = plan.count(SyncAction::Translate);
        let service = if pending > 0 {
            Some(
                self.services
                    .instantiate(&pass.service, pass.service_config.as_deref())?,
            )
        } else {
            None
        };

        let ctx = PassContext {
            service_id: &pass.service,
            service_config: pass.service_config.as_deref(),
            src_lng: &pass.src_lng,
            target_lng: &pass.target_lng,
            matcher: &pass.matcher,
        };
        let outcome =
            translate_plan(&plan, &source, &target, &cache, service.as_deref(), &ctx).await?;
        let counts = outcome.counts;

        let mut lines = Vec::new();
        if counts.translated > 0 {
            lines.push(format!(
                "Invoke '{}' from '{}' to '{}' with {} inputs...",
                pass.service, pass.src_lng, pass.target_lng, counts.translated
            ));
        }
        if counts.bypassed > 0 {
            lines.push(format!(
                "Bypass {} strings because they are empty...",
                counts.bypassed
            ));
        }
        if counts.added > 0 {
            lines.push(format!("Add {} new translations", counts.added));
        }
        if counts.updated > 0 {
            lines.push(format!("Update {} existing translations", counts.updated));
        }
        if counts.removed > 0 {
            lines.push(format!("Remove {} stale translations", counts.removed));
        }

        self.resources.write_target(&pass.target, &outcome.target)?;
        lines.push(format!("Write target {}", pass.target.path.display()));
        self.caches.write_cache(&pass.cache_path, &outcome.cache)?;
        lines.push(format!("Write cache {}", pass.cache_path.display()));

        Ok(self.report(pass, SyncOutcome::Translated(counts), lines))
    }

    /// Run `passes` in order, handing each report to `on_report` as soon as it is done
    ///
    /// Stops at the first error. Files written by earlier passes stay written.
    pub async fn sync_all(
        &mut self,
        passes: &[SyncPass],
        mut on_report: impl FnMut(&SyncReport),
    ) -> SyncResult<Vec<SyncReport>> {
        let mut reports = Vec::with_capacity(passes.len());
        for pass in passes {
            let report = self.sync(pass).await?;
            on_report(&report);
            reports.push(report);
        }
        Ok(reports)
    }

    fn seed_cache(
        &self,
        pass: &SyncPass,
        source: &[StringEntry],
        target: &TargetSet,
    ) -> SyncResult<SyncReport> {
        let mut cache = TranslationCache::new();
        let mut seen = HashSet::new();
        for entry in source {
            if seen.insert(entry.key.as_str()) {
                let current = target.lookup(&entry.key).flatten().unwrap_or_default();
                cache.record(&entry.key, &entry.value, current);
            }
        }
        self.caches.write_cache(&pass.cache_path, &cache)?;
        info!(entries = cache.len(), "seeded new cache");

        let lines = vec![
            "Cache not found -> Generate a new cache to enable selective translations.".to_string(),
            "To make selective translations, do one of the following:".to_string(),
            "Option 1: Change your source-file and then re-run this tool.".to_string(),
            "Option 2: Delete parts of your target-file and then re-run this tool.".to_string(),
            "Skipped translations because we had to generate a new cache.".to_string(),
            format!("Write cache {}", pass.cache_path.display()),
        ];
        Ok(self.report(pass, SyncOutcome::CacheSeeded, lines))
    }

    fn report(&self, pass: &SyncPass, outcome: SyncOutcome, lines: Vec<String>) -> SyncReport {
        SyncReport {
            target: pass.target.path.clone(),
            target_lng: pass.target_lng.clone(),
            outcome,
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceFormat;

    fn pass(service: &str, src_lng: &str, target_lng: &str) -> SyncPass {
        SyncPass {
            source: ResourceLocation::new("en.json", ResourceFormat::FlatJson),
            target: ResourceLocation::new("de.json", ResourceFormat::FlatJson),
            cache_path: PathBuf::from("cache/en__de.json"),
            src_lng: src_lng.to_string(),
            target_lng: target_lng.to_string(),
            service: service.to_string(),
            service_config: None,
            matcher: "icu".parse().unwrap(),
        }
    }

    #[test]
    fn test_validate_accepts_known_service() {
        assert!(pass("manual", "en", "de").validate().is_ok());
        assert!(pass("deepl", "en_US", "pt-BR").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_service() {
        let err = pass("babelfish", "en", "de").validate().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_validate_rejects_bad_language() {
        let err = pass("manual", "en", "not a language!").validate().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_validate_rejects_target_equal_to_source() {
        let mut p = pass("manual", "en", "de");
        p.target = p.source.clone();
        assert!(p.validate().unwrap_err().is_config());
    }
}
