//! Incremental translation sync for localization files
//!
//! Given a source-language resource file and one or more target files, transync
//! works out which strings are new, changed, emptied or gone since the last run,
//! sends only those to a translation provider in a single batch, and writes the
//! merged target file together with a per-target cache of what was translated.
//!
//! ```ignore
//! use transync::{SyncDriver, SyncPass};
//!
//! let mut driver = SyncDriver::new();
//! let reports = driver.sync_all(&passes, |report| {
//!     for line in &report.lines {
//!         println!("{}", line);
//!     }
//! }).await?;
//! ```

pub mod cache;
pub mod diff;
pub mod driver;
pub mod error;
pub mod matcher;
pub mod model;
pub mod mt;
pub mod orchestrator;
pub mod resource;

#[cfg(test)]
mod test_support;

pub use cache::{CacheEntry, CacheStore, JsonCacheStore, TranslationCache, cache_path_for};
pub use diff::{KeyAction, SyncAction, SyncPlan, classify};
pub use driver::{SyncDriver, SyncOutcome, SyncPass, SyncReport};
pub use error::{SyncError, SyncResult};
pub use matcher::{Extraction, InterpolationMatcher, MatcherKind, Placeholder, Reinsertion};
pub use model::{StringEntry, TargetEntry, TargetSet, TranslationResult};
pub use orchestrator::{PassContext, SyncCounts, TranslationOutcome, translate_plan};
pub use resource::{FileResourceStore, ResourceFormat, ResourceLocation, ResourceStore};
