//! The seam between the sync engine and translation backends
//!
//! A [`TranslationService`] receives one keyed batch per pass, with placeholders
//! already swapped for anchor markers, and answers with one text per key.
//!
//! ```ignore
//! let strings = vec![StringEntry::new("fruit", "Apple")];
//! let args = ServiceArgs {
//!     strings: &strings,
//!     src_lng: "en",
//!     target_lng: "de",
//!     service_config: None,
//!     matcher: &matcher,
//! };
//! let results = service.translate_strings(&args).await?;
//! ```

use async_trait::async_trait;
use icu_locale::Locale;

use crate::matcher::InterpolationMatcher;
use crate::model::{StringEntry, TranslationResult};
use crate::mt::error::{ServiceError, ServiceResult};

/// Everything a provider needs for one batched call
#[derive(Debug, Clone, Copy)]
pub struct ServiceArgs<'a> {
    /// Strings to translate, placeholders already replaced by anchor markers
    pub strings: &'a [StringEntry],
    pub src_lng: &'a str,
    pub target_lng: &'a str,
    /// Provider-specific configuration string (API key, `key,region`, ...)
    pub service_config: Option<&'a str>,
    pub matcher: &'a InterpolationMatcher,
}

impl ServiceArgs<'_> {
    /// Source values in request order
    pub fn texts(&self) -> Vec<String> {
        self.strings.iter().map(|s| s.value.clone()).collect()
    }

    /// Pair translated texts with request keys, positionally
    ///
    /// # Errors
    ///
    /// * `ServiceError::Translation` - If the provider returned a different number of texts
    pub fn zip_results(&self, translated: Vec<String>) -> ServiceResult<Vec<TranslationResult>> {
        if translated.len() != self.strings.len() {
            return Err(ServiceError::Translation(format!(
                "provider returned {} translations for {} inputs",
                translated.len(),
                self.strings.len()
            )));
        }
        Ok(self
            .strings
            .iter()
            .zip(translated)
            .map(|(entry, text)| TranslationResult::new(entry.key.clone(), text))
            .collect())
    }
}

/// A translation backend: cloud API, human at the terminal, or test fake
///
/// One call carries the whole batch for one target language. Implementations may
/// split it into several requests internally.
#[async_trait]
pub trait TranslationService: Send + Sync {
    /// Translate every string in `args.strings`
    ///
    /// The answer should hold one result per requested key. The orchestrator
    /// treats a missing key as a failed pass.
    async fn translate_strings(&self, args: &ServiceArgs<'_>) -> ServiceResult<Vec<TranslationResult>>;

    /// Human-readable provider name for logs
    fn provider_name(&self) -> &str;
}

/// Primary language subtag, lower-cased: `pt_BR` and `PT-br` both give `pt`
pub fn normalize_locale(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or(locale)
        .to_lowercase()
}

/// Check that `locale` parses as a BCP 47 tag, accepting `_` as separator
pub fn validate_locale(locale: &str) -> ServiceResult<()> {
    if locale.trim().is_empty() {
        return Err(ServiceError::Config("language code is empty".to_string()));
    }

    locale
        .replace('_', "-")
        .parse::<Locale>()
        .map(|_| ())
        .map_err(|e| ServiceError::Config(format!("'{}' is not a valid language code: {}", locale, e)))
}
