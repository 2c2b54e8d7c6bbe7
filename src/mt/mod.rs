//! Translation providers
//!
//! This module hosts everything the sync engine knows about machine translation:
//!
//! 1. **TranslationService trait** - the one seam between the engine and any backend
//! 2. **Providers** - Google Translate, DeepL, Azure Translator and manual entry
//! 3. **Registry** - maps a provider id to a lazily constructed instance, with a
//!    fake-override table for tests
//! 4. **Mock** - deterministic provider used throughout the test suite
//!
//! # Example
//!
//! ```ignore
//! use transync::mt::ServiceRegistry;
//!
//! let mut registry = ServiceRegistry::new();
//! let service = registry.instantiate("deepl", Some("my-auth-key:fx"))?;
//! let results = service.translate_strings(&args).await?;
//! ```

pub mod azure;
pub mod deepl;
pub mod error;
pub mod google_translate;
mod http;
pub mod manual;
pub mod mock;
pub mod registry;
pub mod translator;

pub use azure::AzureTranslatorProvider;
pub use deepl::DeepLProvider;
pub use error::{ServiceError, ServiceResult};
pub use google_translate::GoogleTranslateProvider;
pub use manual::ManualTranslator;
pub use mock::{MockMode, MockTranslator};
pub use registry::{FakeServiceGuard, ServiceRegistry, inject_fake_service};
pub use translator::{ServiceArgs, TranslationService, normalize_locale, validate_locale};
