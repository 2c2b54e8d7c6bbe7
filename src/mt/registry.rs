//! Provider registry
//!
//! Providers are selected by a string id from a fixed table and constructed
//! lazily, the first time a run actually needs them, so a run that finds every
//! target up to date never builds an HTTP client or asks for credentials.
//!
//! Tests can swap a provider out with [`inject_fake_service`]. The override table
//! is process-wide and consulted before the real registry; the returned
//! [`FakeServiceGuard`] removes the override again when dropped.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::{SyncError, SyncResult};
use crate::mt::azure::AzureTranslatorProvider;
use crate::mt::deepl::DeepLProvider;
use crate::mt::error::ServiceResult;
use crate::mt::google_translate::GoogleTranslateProvider;
use crate::mt::manual::ManualTranslator;
use crate::mt::translator::TranslationService;

type ServiceFactory = fn(Option<&str>) -> ServiceResult<Arc<dyn TranslationService>>;

const SERVICES: &[(&str, ServiceFactory)] = &[
    ("google-translate", google_translate),
    ("deepl", deepl),
    ("azure", azure),
    ("manual", manual),
];

fn google_translate(config: Option<&str>) -> ServiceResult<Arc<dyn TranslationService>> {
    Ok(Arc::new(GoogleTranslateProvider::from_config(config)?))
}

fn deepl(config: Option<&str>) -> ServiceResult<Arc<dyn TranslationService>> {
    Ok(Arc::new(DeepLProvider::from_config(config)?))
}

fn azure(config: Option<&str>) -> ServiceResult<Arc<dyn TranslationService>> {
    Ok(Arc::new(AzureTranslatorProvider::from_config(config)?))
}

fn manual(_config: Option<&str>) -> ServiceResult<Arc<dyn TranslationService>> {
    Ok(Arc::new(ManualTranslator::new()))
}

static FAKE_SERVICES: LazyLock<Mutex<HashMap<String, Arc<dyn TranslationService>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Lock the override table, recovering it if a panicking test poisoned it
fn fakes() -> MutexGuard<'static, HashMap<String, Arc<dyn TranslationService>>> {
    FAKE_SERVICES.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Replace the provider registered under `name` for as long as the guard lives
///
/// Intended for test setup only; `name` does not have to be a registered id.
pub fn inject_fake_service(name: &str, service: Arc<dyn TranslationService>) -> FakeServiceGuard {
    fakes().insert(name.to_string(), service);
    FakeServiceGuard {
        name: name.to_string(),
    }
}

fn fake_service(name: &str) -> Option<Arc<dyn TranslationService>> {
    fakes().get(name).cloned()
}

/// Removes a fake provider override on drop
#[must_use = "the fake service is removed as soon as the guard is dropped"]
#[derive(Debug)]
pub struct FakeServiceGuard {
    name: String,
}

impl Drop for FakeServiceGuard {
    fn drop(&mut self) {
        fakes().remove(&self.name);
    }
}

/// Lazily constructed providers for one run
#[derive(Default)]
pub struct ServiceRegistry {
    instances: HashMap<String, Arc<dyn TranslationService>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of all real providers, in registry order
    pub fn service_ids() -> Vec<&'static str> {
        SERVICES.iter().map(|(id, _)| *id).collect()
    }

    /// Check that `id` names a provider (or an injected fake) without constructing it
    pub fn validate(id: &str) -> SyncResult<()> {
        if fake_service(id).is_some() || SERVICES.iter().any(|(known, _)| *known == id) {
            return Ok(());
        }
        Err(SyncError::config(format!(
            "unknown service '{}' (available: {})",
            id,
            Self::service_ids().join(", ")
        )))
    }

    /// Get the provider for `id`, constructing it on first use
    ///
    /// An injected fake takes precedence over the real provider.
    ///
    /// # Errors
    ///
    /// * `SyncError::Config` - If `id` is unknown or the provider rejects its configuration
    pub fn instantiate(
        &mut self,
        id: &str,
        config: Option<&str>,
    ) -> SyncResult<Arc<dyn TranslationService>> {
        if let Some(fake) = fake_service(id) {
            return Ok(fake);
        }
        if let Some(instance) = self.instances.get(id) {
            return Ok(Arc::clone(instance));
        }

        Self::validate(id)?;
        let factory = SERVICES
            .iter()
            .find(|(known, _)| *known == id)
            .map(|(_, factory)| *factory)
            .ok_or_else(|| SyncError::config(format!("unknown service '{}'", id)))?;

        debug!(service = id, "constructing translation service");
        let instance = factory(config)
            .map_err(|e| SyncError::config(format!("cannot initialize '{}': {}", id, e)))?;
        self.instances.insert(id.to_string(), Arc::clone(&instance));
        Ok(instance)
    }

    /// Whether `id` has been constructed during this run
    pub fn is_constructed(&self, id: &str) -> bool {
        self.instances.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::mock::{MockMode, MockTranslator};

    #[test]
    fn test_service_ids() {
        assert_eq!(
            ServiceRegistry::service_ids(),
            vec!["google-translate", "deepl", "azure", "manual"]
        );
    }

    #[test]
    fn test_unknown_service_is_config_error() {
        let err = ServiceRegistry::validate("babelfish").unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("google-translate"));

        let mut registry = ServiceRegistry::new();
        assert!(registry.instantiate("babelfish", None).is_err());
    }

    #[test]
    fn test_constructed_once_per_run() {
        let mut registry = ServiceRegistry::new();
        assert!(!registry.is_constructed("manual"));

        let first = registry.instantiate("manual", None).unwrap();
        let second = registry.instantiate("manual", None).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.is_constructed("manual"));
        assert_eq!(first.provider_name(), "Manual");
    }

    #[test]
    fn test_provider_config_error_surfaces_as_config() {
        let mut registry = ServiceRegistry::new();
        let err = registry.instantiate("deepl", Some("   ")).err();
        // Blank config falls back to the environment; either way construction must not panic
        if let Some(err) = err {
            assert!(err.is_config());
        }
    }

    #[test]
    fn test_fake_overrides_real_provider_until_dropped() {
        let name = "registry-test-fake";
        assert!(ServiceRegistry::validate(name).is_err());

        let mock = MockTranslator::new(MockMode::NoOp);
        {
            let _guard = inject_fake_service(name, Arc::new(mock));
            assert!(ServiceRegistry::validate(name).is_ok());

            let mut registry = ServiceRegistry::new();
            let service = registry.instantiate(name, None).unwrap();
            assert_eq!(service.provider_name(), "Mock Translator");
            assert!(!registry.is_constructed(name));
        }

        assert!(ServiceRegistry::validate(name).is_err());
    }

    #[test]
    fn test_fake_injection_survives_poisoned_table() {
        let _ = std::thread::spawn(|| {
            let _held = fakes();
            panic!("poisoning the fake table");
        })
        .join();
        assert!(FAKE_SERVICES.is_poisoned());

        let name = "registry-poisoned-fake";
        let guard = inject_fake_service(name, Arc::new(MockTranslator::new(MockMode::NoOp)));
        assert!(ServiceRegistry::validate(name).is_ok());

        drop(guard);
        assert!(ServiceRegistry::validate(name).is_err());
    }
}
