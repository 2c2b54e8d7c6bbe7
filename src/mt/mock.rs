//! Scripted translation service
//!
//! Stands in for a real provider in unit and end-to-end tests. It never touches
//! the network, always answers the same way for the same input, and records every
//! batch it receives so tests can check how often and with what it was called.
//!
//! ```ignore
//! let mock = MockTranslator::new(MockMode::Suffix);
//! let _guard = inject_fake_service("google-translate", Arc::new(mock.clone()));
//! driver.sync(&pass).await?;
//! assert_eq!(mock.call_count(), 1);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::model::TranslationResult;
use crate::mt::error::{ServiceError, ServiceResult};
use crate::mt::translator::{ServiceArgs, TranslationService};

#[derive(Debug, Clone)]
pub enum MockMode {
    /// `"Apple"` to `"Apple_de"`; anchor markers pass through unchanged
    Suffix,

    /// Look up `(text, target_lng)`, falling back to `Suffix`
    Mappings(HashMap<(String, String), String>),

    /// Reverse the word order, moving anchor markers around
    Reorder,

    /// Fail every call with `ServiceError::Translation`
    Error(String),

    /// Like `Suffix`, but leave these keys out of the answer
    DropKeys(Vec<String>),

    /// Echo the input
    NoOp,
}

/// Deterministic [`TranslationService`]
///
/// Clones share one call log, so a test can keep a handle while the fake
/// service table owns another.
#[derive(Debug, Clone)]
pub struct MockTranslator {
    mode: MockMode,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        MockTranslator {
            mode,
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of `translate_strings` invocations so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Keys of every batch received, in call order
    pub fn requested_keys(&self) -> Vec<Vec<String>> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn answer(&self, text: &str, target_lng: &str) -> ServiceResult<String> {
        let suffixed = || format!("{}_{}", text, target_lng);
        match &self.mode {
            MockMode::Suffix | MockMode::DropKeys(_) => Ok(suffixed()),
            MockMode::Mappings(table) => Ok(table
                .get(&(text.to_string(), target_lng.to_string()))
                .cloned()
                .unwrap_or_else(suffixed)),
            MockMode::Reorder => Ok(text.split_whitespace().rev().collect::<Vec<_>>().join(" ")),
            MockMode::Error(message) => Err(ServiceError::Translation(message.clone())),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl TranslationService for MockTranslator {
    async fn translate_strings(&self, args: &ServiceArgs<'_>) -> ServiceResult<Vec<TranslationResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(args.strings.iter().map(|s| s.key.clone()).collect());
        }

        let mut results = Vec::with_capacity(args.strings.len());
        for entry in args.strings {
            if let MockMode::DropKeys(dropped) = &self.mode {
                if dropped.contains(&entry.key) {
                    continue;
                }
            }
            let translated = self.answer(&entry.value, args.target_lng)?;
            results.push(TranslationResult::new(entry.key.clone(), translated));
        }
        Ok(results)
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}
