//! Error taxonomy for a sync run.
//!
//! Every variant is fatal for the pass that raised it. Placeholder mismatches are
//! deliberately absent: they degrade to a [`Reinsertion`](crate::matcher::Reinsertion)
//! with warnings instead.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::mt::ServiceError;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Bad invocation: unknown provider, malformed matcher, invalid language code.
    /// Raised before any file is touched.
    #[error("configuration error: {0}")]
    Config(String),

    /// The translation provider failed or returned an incomplete result.
    #[error("'{service}' failed translating to '{target_lng}': {source}")]
    Service {
        service: String,
        target_lng: String,
        #[source]
        source: ServiceError,
    },

    /// A resource or cache file exists but cannot be interpreted.
    #[error("invalid store '{}': {message}", path.display())]
    Store { path: PathBuf, message: String },

    /// A resource or cache file cannot be read or written.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    pub fn config(message: impl Into<String>) -> Self {
        SyncError::Config(message.into())
    }

    pub fn store(path: &Path, message: impl Into<String>) -> Self {
        SyncError::Store {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether this error was raised before any I/O took place
    pub fn is_config(&self) -> bool {
        matches!(self, SyncError::Config(_))
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_carries_context() {
        let err = SyncError::Service {
            service: "deepl".to_string(),
            target_lng: "de".to_string(),
            source: ServiceError::IncompleteResult {
                key: "fruit".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("deepl"));
        assert!(msg.contains("'de'"));
        assert!(msg.contains("fruit"));
    }

    #[test]
    fn test_store_error_mentions_path() {
        let err = SyncError::store(Path::new("de/fruits.json"), "root must be an object");
        assert_eq!(
            err.to_string(),
            "invalid store 'de/fruits.json': root must be an object"
        );
        assert!(!err.is_config());
    }

    #[test]
    fn test_config_error() {
        let err = SyncError::config("unknown service 'babelfish'");
        assert!(err.is_config());
        assert!(err.to_string().starts_with("configuration error"));
    }
}
