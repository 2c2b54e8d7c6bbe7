//! HTTP plumbing shared by the REST providers

use std::time::Duration;

use crate::mt::error::{ServiceError, ServiceResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the HTTP client used by every REST provider
pub(crate) fn build_client() -> ServiceResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(ServiceError::Network)
}

/// Turn a provider response into JSON, mapping HTTP failures onto [`ServiceError`]
///
/// 4xx responses are reported as configuration problems (bad key, quota, unsupported
/// language); 5xx responses as translation failures.
pub(crate) async fn json_body(response: reqwest::Response) -> ServiceResult<serde_json::Value> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        return Err(if status.is_client_error() {
            ServiceError::Config(format!("API client error ({}): {}", status, error_text))
        } else {
            ServiceError::Translation(format!("API server error ({}): {}", status, error_text))
        });
    }

    response
        .json()
        .await
        .map_err(|e| ServiceError::Translation(format!("Failed to parse API response: {}", e)))
}

/// Send `texts` to a provider in slices of at most `limit`, concatenating the answers
///
/// Each slice must come back with exactly as many texts as were sent.
///
/// # Arguments
///
/// * `texts` - Every text of the batch, in order
/// * `limit` - Most texts the provider accepts per request
/// * `call` - Sends one slice and returns its translations
///
/// # Returns
///
/// * `Ok(Vec<String>)` - One translation per input text, in input order
/// * `Err(ServiceError)` - The first failing request, or a slice answered with the wrong length
pub(crate) async fn translate_in_chunks<'a, F, Fut>(
    texts: &'a [String],
    limit: usize,
    mut call: F,
) -> ServiceResult<Vec<String>>
where
    F: FnMut(&'a [String]) -> Fut,
    Fut: Future<Output = ServiceResult<Vec<String>>>,
{
    let mut translated = Vec::with_capacity(texts.len());
    for chunk in texts.chunks(limit.max(1)) {
        let answer = call(chunk).await?;
        if answer.len() != chunk.len() {
            return Err(ServiceError::Translation(format!(
                "provider answered {} texts for a chunk of {}",
                answer.len(),
                chunk.len()
            )));
        }
        translated.extend(answer);
    }
    Ok(translated)
}

/// Resolve a credential from the explicit service config, falling back to `env_var`
pub(crate) fn credential(config: Option<&str>, env_var: &str) -> ServiceResult<String> {
    if let Some(value) = config.map(str::trim).filter(|v| !v.is_empty()) {
        return Ok(value.to_string());
    }
    std::env::var(env_var).map_err(|_| {
        ServiceError::Config(format!(
            "no service config given and {} environment variable not set",
            env_var
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("text{}", i)).collect()
    }

    #[tokio::test]
    async fn test_chunks_respect_limit_and_order() {
        let texts = numbered(200);
        let mut sizes = Vec::new();
        let translated = translate_in_chunks(&texts, 128, |chunk| {
            sizes.push(chunk.len());
            let upper: Vec<String> = chunk.iter().map(|t| t.to_uppercase()).collect();
            async move { Ok(upper) }
        })
        .await
        .unwrap();

        assert_eq!(sizes, vec![128, 72]);
        assert_eq!(translated.len(), 200);
        assert_eq!(translated[199], "TEXT199");
    }

    #[tokio::test]
    async fn test_no_chunks_for_empty_input() {
        let mut calls = 0;
        let translated = translate_in_chunks(&[], 50, |_| {
            calls += 1;
            async { Ok(Vec::new()) }
        })
        .await
        .unwrap();
        assert!(translated.is_empty());
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_short_answer_rejected() {
        let texts = numbered(3);
        let result = translate_in_chunks(&texts, 100, |_| async { Ok(vec!["only".to_string()]) }).await;
        match result {
            Err(ServiceError::Translation(msg)) => assert!(msg.contains("1 texts for a chunk of 3")),
            _ => panic!("Expected Translation error"),
        }
    }

    #[test]
    fn test_credential_prefers_explicit_config() {
        let key = credential(Some("  abc  "), "TRANSYNC_TEST_UNUSED_VAR").unwrap();
        assert_eq!(key, "abc");
    }

    #[test]
    fn test_credential_missing() {
        let result = credential(Some(""), "TRANSYNC_TEST_SURELY_UNSET_VAR");
        match result {
            Err(ServiceError::Config(msg)) => assert!(msg.contains("not set")),
            _ => panic!("Expected Config error"),
        }
    }
}
