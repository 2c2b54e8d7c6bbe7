//! DeepL API v2 provider
//!
//! The auth key is taken from the service config or the `DEEPL_AUTH_KEY`
//! environment variable. Free-plan keys end in `:fx` and are routed to the
//! free endpoint.

use async_trait::async_trait;
use serde_json::json;

use crate::model::TranslationResult;
use crate::mt::error::{ServiceError, ServiceResult};
use crate::mt::http::{build_client, credential, json_body, translate_in_chunks};
use crate::mt::translator::{ServiceArgs, TranslationService, normalize_locale, validate_locale};

const AUTH_KEY_ENV: &str = "DEEPL_AUTH_KEY";
const PRO_ENDPOINT: &str = "https://api.deepl.com/v2/translate";
const FREE_ENDPOINT: &str = "https://api-free.deepl.com/v2/translate";

#[derive(Clone)]
pub struct DeepLProvider {
    auth_key: String,
    client: reqwest::Client,
    endpoint: &'static str,
}

impl DeepLProvider {
    /// DeepL accepts at most 50 texts per request
    const MAX_BATCH_SIZE: usize = 50;

    /// Create a provider for an explicit auth key
    ///
    /// # Arguments
    ///
    /// * `auth_key` - DeepL auth key; a `:fx` suffix selects the free endpoint
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - Provider bound to the matching endpoint
    /// * `Err(ServiceError::Config)` - If the key is blank
    /// * `Err(ServiceError::Network)` - If the HTTP client cannot be built
    ///
    /// # Example
    ///
    /// ```ignore
    /// let provider = DeepLProvider::new("0123-abcd:fx".to_string())?;
    /// ```
    pub fn new(auth_key: String) -> ServiceResult<Self> {
        if auth_key.trim().is_empty() {
            return Err(ServiceError::Config("DeepL auth key cannot be empty".to_string()));
        }
        let endpoint = if auth_key.ends_with(":fx") {
            FREE_ENDPOINT
        } else {
            PRO_ENDPOINT
        };
        Ok(Self {
            auth_key,
            client: build_client()?,
            endpoint,
        })
    }

    /// Create a provider from `--service-config`, or `DEEPL_AUTH_KEY` when it is absent
    pub fn from_config(config: Option<&str>) -> ServiceResult<Self> {
        Self::new(credential(config, AUTH_KEY_ENV)?)
    }

    /// DeepL wants upper-case codes; sources are language-only, targets keep the region
    /// (`EN-GB`, `PT-BR`)
    fn deepl_code(locale: &str, keep_region: bool) -> String {
        if keep_region {
            locale.replace('_', "-").to_uppercase()
        } else {
            normalize_locale(locale).to_uppercase()
        }
    }

    /// Translate one request's worth of texts
    ///
    /// # Arguments
    ///
    /// * `texts` - At most `MAX_BATCH_SIZE` texts
    /// * `source_locale` - Source language, sent without its region
    /// * `target_locale` - Target language, region kept
    ///
    /// # Returns
    ///
    /// Translated texts in request order
    async fn translate_chunk(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> ServiceResult<Vec<String>> {
        let body = json!({
            "text": texts,
            "source_lang": Self::deepl_code(source_locale, false),
            "target_lang": Self::deepl_code(target_locale, true),
        });

        let response = self
            .client
            .post(self.endpoint)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.auth_key))
            .json(&body)
            .send()
            .await?;
        let json = json_body(response).await?;

        let translations = json["translations"].as_array().ok_or_else(|| {
            ServiceError::Translation(
                "Invalid API response: missing 'translations' array".to_string(),
            )
        })?;
        translations
            .iter()
            .map(|t| {
                t["text"].as_str().map(str::to_string).ok_or_else(|| {
                    ServiceError::Translation("Invalid API response: missing 'text' field".to_string())
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for DeepLProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepLProvider")
            .field("auth_key", &"***")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl TranslationService for DeepLProvider {
    async fn translate_strings(&self, args: &ServiceArgs<'_>) -> ServiceResult<Vec<TranslationResult>> {
        validate_locale(args.src_lng)?;
        validate_locale(args.target_lng)?;
        if args.strings.is_empty() {
            return Ok(Vec::new());
        }

        let texts = args.texts();
        let translated = translate_in_chunks(&texts, Self::MAX_BATCH_SIZE, move |chunk| {
            self.translate_chunk(chunk, args.src_lng, args.target_lng)
        })
        .await?;
        args.zip_results(translated)
    }

    fn provider_name(&self) -> &str {
        "DeepL"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_key_uses_free_endpoint() {
        let provider = DeepLProvider::new("abc:fx".to_string()).unwrap();
        assert_eq!(provider.endpoint, FREE_ENDPOINT);

        let provider = DeepLProvider::new("abc".to_string()).unwrap();
        assert_eq!(provider.endpoint, PRO_ENDPOINT);
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            DeepLProvider::new(" ".to_string()),
            Err(ServiceError::Config(_))
        ));
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(DeepLProvider::deepl_code("en-US", false), "EN");
        assert_eq!(DeepLProvider::deepl_code("pt_br", true), "PT-BR");
        assert_eq!(DeepLProvider::deepl_code("de", true), "DE");
    }

    #[test]
    fn test_debug_masks_key() {
        let provider = DeepLProvider::new("secret-key".to_string()).unwrap();
        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret-key"));
        assert_eq!(provider.provider_name(), "DeepL");
    }
}
