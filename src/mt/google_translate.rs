//! Google Cloud Translation (Basic, v2) provider
//!
//! Credentials: `--service-config <api key>`, or `GOOGLE_TRANSLATE_API_KEY` when no
//! config is given. Requests are sent as plain text so the `_ID{n}_` anchor markers
//! come back untouched.
//!
//! ```ignore
//! let provider = GoogleTranslateProvider::from_config(Some("my-key"))?;
//! let results = provider.translate_strings(&args).await?;
//! ```

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::model::TranslationResult;
use crate::mt::error::{ServiceError, ServiceResult};
use crate::mt::http::{build_client, credential, json_body, translate_in_chunks};
use crate::mt::translator::{ServiceArgs, TranslationService, normalize_locale, validate_locale};

const API_KEY_ENV: &str = "GOOGLE_TRANSLATE_API_KEY";
const ENDPOINT: &str = "https://translation.googleapis.com/language/translate/v2";

/// Texts per request accepted by the v2 endpoint
const TEXTS_PER_REQUEST: usize = 128;

/// Longest single text the endpoint accepts
const MAX_TEXT_LEN: usize = 30_000;

#[derive(Clone)]
pub struct GoogleTranslateProvider {
    api_key: String,
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslateProvider {
    /// Create a provider for an explicit API key
    ///
    /// # Errors
    ///
    /// * `ServiceError::Config` - If `api_key` is blank
    /// * `ServiceError::Network` - If the HTTP client cannot be built
    pub fn new(api_key: String) -> ServiceResult<Self> {
        if api_key.trim().is_empty() {
            return Err(ServiceError::Config(
                "Google Translate API key is empty".to_string(),
            ));
        }
        Ok(GoogleTranslateProvider {
            api_key,
            client: build_client()?,
            endpoint: ENDPOINT.to_string(),
        })
    }

    /// Create a provider from `GOOGLE_TRANSLATE_API_KEY`
    pub fn from_env() -> ServiceResult<Self> {
        Self::from_config(None)
    }

    /// Create a provider from `--service-config`, falling back to the environment
    ///
    /// # Arguments
    ///
    /// * `config` - API key; `None` or blank reads `GOOGLE_TRANSLATE_API_KEY`
    pub fn from_config(config: Option<&str>) -> ServiceResult<Self> {
        Self::new(credential(config, API_KEY_ENV)?)
    }

    async fn request(&self, texts: &[String], src_lng: &str, target_lng: &str) -> ServiceResult<Vec<String>> {
        let payload = json!({
            "q": texts,
            "source": normalize_locale(src_lng),
            "target": target_lng.replace('_', "-"),
            "format": "text",
        });
        let response = self
            .client
            .post(format!("{}?key={}", self.endpoint, self.api_key))
            .json(&payload)
            .send()
            .await?;
        parse_response(&json_body(response).await?)
    }
}

/// Pull `data.translations[*].translatedText` out of a v2 response
fn parse_response(body: &Value) -> ServiceResult<Vec<String>> {
    let Some(items) = body["data"]["translations"].as_array() else {
        return Err(ServiceError::Translation(
            "Google response has no data.translations".to_string(),
        ));
    };
    items
        .iter()
        .map(|item| match item["translatedText"].as_str() {
            Some(text) => Ok(text.to_string()),
            None => Err(ServiceError::Translation(
                "Google response item has no translatedText".to_string(),
            )),
        })
        .collect()
}

impl std::fmt::Debug for GoogleTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslateProvider")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl TranslationService for GoogleTranslateProvider {
    async fn translate_strings(&self, args: &ServiceArgs<'_>) -> ServiceResult<Vec<TranslationResult>> {
        validate_locale(args.src_lng)?;
        validate_locale(args.target_lng)?;

        if let Some(entry) = args.strings.iter().find(|e| e.value.len() > MAX_TEXT_LEN) {
            return Err(ServiceError::Translation(format!(
                "'{}' is longer than the {} characters Google accepts",
                entry.key, MAX_TEXT_LEN
            )));
        }

        let texts = args.texts();
        let translated = translate_in_chunks(&texts, TEXTS_PER_REQUEST, move |chunk| {
            self.request(chunk, args.src_lng, args.target_lng)
        })
        .await?;
        args.zip_results(translated)
    }

    fn provider_name(&self) -> &str {
        "Google Translate"
    }
}
