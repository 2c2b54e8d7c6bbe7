//! Azure AI Translator (v3) provider
//!
//! Service config format: `key` or `key,region`. When no config is given the
//! `AZURE_TRANSLATOR_KEY` and `AZURE_TRANSLATOR_REGION` environment variables are used.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::model::TranslationResult;
use crate::mt::error::{ServiceError, ServiceResult};
use crate::mt::http::{build_client, credential, json_body, translate_in_chunks};
use crate::mt::translator::{ServiceArgs, TranslationService, validate_locale};

const KEY_ENV: &str = "AZURE_TRANSLATOR_KEY";
const REGION_ENV: &str = "AZURE_TRANSLATOR_REGION";
const ENDPOINT: &str = "https://api.cognitive.microsofttranslator.com/translate";

#[derive(Clone)]
pub struct AzureTranslatorProvider {
    key: String,
    region: Option<String>,
    client: reqwest::Client,
}

impl AzureTranslatorProvider {
    /// Azure accepts at most 100 array elements per request
    const MAX_BATCH_SIZE: usize = 100;

    /// Create a provider for an explicit subscription key
    ///
    /// # Arguments
    ///
    /// * `key` - Translator resource key
    /// * `region` - Resource region; required for regional resources, blank means global
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - New provider instance
    /// * `Err(ServiceError::Config)` - If the key is blank
    /// * `Err(ServiceError::Network)` - If the HTTP client cannot be built
    ///
    /// # Example
    ///
    /// ```ignore
    /// let provider = AzureTranslatorProvider::new(key, Some("westeurope".to_string()))?;
    /// ```
    pub fn new(key: String, region: Option<String>) -> ServiceResult<Self> {
        if key.trim().is_empty() {
            return Err(ServiceError::Config("Azure key cannot be empty".to_string()));
        }
        Ok(Self {
            key,
            region: region.filter(|r| !r.trim().is_empty()),
            client: build_client()?,
        })
    }

    /// Create a provider from a `key[,region]` config string
    ///
    /// Without a config the key comes from `AZURE_TRANSLATOR_KEY` and the region from
    /// `AZURE_TRANSLATOR_REGION`. A config without a region also reads the region
    /// from the environment.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let provider = AzureTranslatorProvider::from_config(Some("k3y,westeurope"))?;
    /// ```
    pub fn from_config(config: Option<&str>) -> ServiceResult<Self> {
        let raw = credential(config, KEY_ENV)?;
        let (key, region) = match raw.split_once(',') {
            Some((key, region)) => (key.trim().to_string(), Some(region.trim().to_string())),
            None => (raw, std::env::var(REGION_ENV).ok()),
        };
        Self::new(key, region)
    }

    /// Translate at most `MAX_BATCH_SIZE` texts in one request
    async fn translate_chunk(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> ServiceResult<Vec<String>> {
        let url = format!(
            "{}?api-version=3.0&from={}&to={}",
            ENDPOINT, source_locale, target_locale
        );
        let body: Vec<Value> = texts.iter().map(|t| json!({ "Text": t })).collect();

        let mut request = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .json(&body);
        if let Some(region) = &self.region {
            request = request.header("Ocp-Apim-Subscription-Region", region);
        }
        let json = json_body(request.send().await?).await?;

        let items = json.as_array().ok_or_else(|| {
            ServiceError::Translation("Invalid API response: expected an array".to_string())
        })?;
        items
            .iter()
            .map(|item| {
                item["translations"][0]["text"]
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| {
                        ServiceError::Translation(
                            "Invalid API response: missing 'translations[0].text'".to_string(),
                        )
                    })
            })
            .collect()
    }
}

impl std::fmt::Debug for AzureTranslatorProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureTranslatorProvider")
            .field("key", &"***")
            .field("region", &self.region)
            .finish()
    }
}

#[async_trait]
impl TranslationService for AzureTranslatorProvider {
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
        "Azure Translator"
    }
}
