use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ContentGenerator, ModelFailure};
use crate::config::{Config, GenerationSettings};
use crate::extract::truncate_chars;

const ERROR_BODY_PREVIEW: usize = 200;

#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(rename = "topK")]
    pub top_k: u32,
    #[serde(rename = "topP")]
    pub top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
}

impl From<&GenerationSettings> for GenerationConfig {
    fn from(settings: &GenerationSettings) -> Self {
        Self {
            temperature: settings.temperature,
            top_k: settings.top_k,
            top_p: settings.top_p,
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateContentRequest {
    pub fn new(prompt: &str, settings: &GenerationSettings) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: settings.into(),
        }
    }
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

/// Client for the `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    settings: GenerationSettings,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            settings: config.generation.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ModelFailure> {
        let body = GenerateContentRequest::new(prompt, &self.settings);

        let response = self
            .client
            .post(self.endpoint(model))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelFailure::Network(e.to_string()))?;

        let status = response.status();
        debug!(model, status = status.as_u16(), "model responded");

        let text = response
            .text()
            .await
            .map_err(|e| ModelFailure::Network(e.to_string()))?;

        if !status.is_success() {
            warn!(model, status = status.as_u16(), "model request failed");
            return Err(ModelFailure::Http {
                status: status.as_u16(),
                message: truncate_chars(&text, ERROR_BODY_PREVIEW).0.to_string(),
            });
        }

        extract_generated_text(&text)
    }
}

/// Pull the generated text out of a raw response body.
pub(crate) fn extract_generated_text(body: &str) -> Result<String, ModelFailure> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| ModelFailure::UnexpectedShape(e.to_string()))?;
    parsed
        .first_text()
        .map(str::to_string)
        .ok_or_else(|| ModelFailure::UnexpectedShape("no candidate text".to_string()))
}
