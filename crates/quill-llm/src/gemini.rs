//! Google Gemini text generation provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use quill_core::error::{QuillError, QuillResult};
use quill_core::traits::{
    GenerationRequest, GenerationResponse, LlmConfig, TextGenerator, TextStream, TokenUsage,
};

use crate::sse::decode_event_stream;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini provider.
///
/// Holds no credential; every call uses the key carried by its request.
pub struct GeminiLlm {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate.
    pub(crate) fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

impl GeminiLlm {
    /// Create a new Gemini provider.
    pub fn new(config: LlmConfig) -> QuillResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QuillError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| GEMINI_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut config = config;
        if config.model.is_empty() {
            config.model = DEFAULT_MODEL.to_string();
        }

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    fn build_body(&self, request: &GenerationRequest) -> GeminiRequest {
        let options = &request.options;
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(request.prompt.clone()),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: options.temperature.unwrap_or(self.config.temperature),
                max_output_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
                top_p: options.top_p,
            },
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.config.model, method)
    }

    async fn send(
        &self,
        url: String,
        request: &GenerationRequest,
    ) -> QuillResult<reqwest::Response> {
        let api_key = request.api_key.expose_secret();
        if api_key.is_empty() {
            return Err(QuillError::missing_credential());
        }

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key.as_str())
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(|e| QuillError::llm(format!("Gemini API request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GeminiError>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(QuillError::authentication(
                format!("Gemini rejected the API key: {}", message),
            )),
            _ => Err(QuillError::llm(format!(
                "Gemini API error ({}): {}",
                status, message
            ))),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiLlm {
    async fn generate(&self, request: &GenerationRequest) -> QuillResult<GenerationResponse> {
        let response = self.send(self.endpoint("generateContent"), request).await?;

        let body = response
            .text()
            .await
            .map_err(|e| QuillError::llm(format!("Failed to read response body: {}", e)))?;
        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| QuillError::llm(format!("Failed to parse response: {}", e)))?;

        let text = parsed.text();
        if text.is_empty() {
            return Err(QuillError::llm_empty("Gemini returned no text"));
        }

        let usage = parsed.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        debug!(model = %self.config.model, chars = text.len(), "Gemini generation complete");
        Ok(GenerationResponse { text, usage })
    }

    async fn generate_stream(&self, request: &GenerationRequest) -> QuillResult<TextStream> {
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        let response = self.send(url, request).await?;

        debug!(model = %self.config.model, "Gemini stream opened");
        Ok(Box::pin(decode_event_stream(Box::pin(response.bytes_stream()))))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
