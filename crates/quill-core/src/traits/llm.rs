//! Text generation trait and related types.

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::error::QuillResult;

/// Separator placed between the user's message and attached context.
pub const CONTEXT_HEADER: &str = "\n\nContext (selected files):\n";

/// A single generation call.
///
/// The credential travels with the request; providers never read it from
/// process-wide state.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Full prompt text.
    pub prompt: String,
    /// Provider API key for this call.
    pub api_key: SecretString,
    /// Per-call overrides.
    pub options: GenerationOptions,
}

impl GenerationRequest {
    /// Create a request for a raw prompt.
    pub fn new(prompt: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            prompt: prompt.into(),
            api_key,
            options: GenerationOptions::default(),
        }
    }

    /// Create a request from a message plus optional attached context.
    pub fn with_context(message: &str, context: Option<&str>, api_key: SecretString) -> Self {
        let prompt = match context.filter(|c| !c.is_empty()) {
            Some(context) => format!("{}{}{}", message, CONTEXT_HEADER, context),
            None => message.to_string(),
        };
        Self::new(prompt, api_key)
    }

    /// Set generation options.
    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// Response from a non-streaming generation.
#[derive(Debug, Clone, Default)]
pub struct GenerationResponse {
    /// Generated text.
    pub text: String,
    /// Token usage statistics.
    pub usage: Option<TokenUsage>,
}

/// Token usage statistics.
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    pub completion_tokens: u32,
    /// Total tokens.
    pub total_tokens: u32,
}

/// Configuration options for generation.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    /// Sampling temperature (0.0 - 2.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Top-p nucleus sampling.
    pub top_p: Option<f32>,
}

/// Stream item for streaming responses.
pub type StreamItem = QuillResult<String>;

/// Stream of text fragments, finished when the provider is exhausted.
pub type TextStream = Pin<Box<dyn futures::Stream<Item = StreamItem> + Send>>;

/// Core text generation trait - all providers implement this.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a complete response.
    async fn generate(&self, request: &GenerationRequest) -> QuillResult<GenerationResponse>;

    /// Generate an incremental response.
    async fn generate_stream(&self, request: &GenerationRequest) -> QuillResult<TextStream>;

    /// Get the model name.
    fn model_name(&self) -> &str;
}

/// LLM configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name/identifier; providers fill in their default when empty.
    #[serde(default)]
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Default API key, used when a request does not bring its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL for API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}
