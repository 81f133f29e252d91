//! Factory for creating text generation providers.

use std::sync::Arc;

use quill_core::config::{LlmProvider, LlmProviderConfig};
use quill_core::error::QuillResult;
use quill_core::traits::{LlmConfig, TextGenerator};

use crate::gemini::GeminiLlm;

/// Factory for creating text generation providers.
pub struct LlmFactory;

impl LlmFactory {
    /// Create a provider from the given configuration.
    pub fn create(provider: LlmProvider, config: LlmConfig) -> QuillResult<Arc<dyn TextGenerator>> {
        match provider {
            LlmProvider::Gemini => {
                let llm = GeminiLlm::new(config)?;
                Ok(Arc::new(llm))
            }
        }
    }

    /// Create a provider from a full provider configuration.
    pub fn from_config(config: &LlmProviderConfig) -> QuillResult<Arc<dyn TextGenerator>> {
        Self::create(config.provider, config.config.clone())
    }

    /// Create a Gemini provider with default configuration.
    pub fn gemini() -> QuillResult<Arc<dyn TextGenerator>> {
        Self::create(LlmProvider::Gemini, LlmConfig::default())
    }

    /// Create a Gemini provider with a specific model.
    pub fn gemini_with_model(model: impl Into<String>) -> QuillResult<Arc<dyn TextGenerator>> {
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::Gemini, config)
    }
}
