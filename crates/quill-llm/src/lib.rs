//! quill-llm - Text generation providers for quill.
//!
//! # Supported Providers
//!
//! - **Gemini** - Google's Generative Language API, single-shot and streamed
//!
//! # Example
//!
//! ```ignore
//! use quill_llm::LlmFactory;
//! use quill_core::GenerationRequest;
//!
//! let llm = LlmFactory::gemini()?;
//! let request = GenerationRequest::new("Draft a launch tweet", api_key);
//! let response = llm.generate(&request).await?;
//! ```

mod factory;
mod gemini;
mod sse;

pub use factory::LlmFactory;
pub use gemini::GeminiLlm;

// Re-export core types for convenience
pub use quill_core::config::LlmProvider;
pub use quill_core::traits::{GenerationOptions, GenerationRequest, LlmConfig, TextGenerator};
