//! Core traits for quill collaborators.

mod llm;
mod publisher;
mod trends;

pub use llm::*;
pub use publisher::*;
pub use trends::*;
