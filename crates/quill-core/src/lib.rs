//! quill-core - Core library for quill.
//!
//! This crate provides the versioned content store, configuration, error
//! types, and the collaborator traits (text generation, trends, publishing)
//! used by the quill backend.
//!
//! # Example
//!
//! ```ignore
//! use quill_core::{ContentStore, NewContent, SqliteContentStore};
//!
//! let store = SqliteContentStore::new("./content.db")?;
//!
//! let v1 = store.create(&NewContent::new("Launch Post", "twitter", "post", "v1 text"))?;
//! let v2 = store.create(&NewContent::new("Launch Post", "twitter", "post", "v2 text"))?;
//! assert_eq!(v2.version, 2);
//!
//! let history = store.list_versions("Launch Post", "twitter")?;
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod publish;
pub mod traits;

// Re-export commonly used types
pub use config::{LlmProvider, LlmProviderConfig, StudioConfig};
pub use content::{
    ContentEntry, ContentFilter, ContentStore, ContentUpdate, NewContent, SqliteContentStore,
};
pub use error::{ErrorCode, QuillError, QuillResult};
pub use publish::StubPublisher;
pub use traits::{
    GenerationRequest, GenerationResponse, LlmConfig, Platform, Publication, PublishReceipt,
    Publisher, TextGenerator, TextStream, Trend, TrendSource,
};
