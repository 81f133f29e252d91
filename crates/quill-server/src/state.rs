//! Server state management.

use std::sync::Arc;

use secrecy::SecretString;

use quill_core::config::StudioConfig;
use quill_core::error::{QuillError, QuillResult};
use quill_core::{ContentStore, Publisher, SqliteContentStore, StubPublisher, TextGenerator};
use quill_llm::LlmFactory;
use quill_trends::TrendsService;

use crate::error::{ApiError, ApiResult};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub generator: Arc<dyn TextGenerator>,
    pub trends: Arc<TrendsService>,
    pub publisher: Arc<dyn Publisher>,
    default_api_key: Option<SecretString>,
}

impl AppState {
    /// Create a new application state from its collaborators.
    pub fn new(
        store: Arc<dyn ContentStore>,
        generator: Arc<dyn TextGenerator>,
        trends: Arc<TrendsService>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            store,
            generator,
            trends,
            publisher,
            default_api_key: None,
        }
    }

    /// Set the credential used when a request does not supply one.
    pub fn with_default_api_key(mut self, key: Option<String>) -> Self {
        self.default_api_key = key.filter(|k| !k.is_empty()).map(SecretString::new);
        self
    }

    /// Build every collaborator from configuration.
    pub fn from_config(config: &StudioConfig) -> QuillResult<Self> {
        let store = SqliteContentStore::new(&config.database.path)?;
        let generator = LlmFactory::from_config(&config.llm)?;
        let trends = TrendsService::from_config(&config.trends)?;

        Ok(Self::new(
            Arc::new(store),
            generator,
            Arc::new(trends),
            Arc::new(StubPublisher::new()),
        )
        .with_default_api_key(config.llm.config.api_key.clone()))
    }

    /// Run a store operation on the blocking pool.
    pub async fn with_store<F, T>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&dyn ContentStore) -> QuillResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| ApiError::internal(format!("Store task failed: {}", e)))?
            .map_err(ApiError::from)
    }

    /// Credential for a generation call: the request's key, else the default.
    pub fn resolve_api_key(&self, requested: Option<String>) -> QuillResult<SecretString> {
        match requested.filter(|k| !k.trim().is_empty()) {
            Some(key) => Ok(SecretString::new(key)),
            None => self
                .default_api_key
                .clone()
                .ok_or_else(QuillError::missing_credential),
        }
    }
}
