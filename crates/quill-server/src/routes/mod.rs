//! Route definitions for the REST API.

mod content;
mod generate;
mod health;
mod publish;
mod trends;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Content versions
        .route(
            "/content",
            post(content::create_content).get(content::list_content),
        )
        .route(
            "/content/",
            post(content::create_content).get(content::list_content),
        )
        .route(
            "/content/versions/:title/:platform",
            get(content::list_versions),
        )
        .route(
            "/content/:id",
            get(content::get_content)
                .put(content::update_content)
                .delete(content::delete_content),
        )
        // Text generation
        .route("/gemini/generate", post(generate::generate))
        .route("/gemini/stream", post(generate::stream))
        // Trends
        .route("/trends", get(trends::get_trends))
        // Publishing
        .route("/post-content", post(publish::post_content))
        .route("/post-content/", post(publish::post_content))
        // Attach state
        .with_state(state)
}

pub use content::*;
pub use generate::*;
pub use health::*;
pub use publish::*;
pub use trends::*;
