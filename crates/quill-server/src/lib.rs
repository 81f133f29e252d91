//! quill-server - REST API server for quill.
//!
//! Exposes the versioned content store, Gemini text generation, trend
//! suggestions and the stub social poster over HTTP.
//!
//! # Example
//!
//! ```ignore
//! use quill_core::StudioConfig;
//! use quill_server::{create_server, AppState};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = StudioConfig::load().unwrap();
//!     let state = AppState::from_config(&config).unwrap();
//!     let app = create_server(state, &config.server.cors_origins);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

/// Create the server with all routes and middleware.
pub fn create_server(state: AppState, cors_origins: &[String]) -> Router {
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer(cors_origins))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
