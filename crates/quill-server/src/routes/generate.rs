//! Text generation endpoints.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use quill_core::traits::{GenerationRequest, StreamItem};

use crate::error::ApiResult;
use crate::state::AppState;

/// Content type of streamed generations.
pub const NDJSON: &str = "application/x-ndjson";

/// Request body for a single-shot generation.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub message: String,
    /// Text of files the user selected, appended under a context header.
    pub context: Option<String>,
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub response: String,
}

/// Generate a full response.
/// POST /gemini/generate
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    let api_key = state.resolve_api_key(request.api_key)?;
    let generation =
        GenerationRequest::with_context(&request.message, request.context.as_deref(), api_key);

    let result = state.generator.generate(&generation).await?;
    debug!(chars = result.text.len(), "Generation served");

    Ok(Json(GenerateResponse {
        response: result.text,
    }))
}

/// Request body for a streamed generation.
#[derive(Debug, Default, Deserialize)]
pub struct StreamRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
}

/// Stream a response as newline-delimited JSON fragments.
/// POST /gemini/stream
pub async fn stream(
    State(state): State<AppState>,
    Json(request): Json<StreamRequest>,
) -> ApiResult<Response> {
    let api_key = state.resolve_api_key(request.api_key)?;
    let generation = GenerationRequest::new(request.prompt, api_key);

    let fragments = state.generator.generate_stream(&generation).await?;
    let lines = fragments.map(|item| Ok::<_, Infallible>(ndjson_line(item)));

    Ok(([(header::CONTENT_TYPE, NDJSON)], Body::from_stream(lines)).into_response())
}

/// Encode one stream item; failures mid-stream become an `error` line.
pub(crate) fn ndjson_line(item: StreamItem) -> String {
    let value = match item {
        Ok(fragment) => serde_json::json!({ "response": fragment }),
        Err(e) => {
            warn!(error = %e, "Generation stream failed");
            serde_json::json!({ "error": e.to_string() })
        }
    };
    format!("{}\n", value)
}
