//! Social posting endpoint.

use axum::{extract::State, Json};
use serde::Deserialize;

use quill_core::{Publication, PublishReceipt};

use crate::error::ApiResult;
use crate::state::AppState;

/// Request body for posting content.
#[derive(Debug, Default, Deserialize)]
pub struct PostContentRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub platform: String,
}

/// Post content to a social platform.
/// POST /post-content
pub async fn post_content(
    State(state): State<AppState>,
    Json(request): Json<PostContentRequest>,
) -> ApiResult<Json<PublishReceipt>> {
    let publication = Publication::from_raw(&request.content, &request.platform)?;
    let receipt = state.publisher.publish(&publication).await?;
    Ok(Json(receipt))
}
