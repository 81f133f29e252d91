//! Content CRUD and version history endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use quill_core::error::{QuillError, QuillResult};
use quill_core::{ContentEntry, ContentFilter, ContentUpdate, NewContent};

use crate::error::ApiResult;
use crate::state::AppState;

/// Request body for creating a content entry.
#[derive(Debug, Default, Deserialize)]
pub struct CreateContentRequest {
    pub title: Option<String>,
    pub platform: Option<String>,
    pub content_type: Option<String>,
    pub content_text: Option<String>,
}

impl CreateContentRequest {
    /// Check that every field is present.
    pub fn into_new_content(self) -> QuillResult<NewContent> {
        fn required(value: Option<String>, field: &str) -> QuillResult<String> {
            value.ok_or_else(|| QuillError::missing_field(field))
        }

        Ok(NewContent::new(
            required(self.title, "title")?,
            required(self.platform, "platform")?,
            required(self.content_type, "content_type")?,
            required(self.content_text, "content_text")?,
        ))
    }
}

/// Create a new version of a content group.
/// POST /content
pub async fn create_content(
    State(state): State<AppState>,
    Json(request): Json<CreateContentRequest>,
) -> ApiResult<Json<ContentEntry>> {
    let content = request.into_new_content()?;
    let entry = state.with_store(move |store| store.create(&content)).await?;
    Ok(Json(entry))
}

/// Query parameters for listing content.
#[derive(Debug, Default, Deserialize)]
pub struct ListContentQuery {
    pub latest_only: Option<bool>,
    pub platform: Option<String>,
    pub date: Option<String>,
}

impl ListContentQuery {
    pub fn into_filter(self) -> ContentFilter {
        let mut filter = ContentFilter::default();
        if let Some(latest_only) = self.latest_only {
            filter.latest_only = latest_only;
        }
        if let Some(platform) = self.platform.filter(|p| !p.is_empty()) {
            filter = filter.with_platform(platform);
        }
        if let Some(date) = self.date.filter(|d| !d.is_empty()) {
            filter = filter.with_date(date);
        }
        filter
    }
}

/// List entries, newest first.
/// GET /content
pub async fn list_content(
    State(state): State<AppState>,
    Query(query): Query<ListContentQuery>,
) -> ApiResult<Json<Vec<ContentEntry>>> {
    let filter = query.into_filter();
    let entries = state.with_store(move |store| store.list(&filter)).await?;
    Ok(Json(entries))
}

/// Get a specific entry by id.
/// GET /content/:id
pub async fn get_content(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ContentEntry>> {
    let entry = state.with_store(move |store| store.get(id)).await?;
    Ok(Json(entry))
}

/// Every version of a `(title, platform)` group, newest first.
/// GET /content/versions/:title/:platform
pub async fn list_versions(
    State(state): State<AppState>,
    Path((title, platform)): Path<(String, String)>,
) -> ApiResult<Json<Vec<ContentEntry>>> {
    let versions = state
        .with_store(move |store| store.list_versions(&title, &platform))
        .await?;
    Ok(Json(versions))
}

/// Derive a new version from an existing entry.
/// PUT /content/:id
pub async fn update_content(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(changes): Json<ContentUpdate>,
) -> ApiResult<Json<ContentEntry>> {
    let entry = state
        .with_store(move |store| store.update(id, &changes))
        .await?;
    Ok(Json(entry))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Permanently remove one entry.
/// DELETE /content/:id
pub async fn delete_content(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteResponse>> {
    state.with_store(move |store| store.delete(id)).await?;
    Ok(Json(DeleteResponse {
        message: "Content deleted successfully".to_string(),
    }))
}
