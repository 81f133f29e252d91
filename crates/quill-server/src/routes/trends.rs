//! Trending topic suggestions.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use quill_core::Trend;

use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TrendsQuery {
    pub area: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrendsResponse {
    pub trends: Vec<Trend>,
}

/// Trending topics for an area; falls back to templates instead of failing.
/// GET /trends?area=
pub async fn get_trends(
    State(state): State<AppState>,
    Query(query): Query<TrendsQuery>,
) -> Json<TrendsResponse> {
    let trends = state.trends.trends(query.area.as_deref()).await;
    Json(TrendsResponse { trends })
}
