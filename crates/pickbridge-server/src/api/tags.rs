use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{selection_error, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TagsResponse {
    pub tags: Vec<String>,
}

/// GET /api/admin/tags
pub async fn list_tags(State(state): State<Arc<AppState>>) -> ApiResult<TagsResponse> {
    let tags = state.coordinator.list_tags().await.map_err(selection_error)?;
    Ok(Json(TagsResponse { tags }))
}

/// POST /api/admin/tags
pub async fn add_tag(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TagRequest>,
) -> ApiResult<TagsResponse> {
    let tags = state
        .coordinator
        .add_tag(&body.name)
        .await
        .map_err(selection_error)?;
    Ok(Json(TagsResponse { tags }))
}

/// DELETE /api/admin/tags/{name}
pub async fn remove_tag(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<TagsResponse> {
    let tags = state
        .coordinator
        .remove_tag(&name)
        .await
        .map_err(selection_error)?;
    Ok(Json(TagsResponse { tags }))
}
