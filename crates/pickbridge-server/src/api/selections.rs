//! Selection endpoints.
//!
//! Streamers toggle their own set under `/api/selections`; admins act on
//! any streamer's set under `/api/admin/selections`. Every accepted change
//! is forwarded to the game server plugin in the background.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use pickbridge_db::PlayerId;
use pickbridge_selection::SelectionChange;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::auth::middleware::AuthUser;
use crate::error::{selection_error, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MySelectionsResponse {
    pub selections: Vec<PlayerId>,
    pub limit: u32,
    /// Players held by other streamers.
    pub taken: Vec<PlayerId>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub selected: bool,
    pub selections: Vec<PlayerId>,
}

#[derive(Debug, Serialize)]
pub struct StreamerSelectionsResponse {
    pub streamer: String,
    pub selections: Vec<PlayerId>,
}

#[derive(Debug, Serialize)]
pub struct AllSelectionsResponse {
    pub selections: BTreeMap<String, Vec<PlayerId>>,
    pub limit: u32,
}

/// GET /api/selections
pub async fn my_selections(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<MySelectionsResponse> {
    let doc = state
        .coordinator
        .snapshot()
        .await
        .map_err(selection_error)?;
    let me = auth_user.0.sub.as_str();

    let taken = doc
        .selections
        .entries()
        .filter(|(streamer, _)| *streamer != me)
        .map(|(_, id)| id)
        .collect();

    Ok(Json(MySelectionsResponse {
        selections: doc.selections.of(me).to_vec(),
        limit: doc.settings.selection_limit,
        taken,
    }))
}

/// POST /api/selections/{player_id}
pub async fn toggle(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(player_id): Path<PlayerId>,
) -> ApiResult<ToggleResponse> {
    let change = state
        .coordinator
        .toggle_self(&auth_user.principal(), player_id)
        .await
        .map_err(selection_error)?;

    Ok(Json(ToggleResponse {
        selected: change.selected,
        selections: change.selections,
    }))
}

/// GET /api/admin/selections
pub async fn list_all(State(state): State<Arc<AppState>>) -> ApiResult<AllSelectionsResponse> {
    let selections = state
        .coordinator
        .get_all_selections()
        .await
        .map_err(selection_error)?;
    let limit = state.coordinator.get_limit().await.map_err(selection_error)?;
    Ok(Json(AllSelectionsResponse { selections, limit }))
}

/// GET /api/admin/selections/{streamer}
pub async fn get_for_streamer(
    State(state): State<Arc<AppState>>,
    Path(streamer): Path<String>,
) -> ApiResult<StreamerSelectionsResponse> {
    let selections = state
        .coordinator
        .get_selection(&streamer)
        .await
        .map_err(selection_error)?;
    Ok(Json(StreamerSelectionsResponse {
        streamer,
        selections,
    }))
}

/// POST /api/admin/selections/{streamer}/{player_id}
pub async fn admin_add(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path((streamer, player_id)): Path<(String, PlayerId)>,
) -> ApiResult<SelectionChange> {
    let change = state
        .coordinator
        .admin_add(&auth_user.principal(), &streamer, player_id)
        .await
        .map_err(selection_error)?;
    Ok(Json(change))
}

/// DELETE /api/admin/selections/{streamer}/{player_id}
pub async fn admin_remove(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path((streamer, player_id)): Path<(String, PlayerId)>,
) -> ApiResult<SelectionChange> {
    let change = state
        .coordinator
        .admin_remove(&auth_user.principal(), &streamer, player_id)
        .await
        .map_err(selection_error)?;
    Ok(Json(change))
}
