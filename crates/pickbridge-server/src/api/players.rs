//! Player pool endpoints. Reading is open to any signed-in user; editing
//! is admin-only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use pickbridge_db::{Player, PlayerId};
use pickbridge_selection::{NewPlayer, PlayerPatch};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{selection_error, ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PlayersResponse {
    pub players: Vec<Player>,
}

#[derive(Debug, Serialize)]
pub struct DeletedPlayerResponse {
    pub deleted: PlayerId,
}

/// GET /api/players, GET /api/admin/players
pub async fn list_players(State(state): State<Arc<AppState>>) -> ApiResult<PlayersResponse> {
    let players = state
        .coordinator
        .list_players()
        .await
        .map_err(selection_error)?;
    Ok(Json(PlayersResponse { players }))
}

/// POST /api/admin/players
pub async fn create_player(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewPlayer>,
) -> Result<(StatusCode, Json<Player>), ApiError> {
    let player = state
        .coordinator
        .create_player(body)
        .await
        .map_err(selection_error)?;
    Ok((StatusCode::CREATED, Json(player)))
}

/// PATCH /api/admin/players/{id}
pub async fn update_player(
    State(state): State<Arc<AppState>>,
    Path(id): Path<PlayerId>,
    Json(body): Json<PlayerPatch>,
) -> ApiResult<Player> {
    let player = state
        .coordinator
        .update_player(id, body)
        .await
        .map_err(selection_error)?;
    Ok(Json(player))
}

/// DELETE /api/admin/players/{id}
pub async fn delete_player(
    State(state): State<Arc<AppState>>,
    Path(id): Path<PlayerId>,
) -> ApiResult<DeletedPlayerResponse> {
    let removed = state
        .coordinator
        .delete_player(id)
        .await
        .map_err(selection_error)?;
    Ok(Json(DeletedPlayerResponse {
        deleted: removed.id,
    }))
}
