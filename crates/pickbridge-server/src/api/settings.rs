use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{selection_error, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct LimitBody {
    pub limit: i64,
}

/// GET /api/admin/settings/limit
pub async fn get_limit(State(state): State<Arc<AppState>>) -> ApiResult<LimitBody> {
    let limit = state.coordinator.get_limit().await.map_err(selection_error)?;
    Ok(Json(LimitBody {
        limit: i64::from(limit),
    }))
}

/// PUT /api/admin/settings/limit
pub async fn set_limit(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LimitBody>,
) -> ApiResult<LimitBody> {
    // Out-of-range values collapse to 0, which the engine rejects.
    let requested = u32::try_from(body.limit).unwrap_or(0);
    let limit = state
        .coordinator
        .set_limit(requested)
        .await
        .map_err(selection_error)?;
    Ok(Json(LimitBody {
        limit: i64::from(limit),
    }))
}
