//! Game server plugin administration: endpoint, resend-all, connection
//! test and the recent delivery log.

use axum::{
    extract::{Query, State},
    Json,
};
use pickbridge_db::PluginEndpoint;
use pickbridge_plugin::{DeliveryRecord, DeliveryStats};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{selection_error, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EndpointRequest {
    pub host: String,
    pub port: i64,
    #[serde(default)]
    pub token: Option<String>,
}

/// The stored token is never echoed back.
#[derive(Debug, Serialize)]
pub struct EndpointResponse {
    pub host: String,
    pub port: u16,
    pub token_configured: bool,
}

impl From<PluginEndpoint> for EndpointResponse {
    fn from(endpoint: PluginEndpoint) -> Self {
        Self {
            host: endpoint.host,
            port: endpoint.port,
            token_configured: endpoint.auth_token.is_some(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResendResponse {
    pub attempted: usize,
}

#[derive(Debug, Serialize)]
pub struct TestResponse {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeliveriesQuery {
    #[serde(default)]
    pub failed_only: bool,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DeliveriesResponse {
    pub stats: DeliveryStats,
    pub deliveries: Vec<DeliveryRecord>,
}

/// GET /api/admin/plugin/endpoint
pub async fn get_endpoint(State(state): State<Arc<AppState>>) -> ApiResult<EndpointResponse> {
    let endpoint = state
        .coordinator
        .get_endpoint()
        .await
        .map_err(selection_error)?;
    Ok(Json(endpoint.into()))
}

/// PUT /api/admin/plugin/endpoint
pub async fn set_endpoint(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EndpointRequest>,
) -> ApiResult<EndpointResponse> {
    // Negative or oversized ports map to 0 and are rejected downstream.
    let port = u32::try_from(body.port).unwrap_or(0);
    let endpoint = state
        .coordinator
        .set_endpoint(&body.host, port, body.token)
        .await
        .map_err(selection_error)?;
    Ok(Json(endpoint.into()))
}

/// POST /api/admin/plugin/resend
pub async fn resend_all(State(state): State<Arc<AppState>>) -> ApiResult<ResendResponse> {
    let attempted = state
        .coordinator
        .resend_all()
        .await
        .map_err(selection_error)?;
    Ok(Json(ResendResponse { attempted }))
}

/// POST /api/admin/plugin/test
pub async fn test_connection(State(state): State<Arc<AppState>>) -> ApiResult<TestResponse> {
    state
        .coordinator
        .test_ping()
        .await
        .map_err(selection_error)?;
    Ok(Json(TestResponse { ok: true }))
}

/// GET /api/admin/plugin/deliveries
pub async fn list_deliveries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeliveriesQuery>,
) -> Json<DeliveriesResponse> {
    let log = state.coordinator.delivery_log();
    Json(DeliveriesResponse {
        stats: log.stats(),
        deliveries: log.entries(query.failed_only, query.limit),
    })
}

/// DELETE /api/admin/plugin/deliveries
pub async fn clear_deliveries(State(state): State<Arc<AppState>>) -> Json<DeliveryStats> {
    let log = state.coordinator.delivery_log();
    log.clear();
    Json(log.stats())
}
