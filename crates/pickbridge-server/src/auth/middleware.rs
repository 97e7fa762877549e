use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use pickbridge_db::Role;
use pickbridge_selection::Principal;
use serde_json::json;
use std::sync::Arc;

use super::jwt::{validate_token, Claims, TokenType};
use crate::state::AppState;

/// Extension type to access authenticated user claims in handlers
#[derive(Clone, Debug)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn principal(&self) -> Principal {
        Principal::new(self.0.sub.clone(), self.0.role)
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
}

fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "Admin access required" })),
    )
        .into_response()
}

/// Validate the bearer access token on `request`.
fn access_claims(state: &AppState, request: &Request) -> Result<Claims, Response> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| unauthorized("Missing or invalid Authorization header"))?;

    match validate_token(token, &state.jwt_secret) {
        Ok(claims) if claims.token_type == TokenType::Access => Ok(claims),
        Ok(_) => Err(unauthorized("Invalid token type, access token required")),
        Err(_) => Err(unauthorized("Invalid or expired token")),
    }
}

/// Middleware: require valid access token for a user that still exists
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = match access_claims(&state, &request) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };

    match state.coordinator.find_user(&claims.sub).await {
        Ok(Some(_)) => {
            request.extensions_mut().insert(AuthUser(claims));
            next.run(request).await
        }
        Ok(None) => unauthorized("Account no longer exists"),
        Err(e) => {
            tracing::error!("state store error during auth: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response()
        }
    }
}

/// Middleware: require admin role
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = match access_claims(&state, &request) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };
    if claims.role != Role::Admin {
        return forbidden();
    }

    // SECURITY: verify admin role from the store, not just the JWT
    let is_admin = state
        .coordinator
        .find_user(&claims.sub)
        .await
        .ok()
        .flatten()
        .is_some_and(|u| u.role == Role::Admin);
    if !is_admin {
        return forbidden();
    }

    request.extensions_mut().insert(AuthUser(claims));
    next.run(request).await
}
