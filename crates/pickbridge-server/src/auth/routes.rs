use axum::{extract::State, http::StatusCode, Extension, Json};
use pickbridge_db::{Role, UserRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::jwt::{generate_token_pair, validate_token, TokenPair, TokenType};
use super::middleware::AuthUser;
use super::password::verify_password;
use crate::state::AppState;

// ─── Request/Response DTOs ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub username: String,
    pub role: Role,
}

impl From<&UserRecord> for UserResponse {
    fn from(user: &UserRecord) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type AuthError = (StatusCode, Json<ErrorResponse>);

fn auth_error(status: StatusCode, message: &str) -> AuthError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn internal(context: &str, e: impl std::fmt::Display) -> AuthError {
    tracing::error!("{context}: {e}");
    auth_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

async fn load_user(state: &AppState, username: &str) -> Result<Option<UserRecord>, AuthError> {
    state
        .coordinator
        .find_user(username)
        .await
        .map_err(|e| internal("state store error", e))
}

fn issue_tokens(state: &AppState, user: &UserRecord) -> Result<TokenPair, AuthError> {
    generate_token_pair(&user.username, user.role, &state.jwt_secret)
        .map_err(|e| internal("token error", e))
}

// ─── Handlers ──────────────────────────────────────────────────────

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let invalid = || auth_error(StatusCode::UNAUTHORIZED, "Invalid credentials");

    let user = load_user(&state, body.username.trim())
        .await?
        .ok_or_else(invalid)?;

    // Seeded accounts without a usable hash cannot log in.
    let valid = verify_password(&body.password, &user.password_hash).unwrap_or(false);
    if !valid {
        tracing::info!(username = %user.username, "login rejected");
        return Err(invalid());
    }

    let tokens = issue_tokens(&state, &user)?;
    tracing::info!(username = %user.username, role = %user.role, "login");
    Ok(Json(AuthResponse {
        user: UserResponse::from(&user),
        tokens,
    }))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, AuthError> {
    let claims = validate_token(&body.refresh_token, &state.jwt_secret).map_err(|_| {
        auth_error(StatusCode::UNAUTHORIZED, "Invalid or expired refresh token")
    })?;

    if claims.token_type != TokenType::Refresh {
        return Err(auth_error(StatusCode::UNAUTHORIZED, "Invalid token type"));
    }

    // Role comes from the store so demotions take effect on refresh.
    let user = load_user(&state, &claims.sub)
        .await?
        .ok_or_else(|| auth_error(StatusCode::UNAUTHORIZED, "User not found"))?;

    Ok(Json(issue_tokens(&state, &user)?))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<UserResponse>, AuthError> {
    let user = load_user(&state, &auth_user.0.sub)
        .await?
        .ok_or_else(|| auth_error(StatusCode::NOT_FOUND, "User not found"))?;
    Ok(Json(UserResponse::from(&user)))
}
