//! Account administration. New accounts default to the streamer role.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use pickbridge_db::{PlayerId, Role};
use pickbridge_selection::AccountSummary;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::password::{check_password_policy, hash_password};
use crate::error::{api_error, selection_error, ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<AccountSummary>,
}

#[derive(Debug, Serialize)]
pub struct DeletedUserResponse {
    pub deleted: String,
    /// Players released from the account's selection set.
    pub released: Vec<PlayerId>,
}

/// GET /api/admin/users
pub async fn list_users(State(state): State<Arc<AppState>>) -> ApiResult<UsersResponse> {
    let users = state.coordinator.list_users().await.map_err(selection_error)?;
    Ok(Json(UsersResponse { users }))
}

/// POST /api/admin/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<AccountSummary>), ApiError> {
    check_password_policy(&body.password).map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    let password_hash = hash_password(&body.password).map_err(|e| {
        tracing::error!("hash error: {e}");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    })?;

    let account = state
        .coordinator
        .create_user(
            &body.username,
            password_hash,
            body.role.unwrap_or(Role::Streamer),
        )
        .await
        .map_err(selection_error)?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// DELETE /api/admin/users/{username}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> ApiResult<DeletedUserResponse> {
    let released = state
        .coordinator
        .delete_user(&username)
        .await
        .map_err(selection_error)?;
    Ok(Json(DeletedUserResponse {
        deleted: username,
        released,
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::test_util::send;
    use crate::state::test_support::{bearer, test_state};
    use axum::http::{Method, StatusCode};
    use pickbridge_db::{Document, Role};
    use serde_json::json;

    #[tokio::test]
    async fn test_create_list_delete_streamer() {
        let app = crate::build_app(test_state(Document::default()));
        let admin = bearer("admin", Role::Admin);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/admin/users",
            Some(&admin),
            Some(json!({ "username": "luna", "password": "luna-secret" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "streamer");
        assert!(body.get("password_hash").is_none());

        let (_, list) = send(&app, Method::GET, "/api/admin/users", Some(&admin), None).await;
        let names: Vec<&str> = list["users"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["username"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"luna"));

        let (status, body) =
            send(&app, Method::DELETE, "/api/admin/users/luna", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["released"], json!([]));
    }

    #[tokio::test]
    async fn test_duplicate_and_weak_password() {
        let app = crate::build_app(test_state(Document::default()));
        let admin = bearer("admin", Role::Admin);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/admin/users",
            Some(&admin),
            Some(json!({ "username": "nova", "password": "long-enough" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/admin/users",
            Some(&admin),
            Some(json!({ "username": "luna", "password": "short" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_account_cannot_be_deleted() {
        let app = crate::build_app(test_state(Document::default()));
        let admin = bearer("admin", Role::Admin);
        let (status, _) =
            send(&app, Method::DELETE, "/api/admin/users/admin", Some(&admin), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
