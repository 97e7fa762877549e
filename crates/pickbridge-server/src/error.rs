use axum::{http::StatusCode, Json};
use pickbridge_selection::SelectionError;
use serde_json::{json, Value};

pub type ApiError = (StatusCode, Json<Value>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

/// Map an engine error to its HTTP response.
pub fn selection_error(err: SelectionError) -> ApiError {
    let status = match &err {
        SelectionError::NotFound(_) => StatusCode::NOT_FOUND,
        SelectionError::LimitExceeded { .. }
        | SelectionError::AlreadyClaimed { .. }
        | SelectionError::AlreadyExists(_) => StatusCode::CONFLICT,
        SelectionError::InvalidConfig(_) | SelectionError::InvalidInput(_) => {
            StatusCode::BAD_REQUEST
        }
        SelectionError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        SelectionError::DeliveryFailed(_) => StatusCode::BAD_GATEWAY,
        SelectionError::Store(e) => {
            tracing::error!("state store error: {e}");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    let body = match &err {
        SelectionError::LimitExceeded { held, limit, .. } => json!({
            "error": err.to_string(),
            "limit": limit,
            "held": held,
        }),
        SelectionError::AlreadyClaimed { player_id, holder } => json!({
            "error": err.to_string(),
            "player_id": player_id,
            "holder": holder,
        }),
        SelectionError::DeliveryFailed(cause) => json!({
            "error": err.to_string(),
            "cause": cause,
        }),
        _ => json!({ "error": err.to_string() }),
    };
    (status, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickbridge_db::StoreError;
    use pickbridge_plugin::DeliveryFailure;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (SelectionError::NotFound("player 1".into()), StatusCode::NOT_FOUND),
            (
                SelectionError::LimitExceeded {
                    streamer: "nova".into(),
                    held: 2,
                    limit: 2,
                },
                StatusCode::CONFLICT,
            ),
            (
                SelectionError::AlreadyClaimed {
                    player_id: 5,
                    holder: "nova".into(),
                },
                StatusCode::CONFLICT,
            ),
            (SelectionError::AlreadyExists("user nova".into()), StatusCode::CONFLICT),
            (SelectionError::InvalidConfig("port".into()), StatusCode::BAD_REQUEST),
            (SelectionError::InvalidInput("name".into()), StatusCode::BAD_REQUEST),
            (SelectionError::PermissionDenied("no".into()), StatusCode::FORBIDDEN),
            (
                SelectionError::DeliveryFailed(DeliveryFailure::Timeout { timeout_ms: 5000 }),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(selection_error(err).0, expected);
        }
    }

    #[test]
    fn test_store_error_is_not_leaked() {
        let (status, Json(body)) =
            selection_error(SelectionError::Store(StoreError::Config("secret path".into())));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn test_claim_conflict_names_holder() {
        let (_, Json(body)) = selection_error(SelectionError::AlreadyClaimed {
            player_id: 5,
            holder: "nova".into(),
        });
        assert_eq!(body["holder"], "nova");
        assert_eq!(body["player_id"], 5);
    }

    #[test]
    fn test_delivery_failure_carries_cause() {
        let (_, Json(body)) = selection_error(SelectionError::DeliveryFailed(
            DeliveryFailure::Status { status: 401 },
        ));
        assert_eq!(body["cause"]["kind"], "status");
        assert_eq!(body["cause"]["status"], 401);
    }
}
