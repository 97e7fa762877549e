use axum::{
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use pickbridge_plugin::NotifierConfig;
use pickbridge_selection::SelectionError;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod api;
mod auth;
mod error;
mod state;

use state::AppState;

const DEV_JWT_SECRET: &str = "dev-secret-change-me-in-production";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Serialize)]
struct ApiStatus {
    status: &'static str,
    version: &'static str,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // State store
    let store_config = pickbridge_db::StoreConfig::from_env();
    tracing::info!(backend = ?store_config.backend, "opening state store...");
    let store = pickbridge_db::connect(&store_config)
        .await
        .expect("failed to open state store");

    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string());

    // SECURITY: warn if JWT secret is the default fallback
    if jwt_secret == DEV_JWT_SECRET {
        tracing::error!(
            "JWT_SECRET is not set, using a known development value. \
             Set JWT_SECRET to a strong random string (≥32 chars) in production."
        );
        if std::env::var("PICKBRIDGE_ENV").unwrap_or_default() == "production" {
            panic!("Refusing to start: JWT_SECRET must be set to a secure value in production.");
        }
    }

    let notifier_config = NotifierConfig::from_env();
    tracing::info!(
        timeout_ms = notifier_config.timeout.as_millis() as u64,
        "plugin notifier configured"
    );
    let state = Arc::new(
        AppState::new(store, &notifier_config, jwt_secret)
            .expect("failed to build plugin HTTP client"),
    );

    bootstrap_admin(&state).await;

    let app = build_app(state.clone());

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()
        .expect("BIND_ADDR must be a socket address such as 0.0.0.0:3000");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    tracing::info!(%addr, "server started");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("server error");

    tracing::info!("flushing pending plugin notifications...");
    state.coordinator.flush_notifications().await;
    tracing::info!("shutdown complete");
}

/// Create the first admin from ADMIN_USERNAME / ADMIN_PASSWORD on an empty store.
async fn bootstrap_admin(state: &AppState) {
    let username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let password =
        std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string());

    let created = state
        .coordinator
        .bootstrap_admin(&username, || {
            auth::password::hash_password(&password).map_err(|e| {
                SelectionError::InvalidConfig(format!("cannot hash ADMIN_PASSWORD: {e}"))
            })
        })
        .await
        .expect("failed to bootstrap admin account");

    if created && password == DEFAULT_ADMIN_PASSWORD {
        tracing::warn!(
            %username,
            "admin account uses the default password, set ADMIN_PASSWORD before exposing the server"
        );
    }
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
    tracing::info!("shutting down gracefully...");
}

fn cors_layer() -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let allowed_origins_str = std::env::var("CORS_ORIGINS").unwrap_or_default();

    if allowed_origins_str.is_empty() {
        // Default: same-origin only
        tracing::warn!(
            "CORS_ORIGINS not set, cross-origin requests are refused. \
             Set CORS_ORIGINS=http://localhost:5173 for dev."
        );
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(Vec::<HeaderValue>::new()))
            .allow_methods(methods)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins_str
            .split(',')
            .filter_map(|s| HeaderValue::from_str(s.trim()).ok())
            .collect();
        tracing::info!("CORS allowed origins: {:?}", origins);
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    }
}

/// Assemble every route, middleware and response header.
fn build_app(state: Arc<AppState>) -> Router {
    // Rate limiter for auth endpoints: burst of 10 per IP, refilled every 6s
    let auth_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(6)
            .burst_size(10)
            .finish()
            .expect("failed to build rate limiter config"),
    );

    // Auth routes (public, rate-limited)
    let auth_public = Router::new()
        .route("/login", post(auth::routes::login))
        .route("/refresh", post(auth::routes::refresh))
        .layer(GovernorLayer::new(auth_governor_conf));

    let auth_protected = Router::new()
        .route("/me", get(auth::routes::me))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    // Any signed-in user
    let streamer_api = Router::new()
        .route("/players", get(api::players::list_players))
        .route("/selections", get(api::selections::my_selections))
        .route("/selections/{player_id}", post(api::selections::toggle))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let admin_api = Router::new()
        .route(
            "/players",
            get(api::players::list_players).post(api::players::create_player),
        )
        .route(
            "/players/{id}",
            patch(api::players::update_player).delete(api::players::delete_player),
        )
        .route(
            "/tags",
            get(api::tags::list_tags).post(api::tags::add_tag),
        )
        .route("/tags/{name}", delete(api::tags::remove_tag))
        .route(
            "/users",
            get(api::users::list_users).post(api::users::create_user),
        )
        .route("/users/{username}", delete(api::users::delete_user))
        .route("/selections", get(api::selections::list_all))
        .route(
            "/selections/{streamer}",
            get(api::selections::get_for_streamer),
        )
        .route(
            "/selections/{streamer}/{player_id}",
            post(api::selections::admin_add).delete(api::selections::admin_remove),
        )
        .route(
            "/settings/limit",
            get(api::settings::get_limit).put(api::settings::set_limit),
        )
        .route(
            "/plugin/endpoint",
            get(api::plugin::get_endpoint).put(api::plugin::set_endpoint),
        )
        .route("/plugin/resend", post(api::plugin::resend_all))
        .route("/plugin/test", post(api::plugin::test_connection))
        .route(
            "/plugin/deliveries",
            get(api::plugin::list_deliveries).delete(api::plugin::clear_deliveries),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_admin,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_public.merge(auth_protected))
        .merge(streamer_api)
        .nest("/admin", admin_api);

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::HeaderName::from_static("content-security-policy"),
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("no-referrer"),
        ))
        .with_state(state)
}

async fn healthz() -> Json<ApiStatus> {
    Json(ApiStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_util::send;
    use crate::state::test_support::{bearer, test_state};
    use axum::{body::Body, http::Request, http::StatusCode};
    use pickbridge_db::{Document, Role};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_healthz() {
        let app = build_app(test_state(Document::default()));
        let (status, body) = send(&app, Method::GET, "/healthz", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_security_headers_present() {
        let app = build_app(test_state(Document::default()));
        let resp = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let headers = resp.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_me_returns_account() {
        let app = build_app(test_state(Document::default()));
        let (status, body) = send(
            &app,
            Method::GET,
            "/api/auth/me",
            Some(&bearer("kai", Role::Streamer)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "kai");
        assert_eq!(body["role"], "streamer");
    }

    #[tokio::test]
    async fn test_bootstrap_admin_skips_populated_store() {
        let state = test_state(Document::default());
        bootstrap_admin(&state).await;
        let users = state.coordinator.list_users().await.unwrap();
        assert_eq!(users.len(), 3);
    }
}
