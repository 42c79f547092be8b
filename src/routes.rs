//! Router assembly: health endpoints, app routes, middleware stack.

use crate::handlers;
use crate::middleware::transaction;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    middleware::from_fn,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, cors::{Any, CorsLayer}, trace::TraceLayer};

/// Bound on the readiness database probe.
const READY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<HealthBody>) {
    match tokio::time::timeout(READY_TIMEOUT, state.db.ping()).await {
        Ok(Ok(())) => (StatusCode::OK, Json(HealthBody { status: "ok" })),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "readiness probe failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthBody { status: "degraded" }),
            )
        }
        Err(_) => {
            tracing::error!("readiness probe timed out");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthBody { status: "timeout" }),
            )
        }
    }
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Liveness, readiness, and version routes.
pub fn health_routes(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/readyz", get(ready))
        .route("/version", get(version))
        .with_state(state)
}

/// App CRUD routes, wrapped in the transaction middleware.
pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/apps", post(handlers::create_app))
        .route("/apps/:id", get(handlers::get_app))
        .layer(from_fn(transaction))
        .with_state(state)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ORIGIN,
            HeaderName::from_static("session-key"),
            HeaderName::from_static("api-token"),
        ])
}

/// Full service router: health endpoints at the root, app routes under
/// `/api/v1`, CORS + compression + trace layers outermost.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health_routes(state.clone()))
        .nest("/api/v1", app_routes(state))
        .layer(cors())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}
