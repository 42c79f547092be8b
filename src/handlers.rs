//! App CRUD handlers.
//!
//! Handlers receive the request's [`RequestScope`] as an extension (installed
//! by the transaction middleware) and must do all writes through it so they
//! participate in the per-request transaction.

use crate::db::RequestScope;
use crate::error::AppError;
use crate::model::App;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CreateAppRequest {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub api_token: String,
    #[serde(default)]
    pub is_removed: bool,
}

pub async fn create_app(
    State(state): State<AppState>,
    Extension(scope): Extension<Arc<RequestScope>>,
    Json(req): Json<CreateAppRequest>,
) -> Result<(StatusCode, Json<App>), AppError> {
    uuid::Uuid::parse_str(&req.id)
        .map_err(|_| AppError::BadRequest("id must be a uuid".into()))?;

    let now = chrono::Utc::now().timestamp_millis();
    let app = App {
        id: req.id,
        name: req.name,
        org_id: req.org_id,
        api_token: req.api_token,
        created_at: now,
        updated_at: now,
        is_removed: req.is_removed,
    };
    state.apps.create_app(&scope, &app).await?;
    Ok((StatusCode::CREATED, Json(app)))
}

pub async fn get_app(
    State(state): State<AppState>,
    Extension(scope): Extension<Arc<RequestScope>>,
    Path(id): Path<String>,
) -> Result<Json<App>, AppError> {
    let app = state.apps.get_app_by_id(&scope, &id).await?;
    Ok(Json(app))
}
