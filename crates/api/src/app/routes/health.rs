use std::sync::Arc;

use axum::{extract::Extension, routing::get, Json, Router};

use schelper_infra::DbState;

use crate::app::dto::StatusResponse;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub const PREFIX: &str = "/healthz";

pub fn router() -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/healthz/", get(health))
        .route("/healthz/db", get(health_db))
}

pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse::OK)
}

/// Redacted database location and which expected tables exist.
pub async fn health_db(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<DbState>, ApiError> {
    services
        .db
        .inspect()
        .await
        .map(Json)
        .map_err(|e| ApiError::Unavailable(e.to_string()))
}
