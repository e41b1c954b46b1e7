use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::{
    AppState, database,
    error::{AppError, Result},
};

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

pub async fn readiness_check(State(state): State<AppState>) -> Result<impl IntoResponse> {
    database::check_health(&state.db).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "ready",
            "database": "connected",
            "cache": state.cache.mode(),
        })),
    ))
}

pub async fn api_root() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "message": "Hello 🌍" })))
}

pub async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
