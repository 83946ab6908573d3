use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub entries: usize,
    pub dimension: usize,
    pub metric: String,
    pub embedding_model: String,
    pub loaded_at: DateTime<Utc>,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, StatusCode> {
    let snapshot = state.store.current().map_err(|e| {
        tracing::error!(error = %e, "knowledge snapshot unavailable");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Json(ReadinessResponse {
        status: "ready".into(),
        entries: snapshot.knowledge().len(),
        dimension: snapshot.dimension(),
        metric: snapshot.index().metric().as_str().into(),
        embedding_model: snapshot.embedding_model().into(),
        loaded_at: snapshot.loaded_at(),
    }))
}
