use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::api::{error::ApiError, state::AppState};

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub status: String,
    pub entries: usize,
    pub dimension: usize,
    pub loaded_at: DateTime<Utc>,
}

/// Rebuilds the snapshot from the configured dataset and swaps it in. Queries already
/// running finish on the snapshot they started with.
pub async fn reload_knowledge(
    State(state): State<AppState>,
) -> Result<Json<ReloadResponse>, ApiError> {
    let snapshot = state.loader.reload(&state.store).await?;
    info!(
        entries = snapshot.knowledge().len(),
        dimension = snapshot.dimension(),
        "knowledge snapshot reloaded"
    );

    Ok(Json(ReloadResponse {
        status: "reloaded".into(),
        entries: snapshot.knowledge().len(),
        dimension: snapshot.dimension(),
        loaded_at: snapshot.loaded_at(),
    }))
}
