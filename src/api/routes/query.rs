use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{error::ApiError, state::AppState};
use crate::domain::SupportResponse;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub text: String,
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
    pub threshold: f32,
}

pub async fn query_handler(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<SupportResponse>, ApiError> {
    let response = state
        .orchestrator
        .handle_query(&request.text, request.session_id)
        .await?;
    Ok(Json(response))
}

pub async fn list_categories(State(state): State<AppState>) -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        categories: state.categories.names().into_iter().map(String::from).collect(),
        threshold: state.config.config.classification.threshold,
    })
}
