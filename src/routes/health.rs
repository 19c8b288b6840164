use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::errors::AppResult;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub modules: usize,
    pub global_items: usize,
    pub remote_provider: bool,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Health check", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let registry = state.composer.registry();
    Ok(Json(HealthResponse {
        status: "ok",
        modules: registry.modules().len(),
        global_items: registry.global_items().len(),
        remote_provider: state.provider.is_some(),
    }))
}
