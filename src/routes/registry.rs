//! Read-only views of the module registry.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::module::ModuleDescriptor;
use crate::models::navigation::{AccessRequirement, IconRef};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/modules", get(list_modules))
        .route("/modules/:key", get(get_module))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModuleSummary {
    #[schema(example = "hr")]
    pub key: String,
    #[schema(example = "Human Resources")]
    pub label: String,
    pub icon: IconRef,
    #[schema(example = "/dashboard/modules/hr")]
    pub base_path: String,
    pub required: AccessRequirement,
    pub sections: usize,
    pub items: usize,
}

impl From<&ModuleDescriptor> for ModuleSummary {
    fn from(module: &ModuleDescriptor) -> Self {
        Self {
            key: module.key.clone(),
            label: module.label.clone(),
            icon: module.icon,
            base_path: module.base_path.clone(),
            required: module.required.clone(),
            sections: module.sections.len(),
            items: module.items().count(),
        }
    }
}

/// List registered modules
#[utoipa::path(
    get,
    path = "/api/registry/modules",
    tag = "Registry",
    responses((status = 200, description = "Registered modules", body = Vec<ModuleSummary>))
)]
pub async fn list_modules(State(state): State<AppState>) -> AppResult<Json<Vec<ModuleSummary>>> {
    let modules = state
        .composer
        .registry()
        .modules()
        .iter()
        .map(ModuleSummary::from)
        .collect();
    Ok(Json(modules))
}

/// Full descriptor of one module, unfiltered
#[utoipa::path(
    get,
    path = "/api/registry/modules/{key}",
    tag = "Registry",
    params(("key" = String, Path, description = "Module key")),
    responses(
        (status = 200, description = "Module descriptor"),
        (status = 404, description = "Module not registered"),
    )
)]
pub async fn get_module(State(state): State<AppState>, Path(key): Path<String>) -> AppResult<Json<ModuleDescriptor>> {
    state
        .composer
        .registry()
        .get(&key)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("module '{key}' is not registered")))
}
