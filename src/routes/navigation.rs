//! Navigation resolution endpoints.
//!
//! The caller supplies the user snapshot (and optionally the remote module
//! list); the server never authenticates or authorizes anything here.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use crate::app::AppState;
use crate::authz::User;
use crate::composer::{AccessOutcome, NavigationSource};
use crate::errors::{AppError, AppResult};
use crate::events::Diagnostic;
use crate::models::module::ModuleSidebar;
use crate::models::navigation::Section;
use crate::models::remote::RemoteModuleRecord;
use crate::route::normalize_path;

// =============================================================================
// ROUTER
// =============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/resolve", post(resolve))
        .route("/access", post(check_access))
        .route("/modules/:key", post(module_sidebar))
}

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveRequest {
    pub user: User,
    /// Current route; adds the module sidebar and access outcome
    #[serde(default)]
    #[schema(example = "/dashboard/modules/hr/employees")]
    pub path: Option<String>,
    /// Fetched from the configured provider when omitted
    #[serde(default)]
    pub remote_modules: Option<Vec<RemoteModuleRecord>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResolveResponse {
    pub source: NavigationSource,
    pub fingerprint: String,
    #[schema(value_type = Object)]
    pub sections: Vec<Section>,
    #[schema(value_type = Object)]
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub module_sidebar: Option<ModuleSidebar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessOutcome>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AccessRequest {
    pub user: User,
    #[schema(example = "/dashboard/system/users")]
    pub path: String,
    #[serde(default)]
    pub remote_modules: Option<Vec<RemoteModuleRecord>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessResponse {
    pub path: String,
    pub module: Option<String>,
    pub outcome: AccessOutcome,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Resolve the visible navigation for a user
///
/// The response carries an `ETag` over the whole body, route-dependent fields
/// included; a request whose `If-None-Match` matches gets `304 Not Modified`.
#[utoipa::path(
    post,
    path = "/api/navigation/resolve",
    tag = "Navigation",
    request_body = ResolveRequest,
    responses(
        (status = 200, description = "Resolved navigation", body = ResolveResponse),
        (status = 304, description = "Navigation unchanged"),
    )
)]
pub async fn resolve(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ResolveRequest>,
) -> AppResult<Response> {
    let (remote, fetch_diagnostics) = remote_modules(&state, &request.user, request.remote_modules).await;
    let composer = &state.composer;

    let mut navigation = composer.resolve(&request.user, remote.as_deref());
    let resolved = std::mem::take(&mut navigation.diagnostics);
    navigation.diagnostics = fetch_diagnostics.into_iter().chain(resolved).collect();

    let active_module = request
        .path
        .as_deref()
        .and_then(|path| composer.registry().detect_module(path))
        .map(|module| module.key.clone());
    let module_sidebar = active_module
        .as_deref()
        .and_then(|key| composer.module_sidebar(key, &request.user));
    let access = request
        .path
        .as_deref()
        .map(|path| composer.check_access(&request.user, path, remote.as_deref()));

    let body = ResolveResponse {
        source: navigation.source,
        fingerprint: navigation.fingerprint(),
        sections: navigation.sections,
        diagnostics: navigation.diagnostics,
        active_module,
        module_sidebar,
        access,
    };

    let etag = body_etag(&body);
    let unchanged = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == etag);
    if unchanged {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
    }

    Ok(([(header::ETAG, etag)], Json(body)).into_response())
}

/// Decide whether a direct navigation to a path is allowed
#[utoipa::path(
    post,
    path = "/api/navigation/access",
    tag = "Navigation",
    request_body = AccessRequest,
    responses((status = 200, description = "Access outcome", body = AccessResponse))
)]
pub async fn check_access(State(state): State<AppState>, Json(request): Json<AccessRequest>) -> AppResult<Json<AccessResponse>> {
    if request.path.trim().is_empty() {
        return Err(AppError::bad_request("path must not be empty"));
    }

    let (remote, _) = remote_modules(&state, &request.user, request.remote_modules).await;
    let composer = &state.composer;
    let outcome = composer.check_access(&request.user, &request.path, remote.as_deref());
    let module = composer
        .registry()
        .detect_module(&request.path)
        .map(|module| module.key.clone());

    Ok(Json(AccessResponse {
        path: normalize_path(&request.path),
        module,
        outcome,
    }))
}

/// A module's contextual sidebar filtered for the user
#[utoipa::path(
    post,
    path = "/api/navigation/modules/{key}",
    tag = "Navigation",
    params(("key" = String, Path, description = "Module key")),
    request_body = User,
    responses(
        (status = 200, description = "Filtered module sidebar"),
        (status = 404, description = "Module not registered"),
    )
)]
pub async fn module_sidebar(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(user): Json<User>,
) -> AppResult<Json<ModuleSidebar>> {
    state
        .composer
        .module_sidebar(&key, &user)
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("module '{key}' is not registered")))
}

/// Quoted SHA-256 of the serialized response.
fn body_etag(body: &ResolveResponse) -> String {
    let bytes = serde_json::to_vec(body).unwrap_or_default();
    format!("\"{}\"", hex::encode(Sha256::digest(&bytes)))
}

/// Request-supplied records win; otherwise the configured provider is asked.
/// A provider failure degrades to the registry fallback.
async fn remote_modules(
    state: &AppState,
    user: &User,
    supplied: Option<Vec<RemoteModuleRecord>>,
) -> (Option<Vec<RemoteModuleRecord>>, Vec<Diagnostic>) {
    if supplied.is_some() {
        return (supplied, Vec::new());
    }
    let Some(provider) = &state.provider else {
        return (None, Vec::new());
    };

    match provider.fetch_user_modules(user).await {
        Ok(records) => (Some(records), Vec::new()),
        Err(err) => {
            let diagnostic = Diagnostic::FetchFailure { error: err.to_string() };
            diagnostic.log();
            (None, vec![diagnostic])
        }
    }
}
