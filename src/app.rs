use std::sync::Arc;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{AccessEvaluator, PredicateRegistry};
use crate::composer::NavigationComposer;
use crate::config::NavConfig;
use crate::errors::AppError;
use crate::provider::{HttpModuleProvider, ModuleProvider};
use crate::registry::ModuleRegistry;
use crate::route::RouteDetector;
use crate::routes::{health, navigation, registry};

#[derive(Clone)]
pub struct AppState {
    pub composer: Arc<NavigationComposer>,
    pub provider: Option<Arc<dyn ModuleProvider>>,
}

impl AppState {
    pub fn new(composer: NavigationComposer) -> Self {
        Self {
            composer: Arc::new(composer),
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn ModuleProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Registry, evaluator and provider as configured.
    pub fn from_config(config: &NavConfig) -> Result<Self, AppError> {
        let composer = build_composer(config)?;
        let state = Self::new(composer);
        Ok(match HttpModuleProvider::from_config(config) {
            Some(provider) => {
                tracing::info!(url = %provider.url(), "remote module provider enabled");
                state.with_provider(Arc::new(provider))
            }
            None => state,
        })
    }
}

/// Loads the registry file when one is configured, else the built-in one.
pub fn build_composer(config: &NavConfig) -> Result<NavigationComposer, AppError> {
    let rules = Arc::new(PredicateRegistry::with_builtin());
    let detector = RouteDetector::new(config.module_segment.clone());
    let registry = match &config.registry_path {
        Some(path) => ModuleRegistry::load(path, detector, &rules)?,
        None => ModuleRegistry::builtin(detector, &rules)?,
    };
    let evaluator = AccessEvaluator::new(rules).with_department_policy(config.department_policy);
    Ok(NavigationComposer::new(Arc::new(registry), evaluator))
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/api/registry", registry::routes())
        .nest("/api/navigation", navigation::routes())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
