pub mod app;
pub mod authz;
pub mod cache;
pub mod composer;
pub mod config;
pub mod docs;
pub mod errors;
pub mod events;
pub mod models;
pub mod navigator;
pub mod provider;
pub mod registry;
pub mod route;
pub mod routes;
pub mod view;

// Re-export commonly used items for tests and binaries
pub use app::{create_app, AppState};
pub use authz::{AccessEvaluator, User};
pub use composer::{AccessOutcome, NavigationComposer, ResolvedNavigation};
pub use config::NavConfig;
pub use navigator::{NavigationSnapshot, Navigator};
pub use registry::ModuleRegistry;
