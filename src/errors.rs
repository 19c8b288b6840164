use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type AppResult<T> = Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = self.to_string();
        let error = match &self {
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Configuration(_) => "configuration",
            AppError::Registry(_) => "registry",
        };

        let payload = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(payload)).into_response()
    }
}

/// Module registry rejected at construction or load time.
#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("module key '{0}' must be a non-empty lowercase slug")]
    InvalidKey(String),
    #[error("module key '{0}' is registered more than once")]
    DuplicateKey(String),
    #[error("module '{key}' base path '{base_path}' does not route back to the module")]
    BasePathMismatch { key: String, base_path: String },
    #[error("path '{0}' must be absolute")]
    InvalidPath(String),
    #[error("path '{path}' appears twice in section '{section}'")]
    DuplicatePath { section: String, path: String },
    #[error("item '{path}' lies outside module '{module}'")]
    OutsideBasePath { module: String, path: String },
    #[error("global item '{0}' may not use the modules section")]
    ReservedSection(String),
    #[error("module '{0}' has a section without a title")]
    EmptySectionTitle(String),
    #[error("item '{path}' references unregistered predicate '{name}'")]
    UnknownPredicate { path: String, name: String },
    #[error("failed to parse registry at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read registry file: {0}")]
    Io(#[from] std::io::Error),
}

/// Remote module provider could not deliver a usable list.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("provider reported failure")]
    Rejected,
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else if let Some(status) = value.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

/// A `hidden` rule that could not be evaluated.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PredicateError {
    #[error("no rule registered as '{0}'")]
    UnknownRule(String),
    #[error("rule '{name}' failed: {reason}")]
    RuleFailed { name: String, reason: String },
}

impl PredicateError {
    pub fn unknown_rule(name: impl Into<String>) -> Self {
        Self::UnknownRule(name.into())
    }

    pub fn rule_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RuleFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
