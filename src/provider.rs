//! Remote module providers.

use std::time::Duration;

use async_trait::async_trait;

use crate::authz::User;
use crate::config::NavConfig;
use crate::errors::FetchError;
use crate::models::remote::{RemoteModuleRecord, RemoteModulesResponse};

/// Source of the modules provisioned for the current user.
#[async_trait]
pub trait ModuleProvider: Send + Sync {
    async fn fetch_user_modules(&self, user: &User) -> Result<Vec<RemoteModuleRecord>, FetchError>;
}

/// Calls the backend's "user modules" endpoint.
///
/// Expects `{"success": true, "data": [...]}`. A `success: false` body, a
/// non-2xx status or a timeout are all failures.
#[derive(Debug, Clone)]
pub struct HttpModuleProvider {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpModuleProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            token: None,
            timeout,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// `None` when no modules URL is configured.
    pub fn from_config(config: &NavConfig) -> Option<Self> {
        let url = config.modules_url.as_ref()?;
        let provider = Self::new(url.clone(), config.fetch_timeout);
        Some(match &config.api_token {
            Some(token) => provider.with_token(token.clone()),
            None => provider,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self) -> Result<Vec<RemoteModuleRecord>, FetchError> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: RemoteModulesResponse = response.json().await?;
        if !body.success {
            return Err(FetchError::Rejected);
        }
        Ok(body.data)
    }
}

#[async_trait]
impl ModuleProvider for HttpModuleProvider {
    async fn fetch_user_modules(&self, user: &User) -> Result<Vec<RemoteModuleRecord>, FetchError> {
        tracing::debug!(url = %self.url, role_level = user.role_level, "fetching user modules");

        let result = match tokio::time::timeout(self.timeout, self.request()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        };

        match &result {
            Ok(records) => tracing::debug!(count = records.len(), "user modules fetched"),
            Err(err) => tracing::warn!(url = %self.url, error = %err, "user modules fetch failed"),
        }
        result
    }
}

/// Fixed answer, for offline use and tests.
#[derive(Debug, Clone)]
pub struct StaticModuleProvider {
    result: Result<Vec<RemoteModuleRecord>, FetchError>,
}

impl StaticModuleProvider {
    pub fn new(records: Vec<RemoteModuleRecord>) -> Self {
        Self { result: Ok(records) }
    }

    pub fn failing(error: FetchError) -> Self {
        Self { result: Err(error) }
    }
}

#[async_trait]
impl ModuleProvider for StaticModuleProvider {
    async fn fetch_user_modules(&self, _user: &User) -> Result<Vec<RemoteModuleRecord>, FetchError> {
        self.result.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_requires_url() {
        assert!(HttpModuleProvider::from_config(&NavConfig::default()).is_none());

        let config = NavConfig {
            modules_url: Some("http://localhost:9/modules".into()),
            api_token: Some("secret".into()),
            ..NavConfig::default()
        };
        let provider = HttpModuleProvider::from_config(&config).unwrap();
        assert_eq!(provider.url(), "http://localhost:9/modules");
        assert_eq!(provider.token.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn static_provider_returns_its_answer() {
        let user = User::new(300);
        let provider = StaticModuleProvider::failing(FetchError::Rejected);
        assert_eq!(provider.fetch_user_modules(&user).await, Err(FetchError::Rejected));
    }
}
