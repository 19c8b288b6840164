use std::path::PathBuf;
use std::time::Duration;

use crate::authz::DepartmentPolicy;
use crate::errors::AppError;
use crate::route::DEFAULT_MODULE_SEGMENT;

/// Runtime settings read from the environment (`.env` is loaded first by the
/// binaries).
#[derive(Debug, Clone)]
pub struct NavConfig {
    pub port: u16,
    /// JSON registry document; the built-in registry is used when unset
    pub registry_path: Option<PathBuf>,
    /// "User modules" endpoint; navigation stays on the registry when unset
    pub modules_url: Option<String>,
    pub api_token: Option<String>,
    pub module_segment: String,
    pub department_policy: DepartmentPolicy,
    pub fetch_timeout: Duration,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            registry_path: None,
            modules_url: None,
            api_token: None,
            module_segment: DEFAULT_MODULE_SEGMENT.to_string(),
            department_policy: DepartmentPolicy::default(),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

impl NavConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());

        let port = get("APP_PORT")
            .map(|value| value.parse::<u16>())
            .unwrap_or(Ok(defaults.port))
            .map_err(|_| AppError::configuration("APP_PORT must be a valid port number"))?;

        let module_segment = match get("NAV_MODULE_SEGMENT") {
            Some(segment) => {
                let segment = segment.trim_matches('/').to_string();
                if segment.is_empty() || segment.contains('/') {
                    return Err(AppError::configuration("NAV_MODULE_SEGMENT must be a single path segment"));
                }
                segment
            }
            None => defaults.module_segment,
        };

        let department_policy = get("NAV_DEPARTMENT_POLICY")
            .unwrap_or_default()
            .parse::<DepartmentPolicy>()
            .map_err(|_| AppError::configuration("NAV_DEPARTMENT_POLICY must be 'lenient' or 'strict'"))?;

        let fetch_timeout = get("NAV_FETCH_TIMEOUT_SECS")
            .map(|value| value.parse::<u64>())
            .unwrap_or(Ok(defaults.fetch_timeout.as_secs()))
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| AppError::configuration("NAV_FETCH_TIMEOUT_SECS must be a positive integer"))?;

        Ok(Self {
            port,
            registry_path: get("NAV_REGISTRY_PATH").map(PathBuf::from),
            modules_url: get("NAV_MODULES_URL"),
            api_token: get("NAV_API_TOKEN"),
            module_segment,
            department_policy,
            fetch_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<NavConfig, AppError> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        NavConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.module_segment, "modules");
        assert_eq!(config.department_policy, DepartmentPolicy::Lenient);
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert!(config.modules_url.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("APP_PORT", "9100"),
            ("NAV_MODULE_SEGMENT", "/apps/"),
            ("NAV_DEPARTMENT_POLICY", "strict"),
            ("NAV_FETCH_TIMEOUT_SECS", "3"),
            ("NAV_MODULES_URL", "http://erp.local/api/v1/user-modules"),
        ])
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.module_segment, "apps");
        assert_eq!(config.department_policy, DepartmentPolicy::Strict);
        assert_eq!(config.fetch_timeout, Duration::from_secs(3));
        assert_eq!(config.modules_url.as_deref(), Some("http://erp.local/api/v1/user-modules"));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(config(&[("APP_PORT", "eighty")]), Err(AppError::Configuration(_))));
        assert!(matches!(config(&[("NAV_FETCH_TIMEOUT_SECS", "0")]), Err(AppError::Configuration(_))));
        assert!(matches!(config(&[("NAV_MODULE_SEGMENT", "a/b")]), Err(AppError::Configuration(_))));
        assert!(matches!(config(&[("NAV_DEPARTMENT_POLICY", "loose")]), Err(AppError::Configuration(_))));
    }
}
