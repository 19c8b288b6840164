use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A module provisioned for the user, as reported by the backend.
///
/// `code` and `name` stay optional so one malformed record does not fail the
/// whole response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoteModuleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "HR")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Human Resources")]
    pub name: Option<String>,
    #[serde(default, alias = "required_role_level")]
    #[schema(example = 300)]
    pub required_role_level: u32,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl RemoteModuleRecord {
    pub fn new(code: impl Into<String>, name: impl Into<String>, required_role_level: u32) -> Self {
        Self {
            code: Some(code.into()),
            name: Some(name.into()),
            required_role_level,
            permissions: Vec::new(),
        }
    }

    /// Route slug for this record's code, if it has a usable one.
    pub fn slug(&self) -> Option<String> {
        self.code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(module_slug)
    }
}

/// Body of the "user modules" endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RemoteModulesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Vec<RemoteModuleRecord>,
}

/// Lower-cases a module code and turns underscores into hyphens.
pub fn module_slug(code: &str) -> String {
    code.trim().to_lowercase().replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_lowercase_hyphenated() {
        assert_eq!(module_slug("HUMAN_RESOURCES"), "human-resources");
        assert_eq!(module_slug(" Payroll "), "payroll");
    }

    #[test]
    fn blank_code_has_no_slug() {
        let record = RemoteModuleRecord {
            code: Some("   ".into()),
            ..RemoteModuleRecord::default()
        };
        assert_eq!(record.slug(), None);
    }

    #[test]
    fn accepts_camel_case_and_snake_case_levels() {
        let camel: RemoteModuleRecord =
            serde_json::from_str(r#"{"code": "HR", "name": "HR", "requiredRoleLevel": 300}"#).unwrap();
        let snake: RemoteModuleRecord =
            serde_json::from_str(r#"{"code": "HR", "name": "HR", "required_role_level": 300}"#).unwrap();
        assert_eq!(camel.required_role_level, 300);
        assert_eq!(snake, camel);
    }

    #[test]
    fn missing_fields_still_parse() {
        let response: RemoteModulesResponse =
            serde_json::from_str(r#"{"success": true, "data": [{"name": "No code"}]}"#).unwrap();
        assert!(response.success);
        assert_eq!(response.data[0].code, None);
    }
}
