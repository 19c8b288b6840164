use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles;

/// User represents the authenticated user as seen by navigation resolution.
///
/// A snapshot: it is rebuilt on login or profile change, never mutated while
/// a resolution is running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub role_level: u32,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    /// Keys of modules provisioned for this user
    #[serde(default)]
    pub module_access: BTreeSet<String>,
}

impl User {
    pub fn new(role_level: u32) -> Self {
        Self {
            role_level,
            ..Self::default()
        }
    }

    /// Build a user from a role name. `None` for names outside the level table.
    pub fn for_role(role: &str) -> Option<Self> {
        roles::level_for(role).map(Self::new)
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_permissions<I, S>(mut self, perms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = perms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_module_access<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.module_access = modules.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn has_module(&self, module: &str) -> bool {
        self.module_access.contains(module)
    }

    pub fn in_department(&self, department: &str) -> bool {
        self.department.as_deref() == Some(department)
    }

    pub fn is_super_admin(&self) -> bool {
        roles::is_super_level(self.role_level)
    }
}
