//! Authorization module - navigation visibility engine
//!
//! This module decides which navigation items a user may see:
//! - Role levels on a fixed ordered scale
//! - Direct permission grants and departmental scoping
//! - Module provisioning (`module_access`)
//! - Super admin bypass
//! - Declarative `hidden` predicates with a named-rule fallback

mod evaluator;
mod predicate;
mod principal;

pub use evaluator::{AccessEvaluator, Decision, DecisionReason};
pub use predicate::{NamedPredicate, Predicate, PredicateRegistry};
pub use principal::User;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a department-scoped item is treated when the user has no department.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepartmentPolicy {
    /// Skip the department check (observed legacy behavior)
    #[default]
    Lenient,
    /// Deny department-scoped items to departmentless users
    Strict,
}

impl FromStr for DepartmentPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "" | "lenient" => Ok(DepartmentPolicy::Lenient),
            "strict" => Ok(DepartmentPolicy::Strict),
            other => Err(format!("unknown department policy '{other}'")),
        }
    }
}

/// Well-known role names and their levels
pub mod roles {
    pub const VIEWER: &str = "viewer";
    pub const STAFF: &str = "staff";
    pub const SENIOR_STAFF: &str = "senior_staff";
    pub const TEAM_LEAD: &str = "team_lead";
    pub const SUPERVISOR: &str = "supervisor";
    pub const MANAGER: &str = "manager";
    pub const DEPARTMENT_HEAD: &str = "department_head";
    pub const DIRECTOR: &str = "director";
    pub const ADMIN: &str = "admin";
    pub const SUPER_ADMIN: &str = "super_admin";

    /// Top of the scale. Any level at or above it bypasses every visibility check.
    pub const SUPER_ADMIN_LEVEL: u32 = 1000;

    /// Ordered from lowest to highest authority.
    pub const ROLE_LEVELS: &[(&str, u32)] = &[
        (VIEWER, 100),
        (STAFF, 200),
        (SENIOR_STAFF, 300),
        (TEAM_LEAD, 400),
        (SUPERVISOR, 500),
        (MANAGER, 600),
        (DEPARTMENT_HEAD, 700),
        (DIRECTOR, 800),
        (ADMIN, 900),
        (SUPER_ADMIN, SUPER_ADMIN_LEVEL),
    ];

    /// Level for a role name. Accepts `SUPER_ADMIN`-style spellings.
    pub fn level_for(name: &str) -> Option<u32> {
        let normalized = name.trim().to_lowercase().replace(['-', ' '], "_");
        ROLE_LEVELS
            .iter()
            .find(|(role, _)| *role == normalized)
            .map(|(_, level)| *level)
    }

    /// Highest named role whose level does not exceed `level`.
    pub fn name_for_level(level: u32) -> Option<&'static str> {
        ROLE_LEVELS
            .iter()
            .rev()
            .find(|(_, l)| *l <= level)
            .map(|(role, _)| *role)
    }

    pub fn is_super_level(level: u32) -> bool {
        level >= SUPER_ADMIN_LEVEL
    }
}

/// Well-known permission names used by the built-in registry
pub mod permissions {
    // Documents
    pub const DOCUMENT_VIEW: &str = "document.view";
    pub const DOCUMENT_EDIT: &str = "document.edit";
    pub const DOCUMENT_APPROVE: &str = "document.approve";

    // People
    pub const EMPLOYEE_MANAGE: &str = "employee.manage";
    pub const PAYROLL_RUN: &str = "payroll.run";

    // Finance
    pub const LEDGER_POST: &str = "ledger.post";

    // Reports
    pub const REPORT_EXPORT: &str = "report.export";

    // System
    pub const USER_MANAGE: &str = "user.manage";
    pub const MODULE_MANAGE: &str = "module.manage";
    pub const AUDIT_VIEW: &str = "audit.view";
}

/// Well-known department names
pub mod departments {
    pub const HUMAN_RESOURCES: &str = "Human Resources";
    pub const FINANCE: &str = "Finance & Accounting";
    pub const OPERATIONS: &str = "Operations";
    pub const IT: &str = "Information Technology";
}
