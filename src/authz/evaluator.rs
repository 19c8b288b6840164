use std::sync::Arc;

use serde::Serialize;

use super::predicate::PredicateRegistry;
use super::principal::User;
use super::DepartmentPolicy;
use crate::models::navigation::NavigationItem;

/// Why an item was shown or hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DecisionReason {
    SuperAdmin,
    Allowed,
    BelowMinLevel { required: u32, actual: u32 },
    MissingPermission { permission: String },
    DepartmentMismatch { required: String, actual: String },
    DepartmentUnknown { required: String },
    ModuleNotProvisioned { module: String },
    HiddenByPredicate,
    PredicateFailed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub visible: bool,
    #[serde(flatten)]
    pub reason: DecisionReason,
}

impl Decision {
    fn show(reason: DecisionReason) -> Self {
        Self { visible: true, reason }
    }

    fn hide(reason: DecisionReason) -> Self {
        Self { visible: false, reason }
    }
}

/// Visibility evaluator for navigation items
///
/// Evaluation order:
/// 1. super admin level -> visible
/// 2. role level below `min_level` -> hidden
/// 3. missing required permission -> hidden
/// 4. department mismatch (departmentless users per `DepartmentPolicy`) -> hidden
/// 5. required module not provisioned -> hidden
/// 6. `hidden` predicate true or failing -> hidden
/// 7. visible
#[derive(Debug, Clone)]
pub struct AccessEvaluator {
    rules: Arc<PredicateRegistry>,
    department_policy: DepartmentPolicy,
}

impl Default for AccessEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(PredicateRegistry::with_builtin()))
    }
}

impl AccessEvaluator {
    pub fn new(rules: Arc<PredicateRegistry>) -> Self {
        Self {
            rules,
            department_policy: DepartmentPolicy::default(),
        }
    }

    pub fn with_department_policy(mut self, policy: DepartmentPolicy) -> Self {
        self.department_policy = policy;
        self
    }

    pub fn rules(&self) -> &PredicateRegistry {
        &self.rules
    }

    pub fn department_policy(&self) -> DepartmentPolicy {
        self.department_policy
    }

    pub fn is_visible(&self, item: &NavigationItem, user: &User) -> bool {
        self.evaluate(item, user).visible
    }

    pub fn evaluate(&self, item: &NavigationItem, user: &User) -> Decision {
        // 1. Super admin bypasses every check, `hidden` included
        if user.is_super_admin() {
            return Decision::show(DecisionReason::SuperAdmin);
        }

        let required = &item.required;

        // 2. Role level
        if user.role_level < required.min_level {
            tracing::debug!(
                path = %item.path,
                required = required.min_level,
                actual = user.role_level,
                "below minimum level"
            );
            return Decision::hide(DecisionReason::BelowMinLevel {
                required: required.min_level,
                actual: user.role_level,
            });
        }

        // 3. Permission grant
        if let Some(permission) = &required.permission {
            if !user.has_permission(permission) {
                tracing::debug!(path = %item.path, permission = %permission, "permission missing");
                return Decision::hide(DecisionReason::MissingPermission {
                    permission: permission.clone(),
                });
            }
        }

        // 4. Department scope
        if let Some(department) = &required.department {
            match &user.department {
                Some(actual) if actual != department => {
                    tracing::debug!(path = %item.path, required = %department, actual = %actual, "department mismatch");
                    return Decision::hide(DecisionReason::DepartmentMismatch {
                        required: department.clone(),
                        actual: actual.clone(),
                    });
                }
                Some(_) => {}
                None if self.department_policy == DepartmentPolicy::Strict => {
                    tracing::debug!(path = %item.path, required = %department, "department unknown");
                    return Decision::hide(DecisionReason::DepartmentUnknown {
                        required: department.clone(),
                    });
                }
                None => {}
            }
        }

        // 5. Module provisioning
        if let Some(module) = &required.module {
            if !user.has_module(module) {
                tracing::debug!(path = %item.path, module = %module, "module not provisioned");
                return Decision::hide(DecisionReason::ModuleNotProvisioned {
                    module: module.clone(),
                });
            }
        }

        // 6. `hidden` only narrows; errors hide the item
        if let Some(predicate) = &item.hidden {
            match predicate.evaluate(user, &self.rules) {
                Ok(true) => return Decision::hide(DecisionReason::HiddenByPredicate),
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(path = %item.path, error = %err, "hidden predicate failed, hiding item");
                    return Decision::hide(DecisionReason::PredicateFailed {
                        error: err.to_string(),
                    });
                }
            }
        }

        Decision::show(DecisionReason::Allowed)
    }
}
