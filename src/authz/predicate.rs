use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::principal::User;
use super::roles;
use crate::errors::PredicateError;

/// A bespoke visibility rule registered under a name.
pub type NamedPredicate = Arc<dyn Fn(&User) -> Result<bool, PredicateError> + Send + Sync>;

/// Declarative rule over the user snapshot.
///
/// Attached to an item as `hidden`: when it evaluates to `true` the item is
/// hidden. Rules that cannot be expressed here go through `Named`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    DepartmentIs { department: String },
    DepartmentIsNot { department: String },
    DepartmentIn { departments: Vec<String> },
    HasPermission { permission: String },
    LacksPermission { permission: String },
    HasModule { module: String },
    LevelAtLeast { level: u32 },
    LevelBelow { level: u32 },
    All { of: Vec<Predicate> },
    Any { of: Vec<Predicate> },
    Not { predicate: Box<Predicate> },
    Named { name: String },
}

impl Predicate {
    pub fn named(name: impl Into<String>) -> Self {
        Predicate::Named { name: name.into() }
    }

    pub fn evaluate(&self, user: &User, rules: &PredicateRegistry) -> Result<bool, PredicateError> {
        match self {
            // A departmentless user is in no department.
            Predicate::DepartmentIs { department } => Ok(user.in_department(department)),
            Predicate::DepartmentIsNot { department } => Ok(!user.in_department(department)),
            Predicate::DepartmentIn { departments } => Ok(departments
                .iter()
                .any(|department| user.in_department(department))),
            Predicate::HasPermission { permission } => Ok(user.has_permission(permission)),
            Predicate::LacksPermission { permission } => Ok(!user.has_permission(permission)),
            Predicate::HasModule { module } => Ok(user.has_module(module)),
            Predicate::LevelAtLeast { level } => Ok(user.role_level >= *level),
            Predicate::LevelBelow { level } => Ok(user.role_level < *level),
            Predicate::All { of } => {
                for predicate in of {
                    if !predicate.evaluate(user, rules)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Any { of } => {
                for predicate in of {
                    if predicate.evaluate(user, rules)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Not { predicate } => Ok(!predicate.evaluate(user, rules)?),
            Predicate::Named { name } => rules.evaluate(name, user),
        }
    }

    /// Names of every `Named` rule referenced by this predicate tree.
    pub fn named_rules(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_named(&mut names);
        names
    }

    fn collect_named<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Predicate::Named { name } => names.push(name.as_str()),
            Predicate::All { of } | Predicate::Any { of } => {
                for predicate in of {
                    predicate.collect_named(names);
                }
            }
            Predicate::Not { predicate } => predicate.collect_named(names),
            _ => {}
        }
    }
}

/// Lookup table for named rules.
#[derive(Clone, Default)]
pub struct PredicateRegistry {
    rules: BTreeMap<String, NamedPredicate>,
}

impl PredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the rules the built-in module registry uses.
    pub fn with_builtin() -> Self {
        Self::new()
            .with_rule("no_department", |user| Ok(user.department.is_none()))
            .with_rule("read_only", |user| {
                Ok(user.role_level < roles::level_for(roles::STAFF).unwrap_or(0)
                    && user.permissions.is_empty())
            })
    }

    pub fn with_rule<F>(mut self, name: impl Into<String>, rule: F) -> Self
    where
        F: Fn(&User) -> Result<bool, PredicateError> + Send + Sync + 'static,
    {
        self.register(name, rule);
        self
    }

    pub fn register<F>(&mut self, name: impl Into<String>, rule: F)
    where
        F: Fn(&User) -> Result<bool, PredicateError> + Send + Sync + 'static,
    {
        self.rules.insert(name.into(), Arc::new(rule));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn evaluate(&self, name: &str, user: &User) -> Result<bool, PredicateError> {
        let rule = self
            .rules
            .get(name)
            .ok_or_else(|| PredicateError::unknown_rule(name))?;
        rule(user)
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRegistry")
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}
