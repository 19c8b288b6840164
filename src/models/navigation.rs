use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::authz::Predicate;

// =============================================================================
// SECTIONS
// =============================================================================

/// Sidebar sections, declared in rendering precedence order.
///
/// Items inside a module sidebar default to `Modules`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Main,
    #[default]
    Modules,
    System,
    Documents,
    Communication,
    Reports,
}

impl SectionKind {
    pub const ALL: [SectionKind; 6] = [
        SectionKind::Main,
        SectionKind::Modules,
        SectionKind::System,
        SectionKind::Documents,
        SectionKind::Communication,
        SectionKind::Reports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Main => "main",
            SectionKind::Modules => "modules",
            SectionKind::System => "system",
            SectionKind::Documents => "documents",
            SectionKind::Communication => "communication",
            SectionKind::Reports => "reports",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::Main => "Main",
            SectionKind::Modules => "Modules",
            SectionKind::System => "System",
            SectionKind::Documents => "Documents",
            SectionKind::Communication => "Communication",
            SectionKind::Reports => "Reports",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ICONS
// =============================================================================

/// Symbolic icon identifiers. Concrete assets are chosen by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum IconRef {
    Home,
    LayoutDashboard,
    Users,
    UserPlus,
    Wallet,
    Calculator,
    Briefcase,
    FolderKanban,
    FileText,
    FileCheck,
    Inbox,
    MessageSquare,
    Bell,
    BarChart,
    PieChart,
    Settings,
    Shield,
    Building,
    #[default]
    Package,
    Calendar,
    Clock,
    Receipt,
    Database,
}

impl IconRef {
    pub fn as_str(&self) -> &'static str {
        match self {
            IconRef::Home => "home",
            IconRef::LayoutDashboard => "layout-dashboard",
            IconRef::Users => "users",
            IconRef::UserPlus => "user-plus",
            IconRef::Wallet => "wallet",
            IconRef::Calculator => "calculator",
            IconRef::Briefcase => "briefcase",
            IconRef::FolderKanban => "folder-kanban",
            IconRef::FileText => "file-text",
            IconRef::FileCheck => "file-check",
            IconRef::Inbox => "inbox",
            IconRef::MessageSquare => "message-square",
            IconRef::Bell => "bell",
            IconRef::BarChart => "bar-chart",
            IconRef::PieChart => "pie-chart",
            IconRef::Settings => "settings",
            IconRef::Shield => "shield",
            IconRef::Building => "building",
            IconRef::Package => "package",
            IconRef::Calendar => "calendar",
            IconRef::Clock => "clock",
            IconRef::Receipt => "receipt",
            IconRef::Database => "database",
        }
    }

    /// Asset the renderer loads for this icon.
    pub fn asset_name(&self) -> String {
        format!("icons/{}.svg", self.as_str())
    }
}

impl FromStr for IconRef {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(value.to_string()))
            .map_err(|_| format!("unknown icon '{value}'"))
    }
}

// =============================================================================
// ITEMS
// =============================================================================

/// Every present field must be satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccessRequirement {
    #[serde(default)]
    pub min_level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Module key that must be provisioned for the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl AccessRequirement {
    pub fn level(min_level: u32) -> Self {
        Self {
            min_level,
            ..Self::default()
        }
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationItem {
    pub label: String,
    #[serde(default)]
    pub icon: IconRef,
    pub path: String,
    #[serde(default)]
    pub section: SectionKind,
    #[serde(default)]
    pub required: AccessRequirement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<Predicate>,
}

impl NavigationItem {
    pub fn new(label: impl Into<String>, path: impl Into<String>, section: SectionKind) -> Self {
        Self {
            label: label.into(),
            icon: IconRef::default(),
            path: path.into(),
            section,
            required: AccessRequirement::default(),
            hidden: None,
        }
    }

    pub fn icon(mut self, icon: IconRef) -> Self {
        self.icon = icon;
        self
    }

    pub fn requires(mut self, required: AccessRequirement) -> Self {
        self.required = required;
        self
    }

    pub fn hidden_when(mut self, predicate: Predicate) -> Self {
        self.hidden = Some(predicate);
        self
    }

    /// The fixed entry every user sees first.
    pub fn dashboard() -> Self {
        Self::new("Dashboard", "/dashboard", SectionKind::Main).icon(IconRef::LayoutDashboard)
    }
}

/// Resolved group of visible items handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: SectionKind,
    pub title: String,
    pub items: Vec<NavigationItem>,
}
