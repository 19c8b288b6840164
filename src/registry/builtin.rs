use crate::authz::{departments, permissions, roles, Predicate};
use crate::models::module::{ModuleDescriptor, ModuleSection};
use crate::models::navigation::{AccessRequirement, IconRef, NavigationItem, SectionKind};

use super::RegistryDocument;

fn level(role: &str) -> u32 {
    roles::level_for(role).unwrap_or(roles::SUPER_ADMIN_LEVEL)
}

fn global(label: &str, path: &str, section: SectionKind, icon: IconRef, required: AccessRequirement) -> NavigationItem {
    NavigationItem::new(label, path, section).icon(icon).requires(required)
}

struct ModuleBuilder {
    descriptor: ModuleDescriptor,
}

impl ModuleBuilder {
    fn new(segment: &str, key: &str, label: &str, icon: IconRef, min_role: &str) -> Self {
        Self {
            descriptor: ModuleDescriptor {
                key: key.to_string(),
                label: label.to_string(),
                icon,
                base_path: format!("/dashboard/{segment}/{key}"),
                required: AccessRequirement::level(level(min_role)).with_module(key),
                sections: Vec::new(),
            },
        }
    }

    fn section(mut self, title: &str, collapsible_default: bool, items: Vec<NavigationItem>) -> Self {
        self.descriptor.sections.push(ModuleSection {
            title: title.to_string(),
            collapsible_default,
            items,
        });
        self
    }

    /// Item under the module's base path; an empty `sub` is the base path itself.
    fn item(&self, label: &str, sub: &str, icon: IconRef, required: AccessRequirement) -> NavigationItem {
        let path = if sub.is_empty() {
            self.descriptor.base_path.clone()
        } else {
            format!("{}/{}", self.descriptor.base_path, sub)
        };
        NavigationItem::new(label, path, SectionKind::Modules)
            .icon(icon)
            .requires(required)
    }

    fn build(self) -> ModuleDescriptor {
        self.descriptor
    }
}

fn at(role: &str) -> AccessRequirement {
    AccessRequirement::level(level(role))
}

/// Built-in ERP registry with module routes under `/dashboard/<segment>/`.
pub fn builtin_document(segment: &str) -> RegistryDocument {
    RegistryDocument {
        global_items: global_items(),
        modules: vec![
            human_resources(segment),
            payroll(segment),
            finance(segment),
            projects(segment),
            procurement(segment),
        ],
    }
}

fn global_items() -> Vec<NavigationItem> {
    use SectionKind::*;

    vec![
        // Main
        global("My Tasks", "/dashboard/tasks", Main, IconRef::FolderKanban, at(roles::VIEWER)),
        global("Calendar", "/dashboard/calendar", Main, IconRef::Calendar, at(roles::STAFF)),
        // System
        global(
            "Users",
            "/dashboard/system/users",
            System,
            IconRef::Users,
            at(roles::ADMIN).with_permission(permissions::USER_MANAGE),
        ),
        global(
            "Module Settings",
            "/dashboard/system/modules",
            System,
            IconRef::Settings,
            at(roles::ADMIN).with_permission(permissions::MODULE_MANAGE),
        ),
        global(
            "Audit Log",
            "/dashboard/system/audit",
            System,
            IconRef::Shield,
            at(roles::DIRECTOR).with_permission(permissions::AUDIT_VIEW),
        ),
        global("Settings", "/dashboard/settings", System, IconRef::Settings, at(roles::VIEWER)),
        // Documents
        global("All Documents", "/dashboard/documents", Documents, IconRef::FileText, at(roles::VIEWER)),
        global(
            "Templates",
            "/dashboard/documents/templates",
            Documents,
            IconRef::FileText,
            at(roles::SENIOR_STAFF).with_permission(permissions::DOCUMENT_EDIT),
        ),
        global(
            "Approvals",
            "/dashboard/documents/approvals",
            Documents,
            IconRef::FileCheck,
            at(roles::MANAGER).with_permission(permissions::DOCUMENT_APPROVE),
        ),
        // Communication
        global("Inbox", "/dashboard/inbox", Communication, IconRef::Inbox, at(roles::VIEWER)),
        global("Team Chat", "/dashboard/chat", Communication, IconRef::MessageSquare, at(roles::STAFF))
            .hidden_when(Predicate::named("read_only")),
        global("Announcements", "/dashboard/announcements", Communication, IconRef::Bell, at(roles::VIEWER))
            .hidden_when(Predicate::named("no_department")),
        // Reports
        global("Reports", "/dashboard/reports", Reports, IconRef::BarChart, at(roles::TEAM_LEAD)),
        global(
            "Financial Reports",
            "/dashboard/reports/finance",
            Reports,
            IconRef::PieChart,
            at(roles::MANAGER).with_department(departments::FINANCE),
        ),
        global(
            "HR Analytics",
            "/dashboard/reports/hr",
            Reports,
            IconRef::PieChart,
            at(roles::MANAGER).with_department(departments::HUMAN_RESOURCES),
        ),
        global(
            "Export Center",
            "/dashboard/reports/export",
            Reports,
            IconRef::Database,
            at(roles::SUPERVISOR).with_permission(permissions::REPORT_EXPORT),
        ),
    ]
}

fn human_resources(segment: &str) -> ModuleDescriptor {
    let m = ModuleBuilder::new(segment, "hr", "Human Resources", IconRef::Users, roles::STAFF);
    let overview = vec![
        m.item("Overview", "", IconRef::LayoutDashboard, at(roles::STAFF)),
        m.item("Employee Directory", "employees", IconRef::Users, at(roles::STAFF)),
    ];
    let management = vec![
        m.item(
            "Add Employee",
            "employees/new",
            IconRef::UserPlus,
            at(roles::MANAGER)
                .with_permission(permissions::EMPLOYEE_MANAGE)
                .with_department(departments::HUMAN_RESOURCES),
        ),
        m.item("Leave Requests", "leave", IconRef::Calendar, at(roles::TEAM_LEAD)),
        m.item(
            "Recruitment",
            "recruitment",
            IconRef::Briefcase,
            at(roles::DEPARTMENT_HEAD).with_department(departments::HUMAN_RESOURCES),
        ),
    ];
    let administration = vec![
        m.item("HR Settings", "settings", IconRef::Settings, at(roles::ADMIN)),
        m.item("Org Chart Editor", "org-chart", IconRef::Building, at(roles::DEPARTMENT_HEAD)).hidden_when(
            Predicate::DepartmentIsNot {
                department: departments::HUMAN_RESOURCES.to_string(),
            },
        ),
    ];
    m.section("Overview", false, overview)
        .section("Management", true, management)
        .section("Administration", true, administration)
        .build()
}

fn payroll(segment: &str) -> ModuleDescriptor {
    let m = ModuleBuilder::new(segment, "payroll", "Payroll", IconRef::Wallet, roles::MANAGER);
    let runs = vec![
        m.item("Overview", "", IconRef::LayoutDashboard, at(roles::MANAGER)),
        m.item(
            "Pay Runs",
            "runs",
            IconRef::Calculator,
            at(roles::DEPARTMENT_HEAD).with_permission(permissions::PAYROLL_RUN),
        ),
        m.item("Payslips", "payslips", IconRef::Receipt, at(roles::MANAGER)),
    ];
    let configuration = vec![
        m.item(
            "Tax Tables",
            "tax-tables",
            IconRef::Database,
            at(roles::DIRECTOR).with_department(departments::FINANCE),
        ),
        m.item("Deductions", "deductions", IconRef::Calculator, at(roles::DEPARTMENT_HEAD)),
    ];
    m.section("Payroll", false, runs)
        .section("Configuration", true, configuration)
        .build()
}

fn finance(segment: &str) -> ModuleDescriptor {
    let m = ModuleBuilder::new(segment, "finance", "Finance", IconRef::Calculator, roles::SUPERVISOR);
    let books = vec![
        m.item("Ledger", "", IconRef::Database, at(roles::SUPERVISOR)),
        m.item(
            "Journal Entries",
            "journal",
            IconRef::FileText,
            at(roles::MANAGER).with_permission(permissions::LEDGER_POST),
        ),
        m.item("Invoices", "invoices", IconRef::Receipt, at(roles::SUPERVISOR)),
    ];
    let statements = vec![
        m.item(
            "Balance Sheet",
            "reports/balance-sheet",
            IconRef::BarChart,
            at(roles::DEPARTMENT_HEAD).with_department(departments::FINANCE),
        ),
        m.item(
            "Cash Flow",
            "reports/cash-flow",
            IconRef::PieChart,
            at(roles::DEPARTMENT_HEAD).with_department(departments::FINANCE),
        ),
    ];
    m.section("Books", false, books)
        .section("Statements", true, statements)
        .build()
}

fn projects(segment: &str) -> ModuleDescriptor {
    let m = ModuleBuilder::new(segment, "projects", "Projects", IconRef::FolderKanban, roles::STAFF);
    let work = vec![
        m.item("All Projects", "", IconRef::FolderKanban, at(roles::STAFF)),
        m.item("Timesheets", "timesheets", IconRef::Clock, at(roles::STAFF)).hidden_when(Predicate::named("read_only")),
    ];
    let planning = vec![
        m.item("Gantt", "gantt", IconRef::BarChart, at(roles::TEAM_LEAD)),
        m.item("Resource Allocation", "resources", IconRef::Users, at(roles::MANAGER)),
    ];
    m.section("Work", false, work)
        .section("Planning", true, planning)
        .build()
}

fn procurement(segment: &str) -> ModuleDescriptor {
    let m = ModuleBuilder::new(segment, "procurement", "Procurement", IconRef::Package, roles::SENIOR_STAFF);
    let purchasing = vec![
        m.item("Requisitions", "", IconRef::FileText, at(roles::SENIOR_STAFF)),
        m.item("Purchase Orders", "orders", IconRef::Receipt, at(roles::SUPERVISOR)),
        m.item(
            "Vendors",
            "vendors",
            IconRef::Building,
            at(roles::SUPERVISOR).with_department(departments::OPERATIONS),
        ),
        m.item(
            "Approvals",
            "approvals",
            IconRef::FileCheck,
            at(roles::DEPARTMENT_HEAD).with_permission(permissions::DOCUMENT_APPROVE),
        ),
    ];
    m.section("Purchasing", false, purchasing).build()
}
