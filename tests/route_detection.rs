use erp_nav::authz::PredicateRegistry;
use erp_nav::registry::ModuleRegistry;
use erp_nav::route::{best_match, RouteDetector};

fn detect(registry: &ModuleRegistry, path: &str) -> Option<String> {
    registry.detect_module(path).map(|module| module.key.clone())
}

#[test]
fn module_routes_resolve_to_their_module() {
    let registry = ModuleRegistry::builtin(RouteDetector::default(), &PredicateRegistry::with_builtin()).unwrap();

    assert_eq!(detect(&registry, "/dashboard/modules/hr"), Some("hr".into()));
    assert_eq!(detect(&registry, "/dashboard/modules/hr/users"), Some("hr".into()));
    assert_eq!(detect(&registry, "/dashboard/modules/hr/?tab=leave"), Some("hr".into()));
    assert_eq!(detect(&registry, "/dashboard/settings"), None);
    assert_eq!(detect(&registry, "/dashboard/modules/hr-admin"), None);
    assert_eq!(detect(&registry, "/dashboard/modules"), None);
}

#[test]
fn sibling_items_never_both_own_a_route() {
    let registry = ModuleRegistry::builtin(RouteDetector::default(), &PredicateRegistry::with_builtin()).unwrap();
    let items = registry.all_items();
    let owner = |route: &str| {
        best_match(items.iter().map(|item| (item.path.as_str(), item)), route).map(|item| item.label.clone())
    };

    assert_eq!(owner("/dashboard/documents"), Some("All Documents".into()));
    assert_eq!(owner("/dashboard/documents/templates/42"), Some("Templates".into()));
    assert_eq!(owner("/dashboard/modules/hr/employees/new"), Some("Add Employee".into()));
    assert_eq!(owner("/dashboard/modules/hr/employees/17"), Some("Employee Directory".into()));
    assert_eq!(owner("/dashboard/modules/finance/reports/cash-flow"), Some("Cash Flow".into()));
}

#[test]
fn custom_segment_moves_the_module_namespace() {
    let registry = ModuleRegistry::builtin(RouteDetector::new("apps"), &PredicateRegistry::with_builtin()).unwrap();

    assert_eq!(detect(&registry, "/dashboard/apps/payroll/runs"), Some("payroll".into()));
    assert_eq!(detect(&registry, "/dashboard/modules/payroll"), None);
}
