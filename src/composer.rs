//! Navigation composer - merges remote modules with the static registry and
//! groups visible items into sidebar sections.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use crate::authz::{AccessEvaluator, DecisionReason, User};
use crate::events::Diagnostic;
use crate::models::module::{ModuleSection, ModuleSidebar};
use crate::models::navigation::{AccessRequirement, NavigationItem, Section, SectionKind};
use crate::models::remote::RemoteModuleRecord;
use crate::registry::ModuleRegistry;
use crate::route::{best_match, normalize_path};

/// Where the module entries of a resolution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NavigationSource {
    Remote,
    Registry,
}

/// Outcome of a direct navigation to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccessOutcome {
    Allowed,
    /// The owning item is not visible to the user ("Access Denied")
    Denied,
    /// No registered item owns the path
    Unowned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedNavigation {
    pub source: NavigationSource,
    pub sections: Vec<Section>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolvedNavigation {
    /// SHA-256 over the serialized sections. Equal inputs give equal
    /// fingerprints.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(&self.sections).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }

    pub fn items(&self) -> impl Iterator<Item = &NavigationItem> {
        self.sections.iter().flat_map(|section| section.items.iter())
    }

    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|section| section.name == kind)
    }

    pub fn contains_path(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.items().any(|item| normalize_path(&item.path) == path)
    }
}

/// Module entries for one resolution, before visibility filtering.
struct ModuleEntries {
    source: NavigationSource,
    items: Vec<NavigationItem>,
}

#[derive(Debug, Clone)]
pub struct NavigationComposer {
    registry: Arc<ModuleRegistry>,
    evaluator: AccessEvaluator,
}

impl NavigationComposer {
    pub fn new(registry: Arc<ModuleRegistry>, evaluator: AccessEvaluator) -> Self {
        Self { registry, evaluator }
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    pub fn evaluator(&self) -> &AccessEvaluator {
        &self.evaluator
    }

    /// Visible navigation for `user`.
    ///
    /// Remote records, when present and usable, replace the registry's module
    /// entries. Global registry items are filtered in either case and the
    /// Dashboard item always comes first.
    pub fn resolve(&self, user: &User, remote: Option<&[RemoteModuleRecord]>) -> ResolvedNavigation {
        let mut diagnostics = Vec::new();
        let entries = self.module_entries(remote, &mut diagnostics);

        let candidates = std::iter::once(NavigationItem::dashboard())
            .chain(entries.items)
            .chain(self.registry.global_items().iter().cloned());

        let mut visible = Vec::new();
        for item in candidates {
            if self.check_item(&item, user, &mut diagnostics) {
                visible.push(item);
            }
        }

        let sections = group_sections(visible, &mut diagnostics);

        tracing::debug!(
            source = ?entries.source,
            sections = sections.len(),
            diagnostics = diagnostics.len(),
            "navigation resolved"
        );

        ResolvedNavigation {
            source: entries.source,
            sections,
            diagnostics,
        }
    }

    /// The module's contextual sidebar filtered for `user`. Sections left
    /// without items are dropped.
    pub fn module_sidebar(&self, key: &str, user: &User) -> Option<ModuleSidebar> {
        let module = self.registry.get(key)?;
        let sections = module
            .sections
            .iter()
            .filter_map(|section| {
                let items: Vec<NavigationItem> = section
                    .items
                    .iter()
                    .filter(|item| self.evaluator.is_visible(item, user))
                    .cloned()
                    .collect();
                (!items.is_empty()).then(|| ModuleSection {
                    title: section.title.clone(),
                    collapsible_default: section.collapsible_default,
                    items,
                })
            })
            .collect();

        Some(ModuleSidebar {
            key: module.key.clone(),
            label: module.label.clone(),
            icon: module.icon,
            base_path: module.base_path.clone(),
            sections,
        })
    }

    /// Whether a direct navigation to `path` should be let through.
    ///
    /// Inside a module namespace the module entry must be visible as well as
    /// the item that owns the path.
    pub fn check_access(&self, user: &User, path: &str, remote: Option<&[RemoteModuleRecord]>) -> AccessOutcome {
        let mut diagnostics = Vec::new();
        let entries = self.module_entries(remote, &mut diagnostics);

        if let Some(module) = self.registry.detect_module(path) {
            let base = normalize_path(&module.base_path);
            let entry = entries.items.iter().find(|item| normalize_path(&item.path) == base);
            match entry {
                Some(entry) if self.check_item(entry, user, &mut diagnostics) => {}
                _ => {
                    tracing::debug!(path = %path, module = %module.key, "module not accessible");
                    return AccessOutcome::Denied;
                }
            }
        }

        let dashboard = NavigationItem::dashboard();
        let registry_items = self.registry.all_items();
        let candidates = entries
            .items
            .iter()
            .chain(std::iter::once(&dashboard))
            .chain(registry_items.iter())
            .map(|item| (item.path.as_str(), item));

        match best_match(candidates, path) {
            None => AccessOutcome::Unowned,
            Some(owner) if self.check_item(owner, user, &mut diagnostics) => AccessOutcome::Allowed,
            Some(owner) => {
                tracing::debug!(path = %path, owner = %owner.path, "access denied");
                AccessOutcome::Denied
            }
        }
    }

    fn module_entries(&self, remote: Option<&[RemoteModuleRecord]>, diagnostics: &mut Vec<Diagnostic>) -> ModuleEntries {
        if let Some(records) = remote.filter(|records| !records.is_empty()) {
            let items = self.synthesize_remote(records, diagnostics);
            if !items.is_empty() {
                return ModuleEntries {
                    source: NavigationSource::Remote,
                    items,
                };
            }
            tracing::warn!(records = records.len(), "no usable remote module records, using registry");
        }

        ModuleEntries {
            source: NavigationSource::Registry,
            items: self
                .registry
                .modules()
                .iter()
                .map(|module| module.entry_item())
                .collect(),
        }
    }

    fn synthesize_remote(&self, records: &[RemoteModuleRecord], diagnostics: &mut Vec<Diagnostic>) -> Vec<NavigationItem> {
        let segment = self.registry.detector().segment();
        let mut seen = BTreeSet::new();
        let mut items = Vec::new();

        for (index, record) in records.iter().enumerate() {
            let Some(slug) = record.slug() else {
                diagnostics.push(Diagnostic::DataQuality {
                    index,
                    detail: "missing code".to_string(),
                });
                continue;
            };
            let Some(name) = record.name.as_deref().map(str::trim).filter(|name| !name.is_empty()) else {
                diagnostics.push(Diagnostic::DataQuality {
                    index,
                    detail: format!("module '{slug}' is missing a name"),
                });
                continue;
            };
            if !seen.insert(slug.clone()) {
                diagnostics.push(Diagnostic::DataQuality {
                    index,
                    detail: format!("module '{slug}' listed more than once"),
                });
                continue;
            }

            let icon = self.registry.get(&slug).map(|module| module.icon).unwrap_or_default();
            items.push(
                NavigationItem::new(name, format!("/dashboard/{segment}/{slug}"), SectionKind::Modules)
                    .icon(icon)
                    .requires(AccessRequirement::level(record.required_role_level)),
            );
        }

        items
    }

    fn check_item(&self, item: &NavigationItem, user: &User, diagnostics: &mut Vec<Diagnostic>) -> bool {
        let decision = self.evaluator.evaluate(item, user);
        if let DecisionReason::PredicateFailed { error } = decision.reason {
            diagnostics.push(Diagnostic::PredicateFailed {
                path: item.path.clone(),
                error,
            });
        }
        decision.visible
    }
}

/// Groups items into the fixed section order, dropping duplicate paths and
/// empty sections.
fn group_sections(items: Vec<NavigationItem>, diagnostics: &mut Vec<Diagnostic>) -> Vec<Section> {
    let mut grouped: BTreeMap<SectionKind, Vec<NavigationItem>> = BTreeMap::new();
    let mut seen: BTreeSet<(SectionKind, String)> = BTreeSet::new();

    for item in items {
        if !seen.insert((item.section, normalize_path(&item.path))) {
            diagnostics.push(Diagnostic::DuplicatePath {
                section: item.section,
                path: item.path.clone(),
            });
            continue;
        }
        grouped.entry(item.section).or_default().push(item);
    }

    SectionKind::ALL
        .iter()
        .filter_map(|kind| {
            let items = grouped.remove(kind).filter(|items| !items.is_empty())?;
            Some(Section {
                name: *kind,
                title: kind.title().to_string(),
                items,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::PredicateRegistry;
    use crate::route::RouteDetector;

    fn composer() -> NavigationComposer {
        let rules = PredicateRegistry::with_builtin();
        let registry = ModuleRegistry::builtin(RouteDetector::default(), &rules).unwrap();
        NavigationComposer::new(Arc::new(registry), AccessEvaluator::new(Arc::new(rules)))
    }

    fn labels(nav: &ResolvedNavigation, kind: SectionKind) -> Vec<String> {
        nav.section(kind)
            .map(|section| section.items.iter().map(|item| item.label.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn dashboard_comes_first() {
        let nav = composer().resolve(&User::new(0), None);
        assert_eq!(nav.sections[0].name, SectionKind::Main);
        assert_eq!(nav.sections[0].items[0], NavigationItem::dashboard());
    }

    #[test]
    fn sections_keep_fixed_order() {
        let nav = composer().resolve(&User::new(1000), None);
        let order: Vec<SectionKind> = nav.sections.iter().map(|section| section.name).collect();
        assert_eq!(order, SectionKind::ALL.to_vec());
    }

    #[test]
    fn registry_fallback_uses_module_access() {
        let user = User::new(600).with_module_access(["hr"]);
        let nav = composer().resolve(&user, None);
        assert_eq!(nav.source, NavigationSource::Registry);
        assert_eq!(labels(&nav, SectionKind::Modules), vec!["Human Resources"]);
    }

    #[test]
    fn remote_records_replace_module_entries() {
        let user = User::new(600).with_module_access(["hr"]);
        let remote = vec![
            RemoteModuleRecord::new("PAYROLL", "Payroll", 600),
            RemoteModuleRecord::new("FIELD_SERVICE", "Field Service", 200),
            RemoteModuleRecord::new("BOARD_PORTAL", "Board Portal", 900),
        ];
        let nav = composer().resolve(&user, Some(remote.as_slice()));

        assert_eq!(nav.source, NavigationSource::Remote);
        let modules = nav.section(SectionKind::Modules).unwrap();
        let paths: Vec<&str> = modules.items.iter().map(|item| item.path.as_str()).collect();
        assert_eq!(paths, vec!["/dashboard/modules/payroll", "/dashboard/modules/field-service"]);
        assert_eq!(modules.items[0].icon, crate::models::navigation::IconRef::Wallet);
    }

    #[test]
    fn unusable_remote_list_falls_back() {
        let remote = vec![RemoteModuleRecord {
            name: Some("Nameless".into()),
            ..RemoteModuleRecord::default()
        }];
        let nav = composer().resolve(&User::new(200).with_module_access(["projects"]), Some(remote.as_slice()));

        assert_eq!(nav.source, NavigationSource::Registry);
        assert_eq!(labels(&nav, SectionKind::Modules), vec!["Projects"]);
        assert!(matches!(nav.diagnostics[0], Diagnostic::DataQuality { index: 0, .. }));
    }

    #[test]
    fn duplicate_remote_codes_keep_the_first() {
        let remote = vec![
            RemoteModuleRecord::new("HR", "Human Resources", 100),
            RemoteModuleRecord::new("hr", "HR (again)", 100),
        ];
        let nav = composer().resolve(&User::new(300), Some(remote.as_slice()));
        assert_eq!(labels(&nav, SectionKind::Modules), vec!["Human Resources"]);
        assert_eq!(nav.diagnostics.len(), 1);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let composer = composer();
        let viewer = composer.resolve(&User::new(100), None);
        let admin = composer.resolve(&User::new(1000), None);

        assert_eq!(viewer.fingerprint(), composer.resolve(&User::new(100), None).fingerprint());
        assert_ne!(viewer.fingerprint(), admin.fingerprint());
        assert_eq!(viewer.fingerprint().len(), 64);
    }

    #[test]
    fn module_sidebar_filters_items_and_drops_empty_sections() {
        let composer = composer();
        let staff = User::new(200).with_department("Operations");
        let sidebar = composer.module_sidebar("hr", &staff).unwrap();

        let titles: Vec<&str> = sidebar.sections.iter().map(|section| section.title.as_str()).collect();
        assert_eq!(titles, vec!["Overview"]);
        assert!(composer.module_sidebar("warehouse", &staff).is_none());
    }

    #[test]
    fn check_access_requires_the_module_entry() {
        let composer = composer();
        let outsider = User::new(600);
        let member = User::new(600).with_module_access(["hr"]);

        assert_eq!(composer.check_access(&outsider, "/dashboard/modules/hr/employees", None), AccessOutcome::Denied);
        assert_eq!(composer.check_access(&member, "/dashboard/modules/hr/employees", None), AccessOutcome::Allowed);
        assert_eq!(composer.check_access(&member, "/dashboard/modules/hr/settings", None), AccessOutcome::Denied);
    }

    #[test]
    fn check_access_in_remote_mode_follows_the_remote_list() {
        let composer = composer();
        let user = User::new(600);
        let remote = vec![RemoteModuleRecord::new("HR", "Human Resources", 200)];

        assert_eq!(composer.check_access(&user, "/dashboard/modules/hr", Some(remote.as_slice())), AccessOutcome::Allowed);
        assert_eq!(composer.check_access(&user, "/dashboard/modules/payroll", Some(remote.as_slice())), AccessOutcome::Denied);
    }

    #[test]
    fn check_access_outside_any_item() {
        let composer = composer();
        assert_eq!(composer.check_access(&User::new(100), "/login", None), AccessOutcome::Unowned);
        assert_eq!(composer.check_access(&User::new(100), "/dashboard/system/users", None), AccessOutcome::Denied);
        assert_eq!(composer.check_access(&User::new(100), "/dashboard/unlisted", None), AccessOutcome::Allowed);
    }
}
