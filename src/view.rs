//! View-mode state machine: global dashboard vs. a module's contextual
//! sidebar, plus the session's presentation state.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::authz::User;
use crate::composer::NavigationComposer;
use crate::events::Diagnostic;
use crate::models::module::ModuleSection;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    GlobalDashboard,
    ModuleView { module_key: String },
}

impl ViewMode {
    pub fn module_key(&self) -> Option<&str> {
        match self {
            ViewMode::GlobalDashboard => None,
            ViewMode::ModuleView { module_key } => Some(module_key),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub current_module_key: Option<String>,
    pub is_module_view: bool,
    pub active_sections: Vec<ModuleSection>,
    pub module_loading: bool,
}

/// Result of feeding a route into the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewTransition {
    pub from: Option<String>,
    pub to: Option<String>,
    /// Set when the route named a module that is not registered
    pub diagnostic: Option<Diagnostic>,
}

impl ViewTransition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }

    pub fn entered_module(&self) -> bool {
        self.changed() && self.to.is_some()
    }
}

/// Ties a module load to the route generation that started it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    module_key: Option<String>,
}

impl LoadTicket {
    pub fn module_key(&self) -> Option<&str> {
        self.module_key.as_deref()
    }
}

/// Section collapse map and sidebar flags for one session.
///
/// Collapse state is keyed by section title and falls back to the section's
/// `collapsible_default`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PresentationState {
    collapsed: BTreeMap<String, bool>,
    pub pinned: bool,
    pub hover_expanded: bool,
}

impl PresentationState {
    pub fn is_collapsed(&self, section: &ModuleSection) -> bool {
        self.collapsed
            .get(&section.title)
            .copied()
            .unwrap_or(section.collapsible_default)
    }

    /// Flips the section and returns its new collapsed state.
    pub fn toggle_section(&mut self, section: &ModuleSection) -> bool {
        let collapsed = !self.is_collapsed(section);
        self.collapsed.insert(section.title.clone(), collapsed);
        collapsed
    }

    pub fn set_collapsed(&mut self, title: impl Into<String>, collapsed: bool) {
        self.collapsed.insert(title.into(), collapsed);
    }

    pub fn set_pinned(&mut self, pinned: bool) {
        self.pinned = pinned;
    }

    pub fn set_hover_expanded(&mut self, hover_expanded: bool) {
        self.hover_expanded = hover_expanded;
    }

    /// Forgets collapse overrides and hover. The pin is a user preference and
    /// survives.
    pub fn reset(&mut self) {
        self.collapsed.clear();
        self.hover_expanded = false;
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewStateMachine {
    mode: ViewMode,
    state: ViewState,
    presentation: PresentationState,
    generation: u64,
}

impl ViewStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &ViewMode {
        &self.mode
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn presentation(&self) -> &PresentationState {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut PresentationState {
        &mut self.presentation
    }

    pub fn on_route_change(&mut self, path: &str, composer: &NavigationComposer, user: &User) -> ViewTransition {
        let registry = composer.registry();
        let from = self.state.current_module_key.clone();

        let mut diagnostic = None;
        let to = match registry.detect_module(path) {
            Some(module) => Some(module.key.clone()),
            None => {
                if let Some(segment) = registry.detector().module_segment(path) {
                    diagnostic = Some(Diagnostic::UnknownModule { segment });
                }
                None
            }
        };

        if from != to {
            self.generation += 1;
            self.presentation.reset();
            self.state.module_loading = false;
            tracing::debug!(from = ?from, to = ?to, generation = self.generation, "view changed");
        }

        match &to {
            Some(key) => {
                // Sub-routes of the same module refresh the sections but keep
                // presentation state.
                let sections = composer
                    .module_sidebar(key, user)
                    .map(|sidebar| sidebar.sections)
                    .unwrap_or_default();
                self.mode = ViewMode::ModuleView {
                    module_key: key.clone(),
                };
                self.state.current_module_key = Some(key.clone());
                self.state.is_module_view = true;
                self.state.active_sections = sections;
            }
            None => {
                self.mode = ViewMode::GlobalDashboard;
                self.state = ViewState::default();
            }
        }

        ViewTransition { from, to, diagnostic }
    }

    pub fn begin_module_load(&mut self) -> LoadTicket {
        self.state.module_loading = true;
        LoadTicket {
            generation: self.generation,
            module_key: self.state.current_module_key.clone(),
        }
    }

    /// Clears the loading flag unless the view moved on since `ticket` was
    /// issued. Returns whether the ticket was still current.
    pub fn finish_module_load(&mut self, ticket: LoadTicket) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                module = ?ticket.module_key,
                generation = ticket.generation,
                current = self.generation,
                "ignoring load completion from an abandoned view"
            );
            return false;
        }
        self.state.module_loading = false;
        true
    }

    /// Section of the active module sidebar with the given title.
    pub fn active_section(&self, title: &str) -> Option<&ModuleSection> {
        self.state.active_sections.iter().find(|section| section.title == title)
    }

    pub fn toggle_section(&mut self, title: &str) -> Option<bool> {
        let section = self.active_section(title)?.clone();
        Some(self.presentation.toggle_section(&section))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::authz::{AccessEvaluator, PredicateRegistry};
    use crate::registry::ModuleRegistry;
    use crate::route::RouteDetector;

    fn composer() -> NavigationComposer {
        let rules = PredicateRegistry::with_builtin();
        let registry = ModuleRegistry::builtin(RouteDetector::default(), &rules).unwrap();
        NavigationComposer::new(Arc::new(registry), AccessEvaluator::new(Arc::new(rules)))
    }

    #[test]
    fn starts_on_the_dashboard() {
        let machine = ViewStateMachine::new();
        assert_eq!(machine.mode(), &ViewMode::GlobalDashboard);
        assert_eq!(machine.state(), &ViewState::default());
    }

    #[test]
    fn module_route_enters_module_view() {
        let composer = composer();
        let mut machine = ViewStateMachine::new();

        let transition = machine.on_route_change("/dashboard/modules/hr/employees", &composer, &User::new(1000));

        assert!(transition.entered_module());
        assert_eq!(machine.mode().module_key(), Some("hr"));
        assert!(machine.state().is_module_view);
        assert_eq!(machine.state().active_sections.len(), 3);
    }

    #[test]
    fn unknown_module_stays_global_with_diagnostic() {
        let composer = composer();
        let mut machine = ViewStateMachine::new();

        let transition = machine.on_route_change("/dashboard/modules/warehouse", &composer, &User::new(1000));

        assert!(!transition.changed());
        assert_eq!(
            transition.diagnostic,
            Some(Diagnostic::UnknownModule { segment: "warehouse".into() })
        );
        assert_eq!(machine.mode(), &ViewMode::GlobalDashboard);
    }

    #[test]
    fn sub_route_keeps_presentation_state() {
        let composer = composer();
        let user = User::new(1000);
        let mut machine = ViewStateMachine::new();

        machine.on_route_change("/dashboard/modules/hr", &composer, &user);
        assert_eq!(machine.toggle_section("Management"), Some(false));
        machine.on_route_change("/dashboard/modules/hr/leave", &composer, &user);

        let management = machine.active_section("Management").unwrap();
        assert!(!machine.presentation().is_collapsed(management));
    }

    #[test]
    fn leaving_the_module_clears_state() {
        let composer = composer();
        let user = User::new(1000);
        let mut machine = ViewStateMachine::new();

        machine.on_route_change("/dashboard/modules/hr", &composer, &user);
        let transition = machine.on_route_change("/dashboard/settings", &composer, &user);

        assert_eq!(transition.from.as_deref(), Some("hr"));
        assert_eq!(transition.to, None);
        assert_eq!(machine.state(), &ViewState::default());
    }

    #[test]
    fn abandoned_load_cannot_clear_newer_flag() {
        let composer = composer();
        let user = User::new(1000);
        let mut machine = ViewStateMachine::new();

        machine.on_route_change("/dashboard/modules/hr", &composer, &user);
        let old = machine.begin_module_load();
        machine.on_route_change("/dashboard/modules/payroll", &composer, &user);
        let current = machine.begin_module_load();

        assert!(!machine.finish_module_load(old));
        assert!(machine.state().module_loading);
        assert!(machine.finish_module_load(current));
        assert!(!machine.state().module_loading);
    }

    #[test]
    fn reset_keeps_the_pin() {
        let mut presentation = PresentationState::default();
        presentation.set_pinned(true);
        presentation.set_hover_expanded(true);
        presentation.set_collapsed("Books", true);

        presentation.reset();

        assert!(presentation.pinned);
        assert!(!presentation.hover_expanded);
        let books = ModuleSection {
            title: "Books".into(),
            collapsible_default: false,
            items: Vec::new(),
        };
        assert!(!presentation.is_collapsed(&books));
    }
}
