//! Per-session orchestration: route change -> detector -> view state ->
//! composer, with the remote module list cached in between.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::authz::User;
use crate::cache::{CacheUpdate, ModuleCache};
use crate::composer::{AccessOutcome, NavigationComposer, ResolvedNavigation};
use crate::events::{self, Diagnostic, EventBus, NavEvent};
use crate::models::module::ModuleSidebar;
use crate::provider::ModuleProvider;
use crate::view::{PresentationState, ViewState, ViewStateMachine};

/// Everything the renderer needs after a navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationSnapshot {
    pub route: String,
    pub view: ViewState,
    pub navigation: ResolvedNavigation,
    pub active_module: Option<ModuleSidebar>,
    pub access: AccessOutcome,
}

#[derive(Debug)]
struct Session {
    user: User,
    route: String,
    view: ViewStateMachine,
    /// Set once the session's module list has been requested
    fetch_started: bool,
    /// Diagnostics last sent to the bus, so unchanged ones are not repeated
    reported: Vec<Diagnostic>,
}

impl Session {
    fn new(user: User) -> Self {
        Self {
            user,
            route: "/dashboard".to_string(),
            view: ViewStateMachine::new(),
            fetch_started: false,
            reported: Vec::new(),
        }
    }
}

pub struct Navigator {
    composer: Arc<NavigationComposer>,
    provider: Option<Arc<dyn ModuleProvider>>,
    cache: ModuleCache,
    session: RwLock<Session>,
    bus: EventBus,
}

impl Navigator {
    pub fn new(composer: Arc<NavigationComposer>, user: User, bus: EventBus) -> Self {
        Self {
            composer,
            provider: None,
            cache: ModuleCache::new(),
            session: RwLock::new(Session::new(user)),
            bus,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn ModuleProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn composer(&self) -> &NavigationComposer {
        &self.composer
    }

    pub async fn user(&self) -> User {
        self.session.read().await.user.clone()
    }

    /// Replaces the user snapshot and starts the new session's module fetch.
    /// Cached modules and view state belong to the previous user and are
    /// dropped before the new user becomes visible.
    pub async fn set_user(&self, user: User) {
        {
            let mut session = self.session.write().await;
            *session = Session::new(user);
            self.cache.reset().await;
        }
        tracing::info!("navigation session reset for new user");
        self.refresh_modules().await;
    }

    /// Fetches the user's modules and applies the result if it is still the
    /// newest. `None` when no provider is configured.
    ///
    /// This is the only way to retry after a failed fetch.
    pub async fn refresh_modules(&self) -> Option<CacheUpdate> {
        let provider = self.provider.as_ref()?;
        let (ticket, user) = {
            let mut session = self.session.write().await;
            session.fetch_started = true;
            (self.cache.begin_fetch().await, session.user.clone())
        };

        let result = provider.fetch_user_modules(&user).await;
        let update = self.cache.complete(ticket, result).await;

        match &update {
            CacheUpdate::Applied(snapshot) => {
                tracing::info!(sequence = snapshot.sequence, count = snapshot.records.len(), "user modules refreshed");
                events::publish(
                    &self.bus,
                    NavEvent::ModulesRefreshed {
                        sequence: snapshot.sequence,
                        count: snapshot.records.len(),
                        fetched_at: snapshot.fetched_at,
                    },
                );
            }
            CacheUpdate::Failed { error, .. } => {
                events::report(&self.bus, &[Diagnostic::FetchFailure { error: error.to_string() }]);
            }
            CacheUpdate::Stale { sequence, latest } => {
                events::report(
                    &self.bus,
                    &[Diagnostic::StaleResponse {
                        sequence: *sequence,
                        latest: *latest,
                    }],
                );
            }
        }

        Some(update)
    }

    /// Moves the session to `path` and returns the resulting navigation.
    ///
    /// The first navigation of a session fetches the module list; when it
    /// lands inside a module the view's loading flag is set for the fetch.
    /// Later navigations never fetch, even after a failure.
    pub async fn navigate(&self, path: &str) -> NavigationSnapshot {
        let (transition, fetch, ticket) = {
            let mut session = self.session.write().await;
            let user = session.user.clone();
            session.route = path.to_string();
            let transition = session.view.on_route_change(path, &self.composer, &user);

            let fetch = self.provider.is_some() && !session.fetch_started;
            session.fetch_started |= fetch;
            let ticket = (fetch && session.view.state().is_module_view).then(|| session.view.begin_module_load());
            (transition, fetch, ticket)
        };

        if transition.changed() {
            events::publish(
                &self.bus,
                NavEvent::ViewChanged {
                    from: transition.from.clone(),
                    to: transition.to.clone(),
                },
            );
        }
        if let Some(diagnostic) = &transition.diagnostic {
            events::report(&self.bus, std::slice::from_ref(diagnostic));
        }

        if fetch {
            self.refresh_modules().await;
        }
        if let Some(ticket) = ticket {
            self.session.write().await.view.finish_module_load(ticket);
        }

        self.snapshot().await
    }

    /// Current navigation without moving the session.
    ///
    /// Diagnostics reach the bus only when they differ from the last report.
    pub async fn snapshot(&self) -> NavigationSnapshot {
        let mut session = self.session.write().await;
        let records = self.cache.records().await;
        let user = &session.user;

        let navigation = self.composer.resolve(user, records.as_deref());
        let access = self.composer.check_access(user, &session.route, records.as_deref());
        let active_module = session
            .view
            .mode()
            .module_key()
            .and_then(|key| self.composer.module_sidebar(key, user));

        if session.reported != navigation.diagnostics {
            events::report(&self.bus, &navigation.diagnostics);
            session.reported = navigation.diagnostics.clone();
        }

        NavigationSnapshot {
            route: session.route.clone(),
            view: session.view.state().clone(),
            navigation,
            active_module,
            access,
        }
    }

    pub async fn presentation(&self) -> PresentationState {
        self.session.read().await.view.presentation().clone()
    }

    /// Toggles a section of the active module sidebar; `None` when no such
    /// section is showing.
    pub async fn toggle_section(&self, title: &str) -> Option<bool> {
        self.session.write().await.view.toggle_section(title)
    }

    pub async fn set_pinned(&self, pinned: bool) {
        self.session.write().await.view.presentation_mut().set_pinned(pinned);
    }

    pub async fn set_hover_expanded(&self, hover_expanded: bool) {
        self.session
            .write()
            .await
            .view
            .presentation_mut()
            .set_hover_expanded(hover_expanded);
    }
}
