//! Navigation events and the diagnostics side channel.
//!
//! Nothing here can fail a resolution: events are fire-and-forget and a bus
//! without subscribers simply drops them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

pub mod diagnostic;
pub use diagnostic::{Diagnostic, Severity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NavEvent {
    /// View state machine moved between dashboard and module views
    ViewChanged {
        from: Option<String>,
        to: Option<String>,
    },
    /// A remote module list was applied to the cache
    ModulesRefreshed {
        sequence: u64,
        count: usize,
        fetched_at: DateTime<Utc>,
    },
    Diagnostic(Diagnostic),
}

pub type EventBus = broadcast::Sender<NavEvent>;

pub fn init_event_bus() -> (EventBus, broadcast::Receiver<NavEvent>) {
    broadcast::channel(256)
}

/// Fire and forget - a missing listener must not break navigation.
pub fn publish(bus: &EventBus, event: NavEvent) {
    let _ = bus.send(event);
}

/// Logs each diagnostic and forwards it to the bus.
pub fn report(bus: &EventBus, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        diagnostic.log();
        publish(bus, NavEvent::Diagnostic(diagnostic.clone()));
    }
}
