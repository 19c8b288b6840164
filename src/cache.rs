//! Session cache for the remote module list.
//!
//! Every fetch takes a ticket with a sequence number. Completions apply
//! last-write-wins by sequence: one older than the newest applied completion
//! is discarded, so a slow response can never overwrite a newer one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::errors::FetchError;
use crate::models::remote::RemoteModuleRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    sequence: u64,
}

impl FetchTicket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSnapshot {
    pub sequence: u64,
    pub records: Vec<RemoteModuleRecord>,
    pub fetched_at: DateTime<Utc>,
}

/// What a completed fetch did to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheUpdate {
    Applied(Arc<ModuleSnapshot>),
    /// The fetch failed; the cache was cleared so navigation falls back
    Failed { sequence: u64, error: FetchError },
    /// A newer fetch already completed (or the cache was reset); nothing changed
    Stale { sequence: u64, latest: u64 },
}

#[derive(Debug, Default)]
struct CacheState {
    issued: u64,
    /// Sequence of the newest completion that changed the cache, or of the
    /// last ticket issued before a reset
    applied: u64,
    snapshot: Option<Arc<ModuleSnapshot>>,
}

#[derive(Debug, Default)]
pub struct ModuleCache {
    state: RwLock<CacheState>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn begin_fetch(&self) -> FetchTicket {
        let mut state = self.state.write().await;
        state.issued += 1;
        FetchTicket { sequence: state.issued }
    }

    pub async fn complete(
        &self,
        ticket: FetchTicket,
        result: Result<Vec<RemoteModuleRecord>, FetchError>,
    ) -> CacheUpdate {
        let mut state = self.state.write().await;
        if ticket.sequence <= state.applied {
            return CacheUpdate::Stale {
                sequence: ticket.sequence,
                latest: state.applied,
            };
        }
        state.applied = ticket.sequence;

        match result {
            Ok(records) => {
                let snapshot = Arc::new(ModuleSnapshot {
                    sequence: ticket.sequence,
                    records,
                    fetched_at: Utc::now(),
                });
                state.snapshot = Some(Arc::clone(&snapshot));
                CacheUpdate::Applied(snapshot)
            }
            Err(error) => {
                state.snapshot = None;
                CacheUpdate::Failed {
                    sequence: ticket.sequence,
                    error,
                }
            }
        }
    }

    pub async fn snapshot(&self) -> Option<Arc<ModuleSnapshot>> {
        self.state.read().await.snapshot.clone()
    }

    pub async fn records(&self) -> Option<Vec<RemoteModuleRecord>> {
        self.state.read().await.snapshot.as_ref().map(|snapshot| snapshot.records.clone())
    }

    /// Drops the cached list and invalidates fetches still in flight.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.applied = state.issued;
        state.snapshot = None;
    }
}
