use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::{Mutex, MutexGuard};

use crate::notify::Notifier;

/// Process-wide critical section serializing the multi-step roster
/// read-modify-write operations (confirm, reorder, penalty propagation)
/// against each other. Join/leave deliberately bypass it: they touch a
/// single roster slot, and stalling every signup behind an admin reorder
/// costs more than the rare lost race, which at worst leaves an ordering an
/// admin can redo.
///
/// The storage layer has no transactions spanning these sequences, so the
/// guard is what keeps them from interleaving.
#[derive(Clone, Default)]
pub struct RosterGuard(Arc<Mutex<()>>);

impl RosterGuard {
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.0.lock().await
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub guard: RosterGuard,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(pool: SqlitePool, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            pool,
            guard: RosterGuard::default(),
            notifier,
        }
    }
}
