// ── FixtureCollector ──
//
// In-memory collector over fixed snapshots. Backbone of the engine's
// test suite, also handy for demos that should not touch a real host.

use crate::snapshot::{InterfaceSnapshot, TableSnapshot};
use crate::{CollectorError, StateCollector};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// [`StateCollector`] that serves canned snapshots.
///
/// A failure can be injected at any point; once set it is returned by
/// every read until cleared. Read cycles are counted (one cycle per
/// `list_interfaces` call) so tests can assert build coalescing.
pub struct FixtureCollector {
    interfaces: Vec<InterfaceSnapshot>,
    tables: Vec<TableSnapshot>,
    failure: Mutex<Option<CollectorError>>,
    cycles: AtomicUsize,
}

impl FixtureCollector {
    pub fn new(interfaces: Vec<InterfaceSnapshot>, tables: Vec<TableSnapshot>) -> Self {
        Self {
            interfaces,
            tables,
            failure: Mutex::new(None),
            cycles: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent read fail with `error` until cleared.
    pub fn inject_failure(&self, error: CollectorError) {
        if let Ok(mut slot) = self.failure.lock() {
            *slot = Some(error);
        }
    }

    /// Restore normal reads.
    pub fn clear_failure(&self) {
        if let Ok(mut slot) = self.failure.lock() {
            *slot = None;
        }
    }

    /// Number of read cycles served so far.
    pub fn cycles(&self) -> usize {
        self.cycles.load(Ordering::SeqCst)
    }

    fn current_failure(&self) -> Option<CollectorError> {
        self.failure.lock().ok().and_then(|slot| slot.clone())
    }
}

#[async_trait]
impl StateCollector for FixtureCollector {
    async fn list_interfaces(&self) -> Result<Vec<InterfaceSnapshot>, CollectorError> {
        self.cycles.fetch_add(1, Ordering::SeqCst);
        match self.current_failure() {
            Some(error) => Err(error),
            None => Ok(self.interfaces.clone()),
        }
    }

    async fn list_tables(&self) -> Result<Vec<TableSnapshot>, CollectorError> {
        match self.current_failure() {
            Some(error) => Err(error),
            None => Ok(self.tables.clone()),
        }
    }
}
