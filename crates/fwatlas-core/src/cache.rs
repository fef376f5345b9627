//! Cache & refresh controller.
//!
//! One slot holds the latest built graph. Rebuilds are coalesced: all
//! callers that find the slot empty or stale share a single collector
//! read cycle. Builds run in detached tasks publishing through a
//! `watch` channel, so a caller abandoning its request never cancels a
//! build other callers are waiting on.

use crate::builder;
use crate::error::TopologyError;
use crate::model::TopologyGraph;
use fwatlas_collect::{CollectorError, StateCollector};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

/// What one build publishes to everyone waiting on it.
type BuildOutcome = Result<Arc<TopologyGraph>, Arc<CollectorError>>;

#[derive(Clone)]
struct BuildTicket {
    epoch: u64,
    rx: watch::Receiver<Option<BuildOutcome>>,
}

struct ReadySlot {
    graph: Arc<TopologyGraph>,
    built_at: Instant,
    /// Epoch of the build that produced this graph.
    epoch: u64,
}

#[derive(Default)]
pub(crate) struct CacheState {
    ready: Option<ReadySlot>,
    building: Option<BuildTicket>,
    /// Bumped per spawned build. Completions install in epoch order:
    /// a build only replaces a slot holding an older epoch, so a late
    /// superseded completion never clobbers a newer graph.
    epoch: u64,
}

struct CacheInner {
    collector: Arc<dyn StateCollector>,
    max_age: Duration,
    state: Mutex<CacheState>,
}

/// Single-slot topology cache. Cheap to clone; clones share the slot.
#[derive(Clone)]
pub struct GraphCache {
    inner: Arc<CacheInner>,
}

impl GraphCache {
    pub fn new(collector: Arc<dyn StateCollector>, max_age: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                collector,
                max_age,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    /// Current graph, rebuilding first when the slot is empty or stale.
    ///
    /// If the rebuild this call joins (rather than triggers) fails and a
    /// previously built graph exists, that stale graph is returned and
    /// the failure stays with the caller that triggered it.
    pub async fn get(&self) -> Result<Arc<TopologyGraph>, TopologyError> {
        let (ticket, triggered) = {
            let mut state = self.inner.state.lock().await;
            if let Some(ready) = &state.ready {
                if ready.built_at.elapsed() < self.inner.max_age {
                    debug!("topology cache hit");
                    return Ok(Arc::clone(&ready.graph));
                }
            }
            match &state.building {
                Some(ticket) => (ticket.clone(), false),
                None => (self.spawn_build(&mut state), true),
            }
        };
        self.wait(ticket, triggered).await
    }

    /// Rebuild now regardless of slot age.
    ///
    /// Supersedes any in-flight build: its waiters still receive its
    /// outcome, but once this refresh completes, later `get` calls
    /// never observe a graph older than the one it built.
    pub async fn force_refresh(&self) -> Result<Arc<TopologyGraph>, TopologyError> {
        let ticket = {
            let mut state = self.inner.state.lock().await;
            self.spawn_build(&mut state)
        };
        self.wait(ticket, true).await
    }

    /// Non-building look at the slot, for health probes.
    pub async fn peek(&self) -> Option<Arc<TopologyGraph>> {
        let state = self.inner.state.lock().await;
        state.ready.as_ref().map(|slot| Arc::clone(&slot.graph))
    }

    /// Hold the slot lock, wedging every cache operation until dropped.
    #[cfg(test)]
    pub(crate) async fn lock_state(&self) -> tokio::sync::MutexGuard<'_, CacheState> {
        self.inner.state.lock().await
    }

    async fn wait(
        &self,
        mut ticket: BuildTicket,
        triggered: bool,
    ) -> Result<Arc<TopologyGraph>, TopologyError> {
        let outcome = {
            let published = ticket
                .rx
                .wait_for(Option::is_some)
                .await
                .map_err(|_| TopologyError::Internal("build task dropped its channel".to_owned()))?;
            (*published).clone()
        };
        let Some(outcome) = outcome else {
            return Err(TopologyError::Internal("build published no outcome".to_owned()));
        };

        match outcome {
            Ok(graph) => Ok(graph),
            Err(error) => {
                if triggered {
                    return Err(TopologyError::Collector((*error).clone()));
                }
                let state = self.inner.state.lock().await;
                match &state.ready {
                    Some(slot) => {
                        warn!(error = %error, "shared rebuild failed, serving previous graph");
                        Ok(Arc::clone(&slot.graph))
                    }
                    None => Err(TopologyError::Collector((*error).clone())),
                }
            }
        }
    }

    fn spawn_build(&self, state: &mut CacheState) -> BuildTicket {
        state.epoch += 1;
        let epoch = state.epoch;
        let (tx, rx) = watch::channel(None);
        let ticket = BuildTicket { epoch, rx };
        state.building = Some(ticket.clone());

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            debug!(epoch, "topology rebuild started");
            let outcome = read_and_build(inner.collector.as_ref()).await;

            let mut state = inner.state.lock().await;
            if state.building.as_ref().is_some_and(|current| current.epoch == epoch) {
                state.building = None;
            }
            match &outcome {
                Ok(graph) => {
                    if state.ready.as_ref().is_none_or(|slot| epoch > slot.epoch) {
                        state.ready = Some(ReadySlot {
                            graph: Arc::clone(graph),
                            built_at: Instant::now(),
                            epoch,
                        });
                        info!(
                            epoch,
                            nodes = graph.nodes.len(),
                            links = graph.links.len(),
                            flows = graph.flows.len(),
                            "topology rebuilt"
                        );
                    } else {
                        debug!(epoch, "out-of-order build discarded");
                    }
                }
                Err(error) => {
                    warn!(
                        epoch,
                        error = %error,
                        stale_available = state.ready.is_some(),
                        "topology rebuild failed"
                    );
                }
            }
            // Publish after the slot update so a waiter that sees the
            // outcome also sees the installed graph.
            let _ = tx.send(Some(outcome));
        });

        ticket
    }
}

async fn read_and_build(collector: &dyn StateCollector) -> BuildOutcome {
    let (interfaces, tables) =
        tokio::join!(collector.list_interfaces(), collector.list_tables());
    match (interfaces, tables) {
        (Ok(interfaces), Ok(tables)) => Ok(Arc::new(builder::build(&interfaces, &tables))),
        (Err(error), _) | (_, Err(error)) => Err(Arc::new(error)),
    }
}

// ── Tests ───────────────────────────────────────────────────────────
