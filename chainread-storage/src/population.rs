//! Background cache population.
//!
//! After an origin hit the reader hands the event to a [`PopulationPool`]:
//! a bounded queue drained by a fixed set of Tokio workers, each writing the
//! event into the local tier and then the remote tier. Scheduling never
//! waits. When the queue is full the event is dropped and counted; the next
//! read of that identifier simply goes to the origin again.
//!
//! Both tiers treat re-insertion as a no-op, so duplicate population of the
//! same identifier from racing readers needs no deduplication here.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chainread_core::Event;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use crate::cache::{LocalEventCache, RemoteEventCache};

/// Counters for population activity since startup.
#[derive(Debug, Default)]
struct PopulationCounters {
    enqueued: AtomicU64,
    completed: AtomicU64,
    dropped: AtomicU64,
}

/// Snapshot of population activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulationStats {
    /// Events accepted onto the queue.
    pub enqueued: u64,
    /// Events written to both tiers.
    pub completed: u64,
    /// Events discarded because the queue was full or closed.
    pub dropped: u64,
}

impl PopulationStats {
    /// Accepted events not yet written.
    pub fn backlog(&self) -> u64 {
        self.enqueued.saturating_sub(self.completed)
    }
}

/// Bounded work queue plus worker pool that backfills cache tiers.
pub struct PopulationPool {
    sender: RwLock<Option<mpsc::Sender<Event>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<PopulationCounters>,
    idle: Arc<Notify>,
}

impl PopulationPool {
    /// Spawn `workers` tasks on the current Tokio runtime.
    ///
    /// Must be called from within a runtime. `workers` and `queue_capacity`
    /// are clamped to at least one.
    pub fn start(
        workers: usize,
        queue_capacity: usize,
        local: Arc<LocalEventCache>,
        remote: Arc<dyn RemoteEventCache>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel::<Event>(queue_capacity.max(1));
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let counters = Arc::new(PopulationCounters::default());
        let idle = Arc::new(Notify::new());

        let handles = (0..workers.max(1))
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                let local = Arc::clone(&local);
                let remote = Arc::clone(&remote);
                let counters = Arc::clone(&counters);
                let idle = Arc::clone(&idle);
                tokio::spawn(async move {
                    loop {
                        let next = receiver.lock().await.recv().await;
                        let Some(event) = next else {
                            tracing::debug!(worker, "Population worker stopping");
                            break;
                        };
                        local.put(event.clone());
                        remote.set(&event).await;
                        counters.completed.fetch_add(1, Ordering::AcqRel);
                        idle.notify_waiters();
                    }
                })
            })
            .collect();

        Self {
            sender: RwLock::new(Some(sender)),
            workers: Mutex::new(handles),
            counters,
            idle,
        }
    }

    /// Queue an event for population without waiting.
    ///
    /// Returns `false` when the event was dropped.
    pub fn schedule(&self, event: Event) -> bool {
        let guard = self.sender.read();
        let Some(sender) = guard.as_ref() else {
            self.counters.dropped.fetch_add(1, Ordering::AcqRel);
            tracing::debug!(event_id = %event.id, "Population pool shut down, dropping cache backfill");
            return false;
        };
        // Count before sending so a fast worker never completes more than was enqueued
        self.counters.enqueued.fetch_add(1, Ordering::AcqRel);
        match sender.try_send(event) {
            Ok(()) => true,
            Err(e) => {
                self.counters.enqueued.fetch_sub(1, Ordering::AcqRel);
                self.counters.dropped.fetch_add(1, Ordering::AcqRel);
                self.idle.notify_waiters();
                match e {
                    mpsc::error::TrySendError::Full(event) => {
                        tracing::warn!(event_id = %event.id, "Population queue full, dropping cache backfill");
                    }
                    mpsc::error::TrySendError::Closed(event) => {
                        tracing::warn!(event_id = %event.id, "Population workers stopped, dropping cache backfill");
                    }
                }
                false
            }
        }
    }

    pub fn stats(&self) -> PopulationStats {
        PopulationStats {
            enqueued: self.counters.enqueued.load(Ordering::Acquire),
            completed: self.counters.completed.load(Ordering::Acquire),
            dropped: self.counters.dropped.load(Ordering::Acquire),
        }
    }

    /// Wait until every accepted event has been written.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.stats().backlog() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Close the queue and wait for the workers to drain it.
    ///
    /// Events scheduled afterwards are dropped.
    pub async fn shutdown(&self) {
        self.sender.write().take();
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Population worker panicked");
            }
        }
        let stats = self.stats();
        tracing::info!(
            completed = stats.completed,
            dropped = stats.dropped,
            "Population pool stopped"
        );
    }
}

impl std::fmt::Debug for PopulationPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopulationPool")
            .field("stats", &self.stats())
            .finish()
    }
}
