//! Chain reader: tiered read-through lookup and history reconstruction.
//!
//! # Read path
//!
//! ```text
//! resolve(id)
//!   ├─ LocalEventCache ── hit ──────────────────────────────► event
//!   ├─ RemoteEventCache ─ hit ── put into local ────────────► event
//!   └─ OriginClient ───── ok ─── schedule population ───────► event
//!                        └ err ─────────────────────────────► error
//! ```
//!
//! Local and remote failures never surface; they fall through to the next
//! tier. Only an origin failure fails the call.
//!
//! # History
//!
//! `history(head, stop_at)` walks `previous` links backwards from `head`
//! until it reaches `stop_at` or the sentinel, then reverses, so the result
//! is oldest first. The walk is iterative and all-or-nothing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chainread_core::{ChainError, ChainResult, ConfigError, Event, EventId};

use crate::cache::{CacheStats, LocalEventCache, RemoteEventCache};
use crate::origin::OriginClient;
use crate::population::{PopulationPool, PopulationStats};

/// Configuration for the chain reader and its local tier.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Maximum number of events held in process.
    pub local_capacity: usize,
    /// Number of background population workers.
    pub population_workers: usize,
    /// Bound of the population queue.
    pub population_queue_capacity: usize,
    /// Fail `history` once a walk would resolve more than this many events.
    /// `None` walks until `stop_at` or the sentinel.
    pub max_chain_depth: Option<usize>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            local_capacity: 50_000,
            population_workers: 4,
            population_queue_capacity: 1024,
            max_chain_depth: None,
        }
    }
}

impl ReaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local_capacity(mut self, capacity: usize) -> Self {
        self.local_capacity = capacity;
        self
    }

    pub fn with_population_workers(mut self, workers: usize) -> Self {
        self.population_workers = workers;
        self
    }

    pub fn with_population_queue(mut self, capacity: usize) -> Self {
        self.population_queue_capacity = capacity;
        self
    }

    pub fn with_max_chain_depth(mut self, depth: Option<usize>) -> Self {
        self.max_chain_depth = depth;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("local_capacity", self.local_capacity),
            ("population_workers", self.population_workers),
            ("population_queue_capacity", self.population_queue_capacity),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        if self.max_chain_depth == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "max_chain_depth".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1 when set".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct TierCounters {
    local_hits: AtomicU64,
    remote_hits: AtomicU64,
    origin_fetches: AtomicU64,
    origin_failures: AtomicU64,
}

/// Where resolved events came from, since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub local_hits: u64,
    pub remote_hits: u64,
    pub origin_fetches: u64,
    pub origin_failures: u64,
}

/// Tiered event resolver and history walker.
pub struct ChainReader {
    local: Arc<LocalEventCache>,
    remote: Arc<dyn RemoteEventCache>,
    origin: Arc<dyn OriginClient>,
    population: PopulationPool,
    max_chain_depth: Option<usize>,
    counters: TierCounters,
}

impl ChainReader {
    /// Build the local tier and population pool, wiring them to the given
    /// remote tier and origin. Must be called from within a Tokio runtime.
    pub fn new(
        config: &ReaderConfig,
        remote: Arc<dyn RemoteEventCache>,
        origin: Arc<dyn OriginClient>,
    ) -> ChainResult<Self> {
        config.validate()?;
        let local = Arc::new(LocalEventCache::new(config.local_capacity)?);
        let population = PopulationPool::start(
            config.population_workers,
            config.population_queue_capacity,
            Arc::clone(&local),
            Arc::clone(&remote),
        );
        Ok(Self {
            local,
            remote,
            origin,
            population,
            max_chain_depth: config.max_chain_depth,
            counters: TierCounters::default(),
        })
    }

    /// Resolve one event through local, remote, then origin.
    ///
    /// The sentinel never names an event and resolves to `NotFound` without
    /// consulting any tier.
    pub async fn resolve(&self, id: &EventId) -> ChainResult<Event> {
        if id.is_sentinel() {
            return Err(ChainError::NotFound { id: *id });
        }

        if let Some(event) = self.local.get(id) {
            self.counters.local_hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(event_id = %id, "Local cache hit");
            return Ok(event);
        }

        if let Some(event) = self.remote.get(id).await {
            self.counters.remote_hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(event_id = %id, "Remote cache hit");
            self.local.put(event.clone());
            return Ok(event);
        }

        self.counters.origin_fetches.fetch_add(1, Ordering::Relaxed);
        match self.origin.fetch(id).await {
            Ok(event) => {
                tracing::debug!(event_id = %id, "Fetched from origin");
                self.population.schedule(event.clone());
                Ok(event)
            }
            Err(e) => {
                self.counters.origin_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(event_id = %id, error = %e, "Origin fetch failed");
                Err(e)
            }
        }
    }

    /// Events after `stop_at` up to and including `head`, oldest first.
    ///
    /// A sentinel head yields an empty history. If `stop_at` is never met
    /// the walk runs back to the start of the chain. Any resolve failure
    /// fails the whole call.
    #[tracing::instrument(level = "debug", skip_all, fields(head = %head, stop_at = %stop_at))]
    pub async fn history(&self, head: EventId, stop_at: EventId) -> ChainResult<Vec<Event>> {
        let mut events = Vec::new();
        let mut cursor = head;

        while cursor != stop_at && !cursor.is_sentinel() {
            if let Some(limit) = self.max_chain_depth {
                if events.len() >= limit {
                    return Err(ChainError::DepthExceeded { head, limit });
                }
            }
            let event = self.resolve(&cursor).await?;
            cursor = event.previous;
            events.push(event);
        }

        events.reverse();
        tracing::debug!(count = events.len(), "History resolved");
        Ok(events)
    }

    pub fn local(&self) -> &LocalEventCache {
        &self.local
    }

    pub fn remote(&self) -> &dyn RemoteEventCache {
        self.remote.as_ref()
    }

    pub fn stats(&self) -> ReaderStats {
        ReaderStats {
            local_hits: self.counters.local_hits.load(Ordering::Relaxed),
            remote_hits: self.counters.remote_hits.load(Ordering::Relaxed),
            origin_fetches: self.counters.origin_fetches.load(Ordering::Relaxed),
            origin_failures: self.counters.origin_failures.load(Ordering::Relaxed),
        }
    }

    pub fn local_stats(&self) -> CacheStats {
        self.local.stats()
    }

    pub fn population_stats(&self) -> PopulationStats {
        self.population.stats()
    }

    /// Wait for scheduled population to finish.
    pub async fn wait_for_population(&self) {
        self.population.wait_idle().await;
    }

    /// Drain and stop the population workers.
    pub async fn shutdown(&self) {
        self.population.shutdown().await;
    }
}
