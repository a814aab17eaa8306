//! Cache tier traits and statistics.
//!
//! The local tier is a concrete type (see [`super::LocalEventCache`]); the
//! shared remote tier sits behind [`RemoteEventCache`] so the reader can run
//! against Redis in production and in-memory doubles in tests.

use async_trait::async_trait;
use chainread_core::{ChainResult, Event, EventId};

/// Shared, networked cache tier.
///
/// Implementations are fail-open: a transport or decode failure on `get` is
/// reported as a miss and a failure on `set` is swallowed. Neither may block
/// a fallback to the origin or fail the read that triggered population.
///
/// `set` must be a no-op when the identifier is already present. Events are
/// immutable, so the first writer wins.
#[async_trait]
pub trait RemoteEventCache: Send + Sync {
    /// Look up an event. `None` on miss or on any failure.
    async fn get(&self, id: &EventId) -> Option<Event>;

    /// Store an event if absent. Failures are logged, never returned.
    async fn set(&self, event: &Event);

    /// Probe connectivity for readiness checks.
    async fn ping(&self) -> ChainResult<()>;
}

/// Remote tier used when no shared cache is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRemoteCache;

#[async_trait]
impl RemoteEventCache for NoopRemoteCache {
    async fn get(&self, _id: &EventId) -> Option<Event> {
        None
    }

    async fn set(&self, _event: &Event) {}

    async fn ping(&self) -> ChainResult<()> {
        Ok(())
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of distinct events inserted.
    pub inserts: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
    /// Number of evictions due to capacity.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
