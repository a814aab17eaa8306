//! Log head lookup.
//!
//! Maps a log to the identifier of its most recent event. The PostgreSQL
//! implementation lives in chainread-api.

use async_trait::async_trait;
use chainread_core::{ChainResult, EventId, LogId};

#[async_trait]
pub trait HeadLookup: Send + Sync {
    /// Current head of `log_id`, or `None` when the log is unknown.
    async fn head(&self, log_id: &LogId) -> ChainResult<Option<EventId>>;

    /// Current head, treating an unknown log as an empty one.
    async fn head_or_sentinel(&self, log_id: &LogId) -> ChainResult<EventId> {
        Ok(self.head(log_id).await?.unwrap_or(EventId::SENTINEL))
    }

    /// Probe the backing store for readiness checks.
    async fn health_check(&self) -> ChainResult<()>;
}
