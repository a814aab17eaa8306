//! Cache tiers in front of the origin event store.
//!
//! Two tiers, consulted in order by the [`ChainReader`](crate::ChainReader):
//!
//! - [`LocalEventCache`]: in-process, capacity-bounded, LRU eviction.
//! - [`RemoteEventCache`]: shared networked cache (Redis in production),
//!   fail-open on every error.
//!
//! Events are immutable and content-addressed, so neither tier ever updates
//! an entry in place. Population is insert-if-absent; the first writer wins.
//!
//! # Example
//!
//! ```ignore
//! let local = LocalEventCache::new(50_000)?;
//! let remote = RedisEventCache::new(RemoteCacheConfig::new("redis://cache:6379/0"))?;
//!
//! if let Some(event) = local.get(&id) {
//!     return Ok(event);
//! }
//! if let Some(event) = remote.get(&id).await {
//!     local.put(event.clone());
//!     return Ok(event);
//! }
//! ```

pub mod codec;
pub mod local;
pub mod redis_backend;
pub mod traits;

pub use codec::RemoteRecord;
pub use local::LocalEventCache;
pub use redis_backend::{RedisEventCache, RemoteCacheConfig};
pub use traits::{CacheStats, NoopRemoteCache, RemoteEventCache};
