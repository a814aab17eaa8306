//! chainread storage - cache tiers, origin client and chain reader
//!
//! Resolves content-addressed events through a local LRU, a shared remote
//! cache and finally the origin store, and reconstructs log history by
//! walking `previous` links.

pub mod cache;
pub mod head;
pub mod origin;
pub mod population;
pub mod reader;

pub use cache::{
    CacheStats, LocalEventCache, NoopRemoteCache, RedisEventCache, RemoteCacheConfig,
    RemoteEventCache, RemoteRecord,
};
pub use head::HeadLookup;
pub use origin::{HttpOriginClient, OriginClient, OriginConfig, OriginEventBody};
pub use population::{PopulationPool, PopulationStats};
pub use reader::{ChainReader, ReaderConfig, ReaderStats};
