//! chainread API - HTTP service layer
//!
//! Serves log heads from PostgreSQL and reconstructs log history through the
//! tiered [`ChainReader`](chainread_storage::ChainReader): local LRU, shared
//! Redis cache, then the origin event store.

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod types;

use std::sync::Arc;

use chainread_storage::{
    ChainReader, HttpOriginClient, NoopRemoteCache, RedisEventCache, RemoteEventCache,
};

// Re-export commonly used types
pub use config::{LogFormat, ServiceConfig};
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_router;
pub use state::AppState;
pub use types::*;

/// Wire the production tiers described by `config`.
///
/// Nothing here connects eagerly: the database pool and the Redis
/// connection are established on first use. An unset remote tier falls back
/// to [`NoopRemoteCache`]. Must run inside a Tokio runtime.
pub fn build_state(config: &ServiceConfig) -> ApiResult<AppState> {
    let db = DbClient::from_config(&config.db)?;
    let remote: Arc<dyn RemoteEventCache> = match &config.remote {
        Some(remote) => Arc::new(RedisEventCache::new(remote.clone())?),
        None => {
            tracing::info!("No shared cache configured, remote tier disabled");
            Arc::new(NoopRemoteCache)
        }
    };
    let origin = HttpOriginClient::new(&config.origin)?;
    let reader = ChainReader::new(&config.reader, remote, Arc::new(origin))?;
    Ok(AppState::new(Arc::new(reader), Arc::new(db)))
}
