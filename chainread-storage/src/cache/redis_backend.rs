//! Redis-backed shared cache tier.
//!
//! Values are [`codec`](super::codec) records stored under the textual event
//! identifier (plus an optional key prefix). Writes use `SET ... NX` so that
//! re-populating a resident identifier never rewrites it.
//!
//! The connection is opened lazily on first use and re-established by the
//! connection manager, so the service can start while Redis is unreachable.
//! Every round trip is bounded by `op_timeout`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chainread_core::{ChainResult, ConfigError, Event, EventId, TransportError};
use redis::aio::ConnectionManager;
use tokio::sync::OnceCell;

use super::codec;
use super::traits::RemoteEventCache;

const SERVICE: &str = "redis";

/// Configuration for the Redis cache tier.
#[derive(Debug, Clone)]
pub struct RemoteCacheConfig {
    /// Connection URL, e.g. `redis://:password@host:6379/0`.
    pub url: String,
    /// Prepended to every key.
    pub key_prefix: String,
    /// Expiry for stored entries. `None` keeps entries until the store evicts them.
    pub ttl: Option<Duration>,
    /// Upper bound for connecting and for each command.
    pub op_timeout: Duration,
}

impl Default for RemoteCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/0".to_string(),
            key_prefix: String::new(),
            ttl: None,
            op_timeout: Duration::from_millis(250),
        }
    }
}

impl RemoteCacheConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }
}

/// Shared cache tier over Redis.
pub struct RedisEventCache {
    client: redis::Client,
    connection: OnceCell<ConnectionManager>,
    config: RemoteCacheConfig,
}

impl RedisEventCache {
    /// Validate the URL and build the client. Does not connect.
    pub fn new(config: RemoteCacheConfig) -> ChainResult<Self> {
        let client =
            redis::Client::open(config.url.as_str()).map_err(|e| ConfigError::InvalidValue {
                field: "redis_url".to_string(),
                value: config.url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
            config,
        })
    }

    pub fn config(&self) -> &RemoteCacheConfig {
        &self.config
    }

    /// Key under which `id` is stored.
    pub fn key(&self, id: &EventId) -> String {
        format!("{}{}", self.config.key_prefix, id)
    }

    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T, TransportError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.config.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(TransportError::ConnectionFailed {
                service: SERVICE.to_string(),
                reason: format!("{}: {}", operation, e),
            }),
            Err(_) => Err(TransportError::Timeout {
                operation: format!("{} {}", SERVICE, operation),
                timeout_ms: self.config.op_timeout.as_millis() as u64,
            }),
        }
    }

    async fn connection(&self) -> Result<ConnectionManager, TransportError> {
        let manager = self
            .connection
            .get_or_try_init(|| {
                self.bounded("CONNECT", ConnectionManager::new(self.client.clone()))
            })
            .await?;
        Ok(manager.clone())
    }

    async fn try_get(&self, id: &EventId) -> ChainResult<Option<Event>> {
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("GET");
        cmd.arg(self.key(id));
        let raw: Option<String> = self.bounded("GET", cmd.query_async(&mut conn)).await?;
        match raw {
            Some(raw) => Ok(Some(codec::decode(*id, &raw)?)),
            None => Ok(None),
        }
    }

    async fn try_set(&self, event: &Event) -> ChainResult<()> {
        let value = codec::encode(event)?;
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(self.key(&event.id)).arg(value).arg("NX");
        if let Some(ttl) = self.config.ttl {
            cmd.arg("EX").arg(ttl.as_secs().max(1));
        }
        // Nil when the key already existed
        let _: redis::Value = self.bounded("SET", cmd.query_async(&mut conn)).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteEventCache for RedisEventCache {
    async fn get(&self, id: &EventId) -> Option<Event> {
        match self.try_get(id).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(event_id = %id, error = %e, "Remote cache read failed, treating as miss");
                None
            }
        }
    }

    async fn set(&self, event: &Event) {
        if let Err(e) = self.try_set(event).await {
            tracing::warn!(event_id = %event.id, error = %e, "Remote cache write failed");
        }
    }

    async fn ping(&self) -> ChainResult<()> {
        let mut conn = self.connection().await?;
        let cmd = redis::cmd("PING");
        let _: redis::Value = self.bounded("PING", cmd.query_async(&mut conn)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = RemoteCacheConfig::new("redis://cache:6380/2")
            .with_key_prefix("events:")
            .with_ttl(Some(Duration::from_secs(3600)))
            .with_op_timeout(Duration::from_millis(50));

        assert_eq!(config.url, "redis://cache:6380/2");
        assert_eq!(config.key_prefix, "events:");
        assert_eq!(config.ttl, Some(Duration::from_secs(3600)));
        assert_eq!(config.op_timeout, Duration::from_millis(50));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = RedisEventCache::new(RemoteCacheConfig::new("not a url")).err();
        assert!(matches!(err, Some(chainread_core::ChainError::Config(_))));
    }

    #[test]
    fn test_key_uses_prefix_and_hex_id() {
        let cache =
            RedisEventCache::new(RemoteCacheConfig::default().with_key_prefix("ev:")).unwrap();
        let id = EventId::from_bytes([0xab; 32]);
        assert_eq!(cache.key(&id), format!("ev:{}", "ab".repeat(32)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_miss() {
        // Nothing listens on port 1; the read must fail open.
        let config = RemoteCacheConfig::new("redis://127.0.0.1:1/0")
            .with_op_timeout(Duration::from_millis(200));
        let cache = RedisEventCache::new(config).unwrap();
        let event = Event::with_digest_id(EventId::SENTINEL, "t", vec![]);

        assert!(cache.get(&event.id).await.is_none());
        cache.set(&event).await;
        assert!(cache.ping().await.is_err());
    }
}
