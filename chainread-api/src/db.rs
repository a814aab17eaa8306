//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling via deadpool-postgres, and the head lookup
//! over the `logs` table:
//!
//! ```sql
//! CREATE TABLE logs (
//!     ext_lookup_key BYTEA PRIMARY KEY,  -- 16 raw bytes of the log UUID
//!     head           BYTEA NOT NULL      -- 32-byte event id, zeros when empty
//! );
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chainread_core::{ChainError, ChainResult, DecodeError, EventId, LogId, TransportError};
use chainread_storage::HeadLookup;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime, Timeouts};
use tokio_postgres::NoTls;

use crate::error::{ApiError, ApiResult};

const HEAD_QUERY: &str = "SELECT head FROM logs WHERE ext_lookup_key = $1";

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait and connect timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "chainread".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a connection pool from this configuration.
    ///
    /// Connections are opened lazily, so this succeeds while the database is
    /// down. Readiness reports the outage.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        let mut pool_cfg = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_cfg.timeouts = Timeouts {
            wait: Some(self.timeout),
            create: Some(self.timeout),
            recycle: Some(self.timeout),
        };
        cfg.pool = Some(pool_cfg);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Pooled PostgreSQL client serving log heads.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    async fn get_conn(&self) -> ApiResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(ApiError::from)
    }

    /// Verify that a connection can be acquired and used.
    pub async fn ping(&self) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[]).await?;
        Ok(())
    }
}

fn database_error(err: impl std::fmt::Display) -> TransportError {
    TransportError::Database {
        reason: err.to_string(),
    }
}

/// Decode a stored head column.
pub fn decode_head(raw: &[u8]) -> Result<EventId, DecodeError> {
    EventId::from_slice(raw)
}

/// A malformed head column is a fault in the database, not in any event
/// record, so it surfaces as a database error.
fn head_from_column(log_id: &LogId, raw: &[u8]) -> ChainResult<EventId> {
    decode_head(raw).map_err(|e| {
        ChainError::from(database_error(format!(
            "corrupt head column for log {}: {}",
            log_id, e
        )))
    })
}

#[async_trait]
impl HeadLookup for DbClient {
    async fn head(&self, log_id: &LogId) -> ChainResult<Option<EventId>> {
        let conn = self.pool.get().await.map_err(database_error)?;
        let key: &[u8] = log_id.as_bytes();
        let row = conn
            .query_opt(HEAD_QUERY, &[&key])
            .await
            .map_err(database_error)?;

        let Some(row) = row else {
            tracing::debug!(%log_id, "No head row, treating log as empty");
            return Ok(None);
        };
        let raw: Vec<u8> = row.try_get(0).map_err(database_error)?;
        head_from_column(log_id, &raw).map(Some)
    }

    async fn health_check(&self) -> ChainResult<()> {
        self.ping()
            .await
            .map_err(|e| ChainError::from(database_error(e.message)))
    }
}
