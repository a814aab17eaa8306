//! Service Configuration
//!
//! Everything the server needs to wire its tiers together, loaded from
//! environment variables with development defaults. Values that are present
//! but unparseable are rejected rather than silently defaulted.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use chainread_core::ConfigError;
use chainread_storage::{OriginConfig, ReaderConfig, RemoteCacheConfig};

use crate::db::DbConfig;

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    pub db: DbConfig,
    pub origin: OriginConfig,
    /// Shared cache settings. `None` when `CHAINREAD_REDIS_URL` is set but
    /// empty, which runs the reader without a remote tier.
    pub remote: Option<RemoteCacheConfig>,
    pub reader: ReaderConfig,
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let host = match env.string("CHAINREAD_API_BIND") {
            None => IpAddr::from([0, 0, 0, 0]),
            Some(raw) => raw.trim().parse::<IpAddr>().map_err(|e| ConfigError::InvalidValue {
                field: "CHAINREAD_API_BIND".to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            })?,
        };
        let port: u16 = match env.string("PORT") {
            Some(_) => env.parse("PORT")?,
            None => env.parse("CHAINREAD_API_PORT")?,
        }
        .unwrap_or(3000);
        let bind_addr = SocketAddr::new(host, port);

        let log_format = match env.string("CHAINREAD_LOG_FORMAT").as_deref() {
            None | Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    field: "CHAINREAD_LOG_FORMAT".to_string(),
                    value: other.to_string(),
                    reason: "expected json or pretty".to_string(),
                })
            }
        };

        let defaults = DbConfig::default();
        let db = DbConfig {
            host: env.string("CHAINREAD_DB_HOST").unwrap_or(defaults.host),
            port: env.parse("CHAINREAD_DB_PORT")?.unwrap_or(defaults.port),
            dbname: env.string("CHAINREAD_DB_NAME").unwrap_or(defaults.dbname),
            user: env.string("CHAINREAD_DB_USER").unwrap_or(defaults.user),
            password: env.string("CHAINREAD_DB_PASSWORD").unwrap_or(defaults.password),
            max_size: env.parse("CHAINREAD_DB_POOL_SIZE")?.unwrap_or(defaults.max_size),
            timeout: env
                .parse("CHAINREAD_DB_TIMEOUT")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        };

        let origin_url = env
            .string("CHAINREAD_ORIGIN_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                field: "CHAINREAD_ORIGIN_URL".to_string(),
            })?;
        let mut origin = OriginConfig::new(origin_url);
        if let Some(ms) = env.parse("CHAINREAD_ORIGIN_TIMEOUT_MS")? {
            origin = origin.with_timeout(Duration::from_millis(ms));
        }
        if let Some(verify) = env.parse("CHAINREAD_ORIGIN_VERIFY_IDS")? {
            origin = origin.with_verify_ids(verify);
        }

        let remote = match env.raw("CHAINREAD_REDIS_URL") {
            Some(url) if url.trim().is_empty() => None,
            url => {
                let mut remote = RemoteCacheConfig::new(
                    url.unwrap_or_else(|| RemoteCacheConfig::default().url),
                );
                if let Some(prefix) = env.string("CHAINREAD_REDIS_KEY_PREFIX") {
                    remote = remote.with_key_prefix(prefix);
                }
                if let Some(secs) = env.parse("CHAINREAD_REDIS_TTL_SECS")? {
                    remote = remote.with_ttl(Some(Duration::from_secs(secs)));
                }
                if let Some(ms) = env.parse("CHAINREAD_REDIS_TIMEOUT_MS")? {
                    remote = remote.with_op_timeout(Duration::from_millis(ms));
                }
                Some(remote)
            }
        };

        let mut reader = ReaderConfig::default();
        if let Some(capacity) = env.parse("CHAINREAD_CACHE_MAX_KEYS")? {
            reader = reader.with_local_capacity(capacity);
        }
        if let Some(workers) = env.parse("CHAINREAD_POPULATION_WORKERS")? {
            reader = reader.with_population_workers(workers);
        }
        if let Some(queue) = env.parse("CHAINREAD_POPULATION_QUEUE")? {
            reader = reader.with_population_queue(queue);
        }
        if let Some(depth) = env.parse("CHAINREAD_MAX_CHAIN_DEPTH")? {
            reader = reader.with_max_chain_depth(Some(depth));
        }
        reader.validate()?;

        Ok(Self {
            bind_addr,
            log_format,
            db,
            origin,
            remote,
            reader,
        })
    }
}

struct Env<'a, F>(&'a F);

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    /// Variable value, treating an empty one as unset.
    fn string(&self, key: &str) -> Option<String> {
        self.raw(key).filter(|value| !value.trim().is_empty())
    }

    fn parse<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.string(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::InvalidValue {
                    field: key.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("CHAINREAD_ORIGIN_URL", "http://origin:8080")]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.db.dbname, "chainread");
        assert_eq!(config.reader.local_capacity, 50_000);
        assert_eq!(config.reader.max_chain_depth, None);
        let remote = config.remote.unwrap();
        assert_eq!(remote.ttl, None);
        assert_eq!(remote.url, RemoteCacheConfig::default().url);
        assert_eq!(config.origin.timeout, Duration::from_secs(10));
        assert!(!config.origin.verify_ids);
    }

    #[test]
    fn test_origin_url_required() {
        assert_eq!(
            load(&[]).unwrap_err(),
            ConfigError::MissingRequired {
                field: "CHAINREAD_ORIGIN_URL".to_string()
            }
        );
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("CHAINREAD_ORIGIN_URL", "http://origin"),
            ("PORT", "8081"),
            ("CHAINREAD_API_PORT", "9999"),
            ("CHAINREAD_LOG_FORMAT", "pretty"),
            ("CHAINREAD_REDIS_TTL_SECS", "60"),
            ("CHAINREAD_REDIS_KEY_PREFIX", "ev:"),
            ("CHAINREAD_CACHE_MAX_KEYS", "10"),
            ("CHAINREAD_MAX_CHAIN_DEPTH", "500"),
            ("CHAINREAD_ORIGIN_VERIFY_IDS", "true"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8081);
        assert_eq!(config.log_format, LogFormat::Pretty);
        let remote = config.remote.unwrap();
        assert_eq!(remote.ttl, Some(Duration::from_secs(60)));
        assert_eq!(remote.key_prefix, "ev:");
        assert_eq!(config.reader.local_capacity, 10);
        assert_eq!(config.reader.max_chain_depth, Some(500));
        assert!(config.origin.verify_ids);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = load(&[
            ("CHAINREAD_ORIGIN_URL", "http://origin"),
            ("CHAINREAD_CACHE_MAX_KEYS", "lots"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "CHAINREAD_CACHE_MAX_KEYS"));

        assert!(load(&[
            ("CHAINREAD_ORIGIN_URL", "http://origin"),
            ("CHAINREAD_CACHE_MAX_KEYS", "0"),
        ])
        .is_err());
    }

    #[test]
    fn test_empty_redis_url_disables_remote_tier() {
        let config = load(&[
            ("CHAINREAD_ORIGIN_URL", "http://origin"),
            ("CHAINREAD_REDIS_URL", ""),
            ("CHAINREAD_REDIS_TTL_SECS", "60"),
        ])
        .unwrap();
        assert!(config.remote.is_none());

        let config = load(&[
            ("CHAINREAD_ORIGIN_URL", "http://origin"),
            ("CHAINREAD_REDIS_URL", "redis://cache:6379"),
        ])
        .unwrap();
        assert_eq!(config.remote.unwrap().url, "redis://cache:6379");
    }

    #[test]
    fn test_bind_address_edge_cases() {
        let config = load(&[("CHAINREAD_ORIGIN_URL", "http://origin"), ("PORT", "")]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse().unwrap());

        let config = load(&[
            ("CHAINREAD_ORIGIN_URL", "http://origin"),
            ("PORT", ""),
            ("CHAINREAD_API_PORT", "4000"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 4000);

        let config = load(&[
            ("CHAINREAD_ORIGIN_URL", "http://origin"),
            ("CHAINREAD_API_BIND", "::"),
            ("PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr, "[::]:8080".parse().unwrap());

        let err = load(&[
            ("CHAINREAD_ORIGIN_URL", "http://origin"),
            ("CHAINREAD_API_BIND", "localhost"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "CHAINREAD_API_BIND"));
    }
}
