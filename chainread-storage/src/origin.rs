//! Origin event store client.
//!
//! The origin is the authoritative tier: it has no fallback beneath it, so
//! every failure here is surfaced to the caller. A 404 becomes
//! [`ChainError::NotFound`]; network problems and other statuses become
//! transport errors; a body that cannot be decoded becomes a decode error.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chainread_core::{
    ChainError, ChainResult, ConfigError, DecodeError, Event, EventId, TransportError,
};
use serde::Deserialize;

const SERVICE: &str = "origin";

/// Fetches single events from the authoritative store.
#[async_trait]
pub trait OriginClient: Send + Sync {
    async fn fetch(&self, id: &EventId) -> ChainResult<Event>;
}

/// Configuration for the HTTP origin client.
#[derive(Debug, Clone)]
pub struct OriginConfig {
    /// Base URL of the event reader API. Events are read from `{base_url}/events/{id}`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Reject events whose content digest does not match the requested id.
    pub verify_ids: bool,
}

impl OriginConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
            verify_ids: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verify_ids(mut self, verify: bool) -> Self {
        self.verify_ids = verify;
        self
    }
}

/// Body returned by `GET /events/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct OriginEventBody {
    /// Hex predecessor id. Empty or absent means the sentinel.
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    /// Base64 payload.
    #[serde(default)]
    pub data: String,
}

impl OriginEventBody {
    /// Turn a response body into the event stored under `id`.
    pub fn into_event(self, id: EventId) -> Result<Event, DecodeError> {
        let previous = match self.previous.as_deref() {
            None | Some("") => EventId::SENTINEL,
            Some(text) => EventId::parse(text)?,
        };
        let data = BASE64
            .decode(self.data.as_bytes())
            .map_err(|e| DecodeError::InvalidPayload {
                reason: e.to_string(),
            })?;
        Ok(Event::new(id, previous, self.kind, data))
    }
}

/// HTTP client for the origin event reader API.
#[derive(Clone)]
pub struct HttpOriginClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    verify_ids: bool,
}

impl HttpOriginClient {
    pub fn new(config: &OriginConfig) -> ChainResult<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "origin_url".to_string(),
            }
            .into());
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "origin_url".to_string(),
                value: config.base_url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url,
            timeout: config.timeout,
            verify_ids: config.verify_ids,
        })
    }

    pub fn event_url(&self, id: &EventId) -> String {
        format!("{}/events/{}", self.base_url, id)
    }

    fn transport_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout {
                operation: format!("{} GET", SERVICE),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            TransportError::ConnectionFailed {
                service: SERVICE.to_string(),
                reason: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl OriginClient for HttpOriginClient {
    async fn fetch(&self, id: &EventId) -> ChainResult<Event> {
        let response = self
            .client
            .get(self.event_url(id))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ChainError::NotFound { id: *id });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::RequestFailed {
                service: SERVICE.to_string(),
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        let body: OriginEventBody =
            serde_json::from_slice(&bytes).map_err(|e| DecodeError::MalformedRecord {
                reason: e.to_string(),
            })?;
        let event = body.into_event(*id)?;

        if self.verify_ids && !event.has_digest_id() {
            return Err(DecodeError::ContentMismatch {
                expected: *id,
                actual: EventId::digest(&event.previous, &event.kind, &event.data),
            }
            .into());
        }

        Ok(event)
    }
}
