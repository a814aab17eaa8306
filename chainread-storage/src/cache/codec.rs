//! Wire record for the shared remote cache.
//!
//! An event is stored as a JSON object keyed by the textual encoding of its
//! identifier. The identifier itself is not repeated inside the record.
//!
//! ```text
//! {"previousId": "<64 hex chars>", "type": "<text>", "data": "<base64>"}
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chainread_core::{DecodeError, Event, EventId};
use serde::{Deserialize, Serialize};

/// Serialized form of an event in the remote tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    #[serde(rename = "previousId")]
    pub previous_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: String,
}

impl RemoteRecord {
    pub fn from_event(event: &Event) -> Self {
        Self {
            previous_id: event.previous.to_string(),
            kind: event.kind.clone(),
            data: BASE64.encode(&event.data),
        }
    }

    /// Rebuild the event stored under `id`.
    pub fn into_event(self, id: EventId) -> Result<Event, DecodeError> {
        let previous = EventId::parse(&self.previous_id)?;
        let data = BASE64
            .decode(self.data.as_bytes())
            .map_err(|e| DecodeError::InvalidPayload {
                reason: e.to_string(),
            })?;
        Ok(Event::new(id, previous, self.kind, data))
    }
}

/// Encode an event as its remote cache value, via [`RemoteRecord`].
pub fn encode(event: &Event) -> Result<String, DecodeError> {
    serde_json::to_string(&RemoteRecord::from_event(event)).map_err(|e| {
        DecodeError::MalformedRecord {
            reason: e.to_string(),
        }
    })
}

/// Decode a remote cache value stored under `id`.
pub fn decode(id: EventId, raw: &str) -> Result<Event, DecodeError> {
    let record: RemoteRecord =
        serde_json::from_str(raw).map_err(|e| DecodeError::MalformedRecord {
            reason: e.to_string(),
        })?;
    record.into_event(id)
}
