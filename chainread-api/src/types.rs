//! Response bodies.
//!
//! Every successful response is wrapped as `{"data": ...}`. Identifiers are
//! rendered as lowercase hex, payloads as standard base64.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chainread_core::{Event, EventId, LogId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// `GET /logs/{log_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogHeadResponse {
    pub log_id: LogId,
    pub head: EventId,
}

/// One event as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub event_id: EventId,
    /// Omitted for the first event of a log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<EventId>,
    #[serde(rename = "type")]
    pub kind: String,
    /// Base64 payload.
    pub data: String,
}

impl From<&Event> for EventResponse {
    fn from(event: &Event) -> Self {
        Self {
            event_id: event.id,
            previous: (!event.previous.is_sentinel()).then_some(event.previous),
            kind: event.kind.clone(),
            data: BASE64.encode(&event.data),
        }
    }
}

/// `GET /logs/{log_id}/events`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventListResponse {
    pub events: Vec<EventResponse>,
}

/// Query string of `GET /logs/{log_id}/events`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    /// Return only events after this one. Defaults to the start of the log.
    pub after: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_event_omits_previous() {
        let event = Event::new(EventId::from_bytes([1u8; 32]), EventId::SENTINEL, "t", vec![1, 2]);
        let json = serde_json::to_value(EventResponse::from(&event)).unwrap();
        assert_eq!(json["eventId"], "01".repeat(32));
        assert_eq!(json["type"], "t");
        assert_eq!(json["data"], "AQI=");
        assert!(json.get("previous").is_none());
    }

    #[test]
    fn test_linked_event_has_previous() {
        let previous = EventId::from_bytes([1u8; 32]);
        let event = Event::new(EventId::from_bytes([2u8; 32]), previous, "t", vec![]);
        let json = serde_json::to_value(EventResponse::from(&event)).unwrap();
        assert_eq!(json["previous"], previous.to_string());
        assert_eq!(json["data"], "");
    }
}
