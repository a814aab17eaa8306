//! Event record for hash-linked chains.
//!
//! Events are immutable once the origin has assigned them an identifier.
//! Each event points at its predecessor through `previous`, forming a
//! singly-linked backward chain that ends at [`EventId::SENTINEL`].

use crate::identity::EventId;

/// A single event in a chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Event {
    /// Origin-assigned identifier. Caches never compute or rewrite it.
    pub id: EventId,
    /// Predecessor in the chain, or the sentinel for the first event.
    pub previous: EventId,
    /// Application-defined event type.
    pub kind: String,
    /// Opaque payload.
    pub data: Vec<u8>,
}

impl Event {
    /// Create an event with an identifier already assigned by the origin.
    pub fn new(id: EventId, previous: EventId, kind: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id,
            previous,
            kind: kind.into(),
            data,
        }
    }

    /// Create an event whose identifier is the content digest of its body.
    pub fn with_digest_id(previous: EventId, kind: impl Into<String>, data: Vec<u8>) -> Self {
        let kind = kind.into();
        let id = EventId::digest(&previous, &kind, &data);
        Self {
            id,
            previous,
            kind,
            data,
        }
    }

    /// Whether this event starts its chain.
    pub fn is_first(&self) -> bool {
        self.previous.is_sentinel()
    }

    /// Whether `id` matches the content digest of this event's body.
    pub fn has_digest_id(&self) -> bool {
        EventId::digest(&self.previous, &self.kind, &self.data) == self.id
    }
}
