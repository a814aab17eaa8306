//! chainread Core - Event Types
//!
//! Pure data structures with no I/O. All other crates depend on this.
//! Identifiers, the event record, and the error taxonomy shared by the
//! cache tiers, the origin client and the HTTP layer.

pub mod error;
pub mod event;
pub mod identity;

pub use error::{ChainError, ChainResult, ConfigError, DecodeError, TransportError};
pub use event::Event;
pub use identity::{EventId, LogId, EVENT_ID_LEN};

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_event_id() -> impl Strategy<Value = EventId> {
        prop::array::uniform32(any::<u8>()).prop_map(EventId::from_bytes)
    }

    proptest! {
        #[test]
        fn prop_event_id_text_round_trip(id in arb_event_id()) {
            let text = id.to_string();
            prop_assert_eq!(text.len(), 64);
            prop_assert_eq!(EventId::parse(&text).unwrap(), id);
        }

        #[test]
        fn prop_event_id_parse_never_panics(s in ".{0,80}") {
            let _ = EventId::parse(&s);
        }

        #[test]
        fn prop_digest_ids_verify(
            previous in arb_event_id(),
            kind in "[a-z_]{0,16}",
            data in prop::collection::vec(any::<u8>(), 0..64),
        ) {
            let event = Event::with_digest_id(previous, kind, data);
            prop_assert!(event.has_digest_id());
        }
    }
}
