//! chainread Test Utilities
//!
//! Shared test infrastructure for the chainread workspace:
//! - Proptest generators for identifiers, events and chains
//! - In-memory tier implementations with failure injection
//! - Fixtures for common chain shapes
//! - Assertions for chainread-specific results

pub use chainread_core::{
    ChainError, ChainResult, DecodeError, Event, EventId, LogId, TransportError, EVENT_ID_LEN,
};
pub use chainread_storage::{HeadLookup, OriginClient, RemoteEventCache};

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

// ============================================================================
// IN-MEMORY TIERS
// ============================================================================

/// Remote cache backed by a map. Can be switched into a failing mode, in
/// which it behaves like an unreachable server: reads miss, writes vanish.
#[derive(Debug, Default)]
pub struct InMemoryRemoteCache {
    entries: Mutex<HashMap<EventId, Event>>,
    unavailable: AtomicBool,
    gets: AtomicU64,
    sets: AtomicU64,
}

impl InMemoryRemoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache preloaded with `events`.
    pub fn with_events<'a>(events: impl IntoIterator<Item = &'a Event>) -> Self {
        let cache = Self::new();
        {
            let mut entries = cache.entries.lock();
            for event in events {
                entries.insert(event.id, event.clone());
            }
        }
        cache
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Release);
    }

    pub fn contains(&self, id: &EventId) -> bool {
        self.entries.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn get_count(&self) -> u64 {
        self.gets.load(Ordering::Acquire)
    }

    pub fn set_count(&self) -> u64 {
        self.sets.load(Ordering::Acquire)
    }
}

#[async_trait]
impl RemoteEventCache for InMemoryRemoteCache {
    async fn get(&self, id: &EventId) -> Option<Event> {
        self.gets.fetch_add(1, Ordering::AcqRel);
        if self.unavailable.load(Ordering::Acquire) {
            return None;
        }
        self.entries.lock().get(id).cloned()
    }

    async fn set(&self, event: &Event) {
        self.sets.fetch_add(1, Ordering::AcqRel);
        if self.unavailable.load(Ordering::Acquire) {
            return;
        }
        self.entries
            .lock()
            .entry(event.id)
            .or_insert_with(|| event.clone());
    }

    async fn ping(&self) -> ChainResult<()> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(TransportError::ConnectionFailed {
                service: "remote_cache".to_string(),
                reason: "unavailable".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Origin backed by a map, with per-identifier failure injection.
#[derive(Debug, Default)]
pub struct InMemoryOrigin {
    events: Mutex<HashMap<EventId, Event>>,
    failing: Mutex<HashSet<EventId>>,
    fetches: Mutex<HashMap<EventId, u64>>,
}

impl InMemoryOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events<'a>(events: impl IntoIterator<Item = &'a Event>) -> Self {
        let origin = Self::new();
        for event in events {
            origin.insert(event.clone());
        }
        origin
    }

    pub fn insert(&self, event: Event) {
        self.events.lock().insert(event.id, event);
    }

    /// Make fetches of `id` fail with a transport error.
    pub fn fail_on(&self, id: EventId) {
        self.failing.lock().insert(id);
    }

    pub fn clear_failures(&self) {
        self.failing.lock().clear();
    }

    /// Number of fetches issued for `id`.
    pub fn fetch_count(&self, id: &EventId) -> u64 {
        self.fetches.lock().get(id).copied().unwrap_or(0)
    }

    /// Number of fetches issued overall.
    pub fn total_fetches(&self) -> u64 {
        self.fetches.lock().values().sum()
    }
}

#[async_trait]
impl OriginClient for InMemoryOrigin {
    async fn fetch(&self, id: &EventId) -> ChainResult<Event> {
        *self.fetches.lock().entry(*id).or_insert(0) += 1;
        if self.failing.lock().contains(id) {
            return Err(TransportError::ConnectionFailed {
                service: "origin".to_string(),
                reason: "injected failure".to_string(),
            }
            .into());
        }
        self.events
            .lock()
            .get(id)
            .cloned()
            .ok_or(ChainError::NotFound { id: *id })
    }
}

/// Head lookup backed by a map.
#[derive(Debug, Default)]
pub struct InMemoryHeadLookup {
    heads: Mutex<HashMap<LogId, EventId>>,
    unavailable: AtomicBool,
}

impl InMemoryHeadLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_head(&self, log_id: LogId, head: EventId) {
        self.heads.lock().insert(log_id, head);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Release);
    }
}

#[async_trait]
impl HeadLookup for InMemoryHeadLookup {
    async fn head(&self, log_id: &LogId) -> ChainResult<Option<EventId>> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(TransportError::Database {
                reason: "unavailable".to_string(),
            }
            .into());
        }
        Ok(self.heads.lock().get(log_id).copied())
    }

    async fn health_check(&self) -> ChainResult<()> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(TransportError::Database {
                reason: "unavailable".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for chainread types.

    use super::*;
    use proptest::prelude::*;

    /// Any non-sentinel event identifier.
    pub fn arb_event_id() -> impl Strategy<Value = EventId> {
        any::<[u8; EVENT_ID_LEN]>()
            .prop_filter("sentinel is not an event", |b| b.iter().any(|x| *x != 0))
            .prop_map(EventId::from_bytes)
    }

    pub fn arb_kind() -> impl Strategy<Value = String> {
        "[a-z][a-z_.]{0,23}"
    }

    pub fn arb_data() -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(any::<u8>(), 0..256)
    }

    /// A standalone event with a digest identifier.
    pub fn arb_event() -> impl Strategy<Value = Event> {
        (
            prop_oneof![Just(EventId::SENTINEL), arb_event_id()],
            arb_kind(),
            arb_data(),
        )
            .prop_map(|(previous, kind, data)| Event::with_digest_id(previous, kind, data))
    }

    /// A well-formed chain of `len` events, oldest first.
    pub fn arb_chain(len: impl Into<prop::collection::SizeRange>) -> impl Strategy<Value = Vec<Event>> {
        prop::collection::vec((arb_kind(), arb_data()), len).prop_map(|bodies| {
            let mut previous = EventId::SENTINEL;
            bodies
                .into_iter()
                .map(|(kind, data)| {
                    let event = Event::with_digest_id(previous, kind, data);
                    previous = event.id;
                    event
                })
                .collect()
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built chains for common scenarios.

    use super::*;

    /// Chain of `n` events, oldest first, named `event.0`, `event.1`, ...
    pub fn build_chain(n: usize) -> Vec<Event> {
        let mut previous = EventId::SENTINEL;
        (0..n)
            .map(|i| {
                let event =
                    Event::with_digest_id(previous, format!("event.{}", i), i.to_be_bytes().to_vec());
                previous = event.id;
                event
            })
            .collect()
    }

    /// Head of a chain, or the sentinel when empty.
    pub fn head_of(chain: &[Event]) -> EventId {
        chain.last().map(|e| e.id).unwrap_or(EventId::SENTINEL)
    }

    /// Identifier that does not occur in any fixture chain.
    pub fn unknown_id() -> EventId {
        EventId::from_bytes([0xfe; EVENT_ID_LEN])
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertions for chainread results.

    use super::*;

    /// Assert that `events` form a contiguous chain, oldest first, whose
    /// first event links to `stop_at`.
    pub fn assert_chronological(events: &[Event], stop_at: EventId) {
        let mut expected_previous = stop_at;
        for (i, event) in events.iter().enumerate() {
            assert_eq!(
                event.previous, expected_previous,
                "event {} ({}) does not link to its predecessor",
                i, event.id
            );
            expected_previous = event.id;
        }
    }

    pub fn assert_not_found<T: std::fmt::Debug>(result: &ChainResult<T>) {
        match result {
            Err(e) if e.is_not_found() => {}
            other => panic!("Expected NotFound, got: {:?}", other),
        }
    }

    pub fn assert_transport_error<T: std::fmt::Debug>(result: &ChainResult<T>) {
        assert!(
            matches!(result, Err(ChainError::Transport(_))),
            "Expected transport error, got: {:?}",
            result
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::generators::*;
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_build_chain_links() {
        let chain = build_chain(4);
        assert_eq!(chain.len(), 4);
        assert!(chain[0].is_first());
        assertions::assert_chronological(&chain, EventId::SENTINEL);
        assert_eq!(head_of(&chain), chain[3].id);
        assert_eq!(head_of(&[]), EventId::SENTINEL);
    }

    #[tokio::test]
    async fn test_unavailable_remote_misses() {
        let chain = build_chain(1);
        let remote = InMemoryRemoteCache::with_events(&chain);
        assert!(remote.get(&chain[0].id).await.is_some());

        remote.set_unavailable(true);
        assert!(remote.get(&chain[0].id).await.is_none());
        assert!(remote.ping().await.is_err());
        assert_eq!(remote.get_count(), 2);
    }

    #[tokio::test]
    async fn test_origin_failure_injection() {
        let chain = build_chain(2);
        let origin = InMemoryOrigin::with_events(&chain);
        origin.fail_on(chain[1].id);

        assert!(origin.fetch(&chain[0].id).await.is_ok());
        assertions::assert_transport_error(&origin.fetch(&chain[1].id).await);
        assertions::assert_not_found(&origin.fetch(&unknown_id()).await);
        assert_eq!(origin.total_fetches(), 3);
    }

    proptest! {
        #[test]
        fn prop_arb_chain_is_linked(chain in arb_chain(0..20usize)) {
            assertions::assert_chronological(&chain, EventId::SENTINEL);
            prop_assert!(chain.iter().all(|e| e.has_digest_id()));
        }

        #[test]
        fn prop_arb_event_id_not_sentinel(id in arb_event_id()) {
            prop_assert!(!id.is_sentinel());
        }
    }
}
