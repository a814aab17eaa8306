//! Bounded in-process event cache with least-recently-used eviction.
//!
//! Entries live in a slot arena threaded by a doubly-linked recency list.
//! The lookup table maps an identifier to its slot, so promotion on `get`
//! and eviction on `put` are both O(1). All state sits behind a single
//! mutex; a `get` or `put` is one critical section.

use std::collections::HashMap;

use chainread_core::{ChainResult, ConfigError, Event, EventId};
use parking_lot::Mutex;

use super::traits::CacheStats;

const NIL: usize = usize::MAX;

struct Node {
    event: Event,
    /// Towards the most-recently-used end.
    prev: usize,
    /// Towards the least-recently-used end.
    next: usize,
}

struct LruState {
    index: HashMap<EventId, usize>,
    slots: Vec<Node>,
    free: Vec<usize>,
    /// Most recently used.
    head: usize,
    /// Least recently used.
    tail: usize,
    stats: CacheStats,
}

impl LruState {
    fn with_capacity(capacity: usize) -> Self {
        // The arena grows lazily; capacity only bounds it.
        let reserve = capacity.min(1024);
        Self {
            index: HashMap::with_capacity(reserve),
            slots: Vec::with_capacity(reserve),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            stats: CacheStats::default(),
        }
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = {
            let node = &self.slots[slot];
            (node.prev, node.next)
        };
        if prev == NIL {
            self.head = next;
        } else {
            self.slots[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.slots[next].prev = prev;
        }
        let node = &mut self.slots[slot];
        node.prev = NIL;
        node.next = NIL;
    }

    fn push_front(&mut self, slot: usize) {
        let old_head = self.head;
        {
            let node = &mut self.slots[slot];
            node.prev = NIL;
            node.next = old_head;
        }
        if old_head == NIL {
            self.tail = slot;
        } else {
            self.slots[old_head].prev = slot;
        }
        self.head = slot;
    }

    fn promote(&mut self, slot: usize) {
        if self.head != slot {
            self.unlink(slot);
            self.push_front(slot);
        }
    }

    fn evict_lru(&mut self) -> Option<EventId> {
        let slot = self.tail;
        if slot == NIL {
            return None;
        }
        self.unlink(slot);
        let id = self.slots[slot].event.id;
        self.index.remove(&id);
        self.free.push(slot);
        self.stats.evictions += 1;
        Some(id)
    }

    fn insert_front(&mut self, event: Event) {
        let id = event.id;
        let node = Node {
            event,
            prev: NIL,
            next: NIL,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = node;
                slot
            }
            None => {
                self.slots.push(node);
                self.slots.len() - 1
            }
        };
        self.push_front(slot);
        self.index.insert(id, slot);
        self.stats.inserts += 1;
    }
}

/// Capacity-limited, recency-ordered event cache.
///
/// `put` is an idempotent insert: an identifier that is already resident is
/// left untouched, including its recency. Only `get` promotes.
pub struct LocalEventCache {
    capacity: usize,
    state: Mutex<LruState>,
}

impl LocalEventCache {
    /// Create a cache holding at most `capacity` events.
    pub fn new(capacity: usize) -> ChainResult<Self> {
        if capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "local_capacity".to_string(),
                value: capacity.to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        Ok(Self {
            capacity,
            state: Mutex::new(LruState::with_capacity(capacity)),
        })
    }

    /// Fetch an event and mark it most recently used.
    pub fn get(&self, id: &EventId) -> Option<Event> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        match state.index.get(id).copied() {
            Some(slot) => {
                state.promote(slot);
                state.stats.hits += 1;
                Some(state.slots[slot].event.clone())
            }
            None => {
                state.stats.misses += 1;
                None
            }
        }
    }

    /// Insert an event if its identifier is not resident.
    ///
    /// Returns `true` when the event was inserted. When the cache is full the
    /// least recently used entry is evicted to make room.
    pub fn put(&self, event: Event) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.index.contains_key(&event.id) {
            return false;
        }
        if state.index.len() >= self.capacity {
            state.evict_lru();
        }
        state.insert_front(event);
        true
    }

    /// Whether an identifier is resident. Does not touch recency.
    pub fn contains(&self, id: &EventId) -> bool {
        self.state.lock().index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.state.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            entry_count: state.index.len() as u64,
            ..state.stats.clone()
        }
    }

    /// Resident identifiers from most to least recently used.
    pub fn recency_order(&self) -> Vec<EventId> {
        let state = self.state.lock();
        let mut out = Vec::with_capacity(state.index.len());
        let mut cursor = state.head;
        while cursor != NIL {
            let node = &state.slots[cursor];
            out.push(node.event.id);
            cursor = node.next;
        }
        out
    }
}

impl std::fmt::Debug for LocalEventCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEventCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;
    use std::sync::Arc;

    fn event(n: u8) -> Event {
        Event::new(EventId::from_bytes([n; 32]), EventId::SENTINEL, "t", vec![n])
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = LocalEventCache::new(0).unwrap_err();
        assert!(matches!(err, chainread_core::ChainError::Config(_)));
    }

    #[test]
    fn test_get_miss_then_hit() {
        let cache = LocalEventCache::new(4).unwrap();
        assert!(cache.get(&event(1).id).is_none());
        cache.put(event(1));
        assert_eq!(cache.get(&event(1).id), Some(event(1)));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[test]
    fn test_put_is_idempotent() {
        let cache = LocalEventCache::new(4).unwrap();
        assert!(cache.put(event(1)));
        assert!(!cache.put(event(1)));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().inserts, 1);
    }

    #[test]
    fn test_put_existing_does_not_promote() {
        let cache = LocalEventCache::new(2).unwrap();
        cache.put(event(1));
        cache.put(event(2));
        // Re-putting the oldest entry leaves it oldest
        cache.put(event(1));
        cache.put(event(3));
        assert!(!cache.contains(&event(1).id));
        assert!(cache.contains(&event(2).id));
        assert!(cache.contains(&event(3).id));
    }

    #[test]
    fn test_overflow_evicts_first_inserted() {
        let capacity = 5;
        let cache = LocalEventCache::new(capacity).unwrap();
        for n in 0..=capacity as u8 {
            cache.put(event(n));
        }
        assert_eq!(cache.len(), capacity);
        assert!(!cache.contains(&event(0).id));
        for n in 1..=capacity as u8 {
            assert!(cache.contains(&event(n).id));
        }
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_get_protects_from_eviction() {
        let cache = LocalEventCache::new(3).unwrap();
        cache.put(event(0));
        cache.put(event(1));
        cache.put(event(2));
        assert!(cache.get(&event(0).id).is_some());
        cache.put(event(3));
        assert!(cache.contains(&event(0).id));
        assert!(!cache.contains(&event(1).id));
    }

    #[test]
    fn test_capacity_one() {
        let cache = LocalEventCache::new(1).unwrap();
        cache.put(event(1));
        cache.put(event(2));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&event(2).id));
        assert_eq!(cache.recency_order(), vec![event(2).id]);
    }

    #[test]
    fn test_recency_order_tracks_gets() {
        let cache = LocalEventCache::new(3).unwrap();
        cache.put(event(1));
        cache.put(event(2));
        cache.put(event(3));
        cache.get(&event(1).id);
        assert_eq!(
            cache.recency_order(),
            vec![event(1).id, event(3).id, event(2).id]
        );
    }

    #[test]
    fn test_concurrent_access_keeps_bound() {
        let cache = Arc::new(LocalEventCache::new(16).unwrap());
        let handles: Vec<_> = (0..4u8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for n in 0..200u8 {
                        let e = event(n.wrapping_mul(4).wrapping_add(t));
                        cache.put(e.clone());
                        cache.get(&e.id);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 16);
        assert_eq!(cache.recency_order().len(), cache.len());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Get(u8),
        Put(u8),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![(0u8..12).prop_map(Op::Get), (0u8..12).prop_map(Op::Put)]
    }

    proptest! {
        /// The arena-backed list behaves like a naive recency queue.
        #[test]
        fn prop_matches_reference_model(
            capacity in 1usize..6,
            ops in prop::collection::vec(arb_op(), 0..200),
        ) {
            let cache = LocalEventCache::new(capacity).unwrap();
            let mut model: VecDeque<u8> = VecDeque::new();

            for op in ops {
                match op {
                    Op::Get(n) => {
                        let hit = cache.get(&event(n).id);
                        let pos = model.iter().position(|m| *m == n);
                        prop_assert_eq!(hit.is_some(), pos.is_some());
                        if let Some(pos) = pos {
                            model.remove(pos);
                            model.push_front(n);
                        }
                    }
                    Op::Put(n) => {
                        let inserted = cache.put(event(n));
                        let present = model.contains(&n);
                        prop_assert_eq!(inserted, !present);
                        if !present {
                            if model.len() >= capacity {
                                model.pop_back();
                            }
                            model.push_front(n);
                        }
                    }
                }
                prop_assert!(cache.len() <= capacity);
            }

            let expected: Vec<EventId> = model.iter().map(|n| event(*n).id).collect();
            prop_assert_eq!(cache.recency_order(), expected);
        }
    }
}
