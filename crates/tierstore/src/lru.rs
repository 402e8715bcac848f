//! LRU map backing the memory store
//!
//! Slots live in a `Vec` and link to each other by index, so recency updates
//! and eviction are O(1) without per-node allocation. Freed slots are reused.

use std::collections::HashMap;
use std::hash::Hash;
use ahash::RandomState;

const NIL: usize = usize::MAX;

struct Slot<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// Bounded map that evicts the least recently used key
pub struct LruMap<K, V> {
    index: HashMap<K, usize, RandomState>,
    slots: Vec<Option<Slot<K, V>>>,
    vacant: Vec<usize>,
    // most recently used
    head: usize,
    // least recently used
    tail: usize,
    capacity: usize,
}

impl<K, V> LruMap<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a map holding at most `capacity` keys
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");

        Self {
            index: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            slots: Vec::with_capacity(capacity),
            vacant: Vec::new(),
            head: NIL,
            tail: NIL,
            capacity,
        }
    }

    /// Look up `key` and mark it most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.detach(idx);
        self.attach_front(idx);
        self.slots[idx].as_ref().map(|slot| &slot.value)
    }

    /// Look up `key` without touching recency
    pub fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.slots[idx].as_ref().map(|slot| &slot.value)
    }

    /// Insert or replace `key`, returning the evicted pair if the map was full
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.index.get(&key) {
            if let Some(slot) = self.slots[idx].as_mut() {
                slot.value = value;
            }
            self.detach(idx);
            self.attach_front(idx);
            return None;
        }

        let evicted = if self.index.len() >= self.capacity {
            self.pop_lru()
        } else {
            None
        };

        let slot = Slot {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        };
        let idx = match self.vacant.pop() {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                idx
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };
        self.attach_front(idx);
        self.index.insert(key, idx);

        evicted
    }

    /// Remove `key`, returning its value
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.index.remove(key)?;
        self.release(idx).map(|(_, value)| value)
    }

    /// Keep only the pairs for which `keep` returns true, returning how many were dropped
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&K, &V) -> bool,
    {
        let doomed: Vec<K> = self
            .slots
            .iter()
            .flatten()
            .filter(|slot| !keep(&slot.key, &slot.value))
            .map(|slot| slot.key.clone())
            .collect();

        for key in &doomed {
            self.remove(key);
        }
        doomed.len()
    }

    /// Number of keys held
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the map holds no keys
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Maximum number of keys held
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every key
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.vacant.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    fn pop_lru(&mut self) -> Option<(K, V)> {
        if self.tail == NIL {
            return None;
        }
        let idx = self.tail;
        let (key, value) = self.release(idx)?;
        self.index.remove(&key);
        Some((key, value))
    }

    fn release(&mut self, idx: usize) -> Option<(K, V)> {
        self.detach(idx);
        let slot = self.slots[idx].take()?;
        self.vacant.push(idx);
        Some((slot.key, slot.value))
    }

    fn attach_front(&mut self, idx: usize) {
        if let Some(slot) = self.slots[idx].as_mut() {
            slot.prev = NIL;
            slot.next = self.head;
        }
        if self.head != NIL {
            if let Some(old_head) = self.slots[self.head].as_mut() {
                old_head.prev = idx;
            }
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = match self.slots[idx].as_ref() {
            Some(slot) => (slot.prev, slot.next),
            None => return,
        };

        if prev == NIL {
            if self.head == idx {
                self.head = next;
            }
        } else if let Some(slot) = self.slots[prev].as_mut() {
            slot.next = next;
        }

        if next == NIL {
            if self.tail == idx {
                self.tail = prev;
            }
        } else if let Some(slot) = self.slots[next].as_mut() {
            slot.prev = prev;
        }

        if let Some(slot) = self.slots[idx].as_mut() {
            slot.prev = NIL;
            slot.next = NIL;
        }
    }
}
