//! # Bounded LRU Cache With Idle Expiry
//!
//! Both the voxel cache and the mesh cache use this container. It combines two
//! independent eviction rules:
//!
//! - **Capacity**: inserting into a full cache evicts the least recently used entry.
//! - **Idle time**: an entry untouched for longer than the TTL expires on the next
//!   call to [`LruTtlCache::purge_expired`].
//!
//! ## Layout
//!
//! Entries live in a dense slab (`Vec<Node>`) and are threaded onto an intrusive
//! doubly-linked recency list through slab indices. The head is the most recently
//! used entry and the tail the least recently used one. Removal swaps the last
//! slab node into the hole and patches the links that pointed at it, so the slab
//! never has vacant slots.
//!
//! Every access moves a node to the head and stamps it with the access time, which
//! keeps the list ordered by last access as well. Expiry therefore only ever has to
//! look at the tail.
//!
//! Evicted and expired entries are handed back to the caller instead of being
//! dropped here. The owner decides how to release whatever resources they hold.
//!
//! | Operation        | Cost               |
//! |------------------|--------------------|
//! | `get` / `insert` | O(1) amortized     |
//! | `purge_expired`  | O(number expired)  |

use std::{collections::HashMap, hash::Hash};

use web_time::{Duration, Instant};

const NIL: usize = usize::MAX;

struct Node<K, V> {
    key: K,
    value: V,
    last_access: Instant,
    prev: usize,
    next: usize,
}

/// A capacity-bounded cache with least-recently-used eviction and idle-time expiry.
pub struct LruTtlCache<K, V> {
    map: HashMap<K, usize>,
    nodes: Vec<Node<K, V>>,
    head: usize,
    tail: usize,
    capacity: usize,
    ttl: Duration,
}

impl<K: Eq + Hash + Clone, V> LruTtlCache<K, V> {
    /// Creates an empty cache.
    ///
    /// A capacity of zero is treated as one so that the most recent insert is
    /// always retained.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            map: HashMap::with_capacity(capacity),
            nodes: Vec::with_capacity(capacity),
            head: NIL,
            tail: NIL,
            capacity,
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Looks up an entry and marks it as most recently used.
    pub fn get(&mut self, key: &K, now: Instant) -> Option<&mut V> {
        let index = *self.map.get(key)?;
        self.touch(index, now);
        Some(&mut self.nodes[index].value)
    }

    /// Looks up an entry without changing its recency or access time.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let index = *self.map.get(key)?;
        Some(&self.nodes[index].value)
    }

    /// Mutable lookup that leaves recency untouched.
    pub fn peek_mut(&mut self, key: &K) -> Option<&mut V> {
        let index = *self.map.get(key)?;
        Some(&mut self.nodes[index].value)
    }

    /// Returns the entry for `key`, creating it with `make` on a miss.
    ///
    /// The entry becomes the most recently used one either way. The second element
    /// holds whatever had to be evicted to make room.
    pub fn get_or_insert_with(
        &mut self,
        key: K,
        now: Instant,
        make: impl FnOnce() -> V,
    ) -> (&mut V, Vec<(K, V)>) {
        if let Some(&index) = self.map.get(&key) {
            self.touch(index, now);
            return (&mut self.nodes[index].value, Vec::new());
        }

        let evicted = self.make_room();
        let index = self.push_node(key, make(), now);
        (&mut self.nodes[index].value, evicted)
    }

    /// Inserts or replaces an entry, making it the most recently used one.
    ///
    /// Returns every entry that left the cache because of this call: the value
    /// previously stored under `key` (if any) and the least recently used entry
    /// when the cache was already full.
    pub fn insert(&mut self, key: K, value: V, now: Instant) -> Vec<(K, V)> {
        if let Some(&index) = self.map.get(&key) {
            self.touch(index, now);
            let previous = std::mem::replace(&mut self.nodes[index].value, value);
            return vec![(key, previous)];
        }

        let evicted = self.make_room();
        self.push_node(key, value, now);
        evicted
    }

    /// Removes an entry regardless of its recency.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let index = *self.map.get(key)?;
        let node = self.remove_at(index);
        Some(node.value)
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        if self.tail == NIL {
            return None;
        }
        let node = self.remove_at(self.tail);
        Some((node.key, node.value))
    }

    /// Removes every entry whose last access is older than the TTL.
    pub fn purge_expired(&mut self, now: Instant) -> Vec<(K, V)> {
        let mut expired = Vec::new();
        while self.tail != NIL
            && now.saturating_duration_since(self.nodes[self.tail].last_access) > self.ttl
        {
            let node = self.remove_at(self.tail);
            expired.push((node.key, node.value));
        }
        expired
    }

    /// Empties the cache, returning the entries from most to least recently used.
    pub fn drain(&mut self) -> Vec<(K, V)> {
        let mut drained = Vec::with_capacity(self.nodes.len());
        while self.head != NIL {
            let node = self.remove_at(self.head);
            drained.push((node.key, node.value));
        }
        drained
    }

    /// Keys ordered from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.nodes.len());
        let mut cursor = self.head;
        while cursor != NIL {
            let node = &self.nodes[cursor];
            keys.push(node.key.clone());
            cursor = node.next;
        }
        keys
    }

    /// Iterates over values in slab order, without touching recency.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.nodes.iter().map(|node| &node.value)
    }

    fn make_room(&mut self) -> Vec<(K, V)> {
        let mut evicted = Vec::new();
        while self.nodes.len() >= self.capacity {
            match self.pop_lru() {
                Some(entry) => evicted.push(entry),
                None => break,
            }
        }
        evicted
    }

    fn push_node(&mut self, key: K, value: V, now: Instant) -> usize {
        self.nodes.push(Node {
            key: key.clone(),
            value,
            last_access: now,
            prev: NIL,
            next: NIL,
        });
        let index = self.nodes.len() - 1;
        self.link_front(index);
        self.map.insert(key, index);
        index
    }

    fn touch(&mut self, index: usize, now: Instant) {
        self.nodes[index].last_access = now;
        if self.head != index {
            self.unlink(index);
            self.link_front(index);
        }
    }

    fn link_front(&mut self, index: usize) {
        let old_head = self.head;
        self.nodes[index].prev = NIL;
        self.nodes[index].next = old_head;
        if old_head != NIL {
            self.nodes[old_head].prev = index;
        }
        self.head = index;
        if self.tail == NIL {
            self.tail = index;
        }
    }

    fn unlink(&mut self, index: usize) {
        let (prev, next) = (self.nodes[index].prev, self.nodes[index].next);

        if prev != NIL {
            self.nodes[prev].next = next;
        } else {
            self.head = next;
        }

        if next != NIL {
            self.nodes[next].prev = prev;
        } else {
            self.tail = prev;
        }

        self.nodes[index].prev = NIL;
        self.nodes[index].next = NIL;
    }

    /// Unlinks the node at `index` and swap-removes it from the slab.
    fn remove_at(&mut self, index: usize) -> Node<K, V> {
        self.unlink(index);
        let last = self.nodes.len() - 1;
        let node = self.nodes.swap_remove(index);
        self.map.remove(&node.key);

        if index != last {
            // The former last node now lives at `index`; repoint everything at it.
            let (prev, next) = (self.nodes[index].prev, self.nodes[index].next);
            if prev != NIL {
                self.nodes[prev].next = index;
            } else {
                self.head = index;
            }
            if next != NIL {
                self.nodes[next].prev = index;
            } else {
                self.tail = index;
            }
            let moved_key = self.nodes[index].key.clone();
            self.map.insert(moved_key, index);
        }

        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> LruTtlCache<&'static str, u32> {
        LruTtlCache::new(capacity, Duration::from_secs(60))
    }

    #[test]
    fn evicts_least_recently_used_when_full() {
        let now = Instant::now();
        let mut cache = cache(2);
        assert!(cache.insert("a", 1, now).is_empty());
        assert!(cache.insert("b", 2, now).is_empty());

        let evicted = cache.insert("c", 3, now);
        assert_eq!(evicted, vec![("a", 1)]);
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&"a"));
    }

    #[test]
    fn get_refreshes_recency() {
        let now = Instant::now();
        let mut cache = cache(2);
        cache.insert("a", 1, now);
        cache.insert("b", 2, now);

        assert_eq!(cache.get(&"a", now).copied(), Some(1));
        let evicted = cache.insert("c", 3, now);

        assert_eq!(evicted, vec![("b", 2)]);
        assert_eq!(cache.keys(), vec!["c", "a"]);
    }

    #[test]
    fn peek_does_not_refresh_recency() {
        let now = Instant::now();
        let mut cache = cache(2);
        cache.insert("a", 1, now);
        cache.insert("b", 2, now);

        assert_eq!(cache.peek(&"a"), Some(&1));
        let evicted = cache.insert("c", 3, now);

        assert_eq!(evicted, vec![("a", 1)]);
    }

    #[test]
    fn replacing_a_key_returns_the_previous_value() {
        let now = Instant::now();
        let mut cache = cache(2);
        cache.insert("a", 1, now);

        let replaced = cache.insert("a", 10, now);

        assert_eq!(replaced, vec![("a", 1)]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.peek(&"a"), Some(&10));
    }

    #[test]
    fn get_or_insert_with_only_builds_on_miss() {
        let now = Instant::now();
        let mut cache = cache(1);
        let mut builds = 0;

        {
            let (value, evicted) = cache.get_or_insert_with("a", now, || {
                builds += 1;
                1
            });
            assert_eq!(*value, 1);
            assert!(evicted.is_empty());
        }
        {
            let (value, _) = cache.get_or_insert_with("a", now, || {
                builds += 1;
                2
            });
            *value += 10;
        }
        let (_, evicted) = cache.get_or_insert_with("b", now, || 5);

        assert_eq!(builds, 1);
        assert_eq!(evicted, vec![("a", 11)]);
    }

    #[test]
    fn idle_entries_expire_independently_of_capacity() {
        let start = Instant::now();
        let mut cache = LruTtlCache::new(8, Duration::from_secs(10));
        cache.insert("old", 1, start);
        cache.insert("fresh", 2, start + Duration::from_secs(8));

        let expired = cache.purge_expired(start + Duration::from_secs(15));

        assert_eq!(expired, vec![("old", 1)]);
        assert_eq!(cache.keys(), vec!["fresh"]);
    }

    #[test]
    fn access_postpones_expiry() {
        let start = Instant::now();
        let mut cache = LruTtlCache::new(8, Duration::from_secs(10));
        cache.insert("a", 1, start);
        cache.get(&"a", start + Duration::from_secs(9));

        assert!(cache.purge_expired(start + Duration::from_secs(15)).is_empty());
        assert_eq!(cache.purge_expired(start + Duration::from_secs(20)).len(), 1);
    }

    #[test]
    fn removal_from_the_middle_keeps_links_consistent() {
        let now = Instant::now();
        let mut cache = cache(4);
        cache.insert("a", 1, now);
        cache.insert("b", 2, now);
        cache.insert("c", 3, now);
        cache.insert("d", 4, now);

        assert_eq!(cache.remove(&"b"), Some(2));
        assert_eq!(cache.keys(), vec!["d", "c", "a"]);

        cache.get(&"a", now);
        cache.insert("e", 5, now);
        assert_eq!(cache.keys(), vec!["e", "a", "d", "c"]);
        assert_eq!(cache.pop_lru(), Some(("c", 3)));
        assert_eq!(cache.peek(&"d"), Some(&4));
        assert_eq!(cache.keys(), vec!["e", "a", "d"]);
    }

    #[test]
    fn drain_empties_in_recency_order() {
        let now = Instant::now();
        let mut cache = cache(4);
        cache.insert("a", 1, now);
        cache.insert("b", 2, now);

        assert_eq!(cache.drain(), vec![("b", 2), ("a", 1)]);
        assert!(cache.is_empty());
        assert!(cache.insert("c", 3, now).is_empty());
        assert_eq!(cache.keys(), vec!["c"]);
    }

    #[test]
    fn never_exceeds_capacity() {
        let now = Instant::now();
        let mut cache: LruTtlCache<u32, u32> = LruTtlCache::new(16, Duration::from_secs(60));
        for i in 0..200 {
            cache.insert(i, i, now);
            if i % 3 == 0 {
                cache.get(&(i / 2), now);
            }
            assert!(cache.len() <= 16);
        }
        let keys = cache.keys();
        assert_eq!(keys.len(), 16);
        assert_eq!(keys.first(), Some(&199));
        for key in keys {
            assert_eq!(cache.peek(&key), Some(&key));
        }
    }
}
