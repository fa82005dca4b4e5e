//! Bounded least-recently-used cache.
//!
//! Entries live in a slab and are threaded on a doubly linked list by index,
//! most recent at the head. Touch, insert and evict are all O(1).

use serde::Serialize;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

pub const DEFAULT_CACHE_LIMIT: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub len: usize,
}

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: usize,
    map: HashMap<K, usize>,
    slab: Vec<Entry<K, V>>,
    head: Option<usize>,
    tail: Option<usize>,
    stats: CacheStats,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            map: HashMap::with_capacity(capacity),
            slab: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            stats: CacheStats::default(),
        }
    }

    pub fn capacity(&self) -> usize { self.capacity }
    pub fn len(&self) -> usize { self.map.len() }
    pub fn is_empty(&self) -> bool { self.map.is_empty() }

    pub fn stats(&self) -> CacheStats {
        CacheStats { len: self.len(), ..self.stats }
    }

    /// Look up `key`, promoting it to most recently used on a hit.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.map.get(key).copied() {
            Some(idx) => {
                self.stats.hits += 1;
                self.detach(idx);
                self.push_front(idx);
                Some(&self.slab[idx].value)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Whether `key` is cached, without touching recency or stats.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Insert or replace `key`, making it most recently used. Returns the key
    /// evicted to make room, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<K> {
        if let Some(idx) = self.map.get(&key).copied() {
            self.slab[idx].value = value;
            self.detach(idx);
            self.push_front(idx);
            return None;
        }

        if self.map.len() >= self.capacity {
            // reuse the least recently used slot
            let idx = self.tail?;
            self.detach(idx);
            let old = std::mem::replace(&mut self.slab[idx], Entry { key: key.clone(), value, prev: None, next: None });
            self.map.remove(&old.key);
            self.map.insert(key, idx);
            self.push_front(idx);
            self.stats.evictions += 1;
            return Some(old.key);
        }

        let idx = self.slab.len();
        self.slab.push(Entry { key: key.clone(), value, prev: None, next: None });
        self.map.insert(key, idx);
        self.push_front(idx);
        None
    }

    /// Drop every entry. Hit/miss counters survive.
    pub fn clear(&mut self) {
        self.map.clear();
        self.slab.clear();
        self.head = None;
        self.tail = None;
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<&K> {
        let mut out = Vec::with_capacity(self.len());
        let mut cur = self.head;
        while let Some(idx) = cur {
            out.push(&self.slab[idx].key);
            cur = self.slab[idx].next;
        }
        out
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = (self.slab[idx].prev, self.slab[idx].next);
        match prev {
            Some(p) => self.slab[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slab[n].prev = prev,
            None => self.tail = prev,
        }
        self.slab[idx].prev = None;
        self.slab[idx].next = None;
    }

    fn push_front(&mut self, idx: usize) {
        self.slab[idx].next = self.head;
        self.slab[idx].prev = None;
        if let Some(h) = self.head {
            self.slab[h].prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let mut c = LruCache::new(2);
        assert_eq!(c.put("a", 1), None);
        assert_eq!(c.put("b", 2), None);
        assert_eq!(c.get("a"), Some(&1));
        assert_eq!(c.put("c", 3), Some("b"));
        assert!(c.contains("a"));
        assert!(!c.contains("b"));
        assert_eq!(c.keys(), vec![&"c", &"a"]);
    }

    #[test]
    fn first_key_evicted_after_capacity_plus_one_inserts() {
        let mut c = LruCache::new(DEFAULT_CACHE_LIMIT);
        for i in 0..=DEFAULT_CACHE_LIMIT {
            c.put(format!("q{i}"), i);
        }
        assert_eq!(c.len(), DEFAULT_CACHE_LIMIT);
        assert!(c.get("q0").is_none());
        assert_eq!(c.get("q1"), Some(&1));
        assert_eq!(c.stats().evictions, 1);
    }

    #[test]
    fn replace_promotes_without_growing() {
        let mut c = LruCache::new(2);
        c.put("a", 1);
        c.put("b", 2);
        assert_eq!(c.put("a", 10), None);
        assert_eq!(c.len(), 2);
        assert_eq!(c.put("c", 3), Some("b"));
        assert_eq!(c.get("a"), Some(&10));
    }

    #[test]
    fn counts_hits_and_misses() {
        let mut c = LruCache::new(4);
        c.put("a", 1);
        c.get("a");
        c.get("a");
        c.get("z");
        let s = c.stats();
        assert_eq!((s.hits, s.misses, s.len), (2, 1, 1));
    }

    #[test]
    fn clear_empties_and_allows_reuse() {
        let mut c = LruCache::new(1);
        c.put("a", 1);
        c.clear();
        assert!(c.is_empty());
        assert_eq!(c.put("b", 2), None);
        assert_eq!(c.keys(), vec![&"b"]);
    }

    #[test]
    fn capacity_one_keeps_latest() {
        let mut c = LruCache::new(1);
        c.put(1, "x");
        assert_eq!(c.put(2, "y"), Some(1));
        assert_eq!(c.get(&2), Some(&"y"));
    }
}
