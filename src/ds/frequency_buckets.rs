//! Frequency-bucketed key index with an O(1) minimum-frequency hint.
//!
//! Keys are grouped into doubly-linked buckets by access count. Each
//! bucket keeps its members ordered by touch time (head = most recently
//! touched, tail = oldest), so a victim can be taken from either end of
//! the minimum bucket:
//!
//! ```text
//!   buckets: freq ─► Bucket { head, tail }
//!
//!   freq 1:  head ─► [k9] ◄──► [k4] ◄── tail     ◄─ min_freq hint
//!   freq 2:  head ─► [k1] ◄── tail
//!   freq 5:  head ─► [k7] ◄──► [k2] ◄──► [k3] ◄── tail
//! ```
//!
//! An LFU policy evicts the *oldest* member of the minimum bucket
//! ([`pop_min_oldest`](FrequencyBuckets::pop_min_oldest)); the CACHEUS
//! frequency expert instead targets the *most recently touched* member
//! ([`peek_min_recent`](FrequencyBuckets::peek_min_recent)).
//!
//! All operations are O(1) except removals that empty the minimum
//! bucket, which rescan the set of occupied frequencies.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::slot_arena::{SlotArena, SlotId};

#[derive(Debug)]
struct Entry<K> {
    prev: Option<SlotId>,
    next: Option<SlotId>,
    freq: u64,
    key: K,
}

#[derive(Debug, Default, Clone, Copy)]
struct Bucket {
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

/// Frequency index over a set of keys.
#[derive(Debug)]
pub struct FrequencyBuckets<K> {
    entries: SlotArena<Entry<K>>,
    index: FxHashMap<K, SlotId>,
    buckets: FxHashMap<u64, Bucket>,
    min_freq: u64,
}

impl<K> FrequencyBuckets<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty index.
    pub fn new() -> Self {
        Self {
            entries: SlotArena::new(),
            index: FxHashMap::default(),
            buckets: FxHashMap::default(),
            min_freq: 0,
        }
    }

    /// Creates an empty index with reserved entry capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: SlotArena::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            buckets: FxHashMap::default(),
            min_freq: 0,
        }
    }

    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no key is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the access count for `key`, if present.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        self.entries.get(id).map(|entry| entry.freq)
    }

    /// Returns the lowest occupied frequency, if any key is tracked.
    pub fn min_freq(&self) -> Option<u64> {
        if self.is_empty() { None } else { Some(self.min_freq) }
    }

    /// Starts tracking an absent `key` at frequency 1.
    ///
    /// The key becomes the most recently touched member of bucket 1.
    pub fn insert(&mut self, key: K) {
        debug_assert!(!self.contains(&key), "insert of tracked key");
        let id = self.entries.insert(Entry {
            prev: None,
            next: None,
            freq: 1,
            key: key.clone(),
        });
        self.index.insert(key, id);
        self.link_head(id, 1);
        self.min_freq = 1;
    }

    /// Bumps `key` into the next bucket; returns the new frequency.
    pub fn touch(&mut self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        let old_freq = self.entries.get(id)?.freq;
        let new_freq = old_freq + 1;

        let emptied = self.unlink(id, old_freq);
        if emptied && self.min_freq == old_freq {
            // The key itself moves to old_freq + 1; every other bucket
            // is strictly above old_freq, so the new minimum is exact.
            self.min_freq = new_freq;
        }

        if let Some(entry) = self.entries.get_mut(id) {
            entry.freq = new_freq;
        }
        self.link_head(id, new_freq);
        Some(new_freq)
    }

    /// Stops tracking `key`; returns its final frequency.
    pub fn remove(&mut self, key: &K) -> Option<u64> {
        let id = self.index.remove(key)?;
        let freq = self.entries.get(id)?.freq;
        let emptied = self.unlink(id, freq);
        self.entries.remove(id);
        if emptied && self.min_freq == freq {
            self.rescan_min_freq();
        }
        Some(freq)
    }

    /// Removes and returns the oldest member of the minimum bucket.
    pub fn pop_min_oldest(&mut self) -> Option<(K, u64)> {
        let bucket = *self.buckets.get(&self.min_freq)?;
        let id = bucket.tail?;
        let (key, freq) = {
            let entry = self.entries.get(id)?;
            (entry.key.clone(), entry.freq)
        };
        let emptied = self.unlink(id, freq);
        self.entries.remove(id);
        self.index.remove(&key);
        if emptied {
            self.rescan_min_freq();
        }
        Some((key, freq))
    }

    /// Returns the most recently touched member of the minimum bucket.
    pub fn peek_min_recent(&self) -> Option<&K> {
        let bucket = self.buckets.get(&self.min_freq)?;
        let id = bucket.head?;
        self.entries.get(id).map(|entry| &entry.key)
    }

    /// Drops every tracked key.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.buckets.clear();
        self.min_freq = 0;
    }

    fn link_head(&mut self, id: SlotId, freq: u64) {
        let bucket = self.buckets.entry(freq).or_default();
        let old_head = bucket.head;
        bucket.head = Some(id);
        if bucket.tail.is_none() {
            bucket.tail = Some(id);
        }
        if let Some(entry) = self.entries.get_mut(id) {
            entry.prev = None;
            entry.next = old_head;
        }
        if let Some(old_head) = old_head
            && let Some(entry) = self.entries.get_mut(old_head)
        {
            entry.prev = Some(id);
        }
    }

    /// Unlinks `id` from its bucket; returns `true` if the bucket emptied.
    fn unlink(&mut self, id: SlotId, freq: u64) -> bool {
        let (prev, next) = match self.entries.get(id) {
            Some(entry) => (entry.prev, entry.next),
            None => return false,
        };

        match prev {
            Some(prev_id) => {
                if let Some(entry) = self.entries.get_mut(prev_id) {
                    entry.next = next;
                }
            },
            None => {
                if let Some(bucket) = self.buckets.get_mut(&freq) {
                    bucket.head = next;
                }
            },
        }

        match next {
            Some(next_id) => {
                if let Some(entry) = self.entries.get_mut(next_id) {
                    entry.prev = prev;
                }
            },
            None => {
                if let Some(bucket) = self.buckets.get_mut(&freq) {
                    bucket.tail = prev;
                }
            },
        }

        if let Some(entry) = self.entries.get_mut(id) {
            entry.prev = None;
            entry.next = None;
        }

        let emptied = self
            .buckets
            .get(&freq)
            .is_some_and(|bucket| bucket.head.is_none());
        if emptied {
            self.buckets.remove(&freq);
        }
        emptied
    }

    fn rescan_min_freq(&mut self) {
        self.min_freq = self.buckets.keys().min().copied().unwrap_or(0);
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.index.len(), self.entries.len());

        let mut counted = 0usize;
        for (&freq, bucket) in &self.buckets {
            let mut current = bucket.head;
            let mut prev = None;
            while let Some(id) = current {
                let entry = self.entries.get(id).expect("bucket node missing");
                assert_eq!(entry.freq, freq);
                assert_eq!(entry.prev, prev);
                prev = Some(id);
                current = entry.next;
                counted += 1;
                assert!(counted <= self.entries.len());
            }
            assert_eq!(bucket.tail, prev, "bucket tail out of sync");
        }
        assert_eq!(counted, self.entries.len());

        if let Some(actual_min) = self.buckets.keys().min() {
            assert_eq!(self.min_freq, *actual_min);
        }
    }
}

impl<K> Default for FrequencyBuckets<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
