//! Time-windowed multimap: per-key, per-subkey values that expire.
//!
//! The shape behind any fanout-style detector: `insert` records the latest
//! value for a `(key, subkey)` pair, `purge_key` lazily drops entries older
//! than the window, and `live_count` answers "how many distinct subkeys does
//! this key have right now". Every operation takes an explicit `now` so
//! callers own the clock and tests can drive time directly.

use std::{
    collections::HashMap,
    hash::Hash,
};

use chrono::{DateTime, Duration, Utc};

struct Entry<V> {
    value: V,
    at: DateTime<Utc>,
}

/// Expiring two-level map. A key's row disappears entirely once its last
/// entry expires or is removed; there are no empty rows.
pub struct WindowedMultimap<K, S, V> {
    window: Duration,
    rows: HashMap<K, HashMap<S, Entry<V>>>,
}

impl<K, S, V> WindowedMultimap<K, S, V>
where
    K: Eq + Hash,
    S: Eq + Hash,
{
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            rows: HashMap::new(),
        }
    }

    /// Store `value` for `(key, subkey)`, overwriting any previous entry for
    /// that pair. The entry is timestamped `at`, not "now": expiry compares
    /// against the value's own timestamp.
    pub fn insert(&mut self, key: K, subkey: S, value: V, at: DateTime<Utc>) {
        self.rows
            .entry(key)
            .or_default()
            .insert(subkey, Entry { value, at });
    }

    /// Drop every entry under `key` older than the window, measured from
    /// `now`. Removes the row entirely when it becomes empty.
    pub fn purge_key(&mut self, key: &K, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        let emptied = match self.rows.get_mut(key) {
            Some(row) => {
                row.retain(|_, entry| entry.at >= cutoff);
                row.is_empty()
            },
            None => false,
        };
        if emptied {
            self.rows.remove(key);
        }
    }

    /// Purge every key.
    pub fn purge(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        self.rows.retain(|_, row| {
            row.retain(|_, entry| entry.at >= cutoff);
            !row.is_empty()
        });
    }

    /// Number of distinct subkeys with a live entry under `key`, after
    /// purging that key. Zero for unknown keys.
    pub fn live_count(&mut self, key: &K, now: DateTime<Utc>) -> usize {
        self.purge_key(key, now);
        self.rows.get(key).map_or(0, HashMap::len)
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.rows.contains_key(key)
    }

    /// Clone out the current values under `key`, in no particular order.
    pub fn snapshot(&self, key: &K) -> Vec<V>
    where
        V: Clone,
    {
        self.rows.get(key).map_or_else(Vec::new, |row| {
            row.values().map(|entry| entry.value.clone()).collect()
        })
    }

    /// Remove the whole row for `key`. Returns whether anything was removed.
    pub fn remove(&mut self, key: &K) -> bool {
        self.rows.remove(key).is_some()
    }

    /// Number of tracked keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
