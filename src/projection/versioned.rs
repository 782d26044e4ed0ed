// Copyright (c) 2025 - Cowboy AI, Inc.
//! Versioned Map
//!
//! Multi-version map backing the connectivity graph. Every key keeps a short
//! history of `(version, value)` entries, where `None` marks removal, so a
//! reader holding version `v` sees the state as of `v` regardless of later
//! writes.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct VersionedMap<K, V> {
    entries: HashMap<K, Vec<(u64, Option<V>)>>,
}

impl<K, V> Default for VersionedMap<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K, V> VersionedMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Write a value at `version`; a second write in the same version replaces
    /// the first
    pub fn insert(&mut self, key: K, value: V, version: u64) {
        self.write(key, Some(value), version);
    }

    pub fn remove(&mut self, key: &K, version: u64) {
        if self.latest(key).is_some() {
            self.write(key.clone(), None, version);
        }
    }

    fn write(&mut self, key: K, value: Option<V>, version: u64) {
        let history = self.entries.entry(key).or_default();
        match history.last_mut() {
            Some((last_version, last_value)) if *last_version == version => *last_value = value,
            _ => history.push((version, value)),
        }
    }

    /// Value visible at `version`
    pub fn get(&self, key: &K, version: u64) -> Option<&V> {
        self.entries.get(key).and_then(|history| {
            history
                .iter()
                .rev()
                .find(|(v, _)| *v <= version)
                .and_then(|(_, value)| value.as_ref())
        })
    }

    pub fn latest(&self, key: &K) -> Option<&V> {
        self.entries
            .get(key)
            .and_then(|history| history.last())
            .and_then(|(_, value)| value.as_ref())
    }

    /// Drop history no reader at or after `oldest_version` can observe
    pub fn prune(&mut self, oldest_version: u64) {
        self.entries.retain(|_, history| {
            let visible = history
                .iter()
                .rposition(|(v, _)| *v <= oldest_version)
                .unwrap_or(0);
            history.drain(..visible);
            !(history.len() == 1 && history[0].1.is_none() && history[0].0 <= oldest_version)
        });
    }

    #[cfg(test)]
    fn history_len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_are_version_isolated() {
        let mut map = VersionedMap::default();
        map.insert("a", 1, 1);
        map.insert("a", 2, 3);
        map.remove(&"a", 5);

        assert_eq!(map.get(&"a", 0), None);
        assert_eq!(map.get(&"a", 1), Some(&1));
        assert_eq!(map.get(&"a", 2), Some(&1));
        assert_eq!(map.get(&"a", 4), Some(&2));
        assert_eq!(map.get(&"a", 5), None);
        assert_eq!(map.latest(&"a"), None);
    }

    #[test]
    fn test_same_version_write_replaces() {
        let mut map = VersionedMap::default();
        map.insert(1u8, "x", 2);
        map.remove(&1u8, 2);
        map.insert(1u8, "y", 2);

        assert_eq!(map.get(&1u8, 2), Some(&"y"));
        assert_eq!(map.history_len(), 1);
    }

    #[test]
    fn test_prune_keeps_visible_state() {
        let mut map = VersionedMap::default();
        map.insert("kept", 1, 1);
        map.insert("kept", 2, 4);
        map.insert("gone", 9, 1);
        map.remove(&"gone", 2);

        map.prune(3);

        assert_eq!(map.get(&"kept", 3), Some(&1));
        assert_eq!(map.get(&"kept", 4), Some(&2));
        assert_eq!(map.get(&"gone", 3), None);
        assert_eq!(map.history_len(), 2);
        assert_eq!(map.latest(&"gone"), None);
    }
}
