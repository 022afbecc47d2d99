//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check byte accounting and recency order of the LRU store
//! against a simple list model.

use std::collections::HashMap;

use proptest::prelude::*;

use crate::cache::{ByteView, ConcurrentCache, LruStore};

// == Strategies ==
/// Generates keys from a small alphabet so sequences revisit keys often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-f]{1,3}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,24}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: String },
    Get { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
    ]
}

// == Model ==
/// Reference LRU: a plain list, most recently used first.
struct Model {
    capacity: usize,
    entries: Vec<(String, String)>,
}

impl Model {
    fn used(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    fn get(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        let entry = self.entries.remove(pos);
        let value = entry.1.clone();
        self.entries.insert(0, entry);
        Some(value)
    }

    fn put(&mut self, key: String, value: String) {
        if let Some(pos) = self.entries.iter().position(|(k, _)| *k == key) {
            self.entries.remove(pos);
        }
        self.entries.insert(0, (key, value));
        while self.capacity != 0 && self.used() > self.capacity {
            self.entries.pop();
        }
    }

    fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // For any sequence of puts and gets, used bytes equal the sum of live
    // entry sizes and never exceed a non-zero capacity.
    #[test]
    fn prop_byte_accounting(
        capacity in 0usize..64,
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let mut store: LruStore<String> = LruStore::new(capacity);
        let mut last_written: HashMap<String, usize> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    last_written.insert(key.clone(), value.len());
                    store.put(key, value);
                }
                CacheOp::Get { key } => { store.get(&key); }
            }

            let live: usize = store
                .keys()
                .into_iter()
                .map(|k| k.len() + last_written[k])
                .sum();
            prop_assert_eq!(store.used_bytes(), live);
            if capacity != 0 {
                prop_assert!(store.used_bytes() <= capacity);
            }
        }
    }

    // The store evicts exactly what a list-based LRU evicts, in the same
    // recency order.
    #[test]
    fn prop_matches_model(
        capacity in 0usize..48,
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let mut store: LruStore<String> = LruStore::new(capacity);
        let mut model = Model { capacity, entries: Vec::new() };

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    store.put(key.clone(), value.clone());
                    model.put(key, value);
                }
                CacheOp::Get { key } => {
                    let got = store.get(&key).cloned();
                    prop_assert_eq!(got, model.get(&key));
                }
            }
            prop_assert_eq!(store.keys(), model.keys());
            prop_assert_eq!(store.len(), model.entries.len());
        }
    }

    // A hit never evicts and always makes the key most recently used.
    #[test]
    fn prop_get_moves_to_front_without_evicting(
        entries in prop::collection::vec((key_strategy(), value_strategy()), 1..20),
        pick in any::<prop::sample::Index>()
    ) {
        let mut store: LruStore<String> = LruStore::new(0);
        for (key, value) in entries {
            store.put(key, value);
        }

        let keys: Vec<String> = store.keys().into_iter().map(str::to_owned).collect();
        let target = pick.get(&keys).clone();
        let len_before = store.len();
        let used_before = store.used_bytes();

        prop_assert!(store.get(&target).is_some());
        prop_assert_eq!(store.len(), len_before);
        prop_assert_eq!(store.used_bytes(), used_before);
        prop_assert_eq!(store.keys()[0], target.as_str());
    }

    // Values handed out by the concurrent cache are detached copies.
    #[test]
    fn prop_cached_value_detached_from_caller(
        key in key_strategy(),
        value in prop::collection::vec(any::<u8>(), 1..32)
    ) {
        let cache = ConcurrentCache::new(0);
        let mut source = value.clone();
        cache.add(key.clone(), ByteView::from(source.as_slice()));
        source.iter_mut().for_each(|b| *b = b.wrapping_add(1));

        let mut copy = cache.get(&key).unwrap().as_bytes();
        prop_assert_eq!(&copy, &value);
        copy.clear();
        prop_assert_eq!(cache.get(&key).unwrap().as_bytes(), value);
    }
}
