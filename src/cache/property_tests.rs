//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the layers against simple reference models.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{
    CacheBuilder, Expiring, Layering, Lru, ManualClock, MemoryStore, Store, StoreOptions,
};

// == Test Configuration ==
const TEST_MAX_ITEMS: usize = 8;

// == Strategies ==
/// Generates keys from a small alphabet so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-j]{1,2}".prop_map(|s| s)
}

/// Generates valid cache values
fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,32}".prop_map(|s| s)
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Exists { key: String },
    Delete { key: String },
    Clear,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        3 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Exists { key }),
        2 => key_strategy().prop_map(|key| CacheOp::Delete { key }),
        1 => Just(CacheOp::Clear),
    ]
}

// == Reference Model ==
/// Front = most recently used, back = least recently used.
#[derive(Default)]
struct ModelLru {
    order: VecDeque<String>,
    values: HashMap<String, String>,
    max_items: usize,
}

impl ModelLru {
    fn new(max_items: usize) -> Self {
        Self {
            max_items,
            ..Self::default()
        }
    }

    fn touch(&mut self, key: &str) {
        self.order.retain(|k| k != key);
        self.order.push_front(key.to_string());
    }

    fn set(&mut self, key: String, value: String) {
        if !self.values.contains_key(&key) && self.values.len() >= self.max_items {
            if let Some(evicted) = self.order.pop_back() {
                self.values.remove(&evicted);
            }
        }
        self.touch(&key);
        self.values.insert(key, value);
    }

    fn get(&mut self, key: &str) -> Option<String> {
        let value = self.values.get(key).cloned();
        if value.is_some() {
            self.touch(key);
        }
        value
    }

    fn delete(&mut self, key: &str) -> Option<String> {
        self.order.retain(|k| k != key);
        self.values.remove(key)
    }

    fn clear(&mut self) {
        self.order.clear();
        self.values.clear();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // For any sequence of operations the recency list stays a closed ring
    // through HEAD and TAIL, its size matches a HEAD-to-TAIL walk and the
    // number of stored entries, and never exceeds the capacity.
    #[test]
    fn prop_ring_invariant_holds(ops in prop::collection::vec(cache_op_strategy(), 1..120)) {
        let mut lru = Lru::new(MemoryStore::new(), TEST_MAX_ITEMS).unwrap();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    lru.store(&key, value, &StoreOptions::new()).unwrap();
                }
                CacheOp::Get { key } => {
                    lru.load(&key).unwrap();
                }
                CacheOp::Exists { key } => {
                    lru.exists(&key).unwrap();
                }
                CacheOp::Delete { key } => {
                    lru.delete(&key).unwrap();
                }
                CacheOp::Clear => lru.clear().unwrap(),
            }

            prop_assert!(lru.list().is_consistent(), "Ring broken");
            prop_assert_eq!(lru.len(), lru.list().counting_walk());
            prop_assert_eq!(lru.len(), lru.inner().len());
            prop_assert!(lru.len() <= TEST_MAX_ITEMS);
        }
    }

    // For any sequence of operations the LRU layer agrees with a plain
    // VecDeque model on values, recency order and evictions.
    #[test]
    fn prop_matches_reference_model(ops in prop::collection::vec(cache_op_strategy(), 1..120)) {
        let mut lru = Lru::new(MemoryStore::new(), TEST_MAX_ITEMS).unwrap();
        let mut model = ModelLru::new(TEST_MAX_ITEMS);

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    lru.store(&key, value.clone(), &StoreOptions::new()).unwrap();
                    model.set(key, value);
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(lru.load(&key).unwrap(), model.get(&key));
                }
                CacheOp::Exists { key } => {
                    prop_assert_eq!(lru.exists(&key).unwrap(), model.get(&key).is_some());
                }
                CacheOp::Delete { key } => {
                    prop_assert_eq!(lru.delete(&key).unwrap(), model.delete(&key));
                }
                CacheOp::Clear => {
                    lru.clear().unwrap();
                    model.clear();
                }
            }

            let order: Vec<&str> = lru.list().iter().collect();
            let expected: Vec<&str> = model.order.iter().map(String::as_str).collect();
            prop_assert_eq!(order, expected);
        }
    }

    // For any valid key-value pair, storing then reading returns the value,
    // and deleting returns it once, under both layerings.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy(), outer in any::<bool>()) {
        let layering = if outer { Layering::ExpirationOuter } else { Layering::ExpirationInner };
        let cache = CacheBuilder::new()
            .max_items(TEST_MAX_ITEMS)
            .layering(layering)
            .build(MemoryStore::new())
            .unwrap();

        cache.set(&key, value.clone()).unwrap();
        prop_assert_eq!(cache.get(&key).unwrap(), Some(value.clone()));

        prop_assert_eq!(cache.delete(&key).unwrap(), Some(value));
        prop_assert!(!cache.exists(&key).unwrap());
        prop_assert_eq!(cache.delete(&key).unwrap(), None);
    }

    // For capacity k, inserting k+1 distinct keys evicts exactly the first.
    #[test]
    fn prop_lru_eviction_order(
        keys in prop::collection::hash_set(key_strategy(), 2..TEST_MAX_ITEMS + 2)
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let capacity = keys.len() - 1;
        let mut lru = Lru::new(MemoryStore::new(), capacity).unwrap();

        for key in &keys {
            lru.store(key, format!("value_{}", key), &StoreOptions::new()).unwrap();
        }

        prop_assert_eq!(lru.len(), capacity);
        prop_assert!(!lru.exists(&keys[0]).unwrap(), "Oldest key should have been evicted");
        for key in keys.iter().skip(1) {
            prop_assert!(lru.exists(key).unwrap(), "Key '{}' should still exist", key);
        }
    }

    // For any full cache, reading the oldest key protects it from the next
    // eviction and the second oldest goes instead.
    #[test]
    fn prop_lru_access_tracking(
        keys in prop::collection::hash_set(key_strategy(), 4..TEST_MAX_ITEMS + 2)
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let (new_key, initial) = keys.split_last().unwrap();
        let mut lru = Lru::new(MemoryStore::new(), initial.len()).unwrap();

        for key in initial {
            lru.store(key, format!("value_{}", key), &StoreOptions::new()).unwrap();
        }

        lru.load(&initial[0]).unwrap();
        lru.store(new_key, "new".to_string(), &StoreOptions::new()).unwrap();

        prop_assert!(lru.exists(&initial[0]).unwrap(), "Touched key should survive");
        prop_assert!(!lru.exists(&initial[1]).unwrap(), "Second oldest should be evicted");
        prop_assert!(lru.exists(new_key).unwrap());
    }

    // For any set of TTLs and any elapsed time, exactly the entries whose
    // expiry instant has passed are gone.
    #[test]
    fn prop_expiry_matches_elapsed_time(
        ttls in prop::collection::hash_map(key_strategy(), 1u64..20, 1..10),
        elapsed in 0u64..25
    ) {
        let clock = ManualClock::new();
        let mut store = Expiring::with_clock(MemoryStore::new(), Arc::new(clock.clone()));

        for (key, ttl) in &ttls {
            store
                .store(key, "v".to_string(), &StoreOptions::expires_in(Duration::from_secs(*ttl)))
                .unwrap();
        }

        clock.advance(Duration::from_secs(elapsed));

        let alive: HashSet<&String> = ttls
            .iter()
            .filter(|(_, ttl)| elapsed <= **ttl)
            .map(|(key, _)| key)
            .collect();
        for key in ttls.keys() {
            prop_assert_eq!(store.exists(key).unwrap(), alive.contains(key));
        }
        prop_assert_eq!(store.inner().len(), alive.len());
    }

    // With expiration inside LRU, expired entries leave the recency list as
    // soon as they are observed and the ring stays closed.
    #[test]
    fn prop_expiry_keeps_ring_consistent(
        entries in prop::collection::vec((key_strategy(), 1u64..5), 1..30),
        elapsed in 0u64..6
    ) {
        let clock = ManualClock::new();
        let inner = Expiring::with_clock(MemoryStore::new(), Arc::new(clock.clone()));
        let mut lru = Lru::new(inner, TEST_MAX_ITEMS).unwrap();

        for (key, ttl) in &entries {
            lru.store(key, "v".to_string(), &StoreOptions::expires_in(Duration::from_secs(*ttl)))
                .unwrap();
        }
        clock.advance(Duration::from_secs(elapsed));

        for (key, _) in &entries {
            lru.load(key).unwrap();
            prop_assert!(lru.list().is_consistent());
        }
        prop_assert_eq!(lru.len(), lru.inner().inner().len());
    }
}

// == Property Test for Error Response Format ==
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // For any error condition, the HTTP response includes a JSON body with
    // an "error" field carrying the error's message.
    #[test]
    fn prop_error_response_format(error_msg in "[a-zA-Z0-9 _-]{1,100}") {
        use crate::error::CacheError;
        use axum::body::to_bytes;
        use axum::response::IntoResponse;

        let error_variants = vec![
            CacheError::NotFound(error_msg.clone()),
            CacheError::Backend(error_msg.clone()),
            CacheError::CapacityExhausted {
                max_items: 1,
                source: Box::new(CacheError::Backend(error_msg.clone())),
            },
            CacheError::InvalidRequest(error_msg.clone()),
            CacheError::InvalidConfig(error_msg.clone()),
            CacheError::Internal(error_msg.clone()),
        ];

        for error in error_variants {
            let expected_msg = error.to_string();
            let response = error.into_response();

            let content_type = response.headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok());
            prop_assert!(
                content_type.map(|ct| ct.contains("application/json")).unwrap_or(false),
                "Response should have JSON content-type"
            );

            let bytes = tokio_test::block_on(async {
                to_bytes(response.into_body(), usize::MAX).await.unwrap()
            });
            let json: serde_json::Value = serde_json::from_slice(&bytes)
                .expect("Response body should be valid JSON");

            prop_assert_eq!(json["error"].as_str(), Some(expected_msg.as_str()));
        }
    }
}
