//! Property-based tests for the two-tier invariants.
//!
//! Random sequences of operations run against caches of random capacity and policy. After every
//! step the fast tier must be within capacity, tracked exactly by the policy, and disjoint from the
//! secondary tier. Without injected failures, every key ever written must remain readable.
//!
//! Run with: `cargo test --test proptest_invariants`

mod common;

use common::SharedStore;
use proptest::prelude::*;
use std::collections::HashMap;
use tiered_cache::{CacheService, PolicyKind};

#[derive(Debug, Clone)]
enum Op {
    Put(Option<u8>, u32),
    Get(Option<u8>),
    Clear,
    SetFailing(bool),
}

fn key_strategy() -> impl Strategy<Value = Option<u8>> {
    prop_oneof![
        1 => Just(None),
        9 => (0u8..12).prop_map(Some),
    ]
}

fn op_strategy(with_failures: bool) -> BoxedStrategy<Op> {
    let put = (key_strategy(), any::<u32>()).prop_map(|(key, value)| Op::Put(key, value));
    let get = key_strategy().prop_map(Op::Get);

    if with_failures {
        prop_oneof![
            6 => put,
            6 => get,
            1 => Just(Op::Clear),
            1 => any::<bool>().prop_map(Op::SetFailing),
        ]
        .boxed()
    } else {
        prop_oneof![
            6 => put,
            6 => get,
            1 => Just(Op::Clear),
        ]
        .boxed()
    }
}

fn policy_strategy() -> impl Strategy<Value = PolicyKind> {
    prop_oneof![
        Just(PolicyKind::Fifo),
        Just(PolicyKind::Lru),
        Just(PolicyKind::Lfu),
    ]
}

fn name(key: u8) -> String {
    format!("key-{key}")
}

fn build(
    capacity: usize,
    policy: PolicyKind,
    refresh: bool,
) -> (CacheService<String, u32>, SharedStore) {
    let store = SharedStore::new();
    let cache = CacheService::<String, u32>::new(capacity, policy.build(), Box::new(store.clone()))
        .unwrap()
        .with_refresh_on_hit(refresh);
    (cache, store)
}

fn check_invariants(
    cache: &CacheService<String, u32>,
    store: &SharedStore,
) -> Result<(), TestCaseError> {
    let snapshot = cache.snapshot();
    prop_assert!(snapshot.len() <= cache.capacity());
    prop_assert!(cache.is_consistent());
    for stored in store.keys() {
        prop_assert!(!snapshot.contains_key(&stored), "{} in both tiers", stored);
    }
    Ok(())
}

proptest! {
    #[test]
    fn invariants_hold_under_failures(
        capacity in 1usize..6,
        policy in policy_strategy(),
        refresh in any::<bool>(),
        ops in prop::collection::vec(op_strategy(true), 0..120),
    ) {
        let (cache, store) = build(capacity, policy, refresh);

        for op in ops {
            match op {
                Op::Put(key, value) => cache.put(key.map(name), value),
                Op::Get(key) => {
                    let key = key.map(name);
                    cache.get(key.as_ref());
                }
                Op::Clear => cache.clear(),
                Op::SetFailing(failing) => store.set_failing(failing),
            }
            check_invariants(&cache, &store)?;
        }
    }

    #[test]
    fn nothing_is_lost_without_failures(
        capacity in 1usize..6,
        policy in policy_strategy(),
        refresh in any::<bool>(),
        ops in prop::collection::vec(op_strategy(false), 0..120),
    ) {
        let (cache, store) = build(capacity, policy, refresh);
        let mut model: HashMap<String, u32> = HashMap::new();

        for op in ops {
            match op {
                Op::Put(Some(key), value) => {
                    let key = name(key);
                    // A resident key keeps its value; one sitting in the secondary tier is replaced.
                    if !cache.snapshot().contains_key(&key) {
                        model.insert(key.clone(), value);
                    }
                    cache.put(key, value);
                }
                Op::Put(None, value) => cache.put(None, value),
                Op::Get(Some(key)) => {
                    let key = name(key);
                    prop_assert_eq!(cache.get(&key), model.get(&key).copied());
                }
                Op::Get(None) => prop_assert_eq!(cache.get(None), None),
                Op::Clear => {
                    cache.clear();
                    model.clear();
                }
                Op::SetFailing(_) => unreachable!("failures are disabled"),
            }
            check_invariants(&cache, &store)?;
            prop_assert_eq!(cache.len() + store.len(), model.len());
        }
    }
}
