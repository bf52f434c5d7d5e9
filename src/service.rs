use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::store::replacement::EvictionPolicy;
use crate::store::PersistentStore;
use parking_lot::Mutex;
use std::collections::hash_map;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::{debug, error, warn};

/// Counters describing how the cache has been used since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from the fast tier.
    pub hits: u64,
    /// Reads that found the key in neither tier.
    pub misses: u64,
    /// Entries moved from the secondary tier into the fast tier.
    pub promotions: u64,
    /// Entries written to the secondary tier to free fast tier capacity.
    pub demotions: u64,
    /// Writes to the secondary tier that failed, including returning an entry the cache could not
    /// make room for. The written value is gone.
    pub demotion_failures: u64,
}

/// Read-only copy of the fast tier taken under the cache lock.
#[derive(Debug, Clone)]
pub struct Snapshot<Key, Value> {
    entries: HashMap<Key, Value>,
}

impl<Key: Eq + Hash, Value> Snapshot<Key, Value> {
    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, Key, Value> {
        self.entries.iter()
    }

    pub fn keys(&self) -> hash_map::Keys<'_, Key, Value> {
        self.entries.keys()
    }
}

impl<'a, Key, Value> IntoIterator for &'a Snapshot<Key, Value> {
    type Item = (&'a Key, &'a Value);
    type IntoIter = hash_map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

struct State<Key, Value> {
    fast: HashMap<Key, Value>,
    policy: Box<dyn EvictionPolicy<Key>>,
    store: Box<dyn PersistentStore<Key, Value>>,
    stats: CacheStats,
}

impl<Key, Value> State<Key, Value>
where
    Key: Eq + Hash + Clone + Debug,
{
    /// Asks the policy for victims until one is actually resident and removes it from the fast
    /// tier. A policy honoring its contract yields a resident key on the first try.
    fn take_victim(&mut self) -> Option<(Key, Value)> {
        while let Some(victim) = self.policy.select_victim() {
            if let Some(value) = self.fast.remove(&victim) {
                return Some((victim, value));
            }
            warn!(?victim, "eviction policy selected a key that is not resident, skipping");
        }

        None
    }
}

/// A fast tier of at most `capacity` entries in front of an unbounded secondary tier.
///
/// Entries enter the fast tier on [`put`](CacheService::put). When it is full, the entry chosen by
/// the [`EvictionPolicy`] is demoted to the [`PersistentStore`]; a [`get`](CacheService::get) that
/// misses the fast tier promotes the entry back out of the store, demoting another if needed. A key
/// lives in at most one tier at a time.
///
/// Every operation, store and policy calls included, runs under one lock. A slow store stalls every
/// caller for the duration of its call.
///
/// # Secondary tier failures
///
/// Store errors are logged and counted in [`CacheStats::demotion_failures`], never returned, and the
/// two write paths react differently:
///
/// * `put` on a full cache still inserts the new entry. The victim that could not be written is
///   dropped.
/// * `get` that needs to promote into a full cache gives up and returns `None`. Both the victim and
///   the entry being promoted are dropped.
pub struct CacheService<Key, Value> {
    capacity: usize,
    refresh_on_hit: bool,
    state: Mutex<State<Key, Value>>,
}

impl<Key, Value> CacheService<Key, Value>
where
    Key: Eq + Hash + Clone + Debug,
    Value: Clone,
{
    pub fn new(
        capacity: usize,
        policy: Box<dyn EvictionPolicy<Key>>,
        store: Box<dyn PersistentStore<Key, Value>>,
    ) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity(capacity));
        }

        Ok(Self {
            capacity,
            refresh_on_hit: false,
            state: Mutex::new(State {
                fast: HashMap::with_capacity(capacity),
                policy,
                store,
                stats: CacheStats::default(),
            }),
        })
    }

    pub fn from_config(
        config: &CacheConfig,
        store: Box<dyn PersistentStore<Key, Value>>,
    ) -> Result<Self, CacheError>
    where
        Key: Send + 'static,
    {
        config.validate()?;
        Ok(Self::new(config.capacity, config.policy.build(), store)?
            .with_refresh_on_hit(config.refresh_on_hit))
    }

    /// When enabled, a fast tier hit is reported to the policy as a touch.
    pub fn with_refresh_on_hit(mut self, refresh_on_hit: bool) -> Self {
        self.refresh_on_hit = refresh_on_hit;
        self
    }

    /// Inserts `value` under `key` unless the key is already resident, in which case the stored
    /// value is kept and the key only counts as touched. A `None` key is ignored.
    pub fn put(&self, key: impl Into<Option<Key>>, value: Value) {
        let Some(key) = key.into() else {
            return;
        };
        debug!(?key, "caching key");

        let mut guard = self.state.lock();
        let state = &mut *guard;

        if state.fast.contains_key(&key) {
            state.policy.track(&key);
            state.store.remove(&key);
            return;
        }

        if state.fast.len() >= self.capacity {
            let Some((victim, victim_value)) = state.take_victim() else {
                warn!(?key, "fast tier full but eviction policy has no victim, dropping write");
                return;
            };

            debug!(?victim, "demoting entry to secondary tier");
            match state.store.put(&victim, victim_value) {
                Ok(()) => state.stats.demotions += 1,
                Err(err) => {
                    state.stats.demotion_failures += 1;
                    error!(?victim, %err, "failed to demote entry, its value is lost");
                }
            }
        }

        state.policy.track(&key);
        state.store.remove(&key);
        state.fast.insert(key, value);
    }

    /// Looks `key` up in the fast tier, then in the secondary tier. A secondary tier hit moves the
    /// entry into the fast tier. A `None` key is never found.
    pub fn get<'a>(&self, key: impl Into<Option<&'a Key>>) -> Option<Value>
    where
        Key: 'a,
    {
        let key = key.into()?;

        let mut guard = self.state.lock();
        let state = &mut *guard;

        if let Some(value) = state.fast.get(key) {
            let value = value.clone();
            if self.refresh_on_hit {
                state.policy.track(key);
            }
            state.stats.hits += 1;
            return Some(value);
        }

        debug!(?key, "fast tier miss, checking secondary tier");
        let Some(value) = state.store.remove(key) else {
            state.stats.misses += 1;
            return None;
        };

        if state.fast.len() >= self.capacity {
            let Some((victim, victim_value)) = state.take_victim() else {
                warn!(?key, "fast tier full but eviction policy has no victim, leaving entry in secondary tier");
                if let Err(err) = state.store.put(key, value) {
                    state.stats.demotion_failures += 1;
                    error!(?key, %err, "failed to return entry to secondary tier, its value is lost");
                }
                return None;
            };

            debug!(?victim, "demoting entry to secondary tier");
            if let Err(err) = state.store.put(&victim, victim_value) {
                state.stats.demotion_failures += 1;
                error!(?victim, ?key, %err, "failed to demote entry, abandoning promotion");
                return None;
            }
            state.stats.demotions += 1;
        }

        debug!(?key, "promoting entry to fast tier");
        state.fast.insert(key.clone(), value.clone());
        state.policy.track(key);
        state.stats.promotions += 1;

        Some(value)
    }

    /// Copy of the fast tier as of this call. Taken under the cache lock, so it never observes a
    /// half finished operation.
    pub fn snapshot(&self) -> Snapshot<Key, Value> {
        Snapshot {
            entries: self.state.lock().fast.clone(),
        }
    }

    /// Empties the fast tier, the secondary tier and the eviction policy together.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.fast.clear();
        state.store.clear();
        state.policy.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries in the fast tier.
    pub fn len(&self) -> usize {
        self.state.lock().fast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().fast.is_empty()
    }

    /// Checks that the fast tier is within capacity and that the policy tracks exactly its keys.
    pub fn is_consistent(&self) -> bool {
        let state = self.state.lock();
        state.fast.len() <= self.capacity
            && state.policy.len() == state.fast.len()
            && state.fast.keys().all(|key| state.policy.contains(key))
    }
}
