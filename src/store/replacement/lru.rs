use crate::store::replacement::EvictionPolicy;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Least Recently Used. Every touch stamps the key with a fresh tick; the victim is the key with
/// the oldest stamp.
///
/// The usage order is held in memory only. The cache never reports hits to the policy unless
/// `refresh_on_hit` is enabled, so with it disabled a key's recency is its last write or
/// promotion, not its last read.
#[derive(Debug)]
pub struct LruPolicy<Key> {
    last_used: HashMap<Key, u64>,
    usage_order: BTreeMap<u64, Key>,
    tick: u64,
}

impl<Key> Default for LruPolicy<Key> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Key> LruPolicy<Key> {
    pub fn new() -> Self {
        Self {
            last_used: HashMap::new(),
            usage_order: BTreeMap::new(),
            tick: 0,
        }
    }
}

impl<Key> LruPolicy<Key>
where
    Key: Eq + Hash + Clone,
{
    fn mark_as_most_recent(&mut self, key: &Key) {
        self.tick += 1;

        if let Some(previous) = self.last_used.insert(key.clone(), self.tick) {
            self.usage_order.remove(&previous);
        }
        self.usage_order.insert(self.tick, key.clone());
    }
}

impl<Key> EvictionPolicy<Key> for LruPolicy<Key>
where
    Key: Eq + Hash + Clone + Send,
{
    fn track(&mut self, key: &Key) {
        self.mark_as_most_recent(key);
    }

    fn select_victim(&mut self) -> Option<Key> {
        let (_, victim) = self.usage_order.pop_first()?;
        self.last_used.remove(&victim);
        Some(victim)
    }

    fn clear(&mut self) {
        self.last_used.clear();
        self.usage_order.clear();
    }

    fn len(&self) -> usize {
        self.last_used.len()
    }

    fn contains(&self, key: &Key) -> bool {
        self.last_used.contains_key(key)
    }
}
