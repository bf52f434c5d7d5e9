use crate::store::replacement::EvictionPolicy;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

#[derive(Debug, Clone, Copy)]
struct Usage {
    count: u64,
    tick: u64,
}

/// Least Frequently Used. Each touch bumps a key's count; the victim is the key with the lowest
/// count, and among equals the one touched longest ago.
///
/// Counts are forgotten once a key is evicted, so a promoted key starts over at one.
#[derive(Debug)]
pub struct LfuPolicy<Key> {
    usage: HashMap<Key, Usage>,
    // (count, tick) is unique per key because ticks never repeat.
    order: BTreeMap<(u64, u64), Key>,
    tick: u64,
}

impl<Key> Default for LfuPolicy<Key> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Key> LfuPolicy<Key> {
    pub fn new() -> Self {
        Self {
            usage: HashMap::new(),
            order: BTreeMap::new(),
            tick: 0,
        }
    }
}

impl<Key: Eq + Hash> LfuPolicy<Key> {
    pub fn frequency(&self, key: &Key) -> Option<u64> {
        self.usage.get(key).map(|usage| usage.count)
    }
}

impl<Key> EvictionPolicy<Key> for LfuPolicy<Key>
where
    Key: Eq + Hash + Clone + Send,
{
    fn track(&mut self, key: &Key) {
        self.tick += 1;

        let usage = match self.usage.get(key) {
            Some(previous) => {
                self.order.remove(&(previous.count, previous.tick));
                Usage {
                    count: previous.count.saturating_add(1),
                    tick: self.tick,
                }
            }
            None => Usage {
                count: 1,
                tick: self.tick,
            },
        };

        self.usage.insert(key.clone(), usage);
        self.order.insert((usage.count, usage.tick), key.clone());
    }

    fn select_victim(&mut self) -> Option<Key> {
        let (_, victim) = self.order.pop_first()?;
        self.usage.remove(&victim);
        Some(victim)
    }

    fn clear(&mut self) {
        self.usage.clear();
        self.order.clear();
    }

    fn len(&self) -> usize {
        self.usage.len()
    }

    fn contains(&self, key: &Key) -> bool {
        self.usage.contains_key(key)
    }
}
