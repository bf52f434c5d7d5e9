use crate::store::replacement::EvictionPolicy;
use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

/// First In First Out. Victims leave in the order they were first tracked; touching a resident
/// key again does not buy it more time.
#[derive(Debug)]
pub struct FifoPolicy<Key> {
    queue: VecDeque<Key>,
    resident: HashSet<Key>,
}

impl<Key> Default for FifoPolicy<Key> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Key> FifoPolicy<Key> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            resident: HashSet::new(),
        }
    }
}

impl<Key> EvictionPolicy<Key> for FifoPolicy<Key>
where
    Key: Eq + Hash + Clone + Send,
{
    fn track(&mut self, key: &Key) {
        if self.resident.insert(key.clone()) {
            self.queue.push_back(key.clone());
        }
    }

    fn select_victim(&mut self) -> Option<Key> {
        let victim = self.queue.pop_front()?;
        self.resident.remove(&victim);
        Some(victim)
    }

    fn clear(&mut self) {
        self.queue.clear();
        self.resident.clear();
    }

    fn len(&self) -> usize {
        self.resident.len()
    }

    fn contains(&self, key: &Key) -> bool {
        self.resident.contains(key)
    }
}
