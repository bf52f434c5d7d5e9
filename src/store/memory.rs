use crate::error::StorageError;
use crate::store::PersistentStore;
use std::collections::HashMap;
use std::hash::Hash;

/// Heap backed secondary tier. Useful when the fast tier is bounded for bookkeeping reasons
/// rather than memory pressure, and as the default store in tests.
#[derive(Debug)]
pub struct MemoryStore<Key, Value> {
    data: HashMap<Key, Value>,
}

impl<Key, Value> Default for MemoryStore<Key, Value> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Key, Value> MemoryStore<Key, Value> {
    pub fn new() -> Self {
        MemoryStore {
            data: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<Key: Eq + Hash, Value> MemoryStore<Key, Value> {
    pub fn contains(&self, key: &Key) -> bool {
        self.data.contains_key(key)
    }
}

impl<Key, Value> PersistentStore<Key, Value> for MemoryStore<Key, Value>
where
    Key: Eq + Hash + Clone + Send,
    Value: Send,
{
    fn put(&mut self, key: &Key, value: Value) -> Result<(), StorageError> {
        self.data.insert(key.clone(), value);
        Ok(())
    }

    fn remove(&mut self, key: &Key) -> Option<Value> {
        self.data.remove(key)
    }

    fn clear(&mut self) {
        self.data.clear();
    }
}
