pub mod discrete_files;
pub mod memory;
pub mod replacement;

use crate::error::StorageError;

/// The secondary tier. Only ever holds entries displaced from the fast tier, so the cache never
/// needs to enumerate it: it writes demoted entries, takes promoted entries back out, and wipes
/// it on clear.
pub trait PersistentStore<Key, Value>: Send {
    /// Durably store the pair, replacing any previous value for `key`.
    fn put(&mut self, key: &Key, value: Value) -> Result<(), StorageError>;

    /// Destructive read. Returns the stored value and forgets it, or `None` when the key is not
    /// held. Implementations must not fail here; an unreadable record counts as absent.
    fn remove(&mut self, key: &Key) -> Option<Value>;

    fn clear(&mut self);
}
