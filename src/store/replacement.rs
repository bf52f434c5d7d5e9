pub mod fifo;
pub mod lfu;
pub mod lru;

pub use fifo::FifoPolicy;
pub use lfu::LfuPolicy;
pub use lru::LruPolicy;

/// Tracks which keys are resident in the fast tier and decides which one leaves next.
///
/// The cache keeps the tracked key set equal to its fast tier's key set: every resident key has
/// been passed to [`track`](EvictionPolicy::track), and every key handed out by
/// [`select_victim`](EvictionPolicy::select_victim) has already been removed from the fast tier.
pub trait EvictionPolicy<Key>: Send {
    /// Record `key` as resident and touched. What "touched" means is up to the policy: LRU moves
    /// the key to the most recent position, FIFO ignores repeat touches, LFU counts them.
    fn track(&mut self, key: &Key);

    /// Pick a victim, stop tracking it and hand it back. `None` only when nothing is tracked.
    fn select_victim(&mut self) -> Option<Key>;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, key: &Key) -> bool;
}
