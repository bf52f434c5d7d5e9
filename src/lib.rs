//! # Tiered Cache
//!
//! A bounded in-memory cache that spills the entries it evicts into a secondary store instead of
//! dropping them.
//!
//! ```text
//!   put / get
//!       │
//!       ▼
//! ┌──────────────────────────┐   select_victim   ┌──────────────────────┐
//! │ Fast tier (≤ capacity)   │ ◄───────────────► │ EvictionPolicy       │
//! │ HashMap owned by service │      track        │ FIFO / LRU / LFU     │
//! └──────────────────────────┘                   └──────────────────────┘
//!       │ demote ▲ promote
//!       ▼        │
//! ┌──────────────────────────┐
//! │ PersistentStore          │
//! │ memory / discrete files  │
//! └──────────────────────────┘
//! ```
//!
//! A key is resident in exactly one of the two tiers, and the policy tracks exactly the keys of the
//! fast tier. All of this is kept true under a single lock per [`CacheService`].
//!
//! ## Quick Start
//!
//! ```
//! use tiered_cache::store::memory::MemoryStore;
//! use tiered_cache::store::replacement::FifoPolicy;
//! use tiered_cache::CacheService;
//!
//! let cache = CacheService::<String, u32>::new(
//!     2,
//!     Box::new(FifoPolicy::new()),
//!     Box::new(MemoryStore::new()),
//! )
//! .unwrap();
//!
//! cache.put("one".to_string(), 1);
//! cache.put("two".to_string(), 2);
//! cache.put("three".to_string(), 3); // "one" is demoted to the store
//!
//! assert!(!cache.snapshot().contains_key(&"one".to_string()));
//! assert_eq!(cache.get(&"one".to_string()), Some(1)); // and promoted back
//! assert_eq!(cache.len(), 2);
//! ```

pub mod config;
pub mod error;
pub mod service;
pub mod store;

pub use config::{CacheConfig, PolicyKind};
pub use error::{CacheError, StorageError};
pub use service::{CacheService, CacheStats, Snapshot};
pub use store::replacement::EvictionPolicy;
pub use store::PersistentStore;
