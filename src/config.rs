//! Configuration for a [`CacheService`](crate::CacheService).
//!
//! # Example
//!
//! ```
//! use tiered_cache::{CacheConfig, PolicyKind};
//!
//! let config = CacheConfig::default();
//! assert_eq!(config.capacity, 1024);
//! assert!(!config.refresh_on_hit);
//!
//! let config = CacheConfig::from_json(r#"{ "capacity": 5, "policy": "fifo" }"#).unwrap();
//! assert_eq!(config.capacity, 5);
//! assert_eq!(config.policy, PolicyKind::Fifo);
//! ```

use crate::error::CacheError;
use crate::store::replacement::{EvictionPolicy, FifoPolicy, LfuPolicy, LruPolicy};
use serde::Deserialize;
use std::hash::Hash;

/// Which [`EvictionPolicy`] to build for the fast tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Fifo,
    #[default]
    Lru,
    Lfu,
}

impl PolicyKind {
    pub fn build<Key>(self) -> Box<dyn EvictionPolicy<Key>>
    where
        Key: Eq + Hash + Clone + Send + 'static,
    {
        match self {
            PolicyKind::Fifo => Box::new(FifoPolicy::new()),
            PolicyKind::Lru => Box::new(LruPolicy::new()),
            PolicyKind::Lfu => Box::new(LfuPolicy::new()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries held in the fast tier. Must be at least 1.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Report fast tier hits to the eviction policy. Off by default, which means a read never
    /// changes eviction order; turn it on to get true LRU behavior out of [`PolicyKind::Lru`].
    #[serde(default)]
    pub refresh_on_hit: bool,

    #[serde(default)]
    pub policy: PolicyKind,
}

fn default_capacity() -> usize {
    1024
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            refresh_on_hit: false,
            policy: PolicyKind::default(),
        }
    }
}

impl CacheConfig {
    pub fn from_json(json: &str) -> Result<Self, CacheError> {
        let config: CacheConfig =
            serde_json::from_str(json).map_err(|err| CacheError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CacheError> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidCapacity(self.capacity));
        }
        Ok(())
    }
}
