//! Test doubles shared by the integration tests.
//!
//! Both doubles hand out cloneable handles so a test can keep inspecting and steering them after
//! ownership has moved into the cache.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tiered_cache::{EvictionPolicy, PersistentStore, StorageError};

pub fn key(name: &str) -> String {
    name.to_string()
}

/// In-memory store whose writes can be made to fail on demand.
#[derive(Clone, Default)]
pub struct SharedStore {
    data: Arc<Mutex<HashMap<String, u32>>>,
    failing: Arc<AtomicBool>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.lock().contains_key(key)
    }

    pub fn value(&self, key: &str) -> Option<u32> {
        self.data.lock().get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn keys(&self) -> Vec<String> {
        self.data.lock().keys().cloned().collect()
    }

    pub fn seed(&self, key: &str, value: u32) {
        self.data.lock().insert(key.to_string(), value);
    }
}

impl PersistentStore<String, u32> for SharedStore {
    fn put(&mut self, key: &String, value: u32) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("injected failure".into()));
        }
        self.data.lock().insert(key.clone(), value);
        Ok(())
    }

    fn remove(&mut self, key: &String) -> Option<u32> {
        self.data.lock().remove(key)
    }

    fn clear(&mut self) {
        self.data.lock().clear();
    }
}

#[derive(Default)]
struct ScriptState {
    tracked: Vec<String>,
    script: VecDeque<String>,
    touches: usize,
    starved: bool,
}

/// Insertion-ordered policy whose next victims can be dictated by the test.
#[derive(Clone, Default)]
pub struct ScriptedPolicy {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next call to `select_victim` returns `key`, whether or not it is tracked.
    pub fn evict_next(&self, key: &str) {
        self.state.lock().script.push_back(key.to_string());
    }

    /// While starved, `select_victim` returns `None` even with keys tracked.
    pub fn set_starved(&self, starved: bool) {
        self.state.lock().starved = starved;
    }

    pub fn tracked(&self) -> Vec<String> {
        self.state.lock().tracked.clone()
    }

    pub fn touches(&self) -> usize {
        self.state.lock().touches
    }
}

impl EvictionPolicy<String> for ScriptedPolicy {
    fn track(&mut self, key: &String) {
        let mut state = self.state.lock();
        state.touches += 1;
        if !state.tracked.contains(key) {
            state.tracked.push(key.clone());
        }
    }

    fn select_victim(&mut self) -> Option<String> {
        let mut state = self.state.lock();
        if state.starved {
            return None;
        }
        let victim = match state.script.pop_front() {
            Some(scripted) => scripted,
            None if state.tracked.is_empty() => return None,
            None => state.tracked[0].clone(),
        };
        state.tracked.retain(|tracked| tracked != &victim);
        Some(victim)
    }

    fn clear(&mut self) {
        let mut state = self.state.lock();
        state.tracked.clear();
        state.script.clear();
    }

    fn len(&self) -> usize {
        self.state.lock().tracked.len()
    }

    fn contains(&self, key: &String) -> bool {
        self.state.lock().tracked.contains(key)
    }
}
