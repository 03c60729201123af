//! In-memory mock of the key-value store contract.
//!
//! Implements `KeyValueStore` over a HashMap with per-key expiry driven by
//! a logical clock. Tests call `advance(seconds)` instead of sleeping;
//! expired keys vanish lazily on the next access, which matches how the
//! service observes store-native TTL expiry (key absence).

use async_trait::async_trait;
use room_service::store::{KeyValueStore, StoreError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Value {
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
    List(Vec<String>),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Hash(_) => "hash",
            Value::Set(_) => "set",
            Value::List(_) => "list",
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    /// Logical second at which the key expires; `None` = no expiry.
    expires_at: Option<u64>,
}

#[derive(Debug, Default)]
struct MockStoreInner {
    entries: HashMap<String, Entry>,
    /// Logical clock, in seconds.
    now: u64,
}

impl MockStoreInner {
    /// Drop the key if its expiry has passed.
    fn purge(&mut self, key: &str) {
        let expired = self
            .entries
            .get(key)
            .and_then(|e| e.expires_at)
            .map(|at| at <= self.now)
            .unwrap_or(false);

        if expired {
            self.entries.remove(key);
        }
    }

    /// Purge, then return a live reference.
    fn live_entry(&mut self, key: &str) -> Option<&mut Entry> {
        self.purge(key);
        self.entries.get_mut(key)
    }

    /// Purge, then return a live reference, creating the entry with the
    /// given empty value if absent.
    fn live_entry_or(&mut self, key: &str, empty: Value) -> &mut Entry {
        self.purge(key);
        self.entries.entry(key.to_string()).or_insert(Entry {
            value: empty,
            expires_at: None,
        })
    }
}

fn wrong_type(key: &str, expected: &str, actual: &str) -> StoreError {
    StoreError::Operation(format!(
        "WRONGTYPE key {key} holds {actual}, expected {expected}"
    ))
}

/// Mock store for testing room lifecycle and message behavior.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    inner: Arc<Mutex<MockStoreInner>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the logical clock by `seconds`. Keys whose TTL has elapsed
    /// disappear on their next access.
    pub fn advance(&self, seconds: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner.now += seconds;
    }

    /// Synchronous existence check for assertions.
    pub fn key_exists_sync(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.live_entry(key).is_some()
    }

    /// Synchronous TTL read for assertions (Redis semantics: `-2` missing,
    /// `-1` no expiry).
    pub fn ttl_sync(&self, key: &str) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.now;
        match inner.live_entry(key) {
            None => -2,
            Some(entry) => match entry.expires_at {
                None => -1,
                Some(at) => (at - now) as i64,
            },
        }
    }
}

#[async_trait]
impl KeyValueStore for MockStore {
    async fn key_exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.key_exists_sync(key))
    }

    async fn hash_set(&self, key: &str, fields: &[(&str, String)]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner.live_entry_or(key, Value::Hash(HashMap::new()));

        match &mut entry.value {
            Value::Hash(map) => {
                for (field, value) in fields {
                    map.insert((*field).to_string(), value.clone());
                }
                Ok(())
            }
            other => Err(wrong_type(key, "hash", other.type_name())),
        }
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.live_entry(key) {
            None => Ok(HashMap::new()),
            Some(entry) => match &entry.value {
                Value::Hash(map) => Ok(map.clone()),
                other => Err(wrong_type(key, "hash", other.type_name())),
            },
        }
    }

    async fn expire(&self, key: &str, seconds: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.now;
        if let Some(entry) = inner.live_entry(key) {
            entry.expires_at = Some(now + seconds.max(0) as u64);
        }
        // Expiring an absent key is a no-op, as in Redis.
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<i64, StoreError> {
        Ok(self.ttl_sync(key))
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner.live_entry_or(key, Value::Set(HashSet::new()));

        match &mut entry.value {
            Value::Set(set) => {
                set.insert(member.to_string());
                Ok(())
            }
            other => Err(wrong_type(key, "set", other.type_name())),
        }
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.live_entry(key) {
            None => Ok(false),
            Some(entry) => match &entry.value {
                Value::Set(set) => Ok(set.contains(member)),
                other => Err(wrong_type(key, "set", other.type_name())),
            },
        }
    }

    async fn set_len(&self, key: &str) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.live_entry(key) {
            None => Ok(0),
            Some(entry) => match &entry.value {
                Value::Set(set) => Ok(set.len() as u64),
                other => Err(wrong_type(key, "set", other.type_name())),
            },
        }
    }

    async fn list_push(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner.live_entry_or(key, Value::List(Vec::new()));

        match &mut entry.value {
            Value::List(list) => {
                list.push(value.to_string());
                Ok(())
            }
            other => Err(wrong_type(key, "list", other.type_name())),
        }
    }

    async fn list_range(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<String>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.live_entry(key) {
            None => Ok(Vec::new()),
            Some(entry) => match &entry.value {
                Value::List(list) => {
                    let len = list.len() as i64;
                    // Redis LRANGE semantics: inclusive bounds, negatives
                    // count from the tail, out-of-range clamps.
                    let resolve = |i: i64| if i < 0 { len + i } else { i };
                    let from = resolve(start).max(0);
                    let to = resolve(stop).min(len - 1);

                    if from > to || len == 0 {
                        return Ok(Vec::new());
                    }

                    Ok(list
                        .iter()
                        .skip(from as usize)
                        .take((to - from + 1) as usize)
                        .cloned()
                        .collect())
                }
                other => Err(wrong_type(key, "list", other.type_name())),
            },
        }
    }

    async fn list_set(&self, key: &str, index: i64, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.live_entry(key) {
            None => Err(StoreError::Operation(format!("no such key: {key}"))),
            Some(entry) => match &mut entry.value {
                Value::List(list) => {
                    let len = list.len() as i64;
                    let resolved = if index < 0 { len + index } else { index };
                    match list.get_mut(resolved.max(0) as usize) {
                        Some(slot) if resolved >= 0 => {
                            *slot = value.to_string();
                            Ok(())
                        }
                        _ => Err(StoreError::Operation(format!(
                            "index out of range: {index} for key {key}"
                        ))),
                    }
                }
                other => Err(wrong_type(key, "list", other.type_name())),
            },
        }
    }

    async fn delete(&self, keys: &[String]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        for key in keys {
            inner.entries.remove(key);
        }
        Ok(())
    }
}
