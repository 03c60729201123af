//! TTL key-value store adapter.
//!
//! Thin contract over the external key-value store. Everything a room owns
//! lives under a room-scoped key namespace derived from the room code:
//!
//! - `room:{code}:meta` - room metadata (HASH: status, created_at, started_at)
//! - `room:{code}:members` - membership tokens (SET)
//! - `room:{code}:messages` - message log (LIST of JSON)
//!
//! Expiry relies entirely on store-native per-key TTL; there is no reaper
//! task. The lifecycle and message services keep all three keys' TTLs
//! synchronized so no child key outlives its room.

mod redis;

pub use redis::RedisStore;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Metadata key for a room.
pub fn meta_key(code: &str) -> String {
    format!("room:{code}:meta")
}

/// Membership set key for a room.
pub fn members_key(code: &str) -> String {
    format!("room:{code}:members")
}

/// Message list key for a room.
pub fn messages_key(code: &str) -> String {
    format!("room:{code}:messages")
}

/// All keys owned by a room. This is the authoritative delete set.
pub fn room_keys(code: &str) -> Vec<String> {
    vec![meta_key(code), members_key(code), messages_key(code)]
}

/// Error from a store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Store operation failed: {0}")]
    Operation(String),
}

/// Async contract over the key-value store.
///
/// Single-key operations are atomic at the store; multi-key sequences
/// (read a TTL, apply it to several keys) are not, and callers accept the
/// resulting small race window rather than taking distributed locks.
///
/// TTL semantics follow Redis: `ttl` returns `-2` for a missing key and
/// `-1` for a key without an expiry.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Check whether a key exists.
    async fn key_exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Set fields on a hash key, creating it if absent.
    async fn hash_set(&self, key: &str, fields: &[(&str, String)]) -> Result<(), StoreError>;

    /// Read all fields of a hash key. Empty map if the key is absent.
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Set a key's TTL in seconds.
    async fn expire(&self, key: &str, seconds: i64) -> Result<(), StoreError>;

    /// Remaining TTL in seconds (`-2` missing key, `-1` no expiry).
    async fn ttl(&self, key: &str) -> Result<i64, StoreError>;

    /// Add a member to a set.
    async fn set_add(&self, key: &str, member: &str) -> Result<(), StoreError>;

    /// Check set membership.
    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// Set cardinality. Zero if the key is absent.
    async fn set_len(&self, key: &str) -> Result<u64, StoreError>;

    /// Append a value to the tail of a list.
    async fn list_push(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Read a list range, inclusive on both ends (`-1` = last element).
    async fn list_range(&self, key: &str, start: i64, stop: i64)
        -> Result<Vec<String>, StoreError>;

    /// Overwrite the list element at an index.
    async fn list_set(&self, key: &str, index: i64, value: &str) -> Result<(), StoreError>;

    /// Delete keys. Deleting absent keys is a no-op.
    async fn delete(&self, keys: &[String]) -> Result<(), StoreError>;
}
