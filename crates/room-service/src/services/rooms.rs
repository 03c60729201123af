//! Room lifecycle management.
//!
//! Rooms are created pending under a long grace TTL, activate on the first
//! successful join (TTL reset to the live window), and disappear when their
//! TTL elapses or an explicit destroy removes the keys. Expiry is entirely
//! store-native; the service's job is to keep every room-owned key's TTL in
//! lockstep with the room metadata.
//!
//! Multi-key TTL updates are not atomic. Two concurrent joins can both read
//! a slightly stale TTL; this is an accepted weak-consistency window rather
//! than a reason for distributed locks.

use crate::errors::RoomError;
use crate::models::{RoomStatus, ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH};
use crate::notify::{EventNotifier, EVENT_PARTICIPANT_JOINED, EVENT_ROOM_DESTROYED};
use crate::services::now_millis;
use crate::store::{self, KeyValueStore};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Number of random bytes for room code generation (64 bits folded down to
/// six base-36 digits, ~31 bits of code space).
const ROOM_CODE_RANDOM_BYTES: usize = 8;

/// Length of a membership token in bytes (256 bits, hex-encoded).
const MEMBER_TOKEN_BYTES: usize = 32;

/// Deployment policy for room lifetimes and capacity.
#[derive(Debug, Clone, Copy)]
pub struct RoomPolicy {
    /// TTL for a freshly created room awaiting its first join.
    pub pending_ttl_seconds: i64,
    /// TTL applied when the room activates.
    pub live_ttl_seconds: i64,
    /// Maximum membership count.
    pub max_members: u64,
}

impl From<&crate::config::Config> for RoomPolicy {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            pending_ttl_seconds: config.pending_ttl_seconds,
            live_ttl_seconds: config.live_ttl_seconds,
            max_members: config.max_members,
        }
    }
}

/// Result of a successful join.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// The caller's membership token (fresh, or echoed back on the
    /// idempotent path).
    pub token: String,
    /// Effective remaining room TTL, used for the credential's expiry.
    pub ttl_seconds: i64,
}

/// Room lifecycle manager.
#[derive(Clone)]
pub struct RoomService {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn EventNotifier>,
    policy: RoomPolicy,
}

impl RoomService {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn EventNotifier>,
        policy: RoomPolicy,
    ) -> Self {
        Self {
            store,
            notifier,
            policy,
        }
    }

    /// Create a new room in pending status under the grace TTL.
    ///
    /// The code is a single CSPRNG draw; with ~2.2e9 possible codes and
    /// short-lived rooms, collisions are treated as negligible.
    #[instrument(skip_all, name = "room.create")]
    pub async fn create(&self) -> Result<String, RoomError> {
        let code = generate_room_code()?;

        let meta_key = store::meta_key(&code);
        self.store
            .hash_set(
                &meta_key,
                &[
                    ("status", RoomStatus::Pending.as_str().to_string()),
                    ("created_at", now_millis().to_string()),
                ],
            )
            .await?;
        self.store
            .expire(&meta_key, self.policy.pending_ttl_seconds)
            .await?;

        info!(
            target: "room.services.rooms",
            room_code = %code,
            pending_ttl_seconds = self.policy.pending_ttl_seconds,
            "Room created"
        );

        Ok(code)
    }

    /// Check whether a room currently exists.
    pub async fn exists(&self, code: &str) -> Result<bool, RoomError> {
        Ok(self.store.key_exists(&store::meta_key(code)).await?)
    }

    /// Join a room, minting a membership token.
    ///
    /// Re-presenting a token that is already a member is idempotent: the
    /// same token is returned and no capacity slot is consumed. The first
    /// join on a pending room activates it and resets the TTL to the live
    /// window; later joiners inherit whatever TTL remains.
    #[instrument(skip_all, name = "room.join", fields(room_code = %code))]
    pub async fn join(
        &self,
        code: &str,
        display_name: &str,
        presented_token: Option<&str>,
    ) -> Result<JoinOutcome, RoomError> {
        let meta_key = store::meta_key(code);
        let members_key = store::members_key(code);

        if !self.store.key_exists(&meta_key).await? {
            return Err(RoomError::NotFound("Room not found".to_string()));
        }

        // Idempotent path: an existing member gets their token back.
        if let Some(token) = presented_token {
            if self.store.set_contains(&members_key, token).await? {
                let remaining = self.store.ttl(&meta_key).await?;
                return Ok(JoinOutcome {
                    token: token.to_string(),
                    ttl_seconds: effective_ttl(remaining, self.policy.live_ttl_seconds),
                });
            }
        }

        let count = self.store.set_len(&members_key).await?;
        if count >= self.policy.max_members {
            return Err(RoomError::Full);
        }

        // First successful join activates a pending room and starts the
        // live countdown; a join on an active room inherits its TTL.
        let meta = self.store.hash_get_all(&meta_key).await?;
        let status = meta
            .get("status")
            .and_then(|s| RoomStatus::parse(s))
            .unwrap_or(RoomStatus::Pending);

        let ttl_seconds = if status == RoomStatus::Pending {
            self.store
                .hash_set(
                    &meta_key,
                    &[
                        ("status", RoomStatus::Active.as_str().to_string()),
                        ("started_at", now_millis().to_string()),
                    ],
                )
                .await?;
            self.store
                .expire(&meta_key, self.policy.live_ttl_seconds)
                .await?;
            self.policy.live_ttl_seconds
        } else {
            let remaining = self.store.ttl(&meta_key).await?;
            effective_ttl(remaining, self.policy.live_ttl_seconds)
        };

        let token = generate_member_token()?;
        self.store.set_add(&members_key, &token).await?;
        self.store.expire(&members_key, ttl_seconds).await?;

        self.notifier
            .publish(
                code,
                EVENT_PARTICIPANT_JOINED,
                serde_json::json!({
                    "display_name": display_name,
                    "timestamp": now_millis(),
                }),
            )
            .await;

        info!(
            target: "room.services.rooms",
            room_code = %code,
            member_count = count + 1,
            ttl_seconds = ttl_seconds,
            "Participant joined"
        );

        Ok(JoinOutcome { token, ttl_seconds })
    }

    /// Remaining TTL on the room metadata, floored at zero.
    #[instrument(skip_all, name = "room.ttl", fields(room_code = %code))]
    pub async fn remaining_ttl(&self, code: &str) -> Result<i64, RoomError> {
        let ttl = self.store.ttl(&store::meta_key(code)).await?;
        Ok(ttl.max(0))
    }

    /// Destroy a room: announce, then delete every room-owned key.
    ///
    /// Idempotent; deleting keys of an already-gone room is a no-op.
    #[instrument(skip_all, name = "room.destroy", fields(room_code = %code))]
    pub async fn destroy(&self, code: &str) -> Result<(), RoomError> {
        // Destroy event goes out first so open connections stop interacting
        // before the keys vanish.
        self.notifier
            .publish(
                code,
                EVENT_ROOM_DESTROYED,
                serde_json::json!({ "destroyed": true }),
            )
            .await;

        self.store.delete(&store::room_keys(code)).await?;

        info!(target: "room.services.rooms", room_code = %code, "Room destroyed");

        Ok(())
    }
}

/// Pick the TTL a joiner inherits: the room's remaining TTL when positive,
/// otherwise the live default (covers `-1` no-expiry and expiry races).
fn effective_ttl(remaining: i64, live_default: i64) -> i64 {
    if remaining > 0 {
        remaining
    } else {
        live_default
    }
}

/// Generate a six-character room code from the uppercase-alphanumeric
/// alphabet using a CSPRNG draw.
fn generate_room_code() -> Result<String, RoomError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; ROOM_CODE_RANDOM_BYTES];

    rng.fill(&mut bytes).map_err(|e| {
        warn!(target: "room.services.rooms", error = %e, "Failed to generate random bytes for room code");
        RoomError::Internal("RNG failure".to_string())
    })?;

    // Fold bytes into a big integer, then extract base-36 digits from the
    // least-significant end.
    let mut value: u128 = 0;
    for &b in &bytes {
        value = (value << 8) | u128::from(b);
    }

    let base = ROOM_CODE_ALPHABET.len() as u128;
    let mut code = Vec::with_capacity(ROOM_CODE_LENGTH);
    for _ in 0..ROOM_CODE_LENGTH {
        let idx = (value % base) as usize;
        let ch = ROOM_CODE_ALPHABET
            .get(idx)
            .ok_or_else(|| RoomError::Internal("Code alphabet index out of range".to_string()))?;
        code.push(*ch);
        value /= base;
    }

    code.reverse();

    String::from_utf8(code)
        .map_err(|_| RoomError::Internal("Room code contained invalid UTF-8".to_string()))
}

/// Generate a membership token: 32 random bytes (256 bits) hex-encoded.
fn generate_member_token() -> Result<String, RoomError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; MEMBER_TOKEN_BYTES];

    rng.fill(&mut bytes).map_err(|e| {
        warn!(target: "room.services.rooms", error = %e, "Failed to generate random bytes for membership token");
        RoomError::Internal("RNG failure".to_string())
    })?;

    Ok(hex::encode(bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::is_valid_room_code;
    use std::collections::HashSet;

    #[test]
    fn test_generated_codes_are_valid() {
        for _ in 0..100 {
            let code = generate_room_code().unwrap();
            assert!(is_valid_room_code(&code), "invalid code: {code}");
        }
    }

    #[test]
    fn test_generated_codes_vary() {
        let codes: HashSet<String> = (0..50).map(|_| generate_room_code().unwrap()).collect();
        // With ~2.2e9 possible codes, 50 draws colliding would indicate a
        // broken generator.
        assert_eq!(codes.len(), 50);
    }

    #[test]
    fn test_member_token_shape() {
        let token = generate_member_token().unwrap();
        assert_eq!(token.len(), MEMBER_TOKEN_BYTES * 2);
        assert!(token.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_member_tokens_unique() {
        let a = generate_member_token().unwrap();
        let b = generate_member_token().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_effective_ttl() {
        assert_eq!(effective_ttl(42, 600), 42);
        assert_eq!(effective_ttl(0, 600), 600);
        assert_eq!(effective_ttl(-1, 600), 600); // key without expiry
        assert_eq!(effective_ttl(-2, 600), 600); // key already gone
    }
}
