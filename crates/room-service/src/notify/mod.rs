//! Event notifier.
//!
//! Best-effort fan-out of lifecycle and message events to already-connected
//! clients. Delivery is fire-and-forget: by the time an event is published
//! the triggering mutation has already committed to the store, so publish
//! failures are logged and never surfaced. Subscribers treat events as a
//! low-latency hint and re-fetch authoritative state from the service.

mod redis;

pub use redis::RedisNotifier;

use async_trait::async_trait;

/// A participant joined the room.
pub const EVENT_PARTICIPANT_JOINED: &str = "participant.joined";

/// A message was posted, reacted to, or deleted (full-replace payload).
pub const EVENT_MESSAGE: &str = "message";

/// The room was destroyed; consumers must stop further interaction.
pub const EVENT_ROOM_DESTROYED: &str = "room.destroyed";

/// Transient typing indicator.
pub const EVENT_TYPING: &str = "typing";

/// Pub/sub channel for a room's events.
pub fn channel_key(code: &str) -> String {
    format!("room:{code}:events")
}

/// Fire-and-forget event publisher scoped to a room channel.
///
/// Implementations must not return errors to callers; they log and move on.
#[async_trait]
pub trait EventNotifier: Send + Sync {
    /// Publish a named event to the room's channel.
    async fn publish(&self, room_code: &str, event: &str, payload: serde_json::Value);
}

/// Wire envelope published on the channel.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct EventEnvelope {
    pub event: String,
    pub payload: serde_json::Value,
}
