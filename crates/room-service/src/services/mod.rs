//! Business logic for the room service.
//!
//! Handlers delegate here; services talk to the injected store and notifier
//! seams. `rooms` owns the room lifecycle (create, join, TTL, destroy) and
//! `messages` owns the append-mostly message log.

pub mod messages;
pub mod rooms;

pub use messages::MessageService;
pub use rooms::{JoinOutcome, RoomPolicy, RoomService};

/// Current time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
