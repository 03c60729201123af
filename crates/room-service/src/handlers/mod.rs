//! HTTP request handlers for the room service.

pub mod health;
pub mod messages;
pub mod metrics;
pub mod rooms;

pub use health::{health_check, readiness_check};
pub use messages::{delete_message, list_messages, post_message, react_to_message, typing};
pub use metrics::metrics_handler;
pub use rooms::{create_room, destroy_room, join_room, room_exists, room_ttl};
