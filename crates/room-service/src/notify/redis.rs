//! Redis PUB/SUB implementation of the event notifier.

use super::{channel_key, EventEnvelope, EventNotifier};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{error, warn};

/// Notifier publishing JSON envelopes over Redis PUB/SUB.
///
/// Cheaply cloneable, same connection pattern as the store adapter.
#[derive(Clone)]
pub struct RedisNotifier {
    connection: MultiplexedConnection,
}

impl RedisNotifier {
    /// Connect to Redis for publishing.
    pub async fn connect(redis_url: &str) -> Result<Self, anyhow::Error> {
        let client = redis::Client::open(redis_url).map_err(|e| {
            error!(target: "room.notify.redis", error = %e, "Failed to open Redis client");
            anyhow::anyhow!("Failed to open Redis client: {e}")
        })?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                error!(target: "room.notify.redis", error = %e, "Failed to connect to Redis");
                anyhow::anyhow!("Failed to connect to Redis: {e}")
            })?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl EventNotifier for RedisNotifier {
    async fn publish(&self, room_code: &str, event: &str, payload: serde_json::Value) {
        let envelope = EventEnvelope {
            event: event.to_string(),
            payload,
        };

        let wire = match serde_json::to_string(&envelope) {
            Ok(wire) => wire,
            Err(e) => {
                error!(
                    target: "room.notify.redis",
                    error = %e,
                    event = event,
                    "Failed to serialize event envelope"
                );
                return;
            }
        };

        let mut conn = self.connection.clone();
        let result: Result<(), redis::RedisError> =
            conn.publish(channel_key(room_code), wire).await;

        // Best-effort delivery: the mutation already committed, so a failed
        // publish is logged and dropped.
        if let Err(e) = result {
            warn!(
                target: "room.notify.redis",
                error = %e,
                room_code = %room_code,
                event = event,
                "Failed to publish event"
            );
        }
    }
}
