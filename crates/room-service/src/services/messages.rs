//! Message store: append, list, react, delete, typing.
//!
//! Messages live in the room's list key in append order; list position is
//! the only ordering. React and delete are read-modify-write against the
//! current list snapshot (the list type has no partial-field update), so two
//! concurrent edits to the same message can race and one reaction edit can
//! overwrite the other. Accepted; subscribers reconcile by re-listing.

use crate::errors::RoomError;
use crate::models::{MessageView, Reaction, StoredMessage, DELETED_TEXT};
use crate::notify::{EventNotifier, EVENT_MESSAGE, EVENT_TYPING};
use crate::services::now_millis;
use crate::store::{self, KeyValueStore};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Message store for a room's append-mostly log.
#[derive(Clone)]
pub struct MessageService {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn EventNotifier>,
}

impl MessageService {
    pub fn new(store: Arc<dyn KeyValueStore>, notifier: Arc<dyn EventNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Append a message to the room's log.
    ///
    /// Fails with `RoomGone` if the room metadata has expired under the
    /// caller (a post racing the TTL). After the append, the list and
    /// members keys are re-expired to the room's remaining TTL so they die
    /// with the room; resync failures are logged, never surfaced, since the
    /// append has already committed.
    #[instrument(skip_all, name = "room.message.post", fields(room_code = %code))]
    pub async fn post(
        &self,
        code: &str,
        token: &str,
        sender: &str,
        text: &str,
    ) -> Result<MessageView, RoomError> {
        let meta_key = store::meta_key(code);
        let messages_key = store::messages_key(code);

        if !self.store.key_exists(&meta_key).await? {
            return Err(RoomError::RoomGone);
        }

        let message = StoredMessage {
            id: Uuid::new_v4().to_string(),
            sender: sender.to_string(),
            text: text.to_string(),
            timestamp: now_millis(),
            token: token.to_string(),
            reactions: Vec::new(),
            deleted: false,
        };

        let encoded = encode_message(&message)?;
        self.store.list_push(&messages_key, &encoded).await?;

        self.resync_ttls(code).await;

        self.publish_message(code, &message).await;

        info!(
            target: "room.services.messages",
            room_code = %code,
            message_id = %message.id,
            "Message posted"
        );

        Ok(message.to_view(Some(token)))
    }

    /// All messages in append order, viewed from the caller's token.
    #[instrument(skip_all, name = "room.message.list", fields(room_code = %code))]
    pub async fn list(&self, code: &str, token: &str) -> Result<Vec<MessageView>, RoomError> {
        let messages = self.load_all(code).await?;
        Ok(messages.iter().map(|m| m.to_view(Some(token))).collect())
    }

    /// Toggle the caller's `(emoji, token)` reaction on a message.
    ///
    /// The message is found by linear scan; room message volume is bounded
    /// by the room's lifetime, so no index is kept.
    #[instrument(skip_all, name = "room.message.react", fields(room_code = %code, message_id = %message_id))]
    pub async fn react(
        &self,
        code: &str,
        token: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<MessageView, RoomError> {
        let (index, mut message) = self.find_message(code, message_id).await?;

        // At most one reaction per (emoji, identity) pair at any time.
        if let Some(pos) = message
            .reactions
            .iter()
            .position(|r| r.emoji == emoji && r.reactor == token)
        {
            message.reactions.remove(pos);
        } else {
            message.reactions.push(Reaction {
                emoji: emoji.to_string(),
                reactor: token.to_string(),
                timestamp: now_millis(),
            });
        }

        self.write_back(code, index, &message).await?;
        self.publish_message(code, &message).await;

        Ok(message.to_view(Some(token)))
    }

    /// Mark a message deleted, replacing its text with the placeholder.
    ///
    /// Only the author may delete. The record stays in place at its list
    /// position; the original text is unrecoverable through the public
    /// interface.
    #[instrument(skip_all, name = "room.message.delete", fields(room_code = %code, message_id = %message_id))]
    pub async fn delete(
        &self,
        code: &str,
        token: &str,
        message_id: &str,
    ) -> Result<MessageView, RoomError> {
        let (index, mut message) = self.find_message(code, message_id).await?;

        if message.token != token {
            return Err(RoomError::Unauthorized(
                "Only the author may delete a message".to_string(),
            ));
        }

        message.deleted = true;
        message.text = DELETED_TEXT.to_string();

        self.write_back(code, index, &message).await?;
        self.publish_message(code, &message).await;

        info!(
            target: "room.services.messages",
            room_code = %code,
            message_id = %message_id,
            "Message deleted"
        );

        Ok(message.to_view(Some(token)))
    }

    /// Forward a transient typing signal. Nothing is persisted; rapid
    /// repeated calls are expected and not rate-limited here.
    pub async fn typing(&self, code: &str, display_name: &str, is_typing: bool) {
        self.notifier
            .publish(
                code,
                EVENT_TYPING,
                serde_json::json!({
                    "display_name": display_name,
                    "is_typing": is_typing,
                }),
            )
            .await;
    }

    async fn load_all(&self, code: &str) -> Result<Vec<StoredMessage>, RoomError> {
        let raw = self
            .store
            .list_range(&store::messages_key(code), 0, -1)
            .await?;

        raw.iter()
            .map(|entry| {
                serde_json::from_str(entry).map_err(|e| {
                    RoomError::Internal(format!("Corrupt message record: {e}"))
                })
            })
            .collect()
    }

    async fn find_message(
        &self,
        code: &str,
        message_id: &str,
    ) -> Result<(i64, StoredMessage), RoomError> {
        let messages = self.load_all(code).await?;

        messages
            .into_iter()
            .enumerate()
            .find(|(_, m)| m.id == message_id)
            .map(|(i, m)| (i as i64, m))
            .ok_or_else(|| RoomError::NotFound("Message not found".to_string()))
    }

    /// Overwrite the message at its list position (full-record replace).
    async fn write_back(
        &self,
        code: &str,
        index: i64,
        message: &StoredMessage,
    ) -> Result<(), RoomError> {
        let encoded = encode_message(message)?;
        self.store
            .list_set(&store::messages_key(code), index, &encoded)
            .await?;
        Ok(())
    }

    /// Re-expire the room's child keys to the metadata's remaining TTL so
    /// none outlives the room. Housekeeping only: failures are logged.
    async fn resync_ttls(&self, code: &str) {
        let remaining = match self.store.ttl(&store::meta_key(code)).await {
            Ok(remaining) => remaining,
            Err(e) => {
                warn!(target: "room.services.messages", room_code = %code, error = %e, "TTL resync read failed");
                return;
            }
        };

        if remaining <= 0 {
            return;
        }

        for key in [store::messages_key(code), store::members_key(code)] {
            if let Err(e) = self.store.expire(&key, remaining).await {
                warn!(target: "room.services.messages", room_code = %code, key = %key, error = %e, "TTL resync failed");
            }
        }
    }

    /// Broadcast the message under the generic `message` event (same name
    /// for post, react, and delete; clients apply full-replace semantics).
    async fn publish_message(&self, code: &str, message: &StoredMessage) {
        let payload = match serde_json::to_value(message.to_view(None)) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(target: "room.services.messages", room_code = %code, error = %e, "Failed to encode message event");
                return;
            }
        };

        self.notifier.publish(code, EVENT_MESSAGE, payload).await;
    }
}

fn encode_message(message: &StoredMessage) -> Result<String, RoomError> {
    serde_json::to_string(message)
        .map_err(|e| RoomError::Internal(format!("Failed to serialize message: {e}")))
}
