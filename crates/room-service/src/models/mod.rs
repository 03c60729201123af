//! Data models for rooms and messages.
//!
//! Stored messages carry the owning membership token; tokens are credentials
//! and never leave the service. Public views replace them with booleans
//! relative to the requesting member (`is_me`, `mine`).

use crate::errors::RoomError;
use serde::{Deserialize, Serialize};

/// Length of generated room codes.
pub const ROOM_CODE_LENGTH: usize = 6;

/// Alphabet for room code generation (uppercase letters + digits).
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Maximum sender display name length.
pub const MAX_SENDER_LEN: usize = 100;

/// Maximum message text length.
pub const MAX_TEXT_LEN: usize = 1000;

/// Maximum emoji field length.
pub const MAX_EMOJI_LEN: usize = 16;

/// Text substituted for a deleted message.
pub const DELETED_TEXT: &str = "This message was deleted.";

/// Display name used when a joiner does not provide one.
pub const DEFAULT_DISPLAY_NAME: &str = "Anonymous";

/// Room lifecycle status. Pending rooms await a first join under the grace
/// TTL; active rooms tick down the live TTL. Removal is key absence, not a
/// status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Pending,
    Active,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Pending => "pending",
            RoomStatus::Active => "active",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RoomStatus::Pending),
            "active" => Some(RoomStatus::Active),
            _ => None,
        }
    }
}

/// Check that a room code is exactly six characters from the code alphabet.
pub fn is_valid_room_code(code: &str) -> bool {
    code.len() == ROOM_CODE_LENGTH
        && code
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
}

/// A reaction as stored: the reactor is a membership token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub emoji: String,
    pub reactor: String,
    pub timestamp: i64,
}

/// A message as stored in the room's message list (JSON-encoded).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub sender: String,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Owning membership token. Authorizes deletion; never exposed.
    pub token: String,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default)]
    pub deleted: bool,
}

impl StoredMessage {
    /// Public view of this message relative to a viewer token.
    ///
    /// `None` is used for broadcast payloads, where no viewer exists and all
    /// ownership flags read false; subscribers re-fetch the list for their
    /// own view.
    pub fn to_view(&self, viewer: Option<&str>) -> MessageView {
        MessageView {
            id: self.id.clone(),
            sender: self.sender.clone(),
            text: self.text.clone(),
            timestamp: self.timestamp,
            is_me: viewer.is_some_and(|t| t == self.token),
            deleted: self.deleted,
            reactions: self
                .reactions
                .iter()
                .map(|r| ReactionView {
                    emoji: r.emoji.clone(),
                    timestamp: r.timestamp,
                    mine: viewer.is_some_and(|t| t == r.reactor),
                })
                .collect(),
        }
    }
}

/// Reaction view with the reactor identity stripped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionView {
    pub emoji: String,
    pub timestamp: i64,
    pub mine: bool,
}

/// Message view returned to clients and carried in events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub id: String,
    pub sender: String,
    pub text: String,
    pub timestamp: i64,
    pub is_me: bool,
    pub deleted: bool,
    pub reactions: Vec<ReactionView>,
}

// ============================================================================
// Request / response DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub room_code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct JoinRoomRequest {
    pub display_name: Option<String>,
}

impl JoinRoomRequest {
    pub fn validate(&self) -> Result<(), RoomError> {
        if let Some(name) = &self.display_name {
            if name.chars().count() > MAX_SENDER_LEN {
                return Err(RoomError::Validation(format!(
                    "display_name must be at most {MAX_SENDER_LEN} characters"
                )));
            }
        }
        Ok(())
    }

    /// Display name with the anonymous fallback applied.
    pub fn display_name_or_default(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => DEFAULT_DISPLAY_NAME.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinRoomResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TtlResponse {
    pub ttl: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DestroyResponse {
    pub destroyed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostMessageRequest {
    pub sender: String,
    pub text: String,
}

impl PostMessageRequest {
    pub fn validate(&self) -> Result<(), RoomError> {
        if self.sender.chars().count() > MAX_SENDER_LEN {
            return Err(RoomError::Validation(format!(
                "sender must be at most {MAX_SENDER_LEN} characters"
            )));
        }
        if self.text.trim().is_empty() {
            return Err(RoomError::Validation("text must not be empty".to_string()));
        }
        if self.text.chars().count() > MAX_TEXT_LEN {
            return Err(RoomError::Validation(format!(
                "text must be at most {MAX_TEXT_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReactRequest {
    pub emoji: String,
}

impl ReactRequest {
    pub fn validate(&self) -> Result<(), RoomError> {
        if self.emoji.is_empty() {
            return Err(RoomError::Validation("emoji must not be empty".to_string()));
        }
        if self.emoji.chars().count() > MAX_EMOJI_LEN {
            return Err(RoomError::Validation(format!(
                "emoji must be at most {MAX_EMOJI_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TypingRequest {
    pub display_name: String,
    pub is_typing: bool,
}

impl TypingRequest {
    pub fn validate(&self) -> Result<(), RoomError> {
        if self.display_name.chars().count() > MAX_SENDER_LEN {
            return Err(RoomError::Validation(format!(
                "display_name must be at most {MAX_SENDER_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_room_status_round_trip() {
        assert_eq!(RoomStatus::parse("pending"), Some(RoomStatus::Pending));
        assert_eq!(RoomStatus::parse("active"), Some(RoomStatus::Active));
        assert_eq!(RoomStatus::parse("destroyed"), None);
        assert_eq!(RoomStatus::Pending.as_str(), "pending");
        assert_eq!(RoomStatus::Active.as_str(), "active");
    }

    #[test]
    fn test_valid_room_codes() {
        assert!(is_valid_room_code("AB12CD"));
        assert!(is_valid_room_code("000000"));
        assert!(is_valid_room_code("ZZZZZZ"));
    }

    #[test]
    fn test_invalid_room_codes() {
        assert!(!is_valid_room_code("ab12cd")); // lowercase
        assert!(!is_valid_room_code("AB12C")); // too short
        assert!(!is_valid_room_code("AB12CDE")); // too long
        assert!(!is_valid_room_code("AB 2CD")); // space
        assert!(!is_valid_room_code("AB-2CD")); // punctuation
    }

    #[test]
    fn test_stored_message_view_is_me() {
        let message = StoredMessage {
            id: "m1".to_string(),
            sender: "alice".to_string(),
            text: "hello".to_string(),
            timestamp: 1234,
            token: "tok-a".to_string(),
            reactions: vec![Reaction {
                emoji: "🔥".to_string(),
                reactor: "tok-b".to_string(),
                timestamp: 1235,
            }],
            deleted: false,
        };

        let view = message.to_view(Some("tok-a"));
        assert!(view.is_me);
        assert!(!view.reactions[0].mine);

        let view = message.to_view(Some("tok-b"));
        assert!(!view.is_me);
        assert!(view.reactions[0].mine);

        let view = message.to_view(None);
        assert!(!view.is_me);
        assert!(!view.reactions[0].mine);
    }

    #[test]
    fn test_view_never_carries_tokens() {
        let message = StoredMessage {
            id: "m1".to_string(),
            sender: "alice".to_string(),
            text: "hello".to_string(),
            timestamp: 1234,
            token: "secret-owner-token".to_string(),
            reactions: vec![Reaction {
                emoji: "👍".to_string(),
                reactor: "secret-reactor-token".to_string(),
                timestamp: 1235,
            }],
            deleted: false,
        };

        let json = serde_json::to_string(&message.to_view(Some("other"))).unwrap();
        assert!(!json.contains("secret-owner-token"));
        assert!(!json.contains("secret-reactor-token"));
    }

    #[test]
    fn test_stored_message_optional_fields_default() {
        // Records written before a react/delete have neither field.
        let json = r#"{"id":"m1","sender":"a","text":"hi","timestamp":1,"token":"t"}"#;
        let message: StoredMessage = serde_json::from_str(json).unwrap();
        assert!(message.reactions.is_empty());
        assert!(!message.deleted);
    }

    #[test]
    fn test_post_message_validation() {
        let ok = PostMessageRequest {
            sender: "alice".to_string(),
            text: "hello".to_string(),
        };
        assert!(ok.validate().is_ok());

        let empty = PostMessageRequest {
            sender: "alice".to_string(),
            text: "   ".to_string(),
        };
        assert!(matches!(empty.validate(), Err(RoomError::Validation(_))));

        let long = PostMessageRequest {
            sender: "alice".to_string(),
            text: "x".repeat(MAX_TEXT_LEN + 1),
        };
        assert!(matches!(long.validate(), Err(RoomError::Validation(_))));
    }

    #[test]
    fn test_join_display_name_fallback() {
        let request = JoinRoomRequest { display_name: None };
        assert_eq!(request.display_name_or_default(), DEFAULT_DISPLAY_NAME);

        let request = JoinRoomRequest {
            display_name: Some("  ".to_string()),
        };
        assert_eq!(request.display_name_or_default(), DEFAULT_DISPLAY_NAME);

        let request = JoinRoomRequest {
            display_name: Some(" bob ".to_string()),
        };
        assert_eq!(request.display_name_or_default(), "bob");
    }

    #[test]
    fn test_react_request_validation() {
        let ok = ReactRequest {
            emoji: "🎉".to_string(),
        };
        assert!(ok.validate().is_ok());

        let empty = ReactRequest {
            emoji: String::new(),
        };
        assert!(matches!(empty.validate(), Err(RoomError::Validation(_))));
    }
}
