//! Message handlers.
//!
//! Implements the message endpoints, all member-authenticated:
//!
//! - `POST   /api/v1/rooms/{code}/messages` - Post message
//! - `GET    /api/v1/rooms/{code}/messages` - List messages
//! - `POST   /api/v1/rooms/{code}/messages/{id}/reactions` - Toggle reaction
//! - `DELETE /api/v1/rooms/{code}/messages/{id}` - Delete own message
//! - `POST   /api/v1/rooms/{code}/typing` - Typing signal (transient)
//!
//! The room code is taken from the authenticated membership, not re-read
//! from the path.

use crate::errors::RoomError;
use crate::middleware::auth::MemberAuth;
use crate::models::{
    ListMessagesResponse, MessageView, PostMessageRequest, ReactRequest, TypingRequest,
};
use crate::routes::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

/// Path params for message-scoped routes. The room code is taken from the
/// authenticated membership, so only the message id is deserialized.
#[derive(Deserialize)]
pub struct MessagePath {
    id: String,
}

/// Deserialize a request body manually so malformed input yields 400
/// (not the framework's default 422).
fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, RoomError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(target: "room.handlers.messages", error = %e, "Invalid request body");
        RoomError::Validation("Invalid request body".to_string())
    })
}

/// Handler for POST /api/v1/rooms/{code}/messages
///
/// Appends a message to the room's log.
///
/// # Response
///
/// - 201 Created: the message view (with `is_me = true`)
/// - 410 Gone: room expired between authentication and the post
#[instrument(skip_all, name = "room.handler.post_message")]
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<MemberAuth>,
    body: axum::body::Bytes,
) -> Result<(StatusCode, Json<MessageView>), RoomError> {
    let request: PostMessageRequest = parse_body(&body)?;
    request.validate()?;

    let view = state
        .messages
        .post(&auth.room_code, &auth.token, &request.sender, &request.text)
        .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Handler for GET /api/v1/rooms/{code}/messages
///
/// All messages in append order, with ownership flags computed relative to
/// the caller's token.
#[instrument(skip_all, name = "room.handler.list_messages")]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<MemberAuth>,
) -> Result<Json<ListMessagesResponse>, RoomError> {
    let messages = state.messages.list(&auth.room_code, &auth.token).await?;
    Ok(Json(ListMessagesResponse { messages }))
}

/// Handler for POST /api/v1/rooms/{code}/messages/{id}/reactions
///
/// Toggles the caller's reaction with the given emoji on a message.
///
/// # Response
///
/// - 200 OK: the updated message view
/// - 404 Not Found: no message with that id
#[instrument(skip_all, name = "room.handler.react")]
pub async fn react_to_message(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<MemberAuth>,
    Path(path): Path<MessagePath>,
    body: axum::body::Bytes,
) -> Result<Json<MessageView>, RoomError> {
    let request: ReactRequest = parse_body(&body)?;
    request.validate()?;

    let view = state
        .messages
        .react(&auth.room_code, &auth.token, &path.id, &request.emoji)
        .await?;

    Ok(Json(view))
}

/// Handler for DELETE /api/v1/rooms/{code}/messages/{id}
///
/// Marks the caller's own message deleted.
///
/// # Response
///
/// - 200 OK: the updated view (placeholder text, `deleted = true`)
/// - 401 Unauthorized: caller is not the author
/// - 404 Not Found: no message with that id
#[instrument(skip_all, name = "room.handler.delete_message")]
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<MemberAuth>,
    Path(path): Path<MessagePath>,
) -> Result<Json<MessageView>, RoomError> {
    let view = state
        .messages
        .delete(&auth.room_code, &auth.token, &path.id)
        .await?;

    Ok(Json(view))
}

/// Handler for POST /api/v1/rooms/{code}/typing
///
/// Forwards a transient typing signal; nothing is persisted.
///
/// # Response
///
/// - 202 Accepted
#[instrument(skip_all, name = "room.handler.typing")]
pub async fn typing(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<MemberAuth>,
    body: axum::body::Bytes,
) -> Result<StatusCode, RoomError> {
    let request: TypingRequest = parse_body(&body)?;
    request.validate()?;

    state
        .messages
        .typing(&auth.room_code, &request.display_name, request.is_typing)
        .await;

    Ok(StatusCode::ACCEPTED)
}
