//! Room lifecycle handlers.
//!
//! Implements the room endpoints:
//!
//! - `POST   /api/v1/rooms` - Create room (public)
//! - `GET    /api/v1/rooms/{code}/exists` - Presence check (public)
//! - `POST   /api/v1/rooms/{code}/join` - Join room (public)
//! - `GET    /api/v1/rooms/{code}/ttl` - Remaining TTL (member authenticated)
//! - `DELETE /api/v1/rooms/{code}` - Destroy room (member authenticated)
//!
//! Create, exists and join must work for callers who do not yet hold a
//! membership token; everything else sits behind `require_member`.

use crate::errors::RoomError;
use crate::middleware::auth::{extract_token, membership_cookie, MemberAuth};
use crate::models::{
    CreateRoomResponse, DestroyResponse, ExistsResponse, JoinRoomRequest, JoinRoomResponse,
    TtlResponse,
};
use crate::routes::AppState;
use axum::{
    extract::{Path, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /api/v1/rooms
///
/// Creates a new pending room under the grace TTL and returns its code.
///
/// # Response
///
/// - 201 Created: `{ "room_code": "AB12CD" }`
#[instrument(skip_all, name = "room.handler.create", fields(method = "POST", endpoint = "/api/v1/rooms"))]
pub async fn create_room(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), RoomError> {
    let room_code = state.rooms.create().await?;
    Ok((StatusCode::CREATED, Json(CreateRoomResponse { room_code })))
}

/// Handler for GET /api/v1/rooms/{code}/exists
///
/// Presence check used for pre-join validation in the UI. Public.
#[instrument(skip_all, name = "room.handler.exists", fields(room_code = %code))]
pub async fn room_exists(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<ExistsResponse>, RoomError> {
    let exists = state.rooms.exists(&code).await?;
    Ok(Json(ExistsResponse { exists }))
}

/// Handler for POST /api/v1/rooms/{code}/join
///
/// Joins a room. A caller re-presenting a valid membership cookie gets the
/// same token back without consuming a capacity slot. The token is issued
/// as an HTTP-only cookie whose Max-Age mirrors the room's effective TTL.
///
/// # Response
///
/// - 200 OK: `{ "token": "..." }` + Set-Cookie
/// - 404 Not Found: no such room
/// - 409 Conflict: room at capacity
#[instrument(skip_all, name = "room.handler.join", fields(room_code = %code))]
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, RoomError> {
    // An empty body means an anonymous join; otherwise deserialize manually
    // so malformed input yields 400 (not the framework's default 422).
    let request: JoinRoomRequest = if body.is_empty() {
        JoinRoomRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            tracing::debug!(target: "room.handlers.rooms", error = %e, "Invalid join body");
            RoomError::Validation("Invalid request body".to_string())
        })?
    };
    request.validate()?;

    let presented = extract_token(&headers);
    let display_name = request.display_name_or_default();

    let outcome = state
        .rooms
        .join(&code, &display_name, presented.as_deref())
        .await?;

    let cookie = membership_cookie(&outcome.token, outcome.ttl_seconds);

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(JoinRoomResponse {
            token: outcome.token,
        }),
    ))
}

/// Handler for GET /api/v1/rooms/{code}/ttl
///
/// Remaining seconds on the room metadata, floored at zero. Authenticated.
#[instrument(skip_all, name = "room.handler.ttl")]
pub async fn room_ttl(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<MemberAuth>,
) -> Result<Json<TtlResponse>, RoomError> {
    let ttl = state.rooms.remaining_ttl(&auth.room_code).await?;
    Ok(Json(TtlResponse { ttl }))
}

/// Handler for DELETE /api/v1/rooms/{code}
///
/// Destroys the room: announces `room.destroyed`, then removes the room's
/// metadata, membership set and message list. Authenticated; idempotent at
/// the store layer.
#[instrument(skip_all, name = "room.handler.destroy")]
pub async fn destroy_room(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<MemberAuth>,
) -> Result<Json<DestroyResponse>, RoomError> {
    state.rooms.destroy(&auth.room_code).await?;
    Ok(Json(DestroyResponse { destroyed: true }))
}
