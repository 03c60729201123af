//! Membership authentication middleware.
//!
//! Protected routes require the caller to present their membership token
//! (an HTTP-only cookie issued at join) for the room named in the path.
//! The gate is a set-membership check against the room's members key.
//!
//! Deliberately skipped for create, join and exists: those must work for a
//! participant who does not yet hold a token.

use crate::errors::RoomError;
use crate::store::{self, KeyValueStore};
use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

/// Cookie carrying the membership token. HTTP-only; its Max-Age mirrors the
/// room's TTL at issuance time.
pub const ROOM_TOKEN_COOKIE: &str = "room_token";

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// Store used for the membership check.
    pub store: Arc<dyn KeyValueStore>,
}

/// Authenticated membership, injected into request extensions for handlers.
#[derive(Debug, Clone)]
pub struct MemberAuth {
    pub room_code: String,
    pub token: String,
}

/// Path params for protected room routes. Routes may carry extra params
/// (e.g. a message id); only the room code matters here.
#[derive(Deserialize)]
pub(crate) struct RoomPath {
    code: String,
}

/// Extract the membership token from the Cookie header.
///
/// Also used by the join handler for the idempotent re-join path, which runs
/// before any membership exists.
pub fn extract_token(headers: &axum::http::HeaderMap) -> Option<String> {
    let cookies = headers.get("cookie")?.to_str().ok()?;

    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == ROOM_TOKEN_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

/// Build the Set-Cookie value issuing a membership token.
pub fn membership_cookie(token: &str, max_age_seconds: i64) -> String {
    format!("{ROOM_TOKEN_COOKIE}={token}; Max-Age={max_age_seconds}; Path=/; HttpOnly; SameSite=Lax")
}

/// Membership authentication middleware.
///
/// # Response
///
/// - Returns 401 Unauthorized if the token cookie is missing or the token
///   is not a member of the room
/// - Continues to the next handler with `MemberAuth` in extensions otherwise
#[instrument(skip_all, name = "room.middleware.auth")]
pub async fn require_member(
    State(state): State<Arc<AuthState>>,
    Path(path): Path<RoomPath>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, RoomError> {
    let token = extract_token(req.headers()).ok_or_else(|| {
        tracing::debug!(target: "room.middleware.auth", "Missing membership token cookie");
        RoomError::Unauthorized("Missing room code or token".to_string())
    })?;

    let is_member = state
        .store
        .set_contains(&store::members_key(&path.code), &token)
        .await?;

    if !is_member {
        tracing::debug!(
            target: "room.middleware.auth",
            room_code = %path.code,
            "Token is not a member of the room"
        );
        return Err(RoomError::Unauthorized("Invalid token".to_string()));
    }

    req.extensions_mut().insert(MemberAuth {
        room_code: path.code,
        token,
    });

    Ok(next.run(req).await)
}
