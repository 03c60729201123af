//! HTTP middleware for the room service.

pub mod auth;
pub mod http_metrics;

pub use auth::{
    extract_token, membership_cookie, require_member, AuthState, MemberAuth, ROOM_TOKEN_COOKIE,
};
pub use http_metrics::http_metrics_middleware;
