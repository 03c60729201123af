//! Vanish Room Service Library
//!
//! Core functionality for Vanish - ephemeral, self-destructing chat rooms.
//! Anonymous participants join a short-lived room via a shared code,
//! exchange messages and reactions, and the entire room disappears when its
//! TTL elapses or a participant destroys it.
//!
//! # Architecture
//!
//! The service follows a Handler -> Service -> Store pattern:
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/*.rs -> store (KeyValueStore)
//! ```
//!
//! Expiry is store-native: every room-owned key carries a TTL kept in sync
//! with the room metadata, and no reaper task exists.
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error taxonomy with HTTP status code mapping
//! - `models` - Room and message data models
//! - `store` - TTL key-value store contract + Redis adapter
//! - `notify` - Fire-and-forget event notifier (Redis PUB/SUB)
//! - `services` - Room lifecycle manager and message store
//! - `middleware` - Membership token authentication, HTTP metrics
//! - `observability` - Prometheus metrics definitions
//! - `handlers` - HTTP request handlers
//! - `routes` - Axum router setup

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod observability;
pub mod routes;
pub mod services;
pub mod store;
