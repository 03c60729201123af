//! HTTP routes for the room service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_member, AuthState};
use crate::notify::EventNotifier;
use crate::services::{MessageService, RoomPolicy, RoomService};
use crate::store::KeyValueStore;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Injected store adapter (also used by the auth middleware).
    pub store: Arc<dyn KeyValueStore>,

    /// Room lifecycle manager.
    pub rooms: RoomService,

    /// Message store.
    pub messages: MessageService,

    /// Service configuration.
    pub config: Config,
}

impl AppState {
    /// Assemble application state from the injected seams.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn EventNotifier>,
        config: Config,
    ) -> Self {
        let policy = RoomPolicy::from(&config);
        Self {
            rooms: RoomService::new(store.clone(), notifier.clone(), policy),
            messages: MessageService::new(store.clone(), notifier),
            store,
            config,
        }
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health`, `/ready` - probes, public, unversioned
/// - `/metrics` - Prometheus metrics endpoint - public, unversioned
/// - `POST /api/v1/rooms`, `.../exists`, `.../join` - public room endpoints
/// - TTL, destroy, and all message endpoints gated by `require_member`
/// - HTTP metrics middleware recording every response
/// - TraceLayer for request logging
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let auth_state = Arc::new(AuthState {
        store: state.store.clone(),
    });

    // Metrics endpoint for Prometheus scraping
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Public routes (no membership required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/api/v1/rooms", post(handlers::create_room))
        .route("/api/v1/rooms/:code/exists", get(handlers::room_exists))
        .route("/api/v1/rooms/:code/join", post(handlers::join_room))
        .with_state(state.clone());

    // Protected routes (membership token required)
    let protected_routes = Router::new()
        .route("/api/v1/rooms/:code/ttl", get(handlers::room_ttl))
        .route("/api/v1/rooms/:code", delete(handlers::destroy_room))
        .route(
            "/api/v1/rooms/:code/messages",
            post(handlers::post_message).get(handlers::list_messages),
        )
        .route(
            "/api/v1/rooms/:code/messages/:id/reactions",
            post(handlers::react_to_message),
        )
        .route(
            "/api/v1/rooms/:code/messages/:id",
            delete(handlers::delete_message),
        )
        .route("/api/v1/rooms/:code/typing", post(handlers::typing))
        .route_layer(middleware::from_fn_with_state(auth_state, require_member))
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - timeout the request (innermost)
    // 2. TraceLayer - log request details
    // 3. http_metrics_middleware - record ALL responses (outermost),
    //    including framework-level errors that never reach a handler
    public_routes
        .merge(protected_routes)
        .merge(metrics_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(http_metrics_middleware))
}
