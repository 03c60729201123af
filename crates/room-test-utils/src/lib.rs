//! Test utilities for the Vanish room service.
//!
//! Provides in-memory doubles for the service's two external seams:
//!
//! - [`MockStore`] - the key-value store contract, with per-key TTLs driven
//!   by a controllable logical clock (no sleeping in tests)
//! - [`RecordingNotifier`] - captures published events for assertions
//!
//! # Example
//!
//! ```rust,ignore
//! let store = MockStore::new();
//! let notifier = RecordingNotifier::new();
//!
//! // ... drive the services ...
//!
//! store.advance(601);           // live TTL elapses
//! assert!(!store.key_exists_sync("room:AB12CD:meta"));
//! assert_eq!(notifier.count_of("message"), 3);
//! ```

mod mock_store;
mod recording_notifier;

pub use mock_store::MockStore;
pub use recording_notifier::{PublishedEvent, RecordingNotifier};
