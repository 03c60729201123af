//! Recording implementation of the event notifier.

use async_trait::async_trait;
use room_service::notify::EventNotifier;
use std::sync::{Arc, Mutex};

/// A captured publish call.
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub room_code: String,
    pub event: String,
    pub payload: serde_json::Value,
}

/// Notifier that records every published event for assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<PublishedEvent>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured events, in publish order.
    pub fn events(&self) -> Vec<PublishedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Captured events for one room, in publish order.
    pub fn events_for(&self, room_code: &str) -> Vec<PublishedEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.room_code == room_code)
            .cloned()
            .collect()
    }

    /// Number of events published under a given name.
    pub fn count_of(&self, event: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.event == event)
            .count()
    }

    /// The most recent event with a given name, if any.
    pub fn last_of(&self, event: &str) -> Option<PublishedEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|e| e.event == event)
            .cloned()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

#[async_trait]
impl EventNotifier for RecordingNotifier {
    async fn publish(&self, room_code: &str, event: &str, payload: serde_json::Value) {
        self.events.lock().unwrap().push(PublishedEvent {
            room_code: room_code.to_string(),
            event: event.to_string(),
            payload,
        });
    }
}
