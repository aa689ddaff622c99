//! Station Event System
//!
//! Lifecycle notifications over `tokio::sync::broadcast`. Events are published
//! while the station lock is still held, so every subscriber sees them in the
//! order the operations took effect.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{Call, User};

/// Events published by the station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationEvent {
    /// A user joined the registered set
    UserAdded { user: User },

    /// A user left the registered set
    UserRemoved { user: User },

    /// A call record was created or replaced
    CallUpdated { call: Call },
}

/// Broadcast side of the station event stream
#[derive(Debug, Clone)]
pub struct EventPublisher {
    tx: broadcast::Sender<StationEvent>,
}

impl EventPublisher {
    /// Create a publisher whose channel buffers `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event; having no subscribers is not an error
    pub fn publish(&self, event: StationEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("No station event subscribers");
        }
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<StationEvent> {
        self.tx.subscribe()
    }
}
