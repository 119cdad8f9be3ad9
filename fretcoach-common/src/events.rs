//! Event types for the FretCoach event system
//!
//! The practice session publishes these on an [`EventBus`]; the success cue
//! player and the terminal front end subscribe.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// FretCoach event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PracticeEvent {
    /// Target chord selected (reference fingering may still be resolving)
    TargetChanged {
        chord: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Reference fingering resolved for the target chord
    TargetResolved {
        chord: String,
        positions: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Target chord is not in the registry; nothing is highlighted
    TargetUnknown {
        chord: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Entered the fully-matched state (fires once per entry)
    ChordMatched {
        chord: String,
        score: u32,
        attempts: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Left the fully-matched state
    ChordReleased {
        chord: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// User advanced to the next attempt
    AttemptAdvanced {
        chord: String,
        attempts: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// First failed poll after a healthy period
    SensorDisconnected {
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// First successful poll after an outage
    SensorReconnected {
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PracticeEvent {
    /// Event name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            PracticeEvent::TargetChanged { .. } => "TargetChanged",
            PracticeEvent::TargetResolved { .. } => "TargetResolved",
            PracticeEvent::TargetUnknown { .. } => "TargetUnknown",
            PracticeEvent::ChordMatched { .. } => "ChordMatched",
            PracticeEvent::ChordReleased { .. } => "ChordReleased",
            PracticeEvent::AttemptAdvanced { .. } => "AttemptAdvanced",
            PracticeEvent::SensorDisconnected { .. } => "SensorDisconnected",
            PracticeEvent::SensorReconnected { .. } => "SensorReconnected",
        }
    }
}

/// Broadcast bus for [`PracticeEvent`]s
///
/// Lagging subscribers lose the oldest events rather than blocking the
/// publisher.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PracticeEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use fretcoach_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(64);
    /// assert_eq!(event_bus.capacity(), 64);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<PracticeEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PracticeEvent,
    ) -> Result<usize, broadcast::error::SendError<PracticeEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PracticeEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
