//! Push sensor feed
//!
//! Stand-in for a real-time transport (such as the server's `/ws/sensor`
//! socket): whatever receives messages holds a [`PushHandle`] and pushes
//! them in. Pushes are applied only while the feed is started.

use super::{SensorFeed, SensorState};
use fretcoach_common::api::types::ProcessedReading;
use fretcoach_common::config::StaleReadingPolicy;
use fretcoach_common::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Feed driven by an external push transport
pub struct PushFeed {
    tx: Arc<watch::Sender<SensorState>>,
    running: Arc<AtomicBool>,
    policy: StaleReadingPolicy,
}

/// Sending side handed to the transport
#[derive(Clone)]
pub struct PushHandle {
    tx: Arc<watch::Sender<SensorState>>,
    running: Arc<AtomicBool>,
    policy: StaleReadingPolicy,
}

impl PushFeed {
    pub fn new(policy: StaleReadingPolicy) -> Self {
        let (tx, _) = watch::channel(SensorState::default());
        Self {
            tx: Arc::new(tx),
            running: Arc::new(AtomicBool::new(false)),
            policy,
        }
    }

    pub fn handle(&self) -> PushHandle {
        PushHandle {
            tx: Arc::clone(&self.tx),
            running: Arc::clone(&self.running),
            policy: self.policy,
        }
    }
}

impl SensorFeed for PushFeed {
    fn start(&mut self) {
        self.running.store(true, Ordering::SeqCst);
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> watch::Receiver<SensorState> {
        self.tx.subscribe()
    }
}

impl PushHandle {
    /// Apply a decoded reading; returns false when the feed is stopped
    pub fn push(&self, reading: ProcessedReading) -> bool {
        self.apply(Ok(reading))
    }

    /// Apply an arbitrary JSON message
    ///
    /// Messages that do not decode as a processed reading count as a failed
    /// reading.
    pub fn push_json(&self, message: serde_json::Value) -> bool {
        let result = serde_json::from_value::<ProcessedReading>(message)
            .map_err(|e| Error::MalformedInput(format!("Unexpected sensor message: {}", e)));
        self.apply(result)
    }

    /// Report a transport failure
    pub fn report_error(&self, message: impl Into<String>) -> bool {
        self.apply(Err(Error::UpstreamUnavailable(message.into())))
    }

    fn apply(&self, result: fretcoach_common::Result<ProcessedReading>) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            debug!("Dropping sensor push while feed is stopped");
            return false;
        }
        let policy = self.policy;
        self.tx.send_modify(|state| state.apply(result, policy));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pushes_apply_only_while_running() {
        let mut feed = PushFeed::new(StaleReadingPolicy::Preserve);
        let handle = feed.handle();
        let rx = feed.subscribe();

        let message = json!({"chord": "E minor", "fret_positions": [3, 3], "string_positions": [3, 4]});
        assert!(!handle.push_json(message.clone()));
        assert!(rx.borrow().positions.is_empty());

        feed.start();
        assert!(handle.push_json(message));
        assert!(rx.borrow().positions.contains(3, 4));
        assert_eq!(rx.borrow().label.as_deref(), Some("E minor"));

        feed.stop();
        assert!(!handle.report_error("socket closed"));
        assert!(rx.borrow().connected);
    }

    #[test]
    fn test_unexpected_message_marks_disconnected() {
        let mut feed = PushFeed::new(StaleReadingPolicy::Clear);
        let handle = feed.handle();
        let rx = feed.subscribe();
        feed.start();

        handle.push(ProcessedReading {
            chord: None,
            fret_positions: vec![1],
            string_positions: vec![1],
        });
        handle.push_json(json!({"fret_positions": "nope"}));

        let state = rx.borrow();
        assert!(!state.connected);
        assert!(state.positions.is_empty());
    }
}
