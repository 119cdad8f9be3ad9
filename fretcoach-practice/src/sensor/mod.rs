//! Sensor feeds: where the current pressed positions come from
//!
//! # Components
//! - `poller.rs`: HTTP polling of `/api/sensor/processed` on a fixed interval
//! - `push.rs`: readings pushed in by an external transport
//!
//! Both publish [`SensorState`] on a `tokio::sync::watch` channel, so a
//! consumer only ever sees the latest state (last write wins).

pub mod poller;
pub mod push;

pub use poller::SensorPoller;
pub use push::{PushFeed, PushHandle};

use chrono::{DateTime, Utc};
use fretcoach_common::api::types::ProcessedReading;
use fretcoach_common::config::StaleReadingPolicy;
use fretcoach_common::{PositionSet, Result};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Latest observation from the sensor server
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorState {
    pub positions: PositionSet,
    /// Classifier's best guess at the chord being played
    pub label: Option<String>,
    pub connected: bool,
    pub error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
    /// Number of results applied so far
    pub updates: u64,
}

impl SensorState {
    /// Fold one fetch result into the state
    ///
    /// A failed fetch marks the feed disconnected; the previous positions
    /// survive or are dropped according to `policy`.
    pub fn apply(&mut self, result: Result<ProcessedReading>, policy: StaleReadingPolicy) {
        self.updates += 1;

        let outcome = result.and_then(|reading| {
            let positions = reading.to_position_set()?;
            Ok((positions, reading.chord))
        });

        match outcome {
            Ok((positions, label)) => {
                if !self.connected {
                    debug!("Sensor feed connected");
                }
                self.positions = positions;
                self.label = label;
                self.connected = true;
                self.error = None;
                self.last_success = Some(Utc::now());
            }
            Err(e) => {
                if self.connected {
                    warn!("Sensor feed lost: {}", e);
                }
                self.connected = false;
                self.error = Some(e.to_string());
                if policy == StaleReadingPolicy::Clear {
                    self.positions = PositionSet::new();
                    self.label = None;
                }
            }
        }
    }
}

/// Source of sensor readings, polling or push
///
/// `start` begins delivering readings (idempotent), `stop` ends delivery and
/// leaves the last state visible, `subscribe` hands out a receiver that
/// always holds the latest state.
pub trait SensorFeed: Send {
    fn start(&mut self);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
    fn subscribe(&self) -> watch::Receiver<SensorState>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use fretcoach_common::Error;

    fn reading(frets: &[i64], strings: &[i64]) -> ProcessedReading {
        ProcessedReading {
            chord: Some("Unknown".to_string()),
            fret_positions: frets.to_vec(),
            string_positions: strings.to_vec(),
        }
    }

    #[test]
    fn test_success_replaces_state() {
        let mut state = SensorState::default();
        state.apply(Ok(reading(&[1, 3], &[1, 3])), StaleReadingPolicy::Preserve);

        assert!(state.connected);
        assert!(state.error.is_none());
        assert!(state.positions.contains(3, 3));
        assert_eq!(state.label.as_deref(), Some("Unknown"));
        assert!(state.last_success.is_some());

        state.apply(Ok(reading(&[5], &[0])), StaleReadingPolicy::Preserve);
        assert!(!state.positions.contains(3, 3));
        assert!(state.positions.contains(5, 0));
        assert_eq!(state.updates, 2);
    }

    #[test]
    fn test_failure_preserves_positions() {
        let mut state = SensorState::default();
        state.apply(Ok(reading(&[1], &[1])), StaleReadingPolicy::Preserve);
        state.apply(
            Err(Error::UpstreamUnavailable("Server error: 500".to_string())),
            StaleReadingPolicy::Preserve,
        );

        assert!(!state.connected);
        assert!(state.error.as_deref().unwrap().contains("Server error: 500"));
        assert!(state.positions.contains(1, 1));
    }

    #[test]
    fn test_failure_clears_positions_when_configured() {
        let mut state = SensorState::default();
        state.apply(Ok(reading(&[1], &[1])), StaleReadingPolicy::Clear);
        state.apply(
            Err(Error::UpstreamUnavailable("timeout".to_string())),
            StaleReadingPolicy::Clear,
        );

        assert!(!state.connected);
        assert!(state.positions.is_empty());
        assert!(state.label.is_none());
    }

    #[test]
    fn test_malformed_reading_counts_as_failure() {
        let mut state = SensorState::default();
        state.apply(Ok(reading(&[1], &[1])), StaleReadingPolicy::Preserve);
        state.apply(Ok(reading(&[1, 3], &[1])), StaleReadingPolicy::Preserve);

        assert!(!state.connected);
        assert!(state.error.as_deref().unwrap().starts_with("Malformed input"));
        assert!(state.positions.contains(1, 1));
    }
}
