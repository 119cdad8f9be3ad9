//! Practice session: the composition root of the trainer
//!
//! Owns the chord registry, the current target, the latest sensor state,
//! the progress tracker and the notification log. Sensor updates and target
//! resolutions arrive independently and in any order; every arrival
//! re-evaluates the board and feeds the tracker.
//!
//! Target resolution is asynchronous. [`PracticeSession::select_chord`]
//! returns a [`TargetTicket`]; the driver resolves it against the registry
//! and hands the result back through [`PracticeSession::apply_resolution`].
//! Results for a target that has since changed are ignored.

use crate::notifications::{NotificationKind, NotificationLog};
use crate::registry::ChordRegistry;
use crate::sensor::SensorState;
use chrono::Utc;
use fretcoach_common::events::{EventBus, PracticeEvent};
use fretcoach_common::{Error, Evaluation, MatchPolicy, PositionSet, ProgressTracker, Result, Transition};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where the target's reference fingering stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetResolution {
    Pending,
    Resolved(PositionSet),
    /// Registry has no such chord; nothing is highlighted
    Unknown,
    /// Lookup failed; the driver may try again
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetState {
    pub chord: String,
    pub resolution: TargetResolution,
    generation: u64,
    // Consecutive failed lookups, so an outage is reported once
    failures: u32,
}

impl TargetState {
    pub fn positions(&self) -> Option<&PositionSet> {
        match &self.resolution {
            TargetResolution::Resolved(positions) => Some(positions),
            _ => None,
        }
    }
}

/// Request to resolve a target chord
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetTicket {
    pub chord: String,
    generation: u64,
}

impl TargetTicket {
    /// Resolve against the registry
    pub async fn resolve(self, registry: &ChordRegistry) -> (TargetTicket, Result<PositionSet>) {
        let result = registry.resolve(&self.chord).await;
        (self, result)
    }
}

pub struct PracticeSession {
    registry: Arc<ChordRegistry>,
    events: EventBus,
    notifications: NotificationLog,
    policy: MatchPolicy,
    target: Option<TargetState>,
    sensor: SensorState,
    tracker: ProgressTracker,
    evaluation: Evaluation,
    generation: u64,
    // Last connectivity seen, to report outages once rather than per tick
    was_connected: Option<bool>,
}

impl PracticeSession {
    pub fn new(
        registry: Arc<ChordRegistry>,
        events: EventBus,
        notifications: NotificationLog,
        policy: MatchPolicy,
    ) -> Self {
        let sensor = SensorState::default();
        let evaluation = Evaluation::compute(&sensor.positions, None, policy);
        Self {
            registry,
            events,
            notifications,
            policy,
            target: None,
            sensor,
            tracker: ProgressTracker::new(),
            evaluation,
            generation: 0,
            was_connected: None,
        }
    }

    pub fn registry(&self) -> &Arc<ChordRegistry> {
        &self.registry
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn target(&self) -> Option<&TargetState> {
        self.target.as_ref()
    }

    pub fn sensor(&self) -> &SensorState {
        &self.sensor
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    pub fn notifications(&self) -> &NotificationLog {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationLog {
        &mut self.notifications
    }

    /// Classifier label equals the target chord name
    ///
    /// Informational only; scoring follows the position match.
    pub fn label_matches_target(&self) -> bool {
        match (&self.target, &self.sensor.label) {
            (Some(target), Some(label)) => &target.chord == label,
            _ => false,
        }
    }

    /// Make `chord` the target; the fingering starts out unresolved
    pub fn select_chord(&mut self, chord: impl Into<String>) -> TargetTicket {
        let chord = chord.into();
        self.generation += 1;
        self.target = Some(TargetState {
            chord: chord.clone(),
            resolution: TargetResolution::Pending,
            generation: self.generation,
            failures: 0,
        });
        self.tracker.change_target();

        info!(chord = %chord, "Target chord selected");
        self.events.emit_lossy(PracticeEvent::TargetChanged {
            chord: chord.clone(),
            timestamp: Utc::now(),
        });
        self.reevaluate();

        TargetTicket {
            chord,
            generation: self.generation,
        }
    }

    /// Ticket to re-resolve the current target after a failed lookup
    ///
    /// Moves the target back to pending so only one retry is outstanding.
    pub fn retry_ticket(&mut self) -> Option<TargetTicket> {
        let target = self.target.as_mut()?;
        if !matches!(target.resolution, TargetResolution::Failed(_)) {
            return None;
        }
        target.resolution = TargetResolution::Pending;
        debug!(chord = %target.chord, "Retrying target lookup");
        Some(TargetTicket {
            chord: target.chord.clone(),
            generation: target.generation,
        })
    }

    /// Apply a registry answer; returns false for a stale ticket
    pub fn apply_resolution(&mut self, ticket: TargetTicket, result: Result<PositionSet>) -> bool {
        let Some(target) = self.target.as_mut() else {
            return false;
        };
        if target.generation != ticket.generation {
            debug!(chord = %ticket.chord, "Ignoring resolution for a previous target");
            return false;
        }

        let chord = target.chord.clone();
        match result {
            Ok(positions) => {
                info!(chord = %chord, positions = %positions, "Target fingering resolved");
                self.events.emit_lossy(PracticeEvent::TargetResolved {
                    chord,
                    positions: positions.len(),
                    timestamp: Utc::now(),
                });
                target.resolution = TargetResolution::Resolved(positions);
                target.failures = 0;
            }
            Err(Error::NotFound(_)) => {
                warn!(chord = %chord, "Target chord not found in registry");
                target.resolution = TargetResolution::Unknown;
                self.notifications.add(
                    format!("No fingering known for '{}'", chord),
                    NotificationKind::Warning,
                    true,
                );
                self.events.emit_lossy(PracticeEvent::TargetUnknown {
                    chord,
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                target.resolution = TargetResolution::Failed(e.to_string());
                target.failures += 1;
                if target.failures == 1 {
                    warn!(chord = %chord, "Target lookup failed: {}", e);
                    self.notifications.add(
                        format!("Could not load chord '{}': {}", chord, e),
                        NotificationKind::Error,
                        true,
                    );
                } else {
                    debug!(
                        chord = %chord,
                        failures = target.failures,
                        "Target lookup still failing: {}",
                        e
                    );
                }
            }
        }

        self.reevaluate();
        true
    }

    /// Take the latest sensor state
    pub fn apply_sensor(&mut self, state: SensorState) {
        let connected = state.connected;
        let error = state.error.clone();
        self.sensor = state;

        match (self.was_connected, connected) {
            (Some(true), false) | (None, false) => {
                let message = error.unwrap_or_else(|| "Failed to connect to server".to_string());
                self.notifications
                    .add(message.clone(), NotificationKind::Error, true);
                self.events.emit_lossy(PracticeEvent::SensorDisconnected {
                    message,
                    timestamp: Utc::now(),
                });
            }
            (Some(false), true) => {
                self.notifications
                    .add("Sensor reconnected", NotificationKind::Info, true);
                self.events.emit_lossy(PracticeEvent::SensorReconnected {
                    timestamp: Utc::now(),
                });
            }
            _ => {}
        }
        self.was_connected = Some(connected);

        self.reevaluate();
    }

    /// "Next practice": count an attempt and re-arm the success cue
    pub fn next_chord(&mut self) {
        self.tracker.next_chord();
        let chord = self.target.as_ref().map(|t| t.chord.clone()).unwrap_or_default();
        info!(chord = %chord, attempts = self.tracker.attempts(), "Next attempt");
        self.events.emit_lossy(PracticeEvent::AttemptAdvanced {
            chord,
            attempts: self.tracker.attempts(),
            timestamp: Utc::now(),
        });
        // Re-arming may immediately re-enter the matched state
        self.reevaluate();
    }

    /// Leave practice: drop the target and re-arm
    pub fn back(&mut self) {
        self.generation += 1;
        self.target = None;
        self.tracker.change_target();
        self.reevaluate();
    }

    fn reevaluate(&mut self) {
        let target = self.target.as_ref().and_then(TargetState::positions);
        self.evaluation = Evaluation::compute(&self.sensor.positions, target, self.policy);

        let Some(transition) = self.tracker.observe(self.evaluation.fully_matched) else {
            return;
        };
        let chord = self.target.as_ref().map(|t| t.chord.clone()).unwrap_or_default();

        match transition {
            Transition::Matched => {
                info!(
                    chord = %chord,
                    score = self.tracker.score(),
                    "Chord matched"
                );
                self.notifications
                    .add("Correct! Great job!", NotificationKind::Success, true);
                self.events.emit_lossy(PracticeEvent::ChordMatched {
                    chord,
                    score: self.tracker.score(),
                    attempts: self.tracker.attempts(),
                    timestamp: Utc::now(),
                });
            }
            Transition::Released => {
                debug!(chord = %chord, "Chord released");
                self.events.emit_lossy(PracticeEvent::ChordReleased {
                    chord,
                    timestamp: Utc::now(),
                });
            }
        }
    }
}
