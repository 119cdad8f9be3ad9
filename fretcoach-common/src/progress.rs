//! Progress tracking for a practice session
//!
//! Edge-triggered state machine over the evaluator's "fully matched" flag:
//!
//! ```text
//!   Idle --(match becomes true)--> Matched   score += 1, emits Transition::Matched
//!   Matched --(match becomes false)--> Idle  emits Transition::Released
//!   any --(next_chord)--> Idle               attempts += 1
//!   any --(change_target)--> Idle
//! ```
//!
//! Holding a match across many evaluations counts once.

use serde::{Deserialize, Serialize};

/// Tracker state for the current target chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchState {
    #[default]
    Idle,
    Matched,
}

/// Edge reported by [`ProgressTracker::observe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Entered the matched state; fire the success cue once
    Matched,
    /// Left the matched state; a later match may fire again
    Released,
}

/// Score and attempt counters with the idle/matched state machine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressTracker {
    state: MatchState,
    score: u32,
    attempts: u32,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one evaluation result
    ///
    /// Returns the transition taken, or `None` when the state is unchanged.
    pub fn observe(&mut self, fully_matched: bool) -> Option<Transition> {
        match (self.state, fully_matched) {
            (MatchState::Idle, true) => {
                self.state = MatchState::Matched;
                self.score += 1;
                Some(Transition::Matched)
            }
            (MatchState::Matched, false) => {
                self.state = MatchState::Idle;
                Some(Transition::Released)
            }
            _ => None,
        }
    }

    /// "Next chord" action: counts an attempt and re-arms the cue
    pub fn next_chord(&mut self) {
        self.attempts += 1;
        self.state = MatchState::Idle;
    }

    /// Target chord changed: re-arms without touching the counters
    pub fn change_target(&mut self) {
        self.state = MatchState::Idle;
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn is_matched(&self) -> bool {
        self.state == MatchState::Matched
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Rounded percentage of score over attempts, 0 before any attempt
    pub fn accuracy(&self) -> u32 {
        accuracy(self.score, self.attempts)
    }
}

/// `round(100 * score / attempts)`, or 0 when there are no attempts
///
/// Score is not bounded by attempts, so the result can exceed 100.
pub fn accuracy(score: u32, attempts: u32) -> u32 {
    if attempts == 0 {
        return 0;
    }
    (100.0 * score as f64 / attempts as f64).round() as u32
}
