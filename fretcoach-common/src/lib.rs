//! # FretCoach Common Library
//!
//! Shared code for the FretCoach chord trainer including:
//! - Fretboard positions and geometry
//! - Match evaluation between pressed and target positions
//! - Progress tracking (score, attempts, accuracy)
//! - API wire types for the sensor server
//! - Event types and the event bus
//! - Configuration loading

pub mod api;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod positions;
pub mod progress;

pub use error::{Error, Result};
pub use evaluator::{CellStatus, Evaluation, MatchPolicy};
pub use positions::{Position, PositionSet};
pub use progress::{ProgressTracker, Transition};
