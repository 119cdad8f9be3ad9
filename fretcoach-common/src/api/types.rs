//! Sensor server request/response types
//!
//! Positions travel as two parallel integer arrays paired by index:
//! `fret_positions[i]` and `string_positions[i]` together name one cell.

use crate::positions::PositionSet;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ========================================
// Chord Registry Types
// ========================================

/// Reference fingering for one chord
///
/// # Examples
///
/// ```
/// use fretcoach_common::api::types::ChordShape;
///
/// let shape: ChordShape = serde_json::from_str(
///     r#"{"fret_positions": [1, 3, 5], "string_positions": [1, 3, 4]}"#,
/// ).unwrap();
/// assert!(shape.to_position_set().unwrap().contains(3, 3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChordShape {
    pub fret_positions: Vec<i64>,
    pub string_positions: Vec<i64>,
}

impl ChordShape {
    pub fn to_position_set(&self) -> Result<PositionSet> {
        PositionSet::from_wire(&self.fret_positions, &self.string_positions)
    }
}

/// `GET /api/chords` body: chord name → reference fingering
pub type ChordTable = BTreeMap<String, ChordShape>;

/// `GET /api/chords/{name}` body
///
/// The server answers with an explicit error payload, the bare shape, or a
/// one-entry table keyed by the chord name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChordLookupResponse {
    Error { error: String },
    Shape(ChordShape),
    Table(ChordTable),
}

impl ChordLookupResponse {
    /// Extract the shape for `name`, if the payload carries one
    pub fn into_shape(self, name: &str) -> Option<ChordShape> {
        match self {
            ChordLookupResponse::Error { .. } => None,
            ChordLookupResponse::Shape(shape) => Some(shape),
            ChordLookupResponse::Table(mut table) => table.remove(name),
        }
    }
}

// ========================================
// Sensor Types
// ========================================

/// `POST /api/sensor/processed` body
///
/// `chord` is the classifier's best guess ("Unknown" when nothing matches,
/// `null` before the first reading).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProcessedReading {
    #[serde(default)]
    pub chord: Option<String>,
    #[serde(default)]
    pub fret_positions: Vec<i64>,
    #[serde(default)]
    pub string_positions: Vec<i64>,
}

impl ProcessedReading {
    pub fn to_position_set(&self) -> Result<PositionSet> {
        PositionSet::from_wire(&self.fret_positions, &self.string_positions)
    }
}

// ========================================
// Tests
// ========================================
