//! Fretboard positions and geometry
//!
//! A [`Position`] is one (fret, string) cell of the sensor grid. The sensor
//! server reports pressed cells as two parallel arrays paired by index;
//! [`PositionSet::build`] turns those into a set with duplicates collapsed.
//!
//! # Geometry
//! The sensor grid has 6 strings and 11 fret columns. Even-numbered columns
//! (0, 2, 4, 6, 8, 10) sit on the fret wires themselves and are
//! structurally unplayable: they never count as pressed or required.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Number of strings on the sensor grid
pub const STRING_COUNT: u32 = 6;

/// Number of fret columns on the sensor grid
pub const FRET_COUNT: u32 = 11;

/// True for the fret-wire columns excluded from all matching
pub fn is_separator_fret(fret: u32) -> bool {
    fret < FRET_COUNT && fret % 2 == 0
}

/// A single (fret, string) coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub fret: u32,
    pub string: u32,
}

impl Position {
    pub fn new(fret: u32, string: u32) -> Self {
        Self { fret, string }
    }

    /// True when the position lies on a separator column
    pub fn is_separator(&self) -> bool {
        is_separator_fret(self.fret)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}/S{}", self.fret, self.string + 1)
    }
}

/// Unordered collection of unique positions
///
/// Iteration order is (fret, string) ascending, which keeps rendering and
/// logging stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionSet {
    positions: BTreeSet<Position>,
}

impl PositionSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from parallel fret/string arrays paired by index
    ///
    /// # Errors
    /// Returns [`Error::MalformedInput`] when the arrays differ in length.
    pub fn build(fret_positions: &[u32], string_positions: &[u32]) -> Result<Self> {
        if fret_positions.len() != string_positions.len() {
            return Err(Error::MalformedInput(format!(
                "fret_positions has {} entries but string_positions has {}",
                fret_positions.len(),
                string_positions.len()
            )));
        }

        Ok(fret_positions
            .iter()
            .zip(string_positions)
            .map(|(&fret, &string)| Position::new(fret, string))
            .collect())
    }

    /// Build a set from signed wire integers
    ///
    /// JSON numbers arrive signed; negative coordinates are rejected along
    /// with mismatched lengths.
    pub fn from_wire(fret_positions: &[i64], string_positions: &[i64]) -> Result<Self> {
        let frets = to_coordinates("fret_positions", fret_positions)?;
        let strings = to_coordinates("string_positions", string_positions)?;
        Self::build(&frets, &strings)
    }

    /// Membership check; duplicates in the source arrays count once
    pub fn contains(&self, fret: u32, string: u32) -> bool {
        self.positions.contains(&Position::new(fret, string))
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter()
    }

    /// Positions that are not on separator columns
    pub fn playable(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter().filter(|p| !p.is_separator())
    }

    /// Split back into parallel (fret, string) arrays
    pub fn to_parallel(&self) -> (Vec<u32>, Vec<u32>) {
        self.positions.iter().map(|p| (p.fret, p.string)).unzip()
    }
}

impl FromIterator<Position> for PositionSet {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for PositionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.positions.iter().map(|p| p.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

fn to_coordinates(field: &str, values: &[i64]) -> Result<Vec<u32>> {
    values
        .iter()
        .map(|&v| {
            u32::try_from(v).map_err(|_| {
                Error::MalformedInput(format!("{} contains invalid coordinate {}", field, v))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_contains_listed_pairs_only() {
        let set = PositionSet::build(&[1, 3, 5], &[1, 3, 4]).unwrap();

        assert!(set.contains(1, 1));
        assert!(set.contains(3, 3));
        assert!(set.contains(5, 4));

        // Same frets and strings, different pairing
        assert!(!set.contains(1, 3));
        assert!(!set.contains(3, 4));
        assert!(!set.contains(7, 0));
    }

    #[test]
    fn test_build_rejects_mismatched_lengths() {
        let result = PositionSet::build(&[1, 3], &[1]);
        assert!(matches!(result, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_duplicates_are_one_member() {
        let set = PositionSet::build(&[3, 3, 3], &[2, 2, 2]).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains(3, 2));
    }

    #[test]
    fn test_empty_arrays_build_empty_set() {
        let set = PositionSet::build(&[], &[]).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_from_wire_rejects_negative_coordinates() {
        let result = PositionSet::from_wire(&[1, -3], &[0, 2]);
        assert!(matches!(result, Err(Error::MalformedInput(_))));

        let result = PositionSet::from_wire(&[1], &[0, 2]);
        assert!(matches!(result, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_separator_columns() {
        for fret in [0, 2, 4, 6, 8, 10] {
            assert!(is_separator_fret(fret), "fret {} should be a separator", fret);
        }
        for fret in [1, 3, 5, 7, 9] {
            assert!(!is_separator_fret(fret), "fret {} should be playable", fret);
        }
    }

    #[test]
    fn test_playable_skips_separators() {
        let set = PositionSet::build(&[0, 1, 2, 3], &[0, 0, 0, 0]).unwrap();
        let playable: Vec<_> = set.playable().copied().collect();
        assert_eq!(playable, vec![Position::new(1, 0), Position::new(3, 0)]);
    }

    #[test]
    fn test_to_parallel_is_sorted() {
        let set = PositionSet::build(&[5, 1, 3], &[4, 1, 3]).unwrap();
        assert_eq!(set.to_parallel(), (vec![1, 3, 5], vec![1, 3, 4]));
    }
}
