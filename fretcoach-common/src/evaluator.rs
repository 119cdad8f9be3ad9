//! Match evaluation between pressed and target positions
//!
//! Pure functions over two [`PositionSet`]s: what the sensor reports as
//! pressed ("current") and what the chord requires ("target"). The target
//! may be unresolved, in which case nothing is a target and nothing is
//! correct.
//!
//! Separator frets are excluded everywhere: they are never active, never
//! target, and never count towards a full match.

use crate::positions::{is_separator_fret, PositionSet, FRET_COUNT, STRING_COUNT};
use serde::{Deserialize, Serialize};

/// How strictly the pressed positions must match the chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Every target position pressed; extra presses tolerated
    #[default]
    Subset,
    /// Every target position pressed and nothing else
    Exact,
}

/// Display status of one fretboard cell
///
/// Variants are listed in precedence order: the first that applies wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellStatus {
    Separator,
    Correct,
    Active,
    Target,
    Empty,
}

/// Read-only view over the current and target sets
#[derive(Debug, Clone, Copy)]
pub struct MatchEvaluator<'a> {
    current: &'a PositionSet,
    target: Option<&'a PositionSet>,
}

impl<'a> MatchEvaluator<'a> {
    pub fn new(current: &'a PositionSet, target: Option<&'a PositionSet>) -> Self {
        Self { current, target }
    }

    /// Pressed and not on a separator
    pub fn is_active(&self, fret: u32, string: u32) -> bool {
        !is_separator_fret(fret) && self.current.contains(fret, string)
    }

    /// Required by the target and not on a separator
    pub fn is_target(&self, fret: u32, string: u32) -> bool {
        !is_separator_fret(fret)
            && self
                .target
                .map(|t| t.contains(fret, string))
                .unwrap_or(false)
    }

    pub fn is_correct(&self, fret: u32, string: u32) -> bool {
        self.is_active(fret, string) && self.is_target(fret, string)
    }

    pub fn cell_status(&self, fret: u32, string: u32) -> CellStatus {
        if is_separator_fret(fret) {
            CellStatus::Separator
        } else if self.is_correct(fret, string) {
            CellStatus::Correct
        } else if self.is_active(fret, string) {
            CellStatus::Active
        } else if self.is_target(fret, string) {
            CellStatus::Target
        } else {
            CellStatus::Empty
        }
    }

    /// True when the target is non-empty and satisfied under `policy`
    pub fn is_fully_matched(&self, policy: MatchPolicy) -> bool {
        let Some(target) = self.target else {
            return false;
        };

        let mut required = target.playable().peekable();
        if required.peek().is_none() {
            return false;
        }
        if !required.all(|p| self.current.contains(p.fret, p.string)) {
            return false;
        }

        match policy {
            MatchPolicy::Subset => true,
            MatchPolicy::Exact => self
                .current
                .playable()
                .all(|p| target.contains(p.fret, p.string)),
        }
    }
}

/// Convenience wrapper over [`MatchEvaluator::is_fully_matched`]
pub fn is_fully_matched(
    current: &PositionSet,
    target: Option<&PositionSet>,
    policy: MatchPolicy,
) -> bool {
    MatchEvaluator::new(current, target).is_fully_matched(policy)
}

/// Whole-board snapshot used for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Row-major by string: `cells[string * FRET_COUNT + fret]`
    cells: Vec<CellStatus>,
    pub fully_matched: bool,
    /// Target positions currently pressed
    pub correct: usize,
    /// Target positions not pressed
    pub missing: usize,
    /// Pressed positions outside the target
    pub extra: usize,
}

impl Evaluation {
    pub fn compute(
        current: &PositionSet,
        target: Option<&PositionSet>,
        policy: MatchPolicy,
    ) -> Self {
        let evaluator = MatchEvaluator::new(current, target);

        let cells = (0..STRING_COUNT)
            .flat_map(|string| (0..FRET_COUNT).map(move |fret| (fret, string)))
            .map(|(fret, string)| evaluator.cell_status(fret, string))
            .collect();

        let (correct, missing) = match target {
            Some(t) => t.playable().fold((0, 0), |(hit, miss), p| {
                if current.contains(p.fret, p.string) {
                    (hit + 1, miss)
                } else {
                    (hit, miss + 1)
                }
            }),
            None => (0, 0),
        };

        let extra = current
            .playable()
            .filter(|p| !evaluator.is_target(p.fret, p.string))
            .count();

        Self {
            cells,
            fully_matched: evaluator.is_fully_matched(policy),
            correct,
            missing,
            extra,
        }
    }

    /// Status of one cell; positions off the board read as empty
    pub fn status(&self, fret: u32, string: u32) -> CellStatus {
        if fret >= FRET_COUNT || string >= STRING_COUNT {
            return CellStatus::Empty;
        }
        self.cells[(string * FRET_COUNT + fret) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(frets: &[u32], strings: &[u32]) -> PositionSet {
        PositionSet::build(frets, strings).unwrap()
    }

    #[test]
    fn test_separator_cells_never_active_or_target() {
        let everything: PositionSet = (0..FRET_COUNT)
            .flat_map(|f| (0..STRING_COUNT).map(move |s| crate::Position::new(f, s)))
            .collect();
        let eval = MatchEvaluator::new(&everything, Some(&everything));

        for fret in [0, 2, 4, 6, 8, 10] {
            for string in 0..STRING_COUNT {
                assert!(!eval.is_active(fret, string));
                assert!(!eval.is_target(fret, string));
                assert!(!eval.is_correct(fret, string));
                assert_eq!(eval.cell_status(fret, string), CellStatus::Separator);
            }
        }
    }

    #[test]
    fn test_cell_status_precedence() {
        let current = set(&[1, 3], &[0, 1]);
        let target = set(&[1, 5], &[0, 2]);
        let eval = MatchEvaluator::new(&current, Some(&target));

        assert_eq!(eval.cell_status(0, 3), CellStatus::Separator);
        assert_eq!(eval.cell_status(1, 0), CellStatus::Correct);
        assert_eq!(eval.cell_status(3, 1), CellStatus::Active);
        assert_eq!(eval.cell_status(5, 2), CellStatus::Target);
        assert_eq!(eval.cell_status(7, 5), CellStatus::Empty);
    }

    #[test]
    fn test_unresolved_target_has_no_targets() {
        let current = set(&[1, 3], &[0, 1]);
        let eval = MatchEvaluator::new(&current, None);

        assert!(eval.is_active(1, 0));
        assert!(!eval.is_target(1, 0));
        assert!(!eval.is_correct(1, 0));
        assert!(!eval.is_fully_matched(MatchPolicy::Subset));
    }

    #[test]
    fn test_subset_tolerates_extra_presses() {
        let target = set(&[3, 3], &[0, 1]);
        let current = set(&[3, 3, 5], &[0, 1, 3]);
        assert!(is_fully_matched(&current, Some(&target), MatchPolicy::Subset));
    }

    #[test]
    fn test_missing_position_is_not_a_match() {
        let target = set(&[3, 3], &[0, 1]);
        let current = set(&[3], &[0]);
        assert!(!is_fully_matched(&current, Some(&target), MatchPolicy::Subset));
    }

    #[test]
    fn test_exact_rejects_extra_presses() {
        let target = set(&[3, 3], &[0, 1]);
        let extra = set(&[3, 3, 5], &[0, 1, 3]);
        let exact = set(&[3, 3], &[0, 1]);

        assert!(!is_fully_matched(&extra, Some(&target), MatchPolicy::Exact));
        assert!(is_fully_matched(&exact, Some(&target), MatchPolicy::Exact));
    }

    #[test]
    fn test_exact_ignores_separator_presses() {
        let target = set(&[3], &[0]);
        let current = set(&[3, 4], &[0, 2]);
        assert!(is_fully_matched(&current, Some(&target), MatchPolicy::Exact));
    }

    #[test]
    fn test_target_only_on_separators_never_matches() {
        // Every target cell sits on fret 2, so nothing is left to match
        let target = set(&[2, 2], &[0, 1]);
        let current = set(&[2, 2, 5], &[0, 1, 3]);
        assert!(!is_fully_matched(&current, Some(&target), MatchPolicy::Subset));
    }

    #[test]
    fn test_empty_target_never_matches() {
        let target = PositionSet::new();
        let current = set(&[1], &[0]);
        assert!(!is_fully_matched(&current, Some(&target), MatchPolicy::Subset));
    }

    #[test]
    fn test_evaluation_counts() {
        // C major reference fingering from the default chord table
        let target = set(&[1, 3, 5], &[1, 3, 4]);
        let current = set(&[1, 3, 7, 0], &[1, 3, 0, 5]);
        let evaluation = Evaluation::compute(&current, Some(&target), MatchPolicy::Subset);

        assert_eq!(evaluation.correct, 2);
        assert_eq!(evaluation.missing, 1);
        assert_eq!(evaluation.extra, 1);
        assert!(!evaluation.fully_matched);
        assert_eq!(evaluation.status(1, 1), CellStatus::Correct);
        assert_eq!(evaluation.status(5, 4), CellStatus::Target);
        assert_eq!(evaluation.status(7, 0), CellStatus::Active);
        assert_eq!(evaluation.status(0, 5), CellStatus::Separator);
        assert_eq!(evaluation.status(42, 0), CellStatus::Empty);
    }
}
