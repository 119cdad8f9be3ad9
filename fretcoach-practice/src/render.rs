//! Terminal rendering of the fretboard and session status
//!
//! Glyphs: `|` separator, `O` correct, `X` pressed but not in the chord,
//! `*` required but not pressed, `.` empty.

use crate::session::{PracticeSession, TargetResolution};
use fretcoach_common::positions::{FRET_COUNT, STRING_COUNT};
use fretcoach_common::{CellStatus, Evaluation};
use std::fmt::Write;
use std::time::Instant;

/// ANSI clear-screen and cursor-home
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub fn glyph(status: CellStatus) -> char {
    match status {
        CellStatus::Separator => '|',
        CellStatus::Correct => 'O',
        CellStatus::Active => 'X',
        CellStatus::Target => '*',
        CellStatus::Empty => '.',
    }
}

/// Fret header plus one row per string
pub fn render_board(evaluation: &Evaluation) -> String {
    let mut out = String::from("    ");
    for fret in 0..FRET_COUNT {
        let _ = write!(out, "{:>4}", format!("F{}", fret));
    }
    out.push('\n');

    for string in 0..STRING_COUNT {
        let _ = write!(out, "S{:<3}", string + 1);
        for fret in 0..FRET_COUNT {
            let _ = write!(out, "{:>4}", glyph(evaluation.status(fret, string)));
        }
        out.push('\n');
    }
    out
}

/// Full practice screen: target, board, score box, banners, notifications
pub fn render_practice(session: &PracticeSession, now: Instant) -> String {
    let mut out = String::new();
    let tracker = session.tracker();

    match session.target() {
        Some(target) => {
            let _ = write!(out, "Target Chord: {}", target.chord);
            match &target.resolution {
                TargetResolution::Pending => out.push_str("  (loading fingering...)"),
                TargetResolution::Unknown => out.push_str("  (no fingering known)"),
                TargetResolution::Failed(_) => out.push_str("  (fingering unavailable)"),
                TargetResolution::Resolved(_) => {}
            }
            out.push('\n');
            if tracker.is_matched() {
                out.push_str("✓ Correct! Great job!  [n] next practice\n");
            } else {
                out.push_str("Play this chord on your guitar...\n");
            }
        }
        None => out.push_str("No target chord\n"),
    }
    out.push('\n');

    out.push_str(&render_board(session.evaluation()));
    out.push('\n');

    let _ = writeln!(
        out,
        "Score: {}   Attempts: {}   Accuracy: {}%",
        tracker.score(),
        tracker.attempts(),
        tracker.accuracy()
    );

    out.push_str(&render_sensor_line(session));

    for note in session.notifications().active(now) {
        let _ = writeln!(out, "[{}] {}", note.kind.label(), note.message);
    }

    out.push_str("\nO correct  X pressed  * target  | fret wire\n");
    out.push_str("Commands: n = next, c <chord> = change chord, b = back, q = quit\n");
    out
}

fn render_sensor_line(session: &PracticeSession) -> String {
    let sensor = session.sensor();
    if sensor.updates == 0 {
        return "Sensor: waiting for first reading\n".to_string();
    }
    if let Some(error) = sensor.error.as_ref().filter(|_| !sensor.connected) {
        return format!("Sensor: disconnected ({})\n", error);
    }
    let label = sensor.label.as_deref().unwrap_or("-");
    let hint = if session.label_matches_target() {
        " (classifier agrees)"
    } else {
        ""
    };
    format!("Sensor: connected, hearing {}{}\n", label, hint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fretcoach_common::{MatchPolicy, PositionSet};

    #[test]
    fn test_board_glyphs() {
        let current = PositionSet::build(&[1, 7], &[1, 0]).unwrap();
        let target = PositionSet::build(&[1, 5], &[1, 4]).unwrap();
        let evaluation = Evaluation::compute(&current, Some(&target), MatchPolicy::Subset);

        let board = render_board(&evaluation);
        let lines: Vec<&str> = board.lines().collect();

        assert_eq!(lines.len(), 1 + STRING_COUNT as usize);
        assert!(lines[0].contains("F10"));

        let row = |string: usize| -> Vec<char> {
            lines[string + 1]
                .split_whitespace()
                .skip(1)
                .map(|cell| cell.chars().next().unwrap())
                .collect()
        };
        assert_eq!(row(0), vec!['|', '.', '|', '.', '|', '.', '|', 'X', '|', '.', '|']);
        assert_eq!(row(1)[1], 'O');
        assert_eq!(row(4)[5], '*');
    }
}
