//! Interactive practice loop
//!
//! Multiplexes four sources with `tokio::select!`:
//! - sensor state changes from the feed
//! - target resolutions coming back from the registry
//! - user commands (one per input line)
//! - a housekeeping tick that expires notifications and retries failed lookups
//!
//! The screen is redrawn after every handled input.

use crate::notifications::NotificationKind;
use crate::render::{render_practice, CLEAR_SCREEN};
use crate::sensor::SensorFeed;
use crate::session::{PracticeSession, TargetTicket};
use fretcoach_common::{PositionSet, Result};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Housekeeping tick period
const HOUSEKEEPING_INTERVAL: Duration = Duration::from_millis(500);

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Change(String),
    Back,
    Quit,
    Redraw,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match (word, rest) {
            ("", _) => Command::Redraw,
            ("n" | "next", "") => Command::Next,
            ("b" | "back", "") => Command::Back,
            ("q" | "quit", "") => Command::Quit,
            ("c" | "chord", name) if !name.is_empty() => Command::Change(name.to_string()),
            _ => Command::Unknown(line.to_string()),
        }
    }
}

/// Why the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// User asked to go back to chord selection
    Back,
    /// User quit, or input ended
    Quit,
}

type Resolution = (TargetTicket, Result<PositionSet>);

fn spawn_resolution(
    session: &PracticeSession,
    ticket: TargetTicket,
    tx: &mpsc::UnboundedSender<Resolution>,
) {
    let registry = Arc::clone(session.registry());
    let tx = tx.clone();
    tokio::spawn(async move {
        let resolved = ticket.resolve(&registry).await;
        // Receiver gone means the loop already ended
        let _ = tx.send(resolved);
    });
}

/// Run the practice loop until the user leaves
///
/// With `chord == None` the board shows live sensor data without a target.
pub async fn run_practice<W: Write>(
    session: &mut PracticeSession,
    feed: &mut dyn SensorFeed,
    chord: Option<String>,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    out: &mut W,
) -> Result<RunOutcome> {
    let (resolution_tx, mut resolution_rx) = mpsc::unbounded_channel::<Resolution>();

    if let Some(chord) = chord {
        let ticket = session.select_chord(chord);
        spawn_resolution(session, ticket, &resolution_tx);
    }

    let mut sensor_rx = feed.subscribe();
    feed.start();

    let mut housekeeping = tokio::time::interval(HOUSEKEEPING_INTERVAL);
    housekeeping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    draw(session, out)?;

    let outcome = loop {
        tokio::select! {
            changed = sensor_rx.changed() => {
                if changed.is_err() {
                    debug!("Sensor feed closed");
                    break RunOutcome::Quit;
                }
                let state = sensor_rx.borrow_and_update().clone();
                if state.updates > 0 {
                    session.apply_sensor(state);
                }
            }
            Some((ticket, result)) = resolution_rx.recv() => {
                session.apply_resolution(ticket, result);
            }
            command = commands.recv() => {
                match command.unwrap_or(Command::Quit) {
                    Command::Next => session.next_chord(),
                    Command::Change(name) => {
                        let ticket = session.select_chord(name);
                        spawn_resolution(session, ticket, &resolution_tx);
                    }
                    Command::Back => break RunOutcome::Back,
                    Command::Quit => break RunOutcome::Quit,
                    Command::Redraw => {}
                    Command::Unknown(line) => {
                        session.notifications_mut().add(
                            format!("Unknown command '{}'", line),
                            NotificationKind::Info,
                            true,
                        );
                    }
                }
            }
            _ = housekeeping.tick() => {
                session.notifications_mut().prune(Instant::now());
                if let Some(ticket) = session.retry_ticket() {
                    spawn_resolution(session, ticket, &resolution_tx);
                }
            }
        }

        draw(session, out)?;
    };

    feed.stop();
    if outcome == RunOutcome::Back {
        session.back();
    }
    info!(
        score = session.tracker().score(),
        attempts = session.tracker().attempts(),
        "Practice loop ended"
    );
    Ok(outcome)
}

fn draw<W: Write>(session: &PracticeSession, out: &mut W) -> Result<()> {
    write!(out, "{}{}", CLEAR_SCREEN, render_practice(session, Instant::now()))?;
    out.flush()?;
    Ok(())
}
