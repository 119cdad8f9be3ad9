//! Success cue: a short clip played when a chord is first matched
//!
//! Clips come from a static chord name → file name table resolved against
//! the configured audio folder. Playback is handed to an external player
//! command and never awaited; without a command the cue is only logged.

use fretcoach_common::config::AudioConfig;
use fretcoach_common::events::{EventBus, PracticeEvent};
use fretcoach_common::{Error, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What [`CuePlayer::play`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CueOutcome {
    Disabled,
    /// Chord has no entry in the table
    Unmapped,
    MissingFile(PathBuf),
    /// No player command configured
    Logged(PathBuf),
    Started(PathBuf),
}

/// Chord name → audio file
#[derive(Debug, Clone)]
pub struct CueTable {
    folder: PathBuf,
    cues: BTreeMap<String, String>,
}

impl CueTable {
    pub fn new(folder: PathBuf, cues: BTreeMap<String, String>) -> Self {
        Self { folder, cues }
    }

    /// Path for `chord`, whether or not the file exists
    pub fn lookup(&self, chord: &str) -> Option<PathBuf> {
        self.cues.get(chord).map(|file| self.folder.join(file))
    }
}

pub struct CuePlayer {
    table: CueTable,
    command: Option<(String, Vec<String>)>,
    enabled: bool,
}

impl CuePlayer {
    pub fn from_config(config: &AudioConfig) -> Self {
        let command = config.player_command.as_deref().and_then(|cmd| {
            let mut parts = cmd.split_whitespace().map(str::to_string);
            parts.next().map(|program| (program, parts.collect()))
        });

        Self {
            table: CueTable::new(config.folder.clone(), config.cues.clone()),
            command,
            enabled: config.enabled,
        }
    }

    /// Start playback for `chord` without waiting for it to finish
    pub fn play(&self, chord: &str) -> Result<CueOutcome> {
        if !self.enabled {
            return Ok(CueOutcome::Disabled);
        }

        let Some(path) = self.table.lookup(chord) else {
            debug!(chord = %chord, "No success cue mapped");
            return Ok(CueOutcome::Unmapped);
        };

        if !path.is_file() {
            warn!(chord = %chord, "Success cue file not found: {}", path.display());
            return Ok(CueOutcome::MissingFile(path));
        }

        let Some((program, args)) = &self.command else {
            info!(chord = %chord, "Success cue: {}", path.display());
            return Ok(CueOutcome::Logged(path));
        };

        tokio::process::Command::new(program)
            .args(args)
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Config(format!("Failed to start audio player '{}': {}", program, e)))?;

        info!(chord = %chord, "Playing success cue {}", path.display());
        Ok(CueOutcome::Started(path))
    }

    /// Play a cue for every `ChordMatched` event until the bus closes
    ///
    /// The task resolves to the number of cues played or logged.
    pub fn spawn_listener(self, events: &EventBus) -> JoinHandle<usize> {
        let mut rx = events.subscribe();
        tokio::spawn(async move {
            let mut played = 0;
            loop {
                match rx.recv().await {
                    Ok(PracticeEvent::ChordMatched { chord, .. }) => match self.play(&chord) {
                        Ok(CueOutcome::Logged(_) | CueOutcome::Started(_)) => played += 1,
                        Ok(_) => {}
                        Err(e) => warn!("Success cue failed: {}", e),
                    },
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("Cue listener skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            played
        })
    }
}
