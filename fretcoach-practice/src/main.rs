//! fretcoach - terminal chord trainer
//!
//! Talks to the fretboard sensor server over HTTP, shows which strings and
//! frets are pressed against the target chord, and keeps score.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fretcoach_common::config::{load_config, validate_base_url, TomlConfig};
use fretcoach_common::events::EventBus;
use fretcoach_practice::cue::CuePlayer;
use fretcoach_practice::logging;
use fretcoach_practice::notifications::NotificationLog;
use fretcoach_practice::runner::{run_practice, Command, RunOutcome};
use fretcoach_practice::sensor::SensorPoller;
use fretcoach_practice::{ApiClient, ChordRegistry, PracticeSession};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Command-line arguments for fretcoach
#[derive(Parser, Debug)]
#[command(name = "fretcoach")]
#[command(about = "Guitar chord trainer for the fretboard sensor server")]
#[command(version)]
struct Args {
    /// Config file (default: FRETCOACH_CONFIG, then the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sensor server base URL, overrides config and FRETCOACH_SERVER_URL
    #[arg(short, long)]
    server_url: Option<String>,

    /// Sensor poll interval in milliseconds
    #[arg(short, long, env = "FRETCOACH_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// List the chords the server knows
    Chords,
    /// Practice a chord interactively
    Practice {
        /// Chord name, e.g. "C major"
        chord: String,
    },
    /// Live sensor view without a target chord
    Watch,
    /// Print one raw sensor snapshot as JSON
    Raw,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_control = logging::init();

    info!(
        "Starting fretcoach v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let mut config =
        load_config(args.config.as_deref()).context("Failed to load configuration")?;
    log_control.apply_level(&config.logging.level);
    apply_overrides(&mut config, &args)?;
    info!("Sensor server: {}", config.server.base_url);

    let client = ApiClient::new(
        &config.server.base_url,
        Duration::from_millis(config.server.request_timeout_ms),
    )
    .context("Failed to create API client")?;

    match args.command {
        Mode::Chords => list_chords(client).await,
        Mode::Raw => print_raw(client).await,
        Mode::Watch => interactive(config, client, None).await,
        Mode::Practice { chord } => interactive(config, client, Some(chord)).await,
    }
}

fn apply_overrides(config: &mut TomlConfig, args: &Args) -> Result<()> {
    if let Some(url) = &args.server_url {
        validate_base_url(url)?;
        config.server.base_url = url.clone();
    }
    if let Some(ms) = args.poll_interval_ms {
        config.practice.poll_interval_ms = ms;
    }
    config.validate()?;
    Ok(())
}

async fn list_chords(client: ApiClient) -> Result<()> {
    let registry = ChordRegistry::new(client);
    let names = registry
        .names()
        .await
        .context("Failed to fetch chord list")?;
    print_chord_list(&names);
    Ok(())
}

fn print_chord_list(names: &[String]) {
    println!("Select a chord to practice:");
    for (i, name) in names.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, name);
    }
}

async fn print_raw(client: ApiClient) -> Result<()> {
    let snapshot = client
        .read_raw()
        .await
        .context("Failed to read sensor")?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Forward stdin lines as commands from a dedicated thread
///
/// A blocking thread keeps a pending read from holding up runtime shutdown.
fn spawn_input_reader() -> mpsc::UnboundedReceiver<Command> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(Command::parse(&line)).is_err() {
                break;
            }
        }
    });
    rx
}

async fn interactive(config: TomlConfig, client: ApiClient, chord: Option<String>) -> Result<()> {
    let client = Arc::new(client);
    let registry = Arc::new(ChordRegistry::new((*client).clone()));
    let events = EventBus::new(100);
    let cue_listener = CuePlayer::from_config(&config.audio).spawn_listener(&events);

    let mut poller = SensorPoller::new(
        Arc::clone(&client),
        config.practice.poll_interval(),
        config.practice.stale_readings,
    );
    let mut commands = spawn_input_reader();
    let mut stdout = std::io::stdout();
    let watch_only = chord.is_none();
    let mut next_chord = chord;

    loop {
        let mut session = PracticeSession::new(
            Arc::clone(&registry),
            events.clone(),
            NotificationLog::new(config.practice.notification_ttl()),
            config.practice.match_policy,
        );

        let outcome = tokio::select! {
            outcome = run_practice(
                &mut session,
                &mut poller,
                next_chord.take(),
                &mut commands,
                &mut stdout,
            ) => outcome?,
            _ = shutdown_signal() => RunOutcome::Quit,
        };

        if outcome == RunOutcome::Quit || watch_only {
            break;
        }

        let selected = tokio::select! {
            selected = select_chord(&registry, &mut commands) => selected,
            _ = shutdown_signal() => None,
        };
        match selected {
            Some(chord) => next_chord = Some(chord),
            None => break,
        }
    }

    cue_listener.abort();
    info!("fretcoach shutdown complete");
    Ok(())
}

/// Chord-selection screen; `None` when the user quits
async fn select_chord(
    registry: &ChordRegistry,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> Option<String> {
    let names = match registry.names().await {
        Ok(names) => names,
        Err(e) => {
            warn!("Failed to fetch chord list: {}", e);
            Vec::new()
        }
    };

    loop {
        print_chord_list(&names);
        println!("Enter a number or chord name (q to quit):");

        let text = match commands.recv().await? {
            Command::Quit => return None,
            Command::Change(name) => name,
            Command::Unknown(text) => text,
            _ => continue,
        };

        if let Ok(index) = text.parse::<usize>() {
            if let Some(name) = index.checked_sub(1).and_then(|i| names.get(i)) {
                return Some(name.clone());
            }
            println!("No chord numbered {}", index);
            continue;
        }
        return Some(text);
    }
}

/// Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
