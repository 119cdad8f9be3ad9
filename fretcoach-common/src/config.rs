//! Configuration loading and resolution
//!
//! Settings come from a TOML file with every field defaulted. The file is
//! located in priority order:
//! 1. Command-line argument (highest priority)
//! 2. `FRETCOACH_CONFIG` environment variable
//! 3. `<platform config dir>/fretcoach/config.toml`
//! 4. Compiled defaults (no file)
//!
//! A missing file is not an error: a warning is logged and defaults apply.
//! `FRETCOACH_SERVER_URL` overrides `[server].base_url` from any source.
//!
//! ```toml
//! [server]
//! base_url = "http://127.0.0.1:8000"
//!
//! [practice]
//! poll_interval_ms = 200
//! match_policy = "subset"      # or "exact"
//! stale_readings = "preserve"  # or "clear"
//!
//! [audio]
//! folder = "audio"
//! player_command = "mpg123 -q"
//!
//! [audio.cues]
//! "C major" = "c chord.mp3"
//!
//! [logging]
//! level = "info"
//! ```

use crate::evaluator::MatchPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "FRETCOACH_CONFIG";

/// Environment variable overriding the server base URL
pub const SERVER_URL_ENV_VAR: &str = "FRETCOACH_SERVER_URL";

/// What happens to the last sensor reading when a poll fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleReadingPolicy {
    /// Keep showing the last known positions
    #[default]
    Preserve,
    /// Drop to an empty reading until the server answers again
    Clear,
}

/// Complete configuration file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub practice: PracticeConfig,
    pub audio: AudioConfig,
    pub logging: LoggingConfig,
}

/// Sensor server connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_ms: 2000,
        }
    }
}

/// Practice loop behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeConfig {
    pub poll_interval_ms: u64,
    pub match_policy: MatchPolicy,
    pub stale_readings: StaleReadingPolicy,
    /// Lifetime of auto-removed notifications
    pub notification_ttl_ms: u64,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 200,
            match_policy: MatchPolicy::Subset,
            stale_readings: StaleReadingPolicy::Preserve,
            notification_ttl_ms: 3000,
        }
    }
}

impl PracticeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }
}

/// Success cue playback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub enabled: bool,
    /// Folder the cue file names are resolved against
    pub folder: PathBuf,
    /// External player invoked as `<command> <file>`; cues are only logged when unset
    pub player_command: Option<String>,
    /// Chord name → file name
    pub cues: BTreeMap<String, String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            folder: PathBuf::from("audio"),
            player_command: None,
            cues: default_cues(),
        }
    }
}

fn default_cues() -> BTreeMap<String, String> {
    [
        ("A minor", "am chord.mp3"),
        ("C major", "c chord.mp3"),
        ("D major", "d chord.mp3"),
        ("E minor", "em chord.mp3"),
        ("G major", "g chord.mp3"),
    ]
    .into_iter()
    .map(|(chord, file)| (chord.to_string(), file.to_string()))
    .collect()
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the practice loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.practice.poll_interval_ms == 0 {
            return Err(Error::Config(
                "practice.poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.server.request_timeout_ms == 0 {
            return Err(Error::Config(
                "server.request_timeout_ms must be greater than 0".to_string(),
            ));
        }
        validate_base_url(&self.server.base_url)?;

        let level = self.logging.level.to_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
            return Err(Error::Config(format!(
                "logging.level '{}' is not one of trace, debug, info, warn, error",
                self.logging.level
            )));
        }
        Ok(())
    }
}

/// Base URLs must be absolute http(s) URLs
pub fn validate_base_url(url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "server base URL '{}' must start with http:// or https://",
            url
        )))
    }
}

/// `<platform config dir>/fretcoach/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fretcoach").join("config.toml"))
}

/// Pick the config file to read, without checking that it exists
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path()
}

/// Load configuration with graceful degradation
///
/// A missing file falls back to defaults with a warning. A file that exists
/// but does not parse or validate is an error.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let mut config = match resolve_config_path(cli_arg) {
        Some(path) if path.exists() => {
            info!("Loading configuration from {}", path.display());
            TomlConfig::load(&path)?
        }
        Some(path) => {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            TomlConfig::default()
        }
        None => {
            warn!("No config directory available, using built-in defaults");
            TomlConfig::default()
        }
    };

    if let Ok(url) = std::env::var(SERVER_URL_ENV_VAR) {
        if !url.is_empty() {
            validate_base_url(&url)?;
            info!("Server URL overridden by {}: {}", SERVER_URL_ENV_VAR, url);
            config.server.base_url = url;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.server.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.practice.poll_interval(), Duration::from_millis(200));
        assert_eq!(config.practice.match_policy, MatchPolicy::Subset);
        assert_eq!(config.practice.stale_readings, StaleReadingPolicy::Preserve);
        assert_eq!(config.audio.cues.get("C major").map(String::as_str), Some("c chord.mp3"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [practice]
            match_policy = "exact"
            "#,
        )
        .unwrap();

        assert_eq!(config.practice.match_policy, MatchPolicy::Exact);
        assert_eq!(config.practice.poll_interval_ms, 200);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = TomlConfig::default();
        config.practice.poll_interval_ms = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = TomlConfig::default();
        config.server.base_url = "127.0.0.1:8000".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = TomlConfig::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_cli_path_wins() {
        let path = PathBuf::from("/tmp/fretcoach-cli.toml");
        assert_eq!(resolve_config_path(Some(&path)), Some(path));
    }
}
