//! Common error types for FretCoach

use thiserror::Error;

/// Common result type for FretCoach operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across FretCoach crates
#[derive(Error, Debug)]
pub enum Error {
    /// Position arrays or a server payload could not be interpreted
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Chord name has no mapping in the registry
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport failure or non-2xx response from the sensor server
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures that clear up on their own once the server is back
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::UpstreamUnavailable(_))
    }
}
