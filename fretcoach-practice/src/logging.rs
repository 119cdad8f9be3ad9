//! Tracing setup for the `fretcoach` binary
//!
//! The subscriber is installed before the config file is read so config
//! loading can report fallbacks. It starts at `RUST_LOG`, or `info` when
//! unset; the configured `logging.level` is applied afterwards through a
//! reload handle unless `RUST_LOG` was given.

use tracing::{warn, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Level used until the config file has been read
pub const DEFAULT_LEVEL: &str = "info";

/// Same level for every fretcoach crate
pub fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!(
        "fretcoach={0},fretcoach_practice={0},fretcoach_common={0}",
        level
    ))
}

/// Adjusts the installed filter once configuration is known
pub struct LogControl {
    handle: reload::Handle<EnvFilter, Registry>,
    env_override: bool,
}

impl LogControl {
    /// Switch to the configured level; returns false when `RUST_LOG` wins
    pub fn apply_level(&self, level: &str) -> bool {
        if self.env_override {
            return false;
        }
        match self.handle.reload(default_filter(level)) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to apply log level '{}': {}", level, e);
                false
            }
        }
    }

    pub fn env_override(&self) -> bool {
        self.env_override
    }
}

/// Build the subscriber without installing it
///
/// `env_filter` is the filter parsed from `RUST_LOG`, if any.
pub fn subscriber<W>(
    env_filter: Option<EnvFilter>,
    make_writer: W,
) -> (impl Subscriber + Send + Sync + 'static, LogControl)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_override = env_filter.is_some();
    let (filter, handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| default_filter(DEFAULT_LEVEL)));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer));

    (
        subscriber,
        LogControl {
            handle,
            env_override,
        },
    )
}

/// Install the global subscriber writing to stderr
pub fn init() -> LogControl {
    let env_filter = EnvFilter::try_from_default_env().ok();
    let (subscriber, control) = subscriber(env_filter, std::io::stderr);
    subscriber.init();
    control
}
