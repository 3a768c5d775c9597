//! BonusCraft Logging
//!
//! `tracing-subscriber` setup shared by the binary and tests.
//! `RUST_LOG` always wins over the level passed in.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default verbosity when `RUST_LOG` is unset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Self::Debug
        } else {
            Self::Info
        }
    }

    /// Filter directive for this level, with our crates one step louder
    /// at debug and above.
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "info,bonuscraft=debug",
            Self::Trace => "debug,bonuscraft=trace",
        }
    }
}

fn filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()))
}

/// Install the global subscriber. Panics if one is already set.
pub fn init(level: LogLevel) {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter(level))
        .init();
}

/// Install the global subscriber, returning an error if one is already set.
pub fn try_init(level: LogLevel) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter(level))
        .try_init()
}
