#![forbid(unsafe_code)]

//! Logging setup.
//!
//! Library code logs through `tracing` unconditionally; installing a
//! subscriber is the host's call. With the `tracing-json` feature this module
//! offers a ready-made JSON subscriber filtered by the `SHELF_LOG`
//! environment variable (standard `EnvFilter` syntax, default `info`).

use std::fmt;

/// Environment variable read by [`init_json_subscriber`].
pub const LOG_ENV_VAR: &str = "SHELF_LOG";

/// Default filter directive when [`LOG_ENV_VAR`] is unset or invalid.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Failure to install a global subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingInitError(String);

impl LoggingInitError {
    /// Message reported by the subscriber backend.
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LoggingInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to install log subscriber: {}", self.0)
    }
}

impl std::error::Error for LoggingInitError {}

/// Install a JSON-formatting global subscriber.
///
/// Fails if a global subscriber is already set.
#[cfg(feature = "tracing-json")]
pub fn init_json_subscriber() -> Result<(), LoggingInitError> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| LoggingInitError(err.to_string()))
}
