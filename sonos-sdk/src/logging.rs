//! Logging setup for applications using the SDK
//!
//! Every crate in the workspace logs through `tracing`; nothing is printed
//! until an application installs a subscriber, for example through
//! [`init_logging`].

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No subscriber is installed
    Silent,
    /// Compact stderr output at `info`
    Development,
    /// Verbose output with source locations at `debug`
    Debug,
}

impl LoggingMode {
    /// Parse a `SONOS_LOG_MODE` value. Unknown values mean silent.
    pub fn from_env_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => LoggingMode::Development,
            "debug" => LoggingMode::Debug,
            _ => LoggingMode::Silent,
        }
    }
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
}

/// Initialize logging with the specified mode
///
/// # Environment Variables
///
/// - `SONOS_LOG_LEVEL`: filter directive, e.g. `debug` or `sonos_stream=trace`
/// - `RUST_LOG`: used when `SONOS_LOG_LEVEL` is unset
///
/// Installing a second subscriber fails with [`LoggingError::TracingInit`].
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => Registry::default()
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .compact(),
            )
            .with(env_filter("info"))
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
        LoggingMode::Debug => Registry::default()
            .with(
                fmt::layer()
                    .pretty()
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(env_filter("debug"))
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
    }
}

/// Initialize logging from `SONOS_LOG_MODE` (`silent`, `development`, `debug`).
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let mode = std::env::var("SONOS_LOG_MODE")
        .map(|v| LoggingMode::from_env_value(&v))
        .unwrap_or(LoggingMode::Silent);
    init_logging(mode)
}

fn env_filter(default_level: &str) -> EnvFilter {
    std::env::var("SONOS_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Whether a global subscriber has been installed.
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}
