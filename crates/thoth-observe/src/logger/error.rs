use thiserror::Error;

/// Why the exporter could not set up its log output.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format {0:?}, expected text, json or journald")]
    InvalidFormat(String),
    #[error("journald output needs linux and the `journald` feature")]
    JournaldUnavailable,
    #[error("cannot connect to journald: {0}")]
    Journald(#[source] std::io::Error),
    #[error("invalid log filter {directive:?}: {reason}")]
    InvalidLevel { directive: String, reason: String },
    #[error("a global log subscriber is already installed")]
    AlreadyInitialized,
}
