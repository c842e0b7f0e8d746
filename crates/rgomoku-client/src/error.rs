//! Error types for the engine driver.

use std::path::PathBuf;
use std::time::Duration;

use rgomoku_core::CoordError;

/// Errors surfaced by [`EngineSession`](crate::EngineSession) operations.
///
/// None of these are fatal to the process: the worst outcome of any of them is
/// an operation that returns no useful result.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// No line arrived within the operation's response window
    #[error("engine did not answer within {0:?}")]
    ProtocolTimeout(Duration),

    /// The engine answered with text that could not be interpreted
    #[error("malformed engine response: {0}")]
    MalformedResponse(String),

    /// Coordinates outside the board, rejected before anything is sent
    #[error("invalid position: {0}")]
    InvalidPosition(#[from] CoordError),

    /// Protocol framing is line based, so arguments cannot carry line breaks
    #[error("command text contains a line break: {0:?}")]
    EmbeddedNewline(String),

    /// The engine's output stream ended
    #[error("engine output stream closed")]
    EngineClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised while loading a configuration file.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
