//! Error types for the agenda ecosystem.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in agenda operations.
#[derive(Error, Debug)]
pub enum AgendaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event store at {} is corrupt: {reason}", path.display())]
    StoreCorrupt { path: PathBuf, reason: String },

    #[error("Failed to write event store at {}: {source}", path.display())]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch remote events: {0}")]
    RemoteFetch(String),

    #[error("Remote calendar requires authentication")]
    AuthRequired,

    #[error("Failed to push '{title}' to the remote calendar ({synced_before} synced before it): {message}")]
    RemotePush {
        title: String,
        message: String,
        synced_before: usize,
    },

    #[error("Remote calendar request timed out after {0}s")]
    RemoteTimeout(u64),

    #[error("Advisor returned malformed output: {0}")]
    AdvisorMalformedOutput(String),

    #[error("Advisor request failed: {0}")]
    Advisor(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for agenda operations.
pub type AgendaResult<T> = Result<T, AgendaError>;
