//! Error types for the taxi intake bot.

use std::path::PathBuf;

use crate::records::RecordKind;

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Record store errors. Callers log these; they never reach the user.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {kind} store at {}: {source}", path.display())]
    Io {
        kind: RecordKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed {kind} store at {}: {source}", path.display())]
    Serialization {
        kind: RecordKind,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Channel (transport) errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Failed to edit message on channel {name}: {reason}")]
    EditFailed { name: String, reason: String },

    #[error("Invalid response from channel {name}: {reason}")]
    InvalidResponse { name: String, reason: String },
}

/// Errors raised while turning a finished dialogue into a record.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
