//! Error types for pinch_midi

use gesture_cc::MappingError;
use thiserror::Error;

/// Main error type for pinch_midi
#[derive(Error, Debug)]
pub enum PinchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("MIDI transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Landmark source error: {0}")]
    Source(#[from] SourceError),

    #[error("Window error: {0}")]
    Window(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid mapping: {0}")]
    Mapping(#[from] MappingError),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// MIDI transport errors.
///
/// A failed send never reaches the frame path; [`TransportError::Send`] only
/// exists so backends can report it to the adapter, which logs it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("MIDI output is not available in this environment: {0}")]
    Unsupported(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("MIDI endpoint disappeared: {0}")]
    EndpointGone(String),

    #[error("Already connected to {0}")]
    AlreadyConnected(String),

    #[error("Failed to connect: {0}")]
    Connect(String),

    #[error("Send failed: {0}")]
    Send(String),
}

/// Landmark source errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to bind {0}")]
    Bind(String),

    #[error("Tracker packet parse error: {0}")]
    Parse(String),

    #[error("Receive error: {0}")]
    Receive(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for pinch_midi operations
pub type Result<T> = std::result::Result<T, PinchError>;
