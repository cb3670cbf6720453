//! GNSS Receiver Error Types

use ring_buffer::QueueError;
use thiserror::Error;

/// Errors raised by a serial transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// Serial port connection error
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// Write or reconfigure before `init`
    #[error("Transport not initialized")]
    NotInitialized,

    /// `init` called twice
    #[error("Transport already initialized")]
    AlreadyInitialized,
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::SerialError(err.to_string())
    }
}

impl From<tokio_serial::Error> for TransportError {
    fn from(err: tokio_serial::Error) -> Self {
        TransportError::SerialError(err.to_string())
    }
}

/// Errors composing an outbound configuration command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Framed command would exceed the receiver's input budget
    #[error("Command too long: {len} bytes framed, limit is {max}")]
    TooLong { len: usize, max: usize },

    /// Body contains a framing character
    #[error("Command body contains reserved character {0:?}")]
    ReservedCharacter(char),
}

/// Top-level errors of the receiver
#[derive(Debug, Error)]
pub enum GnssError {
    /// Serial transport failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Command refused before transmission
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Ring buffer could not be built
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Configuration source could not be read
    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    /// Configuration value rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Global subscriber already installed
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}
