//! Error types for ZEPPP links

use thiserror::Error;
use zeppp_core::transport::TransportError;

/// Link-level errors
#[derive(Debug, Error)]
pub enum SerialError {
    /// Failed to connect to the interface
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid programmer connection string
    #[error("Invalid connection string: {0}")]
    InvalidConnection(String),

    /// No complete line arrived in time
    #[error("Communication timeout")]
    Timeout,

    /// The interface sent a line longer than the framing buffer
    #[error("Response line exceeds {0} bytes")]
    LineTooLong(usize),

    /// I/O error during communication
    #[error("I/O error: {0}")]
    IoError(String),

    /// Serial port error
    #[error("Serial port error: {0}")]
    SerialError(#[from] serialport::Error),
}

/// Result type for link operations
pub type Result<T> = core::result::Result<T, SerialError>;

impl From<std::io::Error> for SerialError {
    fn from(e: std::io::Error) -> Self {
        SerialError::IoError(e.to_string())
    }
}

impl From<SerialError> for TransportError {
    fn from(e: SerialError) -> Self {
        match e {
            SerialError::ConnectionFailed(msg) | SerialError::InvalidConnection(msg) => {
                TransportError::Open(msg)
            }
            SerialError::SerialError(e) => TransportError::Open(e.to_string()),
            SerialError::Timeout => TransportError::Timeout,
            e @ SerialError::LineTooLong(_) => TransportError::Framing(e.to_string()),
            SerialError::IoError(msg) => TransportError::Io(msg),
        }
    }
}
