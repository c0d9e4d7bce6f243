//! Error types for zeppp-core
//!
//! Every failure is terminal for the operation that raised it. Nothing in
//! this crate retries; callers re-run the whole operation instead.

use thiserror::Error;

use crate::device::DeviceDbError;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// The interface could not be reached or runs unsupported firmware
    #[error("{action}: {message}")]
    Connection {
        /// What was being attempted
        action: String,
        /// Reason reported by the interface or the transport
        message: String,
    },

    /// The interface answered a command with a non-OK status
    #[error("{action}: {message}")]
    Command {
        /// What was being attempted
        action: String,
        /// Message returned by the interface
        message: String,
    },

    /// The connected PIC is not the device the caller expected
    #[error(
        "Verify PIC Device ID: ID mismatch! Expected 0x{expected:04x} ({name}), found 0x{detected:04x}"
    )]
    DeviceMismatch {
        /// Device ID of the expected profile
        expected: u16,
        /// Device ID of the detected profile
        detected: u16,
        /// Name of the expected device
        name: String,
    },

    /// The raw device ID is not present in the device database
    #[error("Detect connected device: Unrecognized device with ID 0x{raw_id:04x}")]
    UnrecognizedDevice {
        /// Raw device ID word, revision bits included
        raw_id: u16,
    },

    /// A read returned a different number of words than requested
    #[error("{action}: Data size mismatch (expected {expected} words, received {received})")]
    DataSizeMismatch {
        /// What was being attempted
        action: String,
        /// Number of words requested
        expected: usize,
        /// Number of words received
        received: usize,
    },

    /// Read-back data differs from the image
    #[error("Verify data at offset 0x{offset:04x}! Expected 0x{expected:04x}. Received 0x{received:04x} instead")]
    Verify {
        /// Word offset within the verified region
        offset: usize,
        /// Word held by the image
        expected: u16,
        /// Word read from the device
        received: u16,
    },

    /// Loading the device database failed
    #[error("Device database: {0}")]
    DeviceDb(#[from] DeviceDbError),
}

impl Error {
    /// Build a [`Error::Command`] from an action label and a device message
    pub fn command(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Build a [`Error::Connection`] from an action label and a reason
    pub fn connection(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            action: action.into(),
            message: message.into(),
        }
    }
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
