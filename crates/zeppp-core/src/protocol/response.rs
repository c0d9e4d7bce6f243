//! Response decoding

use super::{STATUS_ERR, STATUS_OK};

/// Outcome of one protocol transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The interface accepted and executed the command
    Ok,
    /// The interface rejected the command or answered with garbage
    Failed,
    /// The transport did not deliver a response (timeout or I/O error)
    NoResponse,
}

/// A decoded response line
///
/// The payload is kept untyped; callers pick the accessor that matches the
/// command they sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    status: Status,
    message: String,
}

impl CommandResponse {
    /// Decode a response line
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        match head {
            STATUS_OK => Self {
                status: Status::Ok,
                message: rest.to_string(),
            },
            STATUS_ERR => Self {
                status: Status::Failed,
                message: if rest.is_empty() {
                    "Command failed".to_string()
                } else {
                    rest.to_string()
                },
            },
            "" => Self {
                status: Status::Failed,
                message: "Empty response".to_string(),
            },
            _ => Self {
                status: Status::Failed,
                message: format!("Unexpected response: {}", line),
            },
        }
    }

    /// Build the response for a transaction the transport could not complete
    pub fn no_response(message: impl Into<String>) -> Self {
        Self {
            status: Status::NoResponse,
            message: message.into(),
        }
    }

    /// Transaction status
    pub fn status(&self) -> Status {
        self.status
    }

    /// Whether the interface reported success
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Payload as text
    pub fn message(&self) -> &str {
        &self.message
    }

    /// First payload token as a 16-bit word
    pub fn word(&self) -> Option<u16> {
        self.message
            .split_whitespace()
            .next()
            .and_then(|token| u16::from_str_radix(token, 16).ok())
    }

    /// Every payload token as a 16-bit word
    ///
    /// Returns an empty array if any token is not a hex number; callers
    /// compare the length with what they requested.
    pub fn words(&self) -> Vec<u16> {
        self.message
            .split_whitespace()
            .map(|token| u16::from_str_radix(token, 16).ok())
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default()
    }
}
