//! Transport abstraction
//!
//! A transport carries one text line to the ZEPPP interface and returns the
//! line it answers with. Transactions are strictly sequential: a session
//! never sends a command before the previous response has been returned.

use thiserror::Error;

/// Errors raised by a transport
///
/// The session never propagates these directly. A failed transaction is
/// turned into a non-OK response so it is reported like any other command
/// failure.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The link could not be opened
    #[error("Failed to open link: {0}")]
    Open(String),

    /// No complete response line arrived in time
    #[error("Timed out waiting for a response")]
    Timeout,

    /// The response could not be framed
    #[error("Malformed response: {0}")]
    Framing(String),

    /// I/O error while talking to the interface
    #[error("I/O error: {0}")]
    Io(String),
}

/// Line-oriented link to a ZEPPP interface
pub trait Transport {
    /// Prepare the link for the first transaction
    ///
    /// Called once when a session is opened. The default does nothing.
    fn open(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Send one command line and block until the response line arrives
    ///
    /// `line` carries no terminator; implementations add whatever framing
    /// the link needs and strip it from the returned response.
    fn send_line(&mut self, line: &str) -> Result<String, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self) -> Result<(), TransportError> {
        (**self).open()
    }

    fn send_line(&mut self, line: &str) -> Result<String, TransportError> {
        (**self).send_line(line)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn open(&mut self) -> Result<(), TransportError> {
        (**self).open()
    }

    fn send_line(&mut self, line: &str) -> Result<String, TransportError> {
        (**self).send_line(line)
    }
}
