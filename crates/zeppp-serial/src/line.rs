//! Line framing
//!
//! ZEPPP commands and responses are single text lines terminated by `\n`.
//! The firmware may add a `\r` before the terminator, which is stripped.

use std::time::{Duration, Instant};

use zeppp_core::transport::{Transport, TransportError};

use crate::error::{Result, SerialError};
use crate::transport::{ByteStream, DEFAULT_TIMEOUT_MS};

/// Longest response line accepted from the interface
///
/// A full 32 word read answer is well below this.
pub const MAX_LINE_LEN: usize = 1024;

/// Time an Arduino based interface needs to boot after the port is opened
pub const ARDUINO_BOOT_DELAY: Duration = Duration::from_millis(2000);

/// [`Transport`] carrying the ZEPPP line protocol over a byte stream
pub struct LineTransport<S: ByteStream> {
    stream: S,
    timeout: Duration,
    boot_delay: Duration,
    pending: Vec<u8>,
}

impl<S: ByteStream> LineTransport<S> {
    /// Wrap a byte stream with the default response timeout and no boot delay
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            boot_delay: Duration::ZERO,
            pending: Vec::new(),
        }
    }

    /// Set how long to wait for a complete response line
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how long to wait after opening before the first command
    pub fn with_boot_delay(mut self, delay: Duration) -> Self {
        self.boot_delay = delay;
        self
    }

    /// Get a reference to the underlying stream
    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// Take the next complete line out of the receive buffer
    fn take_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.pending.drain(..=end).collect();
        let line = String::from_utf8_lossy(&raw);
        Some(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn read_line(&mut self) -> Result<String> {
        let deadline = Instant::now() + self.timeout;
        let mut buf = [0u8; 256];

        loop {
            while let Some(line) = self.take_line() {
                if line.trim().is_empty() {
                    continue;
                }
                return Ok(line);
            }
            if self.pending.len() > MAX_LINE_LEN {
                self.pending.clear();
                return Err(SerialError::LineTooLong(MAX_LINE_LEN));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(SerialError::Timeout);
            }
            let timeout_ms = u32::try_from(remaining.as_millis()).unwrap_or(u32::MAX);
            let n = self.stream.read_nonblock(&mut buf, timeout_ms.max(1))?;
            self.pending.extend_from_slice(&buf[..n]);
        }
    }

    fn exchange(&mut self, line: &str) -> Result<String> {
        // Anything left over belongs to an earlier, abandoned transaction
        if !self.pending.is_empty() {
            log::debug!("Dropping {} stale bytes", self.pending.len());
            self.pending.clear();
        }

        let mut out = Vec::with_capacity(line.len() + 1);
        out.extend_from_slice(line.as_bytes());
        out.push(b'\n');
        self.stream.write(&out)?;
        self.stream.flush()?;

        self.read_line()
    }
}

impl<S: ByteStream> Transport for LineTransport<S> {
    fn open(&mut self) -> core::result::Result<(), TransportError> {
        if !self.boot_delay.is_zero() {
            log::debug!("Waiting {:?} for the interface to boot", self.boot_delay);
            std::thread::sleep(self.boot_delay);
        }

        let dropped = self.stream.drain().map_err(TransportError::from)?;
        if dropped > 0 {
            log::debug!("Drained {} bytes of boot output", dropped);
        }
        self.pending.clear();
        Ok(())
    }

    fn send_line(&mut self, line: &str) -> core::result::Result<String, TransportError> {
        self.exchange(line).map_err(TransportError::from)
    }
}
