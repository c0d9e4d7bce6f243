//! Byte stream layer for ZEPPP links
//!
//! This module provides a unified byte interface over serial ports and TCP
//! sockets. Line framing lives in [`crate::line`].

use crate::error::{Result, SerialError};

/// Default read and write timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Byte stream carrying the ZEPPP line protocol
pub trait ByteStream {
    /// Write all bytes to the stream
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read with timeout
    ///
    /// Reads up to `buf.len()` bytes, waiting up to `timeout_ms` milliseconds.
    /// Returns the number of bytes read, or 0 on timeout.
    fn read_nonblock(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<()>;

    /// Discard everything already received
    ///
    /// Returns the number of bytes dropped.
    fn drain(&mut self) -> Result<usize> {
        let mut buf = [0u8; 64];
        let mut total = 0;
        loop {
            match self.read_nonblock(&mut buf, 10)? {
                0 => return Ok(total),
                n => total += n,
            }
        }
    }
}

pub mod serial {
    //! Serial port stream implementation

    use super::*;
    use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
    use std::io::{Read, Write};
    use std::time::Duration;

    /// Serial port stream
    pub struct SerialStream {
        port: Box<dyn SerialPort>,
    }

    impl SerialStream {
        /// Open a serial port with the specified baud rate
        ///
        /// Uses the ZEPPP firmware rate when no baud rate is given.
        pub fn open(device: &str, baud: Option<u32>) -> Result<Self> {
            let baud_rate = baud.unwrap_or(zeppp_core::protocol::BAUD_RATE);

            let port = serialport::new(device, baud_rate)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
                .open()?;

            log::info!("Opened serial port {} at {} baud", device, baud_rate);

            Ok(Self { port })
        }
    }

    impl ByteStream for SerialStream {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.port.write_all(data)?;
            Ok(())
        }

        fn read_nonblock(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize> {
            let old_timeout = self.port.timeout();
            self.port
                .set_timeout(Duration::from_millis(timeout_ms as u64))?;

            let result = match self.port.read(buf) {
                Ok(n) => Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
                Err(e) => Err(SerialError::from(e)),
            };

            self.port.set_timeout(old_timeout)?;
            result
        }

        fn flush(&mut self) -> Result<()> {
            self.port.flush()?;
            Ok(())
        }
    }
}

pub mod tcp {
    //! TCP bridge stream implementation
    //!
    //! Used with serial-to-network bridges such as `ser2net`.

    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::time::Duration;

    /// TCP socket stream
    pub struct TcpBridge {
        stream: TcpStream,
    }

    impl TcpBridge {
        /// Connect to a bridge at the specified host and port
        pub fn connect(host: &str, port: u16) -> Result<Self> {
            let addr = format!("{}:{}", host, port);
            log::info!("Connecting to ZEPPP bridge at {}", addr);

            let stream = TcpStream::connect(&addr)
                .map_err(|e| SerialError::ConnectionFailed(e.to_string()))?;

            stream.set_nodelay(true).map_err(|e| {
                SerialError::ConnectionFailed(format!("Failed to set TCP_NODELAY: {}", e))
            })?;
            stream
                .set_read_timeout(Some(Duration::from_millis(DEFAULT_TIMEOUT_MS)))
                .map_err(|e| {
                    SerialError::ConnectionFailed(format!("Failed to set read timeout: {}", e))
                })?;
            stream
                .set_write_timeout(Some(Duration::from_millis(DEFAULT_TIMEOUT_MS)))
                .map_err(|e| {
                    SerialError::ConnectionFailed(format!("Failed to set write timeout: {}", e))
                })?;

            log::info!("Connected to ZEPPP bridge at {}", addr);

            Ok(Self { stream })
        }
    }

    impl ByteStream for TcpBridge {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.stream.write_all(data)?;
            Ok(())
        }

        fn read_nonblock(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize> {
            // A zero duration would mean "block forever"
            let timeout = Duration::from_millis(u64::from(timeout_ms.max(1)));
            self.stream.set_read_timeout(Some(timeout))?;

            let result = match self.stream.read(buf) {
                Ok(0) => Err(SerialError::ConnectionFailed(
                    "Bridge closed the connection".to_string(),
                )),
                Ok(n) => Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
                Err(e) => Err(SerialError::from(e)),
            };

            self.stream
                .set_read_timeout(Some(Duration::from_millis(DEFAULT_TIMEOUT_MS)))?;
            result
        }

        fn flush(&mut self) -> Result<()> {
            self.stream.flush()?;
            Ok(())
        }
    }
}
