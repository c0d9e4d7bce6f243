//! zeppp-serial - Serial and TCP links to ZEPPP interfaces
//!
//! This crate carries the ZEPPP line protocol over a serial port (the
//! interface's USB serial adapter) or over a TCP socket exposed by a
//! serial-to-network bridge, and implements the `zeppp-core` transport
//! trait on top of either.
//!
//! # Supported Links
//!
//! - Serial port: `dev=/dev/ttyUSB0`, `dev=COM3:115200`, etc.
//! - TCP socket: `ip=host:port`
//!
//! # Example
//!
//! ```no_run
//! use zeppp_core::session::Session;
//!
//! let transport = zeppp_serial::open_zeppp("dev=/dev/ttyUSB0")?;
//! let mut session = Session::open(transport)?;
//! session.connect()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod line;
pub mod transport;

// Re-exports
pub use error::{Result, SerialError};
pub use line::LineTransport;
pub use transport::serial::SerialStream;
pub use transport::tcp::TcpBridge;
pub use transport::ByteStream;

use zeppp_core::transport::Transport;

/// Connection options for a ZEPPP interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZepppConnection {
    /// Serial port connection
    Serial {
        /// Device path (e.g., "/dev/ttyUSB0" or "COM1")
        device: String,
        /// Baud rate (None for the firmware default)
        baud: Option<u32>,
    },
    /// TCP socket connection
    Tcp {
        /// Hostname or IP address
        host: String,
        /// Port number
        port: u16,
    },
}

impl ZepppConnection {
    /// Parse a connection string
    ///
    /// Formats:
    /// - `dev=/dev/ttyUSB0` - Serial with default baud
    /// - `dev=/dev/ttyUSB0:115200` - Serial with specified baud
    /// - `ip=host:port` - TCP connection
    pub fn parse(s: &str) -> Result<Self> {
        if let Some(dev) = s.strip_prefix("dev=") {
            if dev.is_empty() {
                return Err(SerialError::InvalidConnection(
                    "Missing device in dev= parameter".to_string(),
                ));
            }
            // Windows device names never contain ':', so a trailing
            // `:digits` is always a baud rate.
            match dev.rsplit_once(':') {
                Some((device, baud_str)) if !device.is_empty() => {
                    let baud = baud_str.parse().map_err(|_| {
                        SerialError::InvalidConnection(format!("Invalid baud rate: {}", baud_str))
                    })?;
                    Ok(ZepppConnection::Serial {
                        device: device.to_string(),
                        baud: Some(baud),
                    })
                }
                _ => Ok(ZepppConnection::Serial {
                    device: dev.to_string(),
                    baud: None,
                }),
            }
        } else if let Some(ip) = s.strip_prefix("ip=") {
            let (host, port_str) = ip.rsplit_once(':').ok_or_else(|| {
                SerialError::InvalidConnection("Missing port in ip= parameter".to_string())
            })?;
            let port = port_str.parse().map_err(|_| {
                SerialError::InvalidConnection(format!("Invalid port: {}", port_str))
            })?;
            Ok(ZepppConnection::Tcp {
                host: host.to_string(),
                port,
            })
        } else {
            Err(SerialError::InvalidConnection(format!(
                "{}. Use dev=... or ip=...",
                s
            )))
        }
    }
}

/// Open a ZEPPP link and return a boxed transport
///
/// Serial links wait for the interface to reboot before the first command,
/// since opening the port resets Arduino based boards.
pub fn open_zeppp(options: &str) -> Result<Box<dyn Transport>> {
    let conn = ZepppConnection::parse(options)?;

    match conn {
        ZepppConnection::Serial { device, baud } => Ok(Box::new(open_serial(&device, baud)?)),
        ZepppConnection::Tcp { host, port } => Ok(Box::new(open_tcp(&host, port)?)),
    }
}

/// Open a ZEPPP link via serial port
pub fn open_serial(device: &str, baud: Option<u32>) -> Result<LineTransport<SerialStream>> {
    let stream = SerialStream::open(device, baud)?;
    Ok(LineTransport::new(stream).with_boot_delay(line::ARDUINO_BOOT_DELAY))
}

/// Open a ZEPPP link via TCP
pub fn open_tcp(host: &str, port: u16) -> Result<LineTransport<TcpBridge>> {
    let stream = TcpBridge::connect(host, port)?;
    Ok(LineTransport::new(stream))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serial() {
        assert_eq!(
            ZepppConnection::parse("dev=/dev/ttyUSB0").unwrap(),
            ZepppConnection::Serial {
                device: "/dev/ttyUSB0".to_string(),
                baud: None
            }
        );
        assert_eq!(
            ZepppConnection::parse("dev=COM3:57600").unwrap(),
            ZepppConnection::Serial {
                device: "COM3".to_string(),
                baud: Some(57600)
            }
        );
    }

    #[test]
    fn test_parse_tcp() {
        assert_eq!(
            ZepppConnection::parse("ip=localhost:2000").unwrap(),
            ZepppConnection::Tcp {
                host: "localhost".to_string(),
                port: 2000
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(ZepppConnection::parse("dev=").is_err());
        assert!(ZepppConnection::parse("dev=/dev/ttyUSB0:fast").is_err());
        assert!(ZepppConnection::parse("ip=localhost").is_err());
        assert!(ZepppConnection::parse("ip=localhost:99999").is_err());
        assert!(matches!(
            ZepppConnection::parse("/dev/ttyUSB0"),
            Err(SerialError::InvalidConnection(_))
        ));
    }
}
