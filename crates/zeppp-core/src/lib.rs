//! zeppp-core - Core library for ZEPPP PIC programmers
//!
//! This crate drives a ZEPPP ("Zero External Parts PIC Programmer")
//! interface through its line-based text protocol. It provides the
//! programming session state machine, the chunked memory engine used for
//! reading, writing and verifying PIC memories, device identification
//! against a device database, and the erase policy.
//!
//! The byte-level link is not part of this crate: anything implementing
//! [`transport::Transport`] can carry the protocol (see `zeppp-serial` for
//! serial ports and TCP bridges, and `zeppp-dummy` for an in-memory
//! emulator).
//!
//! # Example
//!
//! ```ignore
//! use zeppp_core::device::DeviceDatabase;
//! use zeppp_core::memory::PicDevice;
//! use zeppp_core::session::Session;
//!
//! let db = DeviceDatabase::builtin()?;
//! let mut session = Session::open(transport)?;
//! session.connect()?;
//!
//! let profile = session.autodetect_device(&db)?;
//! let mut pic = PicDevice::new(profile.clone());
//! session.read_all(&mut pic)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod device;
pub mod error;
pub mod memory;
pub mod protocol;
pub mod session;
pub mod transport;

pub use error::{Error, Result};
