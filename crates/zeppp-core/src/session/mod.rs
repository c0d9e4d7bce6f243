//! Programming session
//!
//! A [`Session`] owns the link to one ZEPPP interface and tracks whether
//! the interface has been checked, whether the PIC is in low-voltage
//! programming (LVP) mode, and which device ID was last verified.
//!
//! Every addressing, erase or transfer command is only sent while LVP mode
//! is active. Operations that start from a known address (block passes,
//! erases, config memory accesses) restart LVP mode first, which resets the
//! PIC's address counter to the start of program memory.

mod blocks;
mod erase;
mod ident;
#[cfg(test)]
mod mock;

pub use blocks::{
    chunks, transfer_chunks, Chunk, WriteMode, DATA_UNITS_PER_TRANSFER, VERIFICATION_SKIPPED,
};
pub use erase::{erase_plan, ErasePlan};

use crate::error::{Error, Result};
use crate::protocol::{Command, CommandResponse, EXPECTED_VERSION};
use crate::transport::Transport;

/// Connection and programming mode state for one ZEPPP interface
pub struct Session<T: Transport> {
    transport: T,
    connected: bool,
    lvp_active: bool,
    verified_device_id: Option<u16>,
}

impl<T: Transport> Session<T> {
    /// Open the transport and create a disconnected session
    pub fn open(mut transport: T) -> Result<Self> {
        log::debug!("Opening ZEPPP interface link");
        transport.open().map_err(|e| {
            Error::connection(
                "Open port",
                format!(
                    "{}. Check that the interface is connected, and the port is not already opened by another program",
                    e
                ),
            )
        })?;

        Ok(Self {
            transport,
            connected: false,
            lvp_active: false,
            verified_device_id: None,
        })
    }

    /// Check the interface and its firmware version
    ///
    /// Does nothing if the session is already connected.
    pub fn connect(&mut self) -> Result<()> {
        if self.connected {
            return Ok(());
        }

        log::info!("Connecting to ZEPPP interface...");
        let response = self.transact(&Command::check_interface());
        if !response.is_ok() {
            return Err(Error::connection(
                "Connect to interface",
                response.message(),
            ));
        }
        if !response.message().contains(EXPECTED_VERSION) {
            return Err(Error::connection(
                "Connect to interface",
                format!(
                    "Unsupported interface version '{}' (expected {})",
                    response.message(),
                    EXPECTED_VERSION
                ),
            ));
        }

        log::info!("Interface detected: {}", response.message());
        self.connected = true;
        Ok(())
    }

    /// Whether the interface has been checked
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether the PIC is believed to be in LVP mode
    pub fn is_lvp_active(&self) -> bool {
        self.lvp_active
    }

    /// Device ID confirmed by the last identification, if any
    pub fn verified_device_id(&self) -> Option<u16> {
        self.verified_device_id
    }

    /// Get a reference to the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // ---- Programming mode ----

    /// Put the PIC into LVP mode
    ///
    /// Does nothing if LVP mode is already active.
    pub fn enter_lvp(&mut self) -> Result<()> {
        if self.lvp_active {
            return Ok(());
        }
        if !self.connected {
            return Err(Error::connection(
                "Enter LVP Mode",
                "Not connected to interface",
            ));
        }

        self.execute(&Command::enter_lvp(), "Enter LVP Mode")?;
        self.lvp_active = true;
        Ok(())
    }

    /// Take the PIC out of LVP mode
    ///
    /// Never fails. If the interface does not acknowledge, the session keeps
    /// assuming LVP mode is active.
    pub fn exit_lvp(&mut self) {
        let response = self.transact(&Command::exit_lvp());
        if response.is_ok() {
            self.lvp_active = false;
        } else {
            log::debug!("Exit LVP Mode failed: {}", response.message());
        }
    }

    /// Restart LVP mode, resetting the PIC's address counter
    pub fn reset_lvp(&mut self) -> Result<()> {
        if self.lvp_active {
            self.exit_lvp();
        }
        self.enter_lvp()
    }

    /// Point the address counter `offset` words into configuration memory
    pub fn select_config_mem_start(&mut self, offset: u8) -> Result<()> {
        self.reset_lvp()?;
        self.execute(&Command::select_config_mem(), "Select CFG Memory Area")?;
        if offset > 0 {
            self.execute(&Command::increase_address(offset), "Move to Address")?;
        }
        Ok(())
    }

    // ---- Transactions ----

    /// Send one command and decode the answer
    ///
    /// Transport failures become [`Status::NoResponse`](crate::protocol::Status)
    /// responses.
    fn transact(&mut self, command: &Command) -> CommandResponse {
        let line = command.encode();
        log::trace!("> {}", line);

        match self.transport.send_line(&line) {
            Ok(reply) => {
                log::trace!("< {}", reply);
                CommandResponse::parse(&reply)
            }
            Err(e) => {
                log::debug!("No response to {}: {}", command.mnemonic(), e);
                CommandResponse::no_response(e.to_string())
            }
        }
    }

    /// Send one command and turn a non-OK answer into an error
    fn execute(&mut self, command: &Command, action: &str) -> Result<CommandResponse> {
        if command.requires_lvp() && !self.lvp_active {
            return Err(Error::command(action, "LVP mode not active"));
        }

        let response = self.transact(command);
        if response.is_ok() {
            Ok(response)
        } else {
            Err(Error::command(action, response.message()))
        }
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        if self.lvp_active {
            log::debug!("Leaving LVP mode on session close");
            self.exit_lvp();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::ScriptedTransport;
    use super::*;

    #[test]
    fn test_open_failure() {
        let transport = ScriptedTransport::new(&[]).fail_open();
        let err = Session::open(transport).err().unwrap();
        let msg = err.to_string();
        assert!(msg.starts_with("Open port: "));
        assert!(msg.contains("not already opened by another program"));
    }

    #[test]
    fn test_connect() {
        let transport = ScriptedTransport::new(&["OK ZEPPP v1.0.0"]);
        let mut session = Session::open(transport).unwrap();
        session.connect().unwrap();
        assert!(session.is_connected());

        // Second call does not transact
        session.connect().unwrap();
        assert_eq!(session.transport().sent(), &["ZV"]);
    }

    #[test]
    fn test_connect_wrong_version() {
        let transport = ScriptedTransport::new(&["OK ZEPPP v0.9.2"]);
        let mut session = Session::open(transport).unwrap();
        let err = session.connect().unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
        assert!(err.to_string().contains("0.9.2"));
        assert!(!session.is_connected());
    }

    #[test]
    fn test_connect_no_response() {
        let transport = ScriptedTransport::new(&[]);
        let mut session = Session::open(transport).unwrap();
        let err = session.connect().unwrap_err();
        assert!(err.to_string().starts_with("Connect to interface: "));
    }

    #[test]
    fn test_enter_lvp_requires_connection() {
        let transport = ScriptedTransport::new(&[]);
        let mut session = Session::open(transport).unwrap();
        assert!(matches!(
            session.enter_lvp(),
            Err(Error::Connection { .. })
        ));
        assert!(session.transport().sent().is_empty());
    }

    #[test]
    fn test_enter_lvp_failure() {
        let transport = ScriptedTransport::new(&["OK ZEPPP v1.0.0", "ERR no target"]);
        let mut session = Session::open(transport).unwrap();
        session.connect().unwrap();

        let err = session.enter_lvp().unwrap_err();
        assert_eq!(err.to_string(), "Enter LVP Mode: no target");
        assert!(!session.is_lvp_active());
    }

    #[test]
    fn test_reset_lvp() {
        let transport = ScriptedTransport::new(&["OK ZEPPP v1.0.0", "OK", "OK", "OK", "OK"]);
        let mut session = Session::open(transport).unwrap();
        session.connect().unwrap();

        session.reset_lvp().unwrap();
        assert!(session.is_lvp_active());
        // Already active: exit then enter again
        session.reset_lvp().unwrap();
        assert!(session.is_lvp_active());
        assert_eq!(session.transport().sent(), &["ZV", "LE", "LX", "LE"]);
    }

    #[test]
    fn test_exit_lvp_failure_keeps_flag() {
        let transport = ScriptedTransport::new(&["OK ZEPPP v1.0.0", "OK", "ERR busy"]);
        let mut session = Session::open(transport).unwrap();
        session.connect().unwrap();
        session.enter_lvp().unwrap();

        session.exit_lvp();
        assert!(session.is_lvp_active());

        // Transport failure is swallowed as well
        session.exit_lvp();
        assert!(session.is_lvp_active());
    }

    #[test]
    fn test_select_config_mem_start() {
        let transport =
            ScriptedTransport::new(&["OK ZEPPP v1.0.0", "OK", "OK", "OK", "OK", "OK", "OK"]);
        let mut session = Session::open(transport).unwrap();
        session.connect().unwrap();

        session.select_config_mem_start(7).unwrap();
        session.select_config_mem_start(0).unwrap();
        assert_eq!(
            session.transport().sent(),
            &["ZV", "LE", "CS", "AI 07", "LX", "LE", "CS"]
        );
    }

    #[test]
    fn test_commands_refused_outside_lvp() {
        let transport = ScriptedTransport::new(&["OK ZEPPP v1.0.0"]);
        let mut session = Session::open(transport).unwrap();
        session.connect().unwrap();

        let err = session
            .execute(&Command::chip_erase(), "Erase CHIP")
            .unwrap_err();
        assert_eq!(err.to_string(), "Erase CHIP: LVP mode not active");
        assert_eq!(session.transport().sent(), &["ZV"]);
    }
}
