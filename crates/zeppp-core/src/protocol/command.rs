//! Typed command builder
//!
//! Commands are assembled from typed arguments and only rendered to text
//! when handed to a transport, so the rest of the crate never formats
//! protocol strings by hand.

use core::fmt;

use super::{
    CMD_CHECK_INTERFACE, CMD_CHIP_ERASE, CMD_DATA_MEM_ERASE, CMD_DATA_MEM_READ,
    CMD_DATA_MEM_WRITE, CMD_ENTER_LVP, CMD_EXIT_LVP, CMD_INCREASE_ADDRESS, CMD_PGM_MEM_BLOCKWRITE,
    CMD_PGM_MEM_ERASE, CMD_PGM_MEM_READ, CMD_PGM_MEM_WRITE, CMD_SELECT_CFG_MEM,
};

/// A single command argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg {
    /// Rendered as two hex digits
    Byte(u8),
    /// Rendered as four hex digits
    Word(u16),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Byte(b) => write!(f, "{:02X}", b),
            Arg::Word(w) => write!(f, "{:04X}", w),
        }
    }
}

/// A ZEPPP protocol command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    mnemonic: &'static str,
    args: Vec<Arg>,
}

impl Command {
    /// Create a command without arguments
    pub fn new(mnemonic: &'static str) -> Self {
        Self {
            mnemonic,
            args: Vec::new(),
        }
    }

    /// Append a byte argument
    pub fn byte(mut self, value: u8) -> Self {
        self.args.push(Arg::Byte(value));
        self
    }

    /// Append a word argument
    pub fn word(mut self, value: u16) -> Self {
        self.args.push(Arg::Word(value));
        self
    }

    /// Append a sequence of byte arguments
    pub fn bytes(mut self, values: impl IntoIterator<Item = u8>) -> Self {
        self.args.extend(values.into_iter().map(Arg::Byte));
        self
    }

    /// Append a sequence of word arguments
    pub fn words(mut self, values: impl IntoIterator<Item = u16>) -> Self {
        self.args.extend(values.into_iter().map(Arg::Word));
        self
    }

    /// The command mnemonic
    pub fn mnemonic(&self) -> &'static str {
        self.mnemonic
    }

    /// The command arguments, in wire order
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Whether the interface must be in LVP mode to accept this command
    ///
    /// Only the interface check and the LVP mode transitions themselves may
    /// be sent outside programming mode.
    pub fn requires_lvp(&self) -> bool {
        !matches!(
            self.mnemonic,
            CMD_CHECK_INTERFACE | CMD_ENTER_LVP | CMD_EXIT_LVP
        )
    }

    /// Render the command as a protocol line (without terminator)
    pub fn encode(&self) -> String {
        self.to_string()
    }

    // ---- Command constructors ----

    /// Query the interface version
    pub fn check_interface() -> Self {
        Self::new(CMD_CHECK_INTERFACE)
    }

    /// Enter LVP mode; the address cursor resets to program memory start
    pub fn enter_lvp() -> Self {
        Self::new(CMD_ENTER_LVP)
    }

    /// Exit LVP mode
    pub fn exit_lvp() -> Self {
        Self::new(CMD_EXIT_LVP)
    }

    /// Move the address cursor to the start of configuration memory
    pub fn select_config_mem() -> Self {
        Self::new(CMD_SELECT_CFG_MEM)
    }

    /// Advance the address cursor by `count` words
    pub fn increase_address(count: u8) -> Self {
        Self::new(CMD_INCREASE_ADDRESS).byte(count)
    }

    /// Read `count` program or configuration memory words
    pub fn read_pgm(count: u8) -> Self {
        Self::new(CMD_PGM_MEM_READ).byte(count)
    }

    /// Write words one at a time using the given erase mode
    pub fn write_pgm(erase_mode: u8, words: impl IntoIterator<Item = u16>) -> Self {
        Self::new(CMD_PGM_MEM_WRITE).byte(erase_mode).words(words)
    }

    /// Write words in latch blocks of `write_size` words
    pub fn block_write_pgm(write_size: u8, words: impl IntoIterator<Item = u16>) -> Self {
        Self::new(CMD_PGM_MEM_BLOCKWRITE)
            .byte(write_size)
            .words(words)
    }

    /// Read `count` data memory bytes
    pub fn read_data(count: u8) -> Self {
        Self::new(CMD_DATA_MEM_READ).byte(count)
    }

    /// Write data memory bytes using the given erase mode
    pub fn write_data(erase_mode: u8, bytes: impl IntoIterator<Item = u8>) -> Self {
        Self::new(CMD_DATA_MEM_WRITE).byte(erase_mode).bytes(bytes)
    }

    /// Erase program memory
    pub fn erase_pgm(erase_mode: u8) -> Self {
        Self::new(CMD_PGM_MEM_ERASE).byte(erase_mode)
    }

    /// Erase data memory
    pub fn erase_data(erase_mode: u8) -> Self {
        Self::new(CMD_DATA_MEM_ERASE).byte(erase_mode)
    }

    /// Erase every memory area at once
    pub fn chip_erase() -> Self {
        Self::new(CMD_CHIP_ERASE)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
