//! ZEPPP protocol constants and codec
//!
//! The ZEPPP firmware speaks a line protocol. Every request is a mnemonic
//! followed by zero or more space separated hex tokens (two digits for a
//! byte, four digits for a word). Every response starts with a status token
//! (`OK` or `ERR`) followed by a free-form payload.

mod command;
mod response;

pub use command::{Arg, Command};
pub use response::{CommandResponse, Status};

/// Firmware version this client is written against
pub const EXPECTED_VERSION: &str = "1.0.0";

/// Baud rate used by the ZEPPP firmware
pub const BAUD_RATE: u32 = 115200;

/// Status token of a successful response
pub const STATUS_OK: &str = "OK";
/// Status token of a failed response
pub const STATUS_ERR: &str = "ERR";

// Command mnemonics
/// Query interface name and firmware version
pub const CMD_CHECK_INTERFACE: &str = "ZV";
/// Enter low-voltage programming mode
pub const CMD_ENTER_LVP: &str = "LE";
/// Exit low-voltage programming mode
pub const CMD_EXIT_LVP: &str = "LX";
/// Move the address cursor to the start of configuration memory
pub const CMD_SELECT_CFG_MEM: &str = "CS";
/// Advance the address cursor by N words without transferring data
pub const CMD_INCREASE_ADDRESS: &str = "AI";
/// Read N program (or configuration) memory words
pub const CMD_PGM_MEM_READ: &str = "PR";
/// Write program memory one word at a time
pub const CMD_PGM_MEM_WRITE: &str = "PW";
/// Write program memory using the device's write latches
pub const CMD_PGM_MEM_BLOCKWRITE: &str = "PB";
/// Read N data memory bytes
pub const CMD_DATA_MEM_READ: &str = "DR";
/// Write data memory bytes
pub const CMD_DATA_MEM_WRITE: &str = "DW";
/// Erase program memory (and config words when issued in config space)
pub const CMD_PGM_MEM_ERASE: &str = "PE";
/// Erase data memory
pub const CMD_DATA_MEM_ERASE: &str = "DE";
/// Erase the whole chip
pub const CMD_CHIP_ERASE: &str = "CE";

// Configuration memory layout (word offsets from the config memory start)
/// Offset of the first user ID word
pub const USER_IDS_OFFSET: u8 = 0;
/// Number of user ID words
pub const USER_IDS_COUNT: usize = 4;
/// Offset of the device ID word
pub const DEVICE_ID_OFFSET: u8 = 6;
/// Offset of the first configuration word
pub const CONF_WORD_OFFSET: u8 = 7;

/// Config word 0 bit that keeps low-voltage programming enabled
pub const CONF_WORD_LVP_MASK: u16 = 0x0080;
