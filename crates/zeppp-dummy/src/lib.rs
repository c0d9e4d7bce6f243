//! zeppp-dummy - In-memory ZEPPP interface emulator for testing
//!
//! This crate provides a dummy ZEPPP interface with an attached PIC that
//! lives entirely in memory. It answers the ZEPPP line protocol the way the
//! firmware does, which makes it useful for testing and development without
//! real hardware.

#![warn(missing_docs)]

use std::collections::HashSet;

use zeppp_core::device::DeviceProfile;
use zeppp_core::memory::{DATA_ERASED_WORD, PGM_ERASED_WORD};
use zeppp_core::protocol::{
    CMD_CHECK_INTERFACE, CMD_CHIP_ERASE, CMD_DATA_MEM_ERASE, CMD_DATA_MEM_READ,
    CMD_DATA_MEM_WRITE, CMD_ENTER_LVP, CMD_EXIT_LVP, CMD_INCREASE_ADDRESS, CMD_PGM_MEM_BLOCKWRITE,
    CMD_PGM_MEM_ERASE, CMD_PGM_MEM_READ, CMD_PGM_MEM_WRITE, CMD_SELECT_CFG_MEM, CONF_WORD_OFFSET,
    DEVICE_ID_OFFSET, STATUS_ERR, STATUS_OK, USER_IDS_COUNT,
};
use zeppp_core::transport::{Transport, TransportError};

/// Minimum number of words in the emulated configuration memory space
const CONFIG_SPACE_WORDS: usize = 16;

/// Configuration for the dummy interface
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Firmware banner returned by the interface check
    pub banner: String,
    /// Raw device ID word, revision bits included
    pub raw_device_id: u16,
    /// Program memory size in words
    pub pgm_mem_size: usize,
    /// Data memory size in bytes
    pub data_mem_size: usize,
    /// Number of configuration words
    pub conf_words: usize,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            banner: "ZEPPP v1.0.0".to_string(),
            raw_device_id: 0x1066, // PIC16F628A rev 6
            pgm_mem_size: 2048,
            data_mem_size: 128,
            conf_words: 1,
        }
    }
}

impl DummyConfig {
    /// Emulate the device described by a profile
    pub fn for_profile(profile: &DeviceProfile, revision: u16) -> Self {
        let raw_device_id = profile
            .device_id
            .checked_shl(u32::from(profile.revision_bits))
            .unwrap_or(0)
            | revision;
        Self {
            raw_device_id,
            pgm_mem_size: profile.pgm_mem_size as usize,
            data_mem_size: profile.data_mem_size as usize,
            conf_words: usize::from(profile.conf_words),
            ..Self::default()
        }
    }
}

/// Dummy ZEPPP interface
///
/// Emulates the firmware and the PIC behind it. Program memory follows flash
/// semantics (writes can only clear bits) unless a word write asks for an
/// erase cycle; data memory bytes are replaced on write.
pub struct DummyProgrammer {
    config: DummyConfig,
    program: Vec<u16>,
    data: Vec<u8>,
    config_space: Vec<u16>,
    lvp: bool,
    in_config: bool,
    address: usize,
    log: Vec<String>,
    fail_on: HashSet<String>,
    timeout_on: HashSet<String>,
}

impl DummyProgrammer {
    /// Create a new dummy interface with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        // Devices with many configuration words extend past the usual 16
        let config_words_end = usize::from(CONF_WORD_OFFSET) + config.conf_words;
        let mut config_space = vec![PGM_ERASED_WORD; CONFIG_SPACE_WORDS.max(config_words_end)];
        config_space[usize::from(DEVICE_ID_OFFSET)] = config.raw_device_id;

        Self {
            program: vec![PGM_ERASED_WORD; config.pgm_mem_size],
            data: vec![DATA_ERASED_WORD as u8; config.data_mem_size],
            config_space,
            config,
            lvp: false,
            in_config: false,
            address: 0,
            log: Vec::new(),
            fail_on: HashSet::new(),
            timeout_on: HashSet::new(),
        }
    }

    /// Create a new dummy interface with the default configuration (PIC16F628A)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Program memory contents
    pub fn program(&self) -> &[u16] {
        &self.program
    }

    /// Mutable program memory contents
    pub fn program_mut(&mut self) -> &mut [u16] {
        &mut self.program
    }

    /// Data memory contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable data memory contents
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// User ID words
    pub fn user_ids(&self) -> &[u16] {
        &self.config_space[..USER_IDS_COUNT]
    }

    /// Configuration words
    pub fn config_words(&self) -> &[u16] {
        let start = usize::from(CONF_WORD_OFFSET);
        &self.config_space[start..start + self.config.conf_words]
    }

    /// Mutable configuration words
    pub fn config_words_mut(&mut self) -> &mut [u16] {
        let start = usize::from(CONF_WORD_OFFSET);
        &mut self.config_space[start..start + self.config.conf_words]
    }

    /// Whether the emulated PIC is in LVP mode
    pub fn is_lvp(&self) -> bool {
        self.lvp
    }

    /// Every command line received so far
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Forget the received command lines
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Received command mnemonics, in order
    pub fn mnemonics(&self) -> Vec<&str> {
        self.log
            .iter()
            .filter_map(|line| line.split_whitespace().next())
            .collect()
    }

    /// Answer every command with this mnemonic with an error
    pub fn fail_command(&mut self, mnemonic: &str) {
        self.fail_on.insert(mnemonic.to_string());
    }

    /// Never answer commands with this mnemonic
    pub fn drop_command(&mut self, mnemonic: &str) {
        self.timeout_on.insert(mnemonic.to_string());
    }

    /// Stop injecting failures
    pub fn clear_failures(&mut self) {
        self.fail_on.clear();
        self.timeout_on.clear();
    }

    fn handle_line(&mut self, line: &str) -> String {
        let mut tokens = line.split_whitespace();
        let mnemonic = tokens.next().unwrap_or_default();

        if self.fail_on.contains(mnemonic) {
            return format!("{} injected failure", STATUS_ERR);
        }

        let args: Option<Vec<u16>> = tokens
            .map(|t| u16::from_str_radix(t, 16).ok())
            .collect();
        let Some(args) = args else {
            return format!("{} bad argument", STATUS_ERR);
        };

        let result = match mnemonic {
            CMD_CHECK_INTERFACE => Ok(Some(self.config.banner.clone())),
            CMD_ENTER_LVP => {
                self.lvp = true;
                self.in_config = false;
                self.address = 0;
                Ok(None)
            }
            CMD_EXIT_LVP => {
                self.lvp = false;
                Ok(None)
            }
            _ if !self.lvp => Err("not in LVP mode"),
            CMD_SELECT_CFG_MEM => {
                self.in_config = true;
                self.address = 0;
                Ok(None)
            }
            CMD_INCREASE_ADDRESS => self.count(&args).map(|n| {
                self.address += n;
                None
            }),
            CMD_PGM_MEM_READ => self.count(&args).map(|n| Some(self.read_words(n))),
            CMD_PGM_MEM_WRITE => self.write_words(&args, |a| a != 0),
            CMD_PGM_MEM_BLOCKWRITE => self.write_words(&args, |_| false),
            CMD_DATA_MEM_READ => self.count(&args).map(|n| Some(self.read_bytes(n))),
            CMD_DATA_MEM_WRITE => self.write_bytes(&args),
            CMD_PGM_MEM_ERASE => {
                self.program.fill(PGM_ERASED_WORD);
                if self.in_config {
                    self.erase_config_space();
                }
                Ok(None)
            }
            CMD_DATA_MEM_ERASE => {
                self.data.fill(DATA_ERASED_WORD as u8);
                Ok(None)
            }
            CMD_CHIP_ERASE => {
                self.program.fill(PGM_ERASED_WORD);
                self.data.fill(DATA_ERASED_WORD as u8);
                self.erase_config_space();
                Ok(None)
            }
            _ => Err("unknown command"),
        };

        match result {
            Ok(Some(payload)) => format!("{} {}", STATUS_OK, payload),
            Ok(None) => STATUS_OK.to_string(),
            Err(msg) => format!("{} {}", STATUS_ERR, msg),
        }
    }

    fn count(&self, args: &[u16]) -> Result<usize, &'static str> {
        match args {
            [n] => Ok(usize::from(*n)),
            _ => Err("expected one argument"),
        }
    }

    fn word_at(&self, address: usize) -> u16 {
        let memory = if self.in_config {
            &self.config_space
        } else {
            &self.program
        };
        memory.get(address).copied().unwrap_or(PGM_ERASED_WORD)
    }

    fn read_words(&mut self, n: usize) -> String {
        let words: Vec<String> = (0..n)
            .map(|i| format!("{:04X}", self.word_at(self.address + i)))
            .collect();
        self.address += n;
        words.join(" ")
    }

    fn read_bytes(&mut self, n: usize) -> String {
        let bytes: Vec<String> = (0..n)
            .map(|i| {
                let b = self.data.get(self.address + i).copied().unwrap_or(0xFF);
                format!("{:02X}", b)
            })
            .collect();
        self.address += n;
        bytes.join(" ")
    }

    /// Store words at the address cursor; `erase_first` decides from the
    /// leading mode byte whether the cells are erased before programming
    fn write_words(
        &mut self,
        args: &[u16],
        erase_first: impl Fn(u16) -> bool,
    ) -> Result<Option<String>, &'static str> {
        let (mode, words) = args.split_first().ok_or("missing mode argument")?;
        let erase = erase_first(*mode);

        for (i, word) in words.iter().enumerate() {
            let address = self.address + i;
            let word = word & PGM_ERASED_WORD;
            if self.in_config {
                // Only user IDs and configuration words are writable
                let writable = address < USER_IDS_COUNT
                    || (address >= usize::from(CONF_WORD_OFFSET)
                        && address < usize::from(CONF_WORD_OFFSET) + self.config.conf_words);
                if let Some(cell) = self.config_space.get_mut(address).filter(|_| writable) {
                    *cell = word;
                }
            } else if let Some(cell) = self.program.get_mut(address) {
                *cell = if erase { word } else { *cell & word };
            }
        }
        self.address += words.len();
        Ok(None)
    }

    fn write_bytes(&mut self, args: &[u16]) -> Result<Option<String>, &'static str> {
        let (_mode, bytes) = args.split_first().ok_or("missing mode argument")?;
        for (i, byte) in bytes.iter().enumerate() {
            if let Some(cell) = self.data.get_mut(self.address + i) {
                *cell = (*byte & 0xFF) as u8;
            }
        }
        self.address += bytes.len();
        Ok(None)
    }

    fn erase_config_space(&mut self) {
        for (offset, word) in self.config_space.iter_mut().enumerate() {
            if offset != usize::from(DEVICE_ID_OFFSET) {
                *word = PGM_ERASED_WORD;
            }
        }
    }
}

impl Transport for DummyProgrammer {
    fn send_line(&mut self, line: &str) -> Result<String, TransportError> {
        self.log.push(line.to_string());

        let mnemonic = line.split_whitespace().next().unwrap_or_default();
        if self.timeout_on.contains(mnemonic) {
            return Err(TransportError::Timeout);
        }

        let reply = self.handle_line(line);
        log::trace!("dummy: {} -> {}", line, reply);
        Ok(reply)
    }
}
