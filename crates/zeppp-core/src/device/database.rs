//! Device database for runtime loading and lookup
//!
//! This module provides the `DeviceDatabase` type for loading PIC device
//! definitions from RON files at runtime. A default set of definitions is
//! compiled into the crate.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use super::types::DeviceProfile;

/// Device definitions shipped with the crate
const BUILTIN_DEVICES: &str = include_str!("../../devices/microchip.ron");

/// Largest program write block the firmware can buffer
const MAX_PGM_WRITE_SIZE: u8 = 32;

/// Error type for device database operations
#[derive(Debug, Error)]
pub enum DeviceDbError {
    /// I/O error reading files
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// RON parsing error
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

// ============================================================================
// RON deserialization types (intermediate format)
// ============================================================================

/// Single device definition in RON format
#[derive(Debug, Clone, serde::Deserialize)]
struct DeviceDef {
    name: String,
    device_id: u16,
    #[serde(default = "default_revision_bits")]
    revision_bits: u8,
    pgm_mem_size: u32,
    #[serde(default)]
    data_mem_size: u32,
    #[serde(default = "default_conf_words")]
    conf_words: u8,
    #[serde(default = "default_write_size")]
    pgm_write_size: u8,
    #[serde(default)]
    pgm_erase_mode: u8,
    #[serde(default)]
    chip_erase: bool,
}

fn default_revision_bits() -> u8 {
    5
}

fn default_conf_words() -> u8 {
    1
}

fn default_write_size() -> u8 {
    1
}

/// Family definition containing multiple devices
#[derive(Debug, Clone, serde::Deserialize)]
struct FamilyDef {
    family: String,
    devices: Vec<DeviceDef>,
}

impl DeviceDef {
    fn validate(&self) -> Result<(), DeviceDbError> {
        let invalid = |what: &str| -> Result<(), DeviceDbError> {
            Err(DeviceDbError::Validation(format!("{}: {}", self.name, what)))
        };

        if self.revision_bits >= 16 {
            return invalid("revision_bits must be below 16");
        }
        if self.pgm_mem_size == 0 {
            return invalid("pgm_mem_size must not be 0");
        }
        if self.conf_words == 0 {
            return invalid("conf_words must not be 0");
        }
        if self.pgm_write_size == 0 || self.pgm_write_size > MAX_PGM_WRITE_SIZE {
            return invalid("pgm_write_size must be between 1 and 32");
        }
        Ok(())
    }
}

impl From<DeviceDef> for DeviceProfile {
    fn from(def: DeviceDef) -> Self {
        DeviceProfile {
            name: def.name,
            device_id: def.device_id,
            revision_bits: def.revision_bits,
            pgm_mem_size: def.pgm_mem_size,
            data_mem_size: def.data_mem_size,
            conf_words: def.conf_words,
            pgm_write_size: def.pgm_write_size,
            pgm_erase_mode: def.pgm_erase_mode,
            chip_erase: def.chip_erase,
        }
    }
}

// ============================================================================
// Device lookup
// ============================================================================

/// Capability lookup used by device identification
pub trait DeviceLookup {
    /// Find the device a raw device ID word belongs to
    fn lookup_by_raw_id(&self, raw_id: u16) -> Option<&DeviceProfile>;
}

/// Runtime device database
///
/// Holds a collection of device profiles that can be loaded from RON files.
#[derive(Debug, Clone, Default)]
pub struct DeviceDatabase {
    devices: Vec<DeviceProfile>,
}

impl DeviceDatabase {
    /// Create an empty device database
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
        }
    }

    /// Create a database holding the built-in device definitions
    pub fn builtin() -> Result<Self, DeviceDbError> {
        let mut db = Self::new();
        db.load_ron(BUILTIN_DEVICES)?;
        Ok(db)
    }

    /// Load device definitions from a single RON file
    pub fn load_file(&mut self, path: &Path) -> Result<usize, DeviceDbError> {
        let content = fs::read_to_string(path)?;
        self.load_ron(&content)
    }

    /// Load device definitions from a RON string
    ///
    /// Definitions whose name matches an already loaded device replace it,
    /// so user files can override built-in entries.
    pub fn load_ron(&mut self, content: &str) -> Result<usize, DeviceDbError> {
        let family_def: FamilyDef = ron::from_str(content)?;
        let count = family_def.devices.len();

        for def in family_def.devices {
            def.validate()?;
            let profile = DeviceProfile::from(def);
            match self
                .devices
                .iter_mut()
                .find(|d| d.name.eq_ignore_ascii_case(&profile.name))
            {
                Some(existing) => {
                    log::debug!("Overriding device definition {}", profile.name);
                    *existing = profile;
                }
                None => self.devices.push(profile),
            }
        }

        log::debug!("Loaded {} {} device definitions", count, family_def.family);
        Ok(count)
    }

    /// Load all RON files from a directory
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, DeviceDbError> {
        let mut total = 0;

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "ron") {
                total += self.load_file(&path)?;
            }
        }

        Ok(total)
    }

    /// Get all devices in the database
    pub fn devices(&self) -> &[DeviceProfile] {
        &self.devices
    }

    /// Get the number of devices in the database
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Find a device by name (case-insensitive exact match)
    pub fn find_by_name(&self, name: &str) -> Option<&DeviceProfile> {
        self.devices
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    /// Iterate over all devices
    pub fn iter(&self) -> impl Iterator<Item = &DeviceProfile> {
        self.devices.iter()
    }
}

impl DeviceLookup for DeviceDatabase {
    fn lookup_by_raw_id(&self, raw_id: u16) -> Option<&DeviceProfile> {
        self.devices.iter().find(|d| d.matches_raw_id(raw_id))
    }
}
