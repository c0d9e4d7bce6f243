//! PIC device type definitions

/// Capabilities and memory geometry of one PIC device
///
/// Profiles are immutable once loaded. The session only reads them to decide
/// which commands to issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Device name (e.g., "PIC16F628A")
    pub name: String,
    /// Device ID with the revision bits already shifted out
    pub device_id: u16,
    /// Number of low bits of the raw ID word holding the silicon revision
    pub revision_bits: u8,
    /// Program memory size in words
    pub pgm_mem_size: u32,
    /// Data (EEPROM) memory size in bytes, 0 if the device has none
    pub data_mem_size: u32,
    /// Number of configuration words
    pub conf_words: u8,
    /// Program write granularity in words (1 = single word writes)
    pub pgm_write_size: u8,
    /// Erase mode code passed to word writes and erase commands
    pub pgm_erase_mode: u8,
    /// Whether the device supports the bulk chip erase command
    pub chip_erase: bool,
}

impl DeviceProfile {
    /// Check whether a raw device ID word belongs to this device
    pub fn matches_raw_id(&self, raw_id: u16) -> bool {
        DeviceIdentity::decode(raw_id, self.revision_bits).device_id == self.device_id
    }

    /// Split a raw device ID word using this device's revision bit count
    pub fn decode_raw_id(&self, raw_id: u16) -> DeviceIdentity {
        DeviceIdentity::decode(raw_id, self.revision_bits)
    }

    /// Whether program memory is written in multi-word blocks
    pub fn supports_block_write(&self) -> bool {
        self.pgm_write_size >= 2
    }

    /// Whether the device has data (EEPROM) memory
    pub fn has_data_mem(&self) -> bool {
        self.data_mem_size > 0
    }
}

/// Device ID and revision as reported by the device ID word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Device ID (raw word shifted right by the revision bit count)
    pub device_id: u16,
    /// Silicon revision
    pub revision: u16,
}

impl DeviceIdentity {
    /// Decode a raw device ID word
    ///
    /// NOTE: the revision is computed as `revision_bits & (0xffff >>
    /// revision_bits)`, masking the bit count rather than the raw word. This
    /// matches what existing ZEPPP clients print and is kept until the
    /// intended behaviour is confirmed.
    pub fn decode(raw_id: u16, revision_bits: u8) -> Self {
        let bits = u32::from(revision_bits);
        let device_id = raw_id.checked_shr(bits).unwrap_or(0);
        let revision = u16::from(revision_bits) & 0xffffu16.checked_shr(bits).unwrap_or(0);
        Self {
            device_id,
            revision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(device_id: u16, revision_bits: u8) -> DeviceProfile {
        DeviceProfile {
            name: "TestChip".to_string(),
            device_id,
            revision_bits,
            pgm_mem_size: 1024,
            data_mem_size: 0,
            conf_words: 1,
            pgm_write_size: 1,
            pgm_erase_mode: 0,
            chip_erase: false,
        }
    }

    #[test]
    fn test_decode_raw_id() {
        let id = DeviceIdentity::decode(0xABCD, 5);
        assert_eq!(id.device_id, 0xABCD >> 5);
        // Revision keeps the historical formula
        assert_eq!(id.revision, 5 & (0xffff >> 5));
        assert_eq!(id.revision, 5);
    }

    #[test]
    fn test_decode_without_revision_bits() {
        let id = DeviceIdentity::decode(0x1234, 0);
        assert_eq!(id.device_id, 0x1234);
        assert_eq!(id.revision, 0);
    }

    #[test]
    fn test_matches_raw_id() {
        let p = profile(0x83, 5);
        assert!(p.matches_raw_id(0x1060));
        assert!(p.matches_raw_id(0x1066));
        assert!(p.matches_raw_id(0x107F));
        assert!(!p.matches_raw_id(0x1080));
    }

    #[test]
    fn test_capabilities() {
        let mut p = profile(0x83, 5);
        assert!(!p.supports_block_write());
        assert!(!p.has_data_mem());
        p.pgm_write_size = 4;
        p.data_mem_size = 128;
        assert!(p.supports_block_write());
        assert!(p.has_data_mem());
    }
}
