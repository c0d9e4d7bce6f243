//! Memory image of one PIC device

use crate::device::DeviceProfile;
use crate::protocol::USER_IDS_COUNT;

use super::{Area, MemoryBuffer, DATA_ERASED_WORD, PGM_ERASED_WORD};

/// A device profile together with an image of each of its memory areas
///
/// Data memory holds one word per EEPROM byte; only the low byte of each
/// word is ever sent to the device.
#[derive(Debug, Clone)]
pub struct PicDevice {
    /// Device this image belongs to
    pub profile: DeviceProfile,
    /// Program memory image
    pub program: MemoryBuffer,
    /// Data memory image
    pub data: MemoryBuffer,
    /// Configuration words
    pub config: MemoryBuffer,
    /// User ID words
    pub user_ids: MemoryBuffer,
}

impl PicDevice {
    /// Create a fully erased image for a device
    pub fn new(profile: DeviceProfile) -> Self {
        let program = MemoryBuffer::blank(profile.pgm_mem_size as usize, PGM_ERASED_WORD);
        let data = MemoryBuffer::blank(profile.data_mem_size as usize, DATA_ERASED_WORD);
        let config = MemoryBuffer::blank(usize::from(profile.conf_words), PGM_ERASED_WORD);
        let user_ids = MemoryBuffer::blank(USER_IDS_COUNT, PGM_ERASED_WORD);

        Self {
            profile,
            program,
            data,
            config,
            user_ids,
        }
    }

    /// Get the image of one memory area
    pub fn region(&self, area: Area) -> &MemoryBuffer {
        match area {
            Area::Program => &self.program,
            Area::Data => &self.data,
            Area::Config => &self.config,
            Area::UserIds => &self.user_ids,
        }
    }

    /// Get the mutable image of one memory area
    pub fn region_mut(&mut self, area: Area) -> &mut MemoryBuffer {
        match area {
            Area::Program => &mut self.program,
            Area::Data => &mut self.data,
            Area::Config => &mut self.config,
            Area::UserIds => &mut self.user_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRegion;

    #[test]
    fn test_new_device_is_blank() {
        let profile = DeviceProfile {
            name: "TestChip".to_string(),
            device_id: 0x1234,
            revision_bits: 0,
            pgm_mem_size: 1024,
            data_mem_size: 64,
            conf_words: 2,
            pgm_write_size: 4,
            pgm_erase_mode: 1,
            chip_erase: true,
        };
        let mut pic = PicDevice::new(profile);

        assert_eq!(pic.program.size_words(), 1024);
        assert_eq!(pic.data.size_words(), 64);
        assert_eq!(pic.config.size_words(), 2);
        assert_eq!(pic.user_ids.size_words(), 4);
        assert_eq!(pic.data.erased_word(), 0x00FF);
        assert!(Area::ALL.iter().all(|a| pic.region(*a).is_erased()));

        pic.region_mut(Area::Config).set_word(0, 0x3F7F);
        assert_eq!(pic.config.word(0), 0x3F7F);
    }
}
