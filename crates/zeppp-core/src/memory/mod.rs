//! PIC memory images
//!
//! A memory image is held as a set of word-addressable regions, one per
//! PIC memory area. Offsets passed to [`MemoryRegion`] accessors are byte
//! offsets; words are stored little-endian. Word indices are used wherever
//! the session iterates over a region.

mod buffer;
mod device;

pub use buffer::MemoryBuffer;
pub use device::PicDevice;

use core::fmt;

/// Erased value of a 14-bit program, config or user ID word
pub const PGM_ERASED_WORD: u16 = 0x3FFF;

/// Erased value of a data memory cell (one byte per word)
pub const DATA_ERASED_WORD: u16 = 0x00FF;

/// PIC memory areas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    /// Program (flash) memory
    Program,
    /// Data (EEPROM) memory
    Data,
    /// Configuration words
    Config,
    /// User ID words
    UserIds,
}

impl Area {
    /// All areas, in write order
    pub const ALL: [Area; 4] = [Area::UserIds, Area::Program, Area::Data, Area::Config];

    /// Human readable label used in progress and error messages
    pub fn label(&self) -> &'static str {
        match self {
            Area::Program => "PGM Memory",
            Area::Data => "Data Memory",
            Area::Config => "Config Words",
            Area::UserIds => "User IDs",
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Word-addressable memory buffer
pub trait MemoryRegion {
    /// Size of the region in bytes
    fn size_bytes(&self) -> usize;

    /// Word value of an erased (unprogrammed) cell
    fn erased_word(&self) -> u16;

    /// Get the word at a byte offset
    fn word(&self, offset: usize) -> u16;

    /// Set the word at a byte offset
    fn set_word(&mut self, offset: usize, value: u16);

    /// Get the byte at a byte offset
    fn byte(&self, offset: usize) -> u8;

    /// Set the byte at a byte offset
    fn set_byte(&mut self, offset: usize, value: u8);

    /// Size of the region in words
    fn size_words(&self) -> usize {
        self.size_bytes() / 2
    }

    /// Check whether `count` words starting at word index `start` are erased
    ///
    /// The range is clipped to the region.
    fn is_empty_block(&self, start: usize, count: usize) -> bool {
        let end = start.saturating_add(count).min(self.size_words());
        (start..end).all(|i| self.word(i * 2) == self.erased_word())
    }
}

/// Index of the last word that differs from the erased value
///
/// Returns 0 when the whole region is erased, which is indistinguishable
/// from a region where only word 0 is programmed; see [`written_words`].
pub fn max_written_word<R: MemoryRegion + ?Sized>(region: &R) -> usize {
    let erased = region.erased_word();
    (0..region.size_words())
        .rev()
        .find(|&i| region.word(i * 2) != erased)
        .unwrap_or(0)
}

/// Number of leading words that need to be transferred to program a region
///
/// This covers everything up to and including the last non-erased word, or
/// nothing for a fully erased region.
pub fn written_words<R: MemoryRegion + ?Sized>(region: &R) -> usize {
    match max_written_word(region) {
        0 if region.size_words() == 0 || region.word(0) == region.erased_word() => 0,
        last => last + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_written_word_blank() {
        let buf = MemoryBuffer::blank(128, PGM_ERASED_WORD);
        assert_eq!(max_written_word(&buf), 0);
        assert_eq!(written_words(&buf), 0);
    }

    #[test]
    fn test_max_written_word() {
        let mut buf = MemoryBuffer::blank(128, PGM_ERASED_WORD);
        buf.set_word(5 * 2, 0x1234);
        buf.set_word(70 * 2, 0x0000);
        assert_eq!(max_written_word(&buf), 70);
        assert_eq!(written_words(&buf), 71);
    }

    #[test]
    fn test_written_words_first_word_only() {
        let mut buf = MemoryBuffer::blank(64, PGM_ERASED_WORD);
        buf.set_word(0, 0x2800);
        assert_eq!(max_written_word(&buf), 0);
        assert_eq!(written_words(&buf), 1);
    }

    #[test]
    fn test_is_empty_block() {
        let mut buf = MemoryBuffer::blank(70, PGM_ERASED_WORD);
        buf.set_word(33 * 2, 0x0001);

        assert!(buf.is_empty_block(0, 32));
        assert!(!buf.is_empty_block(32, 32));
        // Clipped to the region end
        assert!(buf.is_empty_block(64, 32));
        assert!(buf.is_empty_block(200, 32));
    }

    #[test]
    fn test_area_labels() {
        assert_eq!(Area::Program.to_string(), "PGM Memory");
        assert_eq!(Area::UserIds.label(), "User IDs");
        assert_eq!(Area::ALL.last(), Some(&Area::Config));
    }
}
