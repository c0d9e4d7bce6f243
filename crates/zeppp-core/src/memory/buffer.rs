//! Vec-backed memory region

use core::fmt;

use super::MemoryRegion;

/// A fixed-size memory buffer with an erased-value sentinel
///
/// Accesses past the end of the buffer read as erased and writes there are
/// dropped, so a short device response can never grow an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBuffer {
    data: Vec<u8>,
    erased: u16,
}

impl MemoryBuffer {
    /// Create a buffer of `words` words, all erased
    pub fn blank(words: usize, erased: u16) -> Self {
        let data = erased.to_le_bytes().repeat(words);
        Self { data, erased }
    }

    /// Create a buffer of `words` words initialised from raw little-endian bytes
    ///
    /// Missing bytes are filled with the erased value and extra bytes are
    /// ignored.
    pub fn from_bytes(words: usize, erased: u16, bytes: &[u8]) -> Self {
        let mut buf = Self::blank(words, erased);
        buf.load(bytes);
        buf
    }

    /// Overwrite the start of the buffer with raw little-endian bytes
    ///
    /// Returns the number of bytes copied.
    pub fn load(&mut self, bytes: &[u8]) -> usize {
        let len = bytes.len().min(self.data.len());
        self.data[..len].copy_from_slice(&bytes[..len]);
        len
    }

    /// Reset every word to the erased value
    pub fn erase(&mut self) {
        for chunk in self.data.chunks_exact_mut(2) {
            chunk.copy_from_slice(&self.erased.to_le_bytes());
        }
    }

    /// Raw little-endian contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Iterate over the words of the buffer
    pub fn words(&self) -> impl Iterator<Item = u16> + '_ {
        self.data
            .chunks_exact(2)
            .map(|w| u16::from_le_bytes([w[0], w[1]]))
    }

    /// Check whether every word is erased
    pub fn is_erased(&self) -> bool {
        self.words().all(|w| w == self.erased)
    }
}

impl MemoryRegion for MemoryBuffer {
    fn size_bytes(&self) -> usize {
        self.data.len()
    }

    fn erased_word(&self) -> u16 {
        self.erased
    }

    fn word(&self, offset: usize) -> u16 {
        match self.data.get(offset..offset + 2) {
            Some(w) => u16::from_le_bytes([w[0], w[1]]),
            None => self.erased,
        }
    }

    fn set_word(&mut self, offset: usize, value: u16) {
        match self.data.get_mut(offset..offset + 2) {
            Some(w) => w.copy_from_slice(&value.to_le_bytes()),
            None => log::debug!("Dropping write past buffer end at offset 0x{:04x}", offset),
        }
    }

    fn byte(&self, offset: usize) -> u8 {
        match self.data.get(offset) {
            Some(b) => *b,
            None => self.erased.to_le_bytes()[offset % 2],
        }
    }

    fn set_byte(&mut self, offset: usize, value: u8) {
        match self.data.get_mut(offset) {
            Some(b) => *b = value,
            None => log::debug!("Dropping write past buffer end at offset 0x{:04x}", offset),
        }
    }
}

/// Formats the buffer as space separated hex words
impl fmt::Display for MemoryBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.words().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:04X}", word)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank() {
        let buf = MemoryBuffer::blank(4, 0x3FFF);
        assert_eq!(buf.size_bytes(), 8);
        assert_eq!(buf.size_words(), 4);
        assert_eq!(buf.as_bytes(), &[0xFF, 0x3F, 0xFF, 0x3F, 0xFF, 0x3F, 0xFF, 0x3F]);
        assert!(buf.is_erased());
    }

    #[test]
    fn test_word_and_byte_access() {
        let mut buf = MemoryBuffer::blank(2, 0x3FFF);
        buf.set_word(2, 0x1234);
        assert_eq!(buf.word(2), 0x1234);
        assert_eq!(buf.byte(2), 0x34);
        assert_eq!(buf.byte(3), 0x12);

        buf.set_byte(0, 0xAA);
        assert_eq!(buf.word(0), 0x3FAA);
        assert!(!buf.is_erased());

        buf.erase();
        assert!(buf.is_erased());
    }

    #[test]
    fn test_out_of_range_access() {
        let mut buf = MemoryBuffer::blank(2, 0x00FF);
        buf.set_word(4, 0x0000);
        buf.set_byte(10, 0x00);
        assert_eq!(buf.size_bytes(), 4);
        assert_eq!(buf.word(4), 0x00FF);
        assert_eq!(buf.word(3), 0x00FF);
        assert_eq!(buf.byte(4), 0xFF);
        assert_eq!(buf.byte(5), 0x00);
    }

    #[test]
    fn test_from_bytes() {
        let buf = MemoryBuffer::from_bytes(3, 0x3FFF, &[0x01, 0x00, 0x02]);
        assert_eq!(buf.word(0), 0x0001);
        assert_eq!(buf.word(2), 0x3F02);
        assert_eq!(buf.word(4), 0x3FFF);

        let buf = MemoryBuffer::from_bytes(1, 0x3FFF, &[0x01, 0x00, 0x02, 0x00]);
        assert_eq!(buf.size_words(), 1);
    }

    #[test]
    fn test_display() {
        let mut buf = MemoryBuffer::blank(2, 0x3FFF);
        buf.set_word(2, 0x00AB);
        assert_eq!(buf.to_string(), "3FFF 00AB");
    }
}
