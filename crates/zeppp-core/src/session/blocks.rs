//! Chunked memory transfers
//!
//! Program and data memory are moved in chunks of up to
//! [`DATA_UNITS_PER_TRANSFER`] words. The PIC's address counter advances on
//! every transferred word, so chunks that need no transfer are skipped with
//! an increase-address command instead. Reads always transfer every chunk.
//!
//! Program writes and verifies stop after the chunk holding the last
//! programmed word, but that chunk is still transferred in full so block
//! writes always cover whole write latches.
//!
//! Configuration words and user IDs fit into a single chunk and are
//! addressed relative to the start of configuration memory.

use crate::device::DeviceProfile;
use crate::error::{Error, Result};
use crate::memory::{written_words, Area, MemoryRegion, PicDevice};
use crate::protocol::{
    Command, CONF_WORD_LVP_MASK, CONF_WORD_OFFSET, USER_IDS_COUNT, USER_IDS_OFFSET,
};
use crate::transport::Transport;

use super::Session;

/// Maximum number of words moved by one read or write command
pub const DATA_UNITS_PER_TRANSFER: usize = 32;

/// Logged when a write is not followed by a read-back pass
pub const VERIFICATION_SKIPPED: &str =
    "Verification skipped. ZEPPP does read-back verification for word-based writes.";

/// A contiguous run of words handled by one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Index of the first word
    pub offset: usize,
    /// Number of words
    pub len: usize,
}

impl Chunk {
    /// Index one past the last word
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    fn count(&self) -> u8 {
        // Chunks never exceed DATA_UNITS_PER_TRANSFER words
        self.len as u8
    }
}

/// Split `total` words into chunks of at most `size` words
///
/// The last chunk is clipped to the remaining words.
pub fn chunks(total: usize, size: usize) -> impl Iterator<Item = Chunk> {
    let size = size.max(1);
    (0..total).step_by(size).map(move |offset| Chunk {
        offset,
        len: size.min(total - offset),
    })
}

/// Chunks starting within the first `extent` words of a `size` word region
///
/// Each chunk spans up to [`DATA_UNITS_PER_TRANSFER`] words, clipped only to
/// the end of the region.
pub fn transfer_chunks(extent: usize, size: usize) -> impl Iterator<Item = Chunk> {
    chunks(extent.min(size), DATA_UNITS_PER_TRANSFER).map(move |chunk| Chunk {
        offset: chunk.offset,
        len: DATA_UNITS_PER_TRANSFER.min(size - chunk.offset),
    })
}

/// How program words are written for a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// One word at a time; the interface verifies every word itself
    SingleWord {
        /// Erase mode code sent with the write command
        erase_mode: u8,
    },
    /// Through the device's write latches, `write_size` words at a time
    Block {
        /// Latch size in words
        write_size: u8,
    },
}

impl WriteMode {
    /// Select the write mode for a program write granularity
    pub fn for_write_size(write_size: u8, erase_mode: u8) -> Self {
        if write_size < 2 {
            WriteMode::SingleWord { erase_mode }
        } else {
            WriteMode::Block { write_size }
        }
    }

    /// Select the program memory write mode of a device
    pub fn for_profile(profile: &DeviceProfile) -> Self {
        Self::for_write_size(profile.pgm_write_size, profile.pgm_erase_mode)
    }

    /// Build the write command carrying `words`
    pub fn command(&self, words: impl IntoIterator<Item = u16>) -> Command {
        match *self {
            WriteMode::SingleWord { erase_mode } => Command::write_pgm(erase_mode, words),
            WriteMode::Block { write_size } => Command::block_write_pgm(write_size, words),
        }
    }

    /// Whether written data has to be read back to be verified
    pub fn needs_readback(&self) -> bool {
        matches!(self, WriteMode::Block { .. })
    }
}

impl<T: Transport> Session<T> {
    // ---- Program memory ----

    /// Read the whole program memory into the image
    pub fn read_pgm_mem(&mut self, pic: &mut PicDevice) -> Result<()> {
        self.ensure_device(&pic.profile)?;
        self.reset_lvp()?;

        log::info!("Reading {}...", Area::Program);
        let words = pic.program.size_words();
        self.read_blocks(&mut pic.program, words, Area::Program, Command::read_pgm)
    }

    /// Compare program memory with the image, up to its last programmed word
    pub fn verify_pgm_mem(&mut self, pic: &PicDevice) -> Result<()> {
        self.ensure_device(&pic.profile)?;
        self.reset_lvp()?;

        log::info!("Verifying {}...", Area::Program);
        let words = written_words(&pic.program);
        self.verify_blocks(&pic.program, words, Area::Program, Command::read_pgm)
    }

    /// Program the image into program memory, up to its last programmed word
    ///
    /// Block writes are read back afterwards; single word writes are
    /// verified by the interface as they go.
    pub fn write_pgm_mem(&mut self, pic: &PicDevice) -> Result<()> {
        self.ensure_device(&pic.profile)?;
        let mode = WriteMode::for_profile(&pic.profile);
        self.reset_lvp()?;

        log::info!("Writing {}...", Area::Program);
        let words = written_words(&pic.program);
        self.write_blocks(&pic.program, words, Area::Program, |w| mode.command(w))?;

        if mode.needs_readback() {
            self.verify_pgm_mem(pic)
        } else {
            log::info!("{}", VERIFICATION_SKIPPED);
            Ok(())
        }
    }

    // ---- Data memory ----

    /// Read the whole data memory into the image
    pub fn read_data_mem(&mut self, pic: &mut PicDevice) -> Result<()> {
        if !has_data_mem(&pic.profile) {
            return Ok(());
        }
        self.ensure_device(&pic.profile)?;
        self.reset_lvp()?;

        log::info!("Reading {}...", Area::Data);
        let words = pic.data.size_words();
        self.read_blocks(&mut pic.data, words, Area::Data, Command::read_data)
    }

    /// Compare data memory with the image
    pub fn verify_data_mem(&mut self, pic: &PicDevice) -> Result<()> {
        if !has_data_mem(&pic.profile) {
            return Ok(());
        }
        self.ensure_device(&pic.profile)?;
        self.reset_lvp()?;

        log::info!("Verifying {}...", Area::Data);
        let words = pic.data.size_words();
        self.verify_blocks(&pic.data, words, Area::Data, Command::read_data)
    }

    /// Program the image into data memory
    ///
    /// Only the low byte of each image word is sent.
    pub fn write_data_mem(&mut self, pic: &PicDevice) -> Result<()> {
        if !has_data_mem(&pic.profile) {
            return Ok(());
        }
        self.ensure_device(&pic.profile)?;
        let erase_mode = pic.profile.pgm_erase_mode;
        self.reset_lvp()?;

        log::info!("Writing {}...", Area::Data);
        let words = pic.data.size_words();
        self.write_blocks(&pic.data, words, Area::Data, |w| {
            Command::write_data(erase_mode, w.into_iter().map(|w| (w & 0xff) as u8))
        })?;

        log::info!("{}", VERIFICATION_SKIPPED);
        Ok(())
    }

    // ---- User IDs ----

    /// Read the user ID words into the image
    pub fn read_user_ids(&mut self, pic: &mut PicDevice) -> Result<()> {
        self.ensure_device(&pic.profile)?;

        log::info!("Reading {}...", Area::UserIds);
        self.select_config_mem_start(USER_IDS_OFFSET)?;
        let words = self.read_chunk(Command::read_pgm, USER_IDS_COUNT, "Read User IDs")?;
        store_words(&mut pic.user_ids, 0, &words);

        log::info!("-- : {}", pic.user_ids);
        Ok(())
    }

    /// Compare the user ID words with the image
    pub fn verify_user_ids(&mut self, pic: &PicDevice) -> Result<()> {
        self.ensure_device(&pic.profile)?;

        log::info!("Verifying {}...", Area::UserIds);
        self.select_config_mem_start(USER_IDS_OFFSET)?;
        let words = self.read_chunk(Command::read_pgm, USER_IDS_COUNT, "Read User IDs")?;
        compare_words(&pic.user_ids, 0, &words)
    }

    /// Program the user ID words
    ///
    /// Block write devices write the four words in a single latch block and
    /// read them back afterwards.
    pub fn write_user_ids(&mut self, pic: &PicDevice) -> Result<()> {
        self.ensure_device(&pic.profile)?;
        let write_size = pic.profile.pgm_write_size.min(USER_IDS_COUNT as u8);
        let mode = WriteMode::for_write_size(write_size, pic.profile.pgm_erase_mode);

        log::info!("Writing {}...", Area::UserIds);
        self.select_config_mem_start(USER_IDS_OFFSET)?;
        let words = region_words(&pic.user_ids, 0, USER_IDS_COUNT);
        self.execute(&mode.command(words), "Write User IDs")?;

        if mode.needs_readback() {
            self.verify_user_ids(pic)
        } else {
            log::info!("{}", VERIFICATION_SKIPPED);
            Ok(())
        }
    }

    // ---- Configuration words ----

    /// Read the configuration words into the image
    pub fn read_config_words(&mut self, pic: &mut PicDevice) -> Result<()> {
        self.ensure_device(&pic.profile)?;

        log::info!("Reading {}...", Area::Config);
        self.select_config_mem_start(CONF_WORD_OFFSET)?;
        let count = usize::from(pic.profile.conf_words);
        let words = self.read_chunk(Command::read_pgm, count, "Read Config Words")?;
        store_words(&mut pic.config, 0, &words);

        log::info!("-- : {}", pic.config);
        Ok(())
    }

    /// Compare the configuration words with the image
    pub fn verify_config_words(&mut self, pic: &PicDevice) -> Result<()> {
        self.ensure_device(&pic.profile)?;

        log::info!("Verifying {}...", Area::Config);
        self.select_config_mem_start(CONF_WORD_OFFSET)?;
        let count = usize::from(pic.profile.conf_words);
        let words = self.read_chunk(Command::read_pgm, count, "Read Config Words")?;
        compare_words(&pic.config, 0, &words)
    }

    /// Program the configuration words, one word at a time
    pub fn write_config_words(&mut self, pic: &PicDevice) -> Result<()> {
        self.ensure_device(&pic.profile)?;
        let mode = WriteMode::SingleWord {
            erase_mode: pic.profile.pgm_erase_mode,
        };

        log::info!("Writing {}...", Area::Config);
        self.select_config_mem_start(CONF_WORD_OFFSET)?;
        let words = region_words(&pic.config, 0, usize::from(pic.profile.conf_words));
        self.execute(&mode.command(words), "Write Config Words")?;

        if pic.config.word(0) & CONF_WORD_LVP_MASK == 0 {
            log::warn!(
                "Your code seems to disable Low-Voltage Programming. This won't be saved in PIC memory!"
            );
        }
        log::info!("{}", VERIFICATION_SKIPPED);
        Ok(())
    }

    // ---- Whole device ----

    /// Read every memory area into the image
    pub fn read_all(&mut self, pic: &mut PicDevice) -> Result<()> {
        self.read_user_ids(pic)?;
        self.read_config_words(pic)?;
        self.read_pgm_mem(pic)?;
        self.read_data_mem(pic)
    }

    /// Compare every memory area with the image
    pub fn verify_all(&mut self, pic: &PicDevice) -> Result<()> {
        self.verify_user_ids(pic)?;
        self.verify_pgm_mem(pic)?;
        self.verify_data_mem(pic)?;
        self.verify_config_words(pic)
    }

    /// Program every memory area
    ///
    /// Configuration words go last: once code protection is enabled the
    /// other areas can no longer be read back.
    pub fn write_all(&mut self, pic: &PicDevice) -> Result<()> {
        self.write_user_ids(pic)?;
        self.write_pgm_mem(pic)?;
        self.write_data_mem(pic)?;
        self.write_config_words(pic)
    }

    // ---- Block engine ----

    /// Transfer every chunk starting below `words`
    fn read_blocks<R, F>(&mut self, region: &mut R, words: usize, area: Area, read: F) -> Result<()>
    where
        R: MemoryRegion + ?Sized,
        F: Fn(u8) -> Command,
    {
        for chunk in transfer_chunks(words, region.size_words()) {
            let action = format!("Read {} block 0x{:04x}", area, chunk.offset);
            let data = self.read_chunk(&read, chunk.len, &action)?;
            store_words(region, chunk.offset, &data);
        }
        Ok(())
    }

    fn verify_blocks<R, F>(&mut self, region: &R, words: usize, area: Area, read: F) -> Result<()>
    where
        R: MemoryRegion + ?Sized,
        F: Fn(u8) -> Command,
    {
        for chunk in transfer_chunks(words, region.size_words()) {
            if region.is_empty_block(chunk.offset, chunk.len) {
                self.skip_block(chunk, area)?;
                continue;
            }

            let action = format!("Read {} block 0x{:04x}", area, chunk.offset);
            let data = self.read_chunk(&read, chunk.len, &action)?;
            compare_words(region, chunk.offset, &data)?;
        }
        Ok(())
    }

    fn write_blocks<R, F>(&mut self, region: &R, words: usize, area: Area, write: F) -> Result<()>
    where
        R: MemoryRegion + ?Sized,
        F: Fn(Vec<u16>) -> Command,
    {
        for chunk in transfer_chunks(words, region.size_words()) {
            if region.is_empty_block(chunk.offset, chunk.len) {
                self.skip_block(chunk, area)?;
                continue;
            }

            let action = format!("Write {} block 0x{:04x}", area, chunk.offset);
            let data = region_words(region, chunk.offset, chunk.len);
            self.execute(&write(data), &action)?;
        }
        Ok(())
    }

    fn skip_block(&mut self, chunk: Chunk, area: Area) -> Result<()> {
        log::debug!("Skipping empty {} block 0x{:04x}", area, chunk.offset);
        let action = format!("Skip empty {} block 0x{:04x}", area, chunk.offset);
        self.execute(&Command::increase_address(chunk.count()), &action)?;
        Ok(())
    }

    /// Read `count` words with one command and check the answer length
    fn read_chunk<F>(&mut self, read: F, count: usize, action: &str) -> Result<Vec<u16>>
    where
        F: Fn(u8) -> Command,
    {
        let response = self.execute(&read(count as u8), action)?;
        let words = response.words();
        if words.len() != count {
            return Err(Error::DataSizeMismatch {
                action: action.to_string(),
                expected: count,
                received: words.len(),
            });
        }
        Ok(words)
    }
}

fn has_data_mem(profile: &DeviceProfile) -> bool {
    if !profile.has_data_mem() {
        log::info!("{} has no {}", profile.name, Area::Data);
    }
    profile.has_data_mem()
}

/// Words `start..start + count` of a region, clipped to its end
fn region_words<R: MemoryRegion + ?Sized>(region: &R, start: usize, count: usize) -> Vec<u16> {
    let end = (start + count).min(region.size_words());
    (start..end).map(|i| region.word(i * 2)).collect()
}

fn store_words<R: MemoryRegion + ?Sized>(region: &mut R, start: usize, words: &[u16]) {
    for (i, word) in words.iter().enumerate() {
        region.set_word((start + i) * 2, *word);
    }
}

fn compare_words<R: MemoryRegion + ?Sized>(region: &R, start: usize, words: &[u16]) -> Result<()> {
    for (i, received) in words.iter().enumerate() {
        let offset = start + i;
        let expected = region.word(offset * 2);
        if *received != expected {
            return Err(Error::Verify {
                offset,
                expected,
                received: *received,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock::ScriptedTransport;

    fn profile(write_size: u8, data_mem_size: u32) -> DeviceProfile {
        DeviceProfile {
            name: "TestChip".to_string(),
            device_id: 0x1234,
            revision_bits: 0,
            pgm_mem_size: 33,
            data_mem_size,
            conf_words: 2,
            pgm_write_size: write_size,
            pgm_erase_mode: 1,
            chip_erase: false,
        }
    }

    /// Connected session that already verified the test device
    fn session(replies: &[&str]) -> Session<ScriptedTransport> {
        let mut transport = ScriptedTransport::new(&["OK ZEPPP v1.0.0"]);
        for reply in replies {
            transport.push(reply);
        }
        let mut session = Session::open(transport).unwrap();
        session.connect().unwrap();
        session.verified_device_id = Some(0x1234);
        session.transport_mut().clear_sent();
        session
    }

    fn hex_words(count: usize, value: u16) -> String {
        let words: Vec<String> = (0..count).map(|_| format!("{:04X}", value)).collect();
        format!("OK {}", words.join(" "))
    }

    #[test]
    fn test_chunks() {
        let c: Vec<Chunk> = chunks(33, 32).collect();
        assert_eq!(
            c,
            vec![Chunk { offset: 0, len: 32 }, Chunk { offset: 32, len: 1 }]
        );
        assert_eq!(chunks(64, 32).count(), 2);
        assert_eq!(chunks(0, 32).count(), 0);
        assert_eq!(chunks(5, 32).next(), Some(Chunk { offset: 0, len: 5 }));
    }

    #[test]
    fn test_transfer_chunks() {
        let c: Vec<Chunk> = transfer_chunks(3, 4096).collect();
        assert_eq!(c, vec![Chunk { offset: 0, len: 32 }]);

        let c: Vec<Chunk> = transfer_chunks(33, 40).collect();
        assert_eq!(
            c,
            vec![Chunk { offset: 0, len: 32 }, Chunk { offset: 32, len: 8 }]
        );
        assert_eq!(transfer_chunks(0, 40).count(), 0);
        assert_eq!(transfer_chunks(100, 40).count(), 2);
    }

    #[test]
    fn test_write_mode() {
        assert_eq!(
            WriteMode::for_write_size(1, 2),
            WriteMode::SingleWord { erase_mode: 2 }
        );
        assert_eq!(
            WriteMode::for_write_size(8, 1),
            WriteMode::Block { write_size: 8 }
        );
        assert!(!WriteMode::for_write_size(0, 0).needs_readback());
        assert!(WriteMode::for_write_size(4, 1).needs_readback());
        assert_eq!(
            WriteMode::Block { write_size: 4 }.command([0x0123]).encode(),
            "PB 04 0123"
        );
    }

    #[test]
    fn test_read_pgm_mem_clips_last_chunk() {
        let mut s = session(&["OK", &hex_words(32, 0x0001), "OK 0002"]);
        let mut pic = PicDevice::new(profile(1, 0));

        s.read_pgm_mem(&mut pic).unwrap();
        assert_eq!(s.transport().sent(), &["LE", "PR 20", "PR 01"]);
        assert_eq!(pic.program.word(0), 0x0001);
        assert_eq!(pic.program.word(31 * 2), 0x0001);
        assert_eq!(pic.program.word(32 * 2), 0x0002);
    }

    #[test]
    fn test_read_size_mismatch() {
        let mut s = session(&["OK", "OK 0001 0002"]);
        let mut pic = PicDevice::new(profile(1, 0));

        let err = s.read_pgm_mem(&mut pic).unwrap_err();
        assert!(matches!(
            err,
            Error::DataSizeMismatch {
                expected: 32,
                received: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_write_blank_pgm_mem_sends_nothing() {
        let mut s = session(&["OK"]);
        let pic = PicDevice::new(profile(1, 0));

        s.write_pgm_mem(&pic).unwrap();
        assert_eq!(s.transport().sent(), &["LE"]);
    }

    #[test]
    fn test_write_pgm_mem_skips_empty_block() {
        let mut s = session(&["OK", "OK", "OK"]);
        let mut pic = PicDevice::new(profile(1, 0));
        pic.program.set_word(32 * 2, 0x2800);

        s.write_pgm_mem(&pic).unwrap();
        assert_eq!(s.transport().sent(), &["LE", "AI 20", "PW 01 2800"]);
    }

    #[test]
    fn test_write_pgm_mem_block_mode_verifies() {
        let readback = format!("OK 0000 1111{}", " 3FFF".repeat(30));
        let mut s = session(&["OK", "OK", "OK", "OK", &readback]);
        let mut pic = PicDevice::new(profile(4, 0));
        pic.program.set_word(0, 0x0000);
        pic.program.set_word(2, 0x1111);

        s.write_pgm_mem(&pic).unwrap();
        let write = format!("PB 04 0000 1111{}", " 3FFF".repeat(30));
        assert_eq!(
            s.transport().sent(),
            &["LE", write.as_str(), "LX", "LE", "PR 20"]
        );
    }

    #[test]
    fn test_verify_pgm_mem_mismatch() {
        let reply = format!("OK 0000 2222{}", " 3FFF".repeat(30));
        let mut s = session(&["OK", &reply]);
        let mut pic = PicDevice::new(profile(1, 0));
        pic.program.set_word(0, 0x0000);
        pic.program.set_word(2, 0x1111);

        let err = s.verify_pgm_mem(&pic).unwrap_err();
        assert!(matches!(
            err,
            Error::Verify {
                offset: 1,
                expected: 0x1111,
                received: 0x2222
            }
        ));
        // The image is left untouched
        assert_eq!(pic.program.word(2), 0x1111);
    }

    #[test]
    fn test_write_failure_aborts() {
        let mut s = session(&["OK", "ERR write failed"]);
        let mut pic = PicDevice::new(profile(1, 0));
        pic.program.set_word(0, 0x0001);
        pic.program.set_word(32 * 2, 0x0001);

        let err = s.write_pgm_mem(&pic).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Write PGM Memory block 0x0000: write failed"
        );
        assert_eq!(s.transport().sent().len(), 2);
    }

    #[test]
    fn test_verify_skips_erased_blocks() {
        let mut s = session(&["OK", "OK", &hex_words(1, 0x2800)]);
        let mut pic = PicDevice::new(profile(1, 0));
        pic.program.set_word(32 * 2, 0x2800);

        s.verify_pgm_mem(&pic).unwrap();
        assert_eq!(s.transport().sent(), &["LE", "AI 20", "PR 01"]);
    }

    #[test]
    fn test_verify_data_mem_skips_erased_blocks() {
        let mut s = session(&["OK", "OK", "OK FF 42"]);
        let mut pic = PicDevice::new(profile(1, 34));
        pic.data.set_word(33 * 2, 0x0042);

        s.verify_data_mem(&pic).unwrap();
        assert_eq!(s.transport().sent(), &["LE", "AI 20", "DR 02"]);
    }

    #[test]
    fn test_write_data_mem_sends_low_bytes() {
        let mut s = session(&["OK", "OK"]);
        let mut pic = PicDevice::new(profile(1, 4));
        pic.data.set_word(0, 0x0012);
        pic.data.set_word(2, 0xAB34);

        s.write_data_mem(&pic).unwrap();
        assert_eq!(s.transport().sent(), &["LE", "DW 01 12 34 FF FF"]);
    }

    #[test]
    fn test_data_mem_without_eeprom() {
        let mut s = session(&[]);
        let mut pic = PicDevice::new(profile(1, 0));

        s.read_data_mem(&mut pic).unwrap();
        s.write_data_mem(&pic).unwrap();
        s.verify_data_mem(&pic).unwrap();
        assert!(s.transport().sent().is_empty());
    }

    #[test]
    fn test_write_config_words() {
        let mut s = session(&["OK", "OK", "OK", "OK"]);
        let mut pic = PicDevice::new(profile(8, 0));
        pic.config.set_word(0, 0x3F10);

        s.write_config_words(&pic).unwrap();
        assert_eq!(
            s.transport().sent(),
            &["LE", "CS", "AI 07", "PW 01 3F10 3FFF"]
        );
    }

    #[test]
    fn test_write_user_ids_block_mode() {
        let replies = ["OK", "OK", "OK", "OK", "OK", "OK", "OK 0001 0002 0003 0004"];
        let mut s = session(&replies);
        let mut pic = PicDevice::new(profile(8, 0));
        for i in 0..4 {
            pic.user_ids.set_word(i * 2, i as u16 + 1);
        }

        s.write_user_ids(&pic).unwrap();
        assert_eq!(
            s.transport().sent(),
            &["LE", "CS", "PB 04 0001 0002 0003 0004", "LX", "LE", "CS", "PR 04"]
        );
    }

    #[test]
    fn test_read_config_words() {
        let mut s = session(&["OK", "OK", "OK", "OK 3F7F 3FFC"]);
        let mut pic = PicDevice::new(profile(1, 0));

        s.read_config_words(&mut pic).unwrap();
        assert_eq!(pic.config.word(0), 0x3F7F);
        assert_eq!(pic.config.word(2), 0x3FFC);
    }
}
