//! Erase operations

use crate::device::DeviceProfile;
use crate::error::Result;
use crate::memory::Area;
use crate::protocol::Command;
use crate::transport::Transport;

use super::Session;

/// How a full chip erase is carried out on a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErasePlan {
    /// A single chip erase command
    ChipErase,
    /// Program and config memory first, then data memory
    Separate,
}

/// Pick the chip erase strategy for a device
pub fn erase_plan(profile: &DeviceProfile) -> ErasePlan {
    if profile.chip_erase {
        ErasePlan::ChipErase
    } else {
        ErasePlan::Separate
    }
}

impl<T: Transport> Session<T> {
    /// Erase program memory
    ///
    /// On some devices this wipes the configuration words as well.
    pub fn erase_pgm_mem(&mut self, profile: &DeviceProfile) -> Result<()> {
        self.ensure_device(profile)?;
        self.reset_lvp()?;

        log::info!("Erasing {}...", Area::Program);
        log::info!("In some devices this may also erase all {}", Area::Config);
        self.execute(&Command::erase_pgm(profile.pgm_erase_mode), "Erase PGM Memory")?;
        Ok(())
    }

    /// Erase data memory
    pub fn erase_data_mem(&mut self, profile: &DeviceProfile) -> Result<()> {
        if !profile.has_data_mem() {
            log::info!("{} has no {}", profile.name, Area::Data);
            return Ok(());
        }
        self.ensure_device(profile)?;
        self.reset_lvp()?;

        log::info!("Erasing {}...", Area::Data);
        self.execute(
            &Command::erase_data(profile.pgm_erase_mode),
            "Erase Data Memory",
        )?;
        Ok(())
    }

    /// Erase program memory and configuration words
    ///
    /// Issuing the program erase from configuration space clears both areas
    /// on devices without a chip erase command.
    pub fn erase_pgm_and_config_mem(&mut self, profile: &DeviceProfile) -> Result<()> {
        self.ensure_device(profile)?;
        self.select_config_mem_start(0)?;

        log::info!("Erasing Configuration and Program Memory...");
        self.execute(
            &Command::erase_pgm(profile.pgm_erase_mode),
            "Erase Config & Program Memory",
        )?;
        Ok(())
    }

    /// Erase every memory area of the device
    pub fn chip_erase(&mut self, profile: &DeviceProfile) -> Result<()> {
        self.ensure_device(profile)?;

        log::info!("Erasing CHIP Memory...");
        match erase_plan(profile) {
            ErasePlan::ChipErase => {
                self.select_config_mem_start(0)?;
                self.execute(&Command::chip_erase(), "Erase CHIP")?;
            }
            ErasePlan::Separate => {
                log::info!(
                    "{} does not support the CHIP Erase command. All memory areas will be erased separately.",
                    profile.name
                );
                self.erase_pgm_and_config_mem(profile)?;
                self.erase_data_mem(profile)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock::ScriptedTransport;

    fn profile(chip_erase: bool, data_mem_size: u32) -> DeviceProfile {
        DeviceProfile {
            name: "TestChip".to_string(),
            device_id: 0x1234,
            revision_bits: 0,
            pgm_mem_size: 64,
            data_mem_size,
            conf_words: 1,
            pgm_write_size: 1,
            pgm_erase_mode: 2,
            chip_erase,
        }
    }

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

    #[test]
    fn test_erase_plan() {
        assert_eq!(erase_plan(&profile(true, 0)), ErasePlan::ChipErase);
        assert_eq!(erase_plan(&profile(false, 0)), ErasePlan::Separate);
    }

    #[test]
    fn test_chip_erase_supported() {
        let mut s = session(&["OK", "OK", "OK"]);
        s.chip_erase(&profile(true, 128)).unwrap();
        assert_eq!(s.transport().sent(), &["LE", "CS", "CE"]);
    }

    #[test]
    fn test_chip_erase_separate() {
        let mut s = session(&["OK", "OK", "OK", "OK", "OK", "OK"]);
        s.chip_erase(&profile(false, 128)).unwrap();
        assert_eq!(
            s.transport().sent(),
            &["LE", "CS", "PE 02", "LX", "LE", "DE 02"]
        );
    }

    #[test]
    fn test_chip_erase_separate_without_data_mem() {
        let mut s = session(&["OK", "OK", "OK"]);
        s.chip_erase(&profile(false, 0)).unwrap();
        assert_eq!(s.transport().sent(), &["LE", "CS", "PE 02"]);
    }

    #[test]
    fn test_erase_failure() {
        let mut s = session(&["OK", "ERR timeout"]);
        let err = s.erase_pgm_mem(&profile(false, 0)).unwrap_err();
        assert_eq!(err.to_string(), "Erase PGM Memory: timeout");
    }
}
