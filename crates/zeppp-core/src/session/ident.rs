//! Device identification

use crate::device::{DeviceIdentity, DeviceLookup, DeviceProfile};
use crate::error::{Error, Result};
use crate::protocol::{Command, DEVICE_ID_OFFSET};
use crate::transport::Transport;

use super::Session;

impl<T: Transport> Session<T> {
    /// Identify the connected PIC and remember its device ID
    pub fn autodetect_device<'db, D>(&mut self, db: &'db D) -> Result<&'db DeviceProfile>
    where
        D: DeviceLookup + ?Sized,
    {
        match self.detect_device(db) {
            Ok(profile) => {
                self.verified_device_id = Some(profile.device_id);
                Ok(profile)
            }
            Err(e) => {
                self.verified_device_id = None;
                Err(e)
            }
        }
    }

    /// Check that the connected PIC is the expected device
    ///
    /// Identification only runs when the expected ID differs from the last
    /// verified one.
    pub fn verify_device_id<D>(&mut self, expected: &DeviceProfile, db: &D) -> Result<()>
    where
        D: DeviceLookup + ?Sized,
    {
        if self.verified_device_id == Some(expected.device_id) {
            return Ok(());
        }

        let detected = self.autodetect_device(db)?;
        if detected.device_id != expected.device_id {
            return Err(Error::DeviceMismatch {
                expected: expected.device_id,
                detected: detected.device_id,
                name: expected.name.clone(),
            });
        }
        Ok(())
    }

    /// Make sure the connected PIC matches `expected` before touching memory
    ///
    /// Unlike [`verify_device_id`](Self::verify_device_id) this needs no
    /// database: the raw ID is checked against the profile directly.
    pub(crate) fn ensure_device(&mut self, expected: &DeviceProfile) -> Result<()> {
        if self.verified_device_id == Some(expected.device_id) {
            return Ok(());
        }

        let raw_id = self.read_device_id_word()?;
        if !expected.matches_raw_id(raw_id) {
            self.verified_device_id = None;
            return Err(Error::DeviceMismatch {
                expected: expected.device_id,
                detected: expected.decode_raw_id(raw_id).device_id,
                name: expected.name.clone(),
            });
        }

        self.verified_device_id = Some(expected.device_id);
        Ok(())
    }

    fn detect_device<'db, D>(&mut self, db: &'db D) -> Result<&'db DeviceProfile>
    where
        D: DeviceLookup + ?Sized,
    {
        log::info!("Detecting connected device...");
        let raw_id = self.read_device_id_word()?;

        let profile = db
            .lookup_by_raw_id(raw_id)
            .ok_or(Error::UnrecognizedDevice { raw_id })?;
        let DeviceIdentity {
            device_id,
            revision,
        } = profile.decode_raw_id(raw_id);

        log::info!("Device Name:     {}", profile.name);
        log::info!("Device ID:       0x{:04x}", device_id);
        log::info!("Device Revision: 0x{:04x}", revision);
        Ok(profile)
    }

    fn read_device_id_word(&mut self) -> Result<u16> {
        const ACTION: &str = "Read Device ID";

        self.select_config_mem_start(DEVICE_ID_OFFSET)?;
        let response = self.execute(&Command::read_pgm(1), ACTION)?;
        response.word().ok_or_else(|| Error::DataSizeMismatch {
            action: ACTION.to_string(),
            expected: 1,
            received: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::device::DeviceDatabase;
    use crate::error::Error;
    use crate::session::mock::ScriptedTransport;
    use crate::session::Session;

    const TEST_RON: &str = r#"(
        family: "Test",
        devices: [
            (name: "TestChip", device_id: 0x1234, revision_bits: 0, pgm_mem_size: 64),
            (name: "OtherChip", device_id: 0x83, pgm_mem_size: 64),
        ],
    )"#;

    fn test_db() -> DeviceDatabase {
        let mut db = DeviceDatabase::new();
        db.load_ron(TEST_RON).unwrap();
        db
    }

    /// Connected session with the identification replies queued
    fn session_with_id(raw_id: &str) -> Session<ScriptedTransport> {
        let transport = ScriptedTransport::new(&["OK ZEPPP v1.0.0"]);
        let mut session = Session::open(transport).unwrap();
        session.connect().unwrap();
        queue_id(&mut session, raw_id);
        session
    }

    fn queue_id(session: &mut Session<ScriptedTransport>, raw_id: &str) {
        // LE, CS, AI 06, PR 01 (LX only when already in LVP mode)
        if session.is_lvp_active() {
            session.transport_mut().push("OK");
        }
        let t = session.transport_mut();
        t.push("OK");
        t.push("OK");
        t.push("OK");
        t.push(&format!("OK {}", raw_id));
    }

    #[test]
    fn test_autodetect() {
        let db = test_db();
        let mut session = session_with_id("1234");

        let profile = session.autodetect_device(&db).unwrap();
        assert_eq!(profile.name, "TestChip");
        assert_eq!(session.verified_device_id(), Some(0x1234));
        assert_eq!(
            session.transport().sent(),
            &["ZV", "LE", "CS", "AI 06", "PR 01"]
        );
    }

    #[test]
    fn test_autodetect_with_revision() {
        let db = test_db();
        let mut session = session_with_id("1066");

        let profile = session.autodetect_device(&db).unwrap();
        assert_eq!(profile.name, "OtherChip");
        assert_eq!(session.verified_device_id(), Some(0x83));
    }

    #[test]
    fn test_autodetect_unrecognized() {
        let db = test_db();
        let mut session = session_with_id("5678");

        let err = session.autodetect_device(&db).unwrap_err();
        assert!(matches!(err, Error::UnrecognizedDevice { raw_id: 0x5678 }));
        assert!(err.to_string().contains("0x5678"));
        assert_eq!(session.verified_device_id(), None);
    }

    #[test]
    fn test_verify_device_id_cached() {
        let db = test_db();
        let mut session = session_with_id("1234");
        let expected = db.find_by_name("TestChip").unwrap();

        session.verify_device_id(expected, &db).unwrap();
        let sent = session.transport().sent().len();
        session.verify_device_id(expected, &db).unwrap();
        assert_eq!(session.transport().sent().len(), sent);
    }

    #[test]
    fn test_verify_device_id_mismatch() {
        let db = test_db();
        let mut session = session_with_id("1066");
        let expected = db.find_by_name("TestChip").unwrap();

        let err = session.verify_device_id(expected, &db).unwrap_err();
        assert!(matches!(
            err,
            Error::DeviceMismatch {
                expected: 0x1234,
                detected: 0x83,
                ..
            }
        ));
        let msg = err.to_string();
        assert!(msg.contains("0x1234"));
        assert!(msg.contains("TestChip"));
    }

    #[test]
    fn test_ensure_device() {
        let db = test_db();
        let mut session = session_with_id("1234");
        let expected = db.find_by_name("TestChip").unwrap();
        session.ensure_device(expected).unwrap();
        assert_eq!(session.verified_device_id(), Some(0x1234));

        let other = db.find_by_name("OtherChip").unwrap();
        queue_id(&mut session, "1234");
        let err = session.ensure_device(other).unwrap_err();
        assert!(matches!(err, Error::DeviceMismatch { expected: 0x83, .. }));
        assert_eq!(session.verified_device_id(), None);
    }

    #[test]
    fn test_read_device_id_garbage() {
        let db = test_db();
        let mut session = session_with_id("zzzz");
        let err = session.autodetect_device(&db).unwrap_err();
        assert!(matches!(err, Error::DataSizeMismatch { .. }));
    }
}
