//! Erase command implementation

use zeppp_core::device::DeviceDatabase;

use super::{open_session, resolve_device, with_spinner};
use crate::cli::{EraseTarget, TargetArgs};

/// Erase one memory area, or the whole chip
pub fn run_erase(
    target: &TargetArgs,
    area: EraseTarget,
    db: &DeviceDatabase,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session(&target.programmer, db)?;
    let profile = resolve_device(&mut session, db, target.device.as_deref())?;
    println!("Found: {}", profile.name);

    match area {
        EraseTarget::Chip => {
            with_spinner("Erasing chip...", || session.chip_erase(&profile))?;
        }
        EraseTarget::Pgm => {
            with_spinner("Erasing program memory...", || {
                session.erase_pgm_mem(&profile)
            })?;
        }
        EraseTarget::Data => {
            with_spinner("Erasing data memory...", || session.erase_data_mem(&profile))?;
        }
        EraseTarget::PgmConfig => {
            with_spinner("Erasing program memory and config words...", || {
                session.erase_pgm_and_config_mem(&profile)
            })?;
        }
    }

    println!("Erase complete");
    Ok(())
}
