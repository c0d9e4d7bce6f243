//! Write command implementation

use zeppp_core::device::DeviceDatabase;
use zeppp_core::memory::PicDevice;

use super::{
    area_present, load_image, open_session, require_areas, resolve_device, verified_by_write,
    verify_area, with_spinner, write_area,
};
use crate::cli::{AreaFiles, TargetArgs};

/// Program the given image files into the chip
///
/// Areas are written in the order user IDs, program, data, config so that
/// code protection bits land last. Areas the write already read back are
/// not verified a second time.
pub fn run_write(
    target: &TargetArgs,
    files: &AreaFiles,
    verify: bool,
    erase: bool,
    db: &DeviceDatabase,
) -> Result<(), Box<dyn std::error::Error>> {
    let areas = require_areas(files)?;

    let mut session = open_session(&target.programmer, db)?;
    let profile = resolve_device(&mut session, db, target.device.as_deref())?;
    println!("Found: {}", profile.name);

    let mut pic = PicDevice::new(profile.clone());
    for (area, path) in &areas {
        load_image(&mut pic, *area, path)?;
    }

    if erase {
        with_spinner("Erasing chip...", || session.chip_erase(&profile))?;
    } else {
        log::warn!("Skipping erase, programmed bits can only be cleared");
    }

    let areas: Vec<_> = areas
        .into_iter()
        .filter(|(area, _)| area_present(&profile, *area))
        .collect();

    for (area, _) in &areas {
        with_spinner(format!("Writing {}...", area), || {
            write_area(&mut session, &pic, *area)
        })?;
    }

    if verify {
        for (area, _) in &areas {
            if verified_by_write(&profile, *area) {
                log::info!("{} already verified while writing", area);
                continue;
            }
            with_spinner(format!("Verifying {}...", area), || {
                verify_area(&mut session, &pic, *area)
            })?;
        }
        println!("Write complete and verified!");
    } else {
        println!("Write complete!");
    }

    Ok(())
}
