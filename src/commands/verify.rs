//! Verify command implementation

use zeppp_core::device::DeviceDatabase;
use zeppp_core::memory::PicDevice;

use super::{area_present, load_image, open_session, require_areas, resolve_device, verify_area, with_spinner};
use crate::cli::{AreaFiles, TargetArgs};

/// Compare the chip with the given image files
pub fn run_verify(
    target: &TargetArgs,
    files: &AreaFiles,
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

    for (area, _) in &areas {
        if !area_present(&profile, *area) {
            continue;
        }
        with_spinner(format!("Verifying {}...", area), || {
            verify_area(&mut session, &pic, *area)
        })?;
    }

    println!("Verification successful!");
    Ok(())
}
