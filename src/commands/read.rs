//! Read command implementation

use zeppp_core::device::DeviceDatabase;
use zeppp_core::memory::PicDevice;

use super::{area_present, open_session, read_area, require_areas, resolve_device, save_image, with_spinner};
use crate::cli::{AreaFiles, TargetArgs};

/// Read the requested memory areas and dump each to its file
pub fn run_read(
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
        if !area_present(&profile, *area) {
            continue;
        }
        with_spinner(format!("Reading {}...", area), || {
            read_area(&mut session, &mut pic, *area)
        })?;
        save_image(&pic, *area, path)?;
    }

    Ok(())
}
