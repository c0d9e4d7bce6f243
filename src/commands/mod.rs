//! CLI command implementations
//!
//! Every command opens its own session: the programmer link is opened, the
//! interface firmware is checked, and the target PIC is resolved either
//! from `--device` (then verified against the chip) or by autodetection.
//!
//! Memory images are raw little-endian dumps, one file per memory area.

mod erase;
mod list;
mod probe;
mod read;
mod verify;
mod write;

pub use erase::run_erase;
pub use list::{list_devices, list_programmers};
pub use probe::run_probe;
pub use read::run_read;
pub use verify::run_verify;
pub use write::run_write;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use zeppp_core::device::{DeviceDatabase, DeviceProfile};
use zeppp_core::memory::{Area, PicDevice};
use zeppp_core::protocol::USER_IDS_COUNT;
use zeppp_core::session::{Session, WriteMode};
use zeppp_core::transport::Transport;

use crate::cli::AreaFiles;
use crate::programmers::open_programmer;

/// Session over whichever link the programmer string selected
pub type ZepppSession = Session<Box<dyn Transport>>;

/// Open the programmer and check the interface
pub fn open_session(
    programmer: &str,
    db: &DeviceDatabase,
) -> Result<ZepppSession, Box<dyn std::error::Error>> {
    let transport = open_programmer(programmer, db)?;
    let mut session = Session::open(transport)?;
    session.connect()?;
    Ok(session)
}

/// Find the profile of the connected PIC
///
/// With a device name the chip must match it; without one the chip is
/// looked up by its device ID.
pub fn resolve_device(
    session: &mut ZepppSession,
    db: &DeviceDatabase,
    name: Option<&str>,
) -> Result<DeviceProfile, Box<dyn std::error::Error>> {
    match name {
        Some(name) => {
            let profile = db
                .find_by_name(name)
                .ok_or_else(|| format!("Unknown device: {} (see list-devices)", name))?;
            session.verify_device_id(profile, db)?;
            Ok(profile.clone())
        }
        None => Ok(session.autodetect_device(db)?.clone()),
    }
}

/// Area files given on the command line, in programming order
pub fn selected_areas(files: &AreaFiles) -> Vec<(Area, PathBuf)> {
    Area::ALL
        .iter()
        .filter_map(|&area| {
            let path = match area {
                Area::UserIds => files.user_ids.as_ref(),
                Area::Program => files.pgm.as_ref(),
                Area::Data => files.data.as_ref(),
                Area::Config => files.config.as_ref(),
            };
            path.map(|p| (area, p.clone()))
        })
        .collect()
}

/// Like [`selected_areas`], but at least one file is required
pub fn require_areas(
    files: &AreaFiles,
) -> Result<Vec<(Area, PathBuf)>, Box<dyn std::error::Error>> {
    let areas = selected_areas(files);
    if areas.is_empty() {
        return Err("No image files given. Use --pgm, --data, --config or --user-ids".into());
    }
    Ok(areas)
}

/// Load a raw image file into one area of the device image
pub fn load_image(
    pic: &mut PicDevice,
    area: Area,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(path).map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
    let region = pic.region_mut(area);
    let capacity = region.as_bytes().len();

    if bytes.len() > capacity {
        log::warn!(
            "{:?} holds {} bytes, {} only has {}; extra bytes ignored",
            path,
            bytes.len(),
            area,
            capacity
        );
    }
    let loaded = region.load(&bytes);
    log::debug!("Loaded {} bytes of {} from {:?}", loaded, area, path);
    Ok(())
}

/// Write one area of the device image to a raw image file
pub fn save_image(pic: &PicDevice, area: Area, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = pic.region(area).as_bytes();
    fs::write(path, bytes).map_err(|e| format!("Failed to write {:?}: {}", path, e))?;
    println!("Wrote {} bytes of {} to {:?}", bytes.len(), area, path);
    Ok(())
}

/// Whether `area` exists on the device, warning when it does not
pub fn area_present(profile: &DeviceProfile, area: Area) -> bool {
    if area == Area::Data && !profile.has_data_mem() {
        log::warn!("{} has no {}, skipping", profile.name, area);
        return false;
    }
    true
}

/// Read one area from the chip into the image
pub fn read_area(
    session: &mut ZepppSession,
    pic: &mut PicDevice,
    area: Area,
) -> zeppp_core::Result<()> {
    match area {
        Area::UserIds => session.read_user_ids(pic),
        Area::Program => session.read_pgm_mem(pic),
        Area::Data => session.read_data_mem(pic),
        Area::Config => session.read_config_words(pic),
    }
}

/// Program one area of the image into the chip
pub fn write_area(session: &mut ZepppSession, pic: &PicDevice, area: Area) -> zeppp_core::Result<()> {
    match area {
        Area::UserIds => session.write_user_ids(pic),
        Area::Program => session.write_pgm_mem(pic),
        Area::Data => session.write_data_mem(pic),
        Area::Config => session.write_config_words(pic),
    }
}

/// Compare one area of the chip with the image
pub fn verify_area(session: &mut ZepppSession, pic: &PicDevice, area: Area) -> zeppp_core::Result<()> {
    match area {
        Area::UserIds => session.verify_user_ids(pic),
        Area::Program => session.verify_pgm_mem(pic),
        Area::Data => session.verify_data_mem(pic),
        Area::Config => session.verify_config_words(pic),
    }
}

/// Whether writing `area` already reads it back and compares it
pub fn verified_by_write(profile: &DeviceProfile, area: Area) -> bool {
    let write_size = match area {
        Area::Program => profile.pgm_write_size,
        Area::UserIds => profile.pgm_write_size.min(USER_IDS_COUNT as u8),
        Area::Data | Area::Config => return false,
    };
    WriteMode::for_write_size(write_size, profile.pgm_erase_mode).needs_readback()
}

/// Run a session operation behind a spinner
pub fn with_spinner<T, E>(
    message: impl Into<String>,
    op: impl FnOnce() -> Result<T, E>,
) -> Result<T, Box<dyn std::error::Error>>
where
    E: Into<Box<dyn std::error::Error>>,
{
    let message = message.into();

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.clone());
    pb.enable_steady_tick(Duration::from_millis(100));

    match op() {
        Ok(value) => {
            pb.finish_with_message(format!("{} done", message));
            Ok(value)
        }
        Err(e) => {
            pb.abandon_with_message(format!("{} failed", message));
            Err(e.into())
        }
    }
}
