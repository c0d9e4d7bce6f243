//! Probe command implementation

use zeppp_core::device::DeviceDatabase;

use super::open_session;

/// Check the interface and identify the connected PIC
pub fn run_probe(programmer: &str, db: &DeviceDatabase) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session(programmer, db)?;

    match session.autodetect_device(db) {
        Ok(profile) => {
            println!("Found PIC device:");
            println!("  Name:           {}", profile.name);
            println!("  Device ID:      0x{:04X}", profile.device_id);
            println!("  Program memory: {} words", profile.pgm_mem_size);
            if profile.has_data_mem() {
                println!("  Data memory:    {} bytes", profile.data_mem_size);
            } else {
                println!("  Data memory:    none");
            }
            println!("  Config words:   {}", profile.conf_words);
            if profile.supports_block_write() {
                println!("  Write mode:     {} word blocks", profile.pgm_write_size);
            } else {
                println!("  Write mode:     single word");
            }
            println!(
                "  Chip erase:     {}",
                if profile.chip_erase { "yes" } else { "no" }
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("Probe failed: {}", e);
            Err(Box::new(e))
        }
    }
}
