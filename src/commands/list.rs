//! List commands implementation

use zeppp_core::device::DeviceDatabase;

use crate::programmers;

/// List all supported programmers
pub fn list_programmers() {
    println!("Supported programmers:");
    println!();
    for p in programmers::available_programmers() {
        println!("  {:10} - {}", p.name, p.description);
        if !p.aliases.is_empty() {
            println!("  {:10}   (aliases: {})", "", p.aliases.join(", "));
        }
    }
}

/// List all devices in the database
pub fn list_devices(db: &DeviceDatabase, name_filter: Option<&str>) {
    println!("Supported PIC devices:");
    println!();
    println!(
        "{:<14} {:>8} {:>10} {:>10} {:>6} {:>6} {:>6}",
        "Name", "ID", "Program", "Data", "Config", "Write", "CE"
    );
    println!("{}", "-".repeat(66));

    for device in db.iter() {
        if let Some(filter) = name_filter {
            if !device.name.to_lowercase().contains(&filter.to_lowercase()) {
                continue;
            }
        }

        println!(
            "{:<14} {:>8} {:>10} {:>10} {:>6} {:>6} {:>6}",
            device.name,
            format!("0x{:04X}", device.device_id),
            format!("{} w", device.pgm_mem_size),
            format!("{} B", device.data_mem_size),
            device.conf_words,
            device.pgm_write_size,
            if device.chip_erase { "yes" } else { "no" }
        );
    }
}
