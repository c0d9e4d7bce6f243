//! Programmer registration and dispatch
//!
//! This module provides a centralized registry for all ZEPPP links, with
//! support for feature-gated inclusion and dynamic help text generation.

use std::collections::HashMap;

use zeppp_core::device::DeviceDatabase;
use zeppp_core::transport::Transport;

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory ZEPPP interface and PIC emulator (device=<name>)",
    });

    #[cfg(feature = "serial")]
    programmers.push(ProgrammerInfo {
        name: "zeppp",
        aliases: &["serial"],
        description: "ZEPPP interface over serial/network (dev=<port>[:baud] or ip=<host:port>)",
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");
    for p in &programmers {
        help.push_str(&format!("  {:12} - {}\n", p.name, p.description));
    }
    help
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}

/// Resolve a programmer name or alias to its primary name
pub fn find_programmer(name: &str) -> Option<&'static str> {
    available_programmers()
        .into_iter()
        .find(|p| p.name == name || p.aliases.contains(&name))
        .map(|p| p.name)
}

/// Parsed programmer parameters
#[derive(Debug)]
pub struct ProgrammerParams {
    /// Programmer name as given
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

/// Parse a programmer string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2". Only the first `:`
/// separates the name, so serial baud rates (`dev=/dev/ttyUSB0:115200`)
/// survive intact.
pub fn parse_programmer_params(s: &str) -> Result<ProgrammerParams, Box<dyn std::error::Error>> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.insert(key.to_string(), value.to_string());
            } else {
                return Err(
                    format!("Invalid parameter format: '{}' (expected key=value)", opt).into(),
                );
            }
        }
    }

    Ok(ProgrammerParams {
        name: name.to_string(),
        params,
    })
}

/// Open the link to a ZEPPP interface
///
/// # Arguments
/// * `programmer` - Programmer string (e.g., "dummy" or "zeppp:dev=/dev/ttyUSB0")
/// * `db` - Device database, used by the dummy programmer to pick the emulated PIC
#[allow(unused_variables)]
pub fn open_programmer(
    programmer: &str,
    db: &DeviceDatabase,
) -> Result<Box<dyn Transport>, Box<dyn std::error::Error>> {
    let params = parse_programmer_params(programmer)?;

    match find_programmer(&params.name) {
        #[cfg(feature = "dummy")]
        Some("dummy") => open_dummy(&params, db),

        #[cfg(feature = "serial")]
        Some("zeppp") => open_serial(&params),

        _ => Err(format!(
            "Unknown programmer: {} [available: {}]",
            params.name,
            programmer_names_short()
        )
        .into()),
    }
}

#[cfg(feature = "dummy")]
fn open_dummy(
    params: &ProgrammerParams,
    db: &DeviceDatabase,
) -> Result<Box<dyn Transport>, Box<dyn std::error::Error>> {
    use zeppp_dummy::{DummyConfig, DummyProgrammer};

    let config = match params.params.get("device") {
        Some(name) => {
            let profile = db
                .find_by_name(name)
                .ok_or_else(|| format!("Unknown device for dummy programmer: {}", name))?;
            DummyConfig::for_profile(profile, 0)
        }
        None => DummyConfig::default(),
    };

    log::info!("Opening dummy ZEPPP interface...");
    Ok(Box::new(DummyProgrammer::new(config)))
}

#[cfg(feature = "serial")]
fn open_serial(params: &ProgrammerParams) -> Result<Box<dyn Transport>, Box<dyn std::error::Error>> {
    // Rebuild the connection string from dev= or ip=
    let conn_str = ["dev", "ip"]
        .iter()
        .find_map(|key| params.params.get(*key).map(|v| format!("{}={}", key, v)))
        .ok_or(
            "zeppp requires connection parameters.\n\
             Usage: zeppp:dev=/dev/ttyUSB0[:baud] or zeppp:ip=host:port",
        )?;

    log::info!("Opening ZEPPP interface ({})...", conn_str);
    let transport = zeppp_serial::open_zeppp(&conn_str)
        .map_err(|e| format!("Invalid zeppp parameters: {}", e))?;
    Ok(transport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_programmer_params() {
        let p = parse_programmer_params("zeppp:dev=/dev/ttyUSB0:115200").unwrap();
        assert_eq!(p.name, "zeppp");
        assert_eq!(p.params.get("dev").unwrap(), "/dev/ttyUSB0:115200");

        let p = parse_programmer_params("dummy").unwrap();
        assert_eq!(p.name, "dummy");
        assert!(p.params.is_empty());

        assert!(parse_programmer_params("dummy:device").is_err());
    }

    #[test]
    fn test_find_programmer() {
        #[cfg(feature = "serial")]
        assert_eq!(find_programmer("serial"), Some("zeppp"));
        #[cfg(feature = "dummy")]
        assert_eq!(find_programmer("dummy"), Some("dummy"));
        assert_eq!(find_programmer("ch341a"), None);
    }

    #[test]
    fn test_open_unknown_programmer() {
        let db = DeviceDatabase::new();
        assert!(open_programmer("ch341a", &db).is_err());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_dummy_with_device() {
        let db = DeviceDatabase::builtin().unwrap();
        assert!(open_programmer("dummy:device=PIC16F88", &db).is_ok());
        assert!(open_programmer("dummy:device=PIC99X1", &db).is_err());
    }

    #[cfg(feature = "serial")]
    #[test]
    fn test_open_serial_requires_connection() {
        let db = DeviceDatabase::new();
        assert!(open_programmer("zeppp", &db).is_err());
    }
}
