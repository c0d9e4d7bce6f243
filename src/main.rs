//! zeppp - Command line client for ZEPPP PIC programmers
//!
//! Reads, writes, verifies and erases mid-range PIC microcontrollers
//! through a ZEPPP ("Zero External Parts PIC Programmer") interface.
//!
//! # Architecture
//!
//! - **zeppp-core** holds the protocol, the programming session and the
//!   device database
//! - **zeppp-serial** carries the protocol over a serial port or a TCP
//!   bridge
//! - **zeppp-dummy** emulates an interface with a PIC attached, for testing
//!   without hardware
//!
//! Every command opens a fresh session and identifies the chip before
//! touching its memory.

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use zeppp_core::device::DeviceDatabase;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    // Load device database
    let db = match load_device_database(cli.device_db.as_deref()) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to load device database: {}", e);
            std::process::exit(1);
        }
    };

    log::debug!("Loaded {} device definitions", db.len());

    match cli.command {
        Commands::Probe { programmer } => commands::run_probe(&programmer, &db),
        Commands::Read { target, files } => commands::run_read(&target, &files, &db),
        Commands::Write {
            target,
            files,
            no_verify,
            no_erase,
        } => commands::run_write(&target, &files, !no_verify, !no_erase, &db),
        Commands::Verify { target, files } => commands::run_verify(&target, &files, &db),
        Commands::Erase { target, area } => commands::run_erase(&target, area, &db),
        Commands::ListDevices { filter } => {
            commands::list_devices(&db, filter.as_deref());
            Ok(())
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
    }
}

/// Load the built-in device database plus any user definitions
fn load_device_database(path: Option<&Path>) -> Result<DeviceDatabase, Box<dyn std::error::Error>> {
    let mut db = DeviceDatabase::builtin()?;

    if let Some(path) = path {
        let count = if path.is_dir() {
            db.load_dir(path)?
        } else if path.is_file() {
            db.load_file(path)?
        } else {
            return Err(format!("Device database path not found: {}", path.display()).into());
        };
        log::debug!("Loaded {} device definitions from {}", count, path.display());
    }

    Ok(db)
}
