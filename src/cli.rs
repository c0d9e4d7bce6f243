//! CLI argument parsing

use crate::programmers;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use [available: {}]",
        programmers::programmer_names_short()
    )
}

#[derive(Parser)]
#[command(name = "zeppp")]
#[command(author, version, about = "ZEPPP PIC programmer client", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Extra device definitions (a .ron file or a directory of them)
    /// loaded on top of the built-in device database
    #[arg(long, global = true)]
    pub device_db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Programmer and target device selection shared across commands
#[derive(clap::Args, Debug, Clone)]
pub struct TargetArgs {
    /// Programmer to use
    #[arg(short, long, help = programmer_help(), long_help = programmers::programmer_help())]
    pub programmer: String,

    /// Device name (optional, auto-detected if not specified)
    #[arg(short, long)]
    pub device: Option<String>,
}

/// Memory image files, one raw little-endian dump per area
#[derive(clap::Args, Debug, Clone, Default)]
pub struct AreaFiles {
    /// Program memory image
    #[arg(long)]
    pub pgm: Option<PathBuf>,

    /// Data (EEPROM) memory image
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Configuration words image
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// User ID words image
    #[arg(long)]
    pub user_ids: Option<PathBuf>,
}

/// What an erase command clears
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EraseTarget {
    /// Every memory area
    #[default]
    Chip,
    /// Program memory
    Pgm,
    /// Data (EEPROM) memory
    Data,
    /// Program memory and configuration words
    PgmConfig,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect the interface and the connected PIC
    Probe {
        /// Programmer to use
        #[arg(short, long, help = programmer_help(), long_help = programmers::programmer_help())]
        programmer: String,
    },

    /// Read device memory to files
    Read {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        files: AreaFiles,
    },

    /// Write files to device memory
    Write {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        files: AreaFiles,

        /// Don't verify after writing
        ///
        /// Block-written program memory and user IDs are always read back
        /// while writing and are not verified again.
        #[arg(long)]
        no_verify: bool,

        /// Don't erase the chip before writing
        #[arg(long)]
        no_erase: bool,
    },

    /// Verify device memory against files
    Verify {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        files: AreaFiles,
    },

    /// Erase device memory
    Erase {
        #[command(flatten)]
        target: TargetArgs,

        /// Memory to erase
        #[arg(long, value_enum, default_value_t = EraseTarget::Chip)]
        area: EraseTarget,
    },

    /// List supported devices
    ListDevices {
        /// Filter by name
        #[arg(long)]
        filter: Option<String>,
    },

    /// List supported programmers
    ListProgrammers,
}
