//! PIC device profiles and database
//!
//! This module provides types for describing PIC devices and their
//! programming quirks, as well as a database of known devices that can be
//! loaded from RON files.

mod database;
mod types;

pub use database::*;
pub use types::*;
