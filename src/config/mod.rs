//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (defaults, logging cadence)
//! - CLI option types and parsing

mod constants;
mod types;

pub use constants::*;
pub use types::{is_valid_table_ident, Config, LogFormat, LogLevel, Mode, OutputFormat};
