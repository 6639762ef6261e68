//! # hoopstats common library
//!
//! Shared code for the hoopstats workspace:
//! - Error type for configuration and I/O failures
//! - TOML bootstrap configuration and setting resolution
//! - Logging initialization

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
