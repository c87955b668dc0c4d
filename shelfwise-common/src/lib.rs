//! # Shelfwise Common Library
//!
//! Shared code for the Shelfwise crates including:
//! - Error and result types
//! - Configuration loading and root folder resolution
//! - Atomic file writes for JSON/TOML state documents
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod fs;
pub mod time;

pub use error::{Error, Result};
