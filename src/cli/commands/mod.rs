//! Command implementations for the framevote CLI
//!
//! Each command is organized into its own module.

pub mod analyze;
pub mod config;
