//! CLI command implementations for hcloud-pricing-exporter.
//!
//! - `check`: HCloud API validation
//! - `config`: Configuration file generation

pub mod check;
pub mod config;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
