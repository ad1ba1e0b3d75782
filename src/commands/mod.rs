//! CLI command implementations for netapp-ontap-exporter.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: One scrape against the cluster with per-collector results
//! - `describe`: Metric listing
//! - `config`: Configuration file generation

pub mod check;
pub mod config;
pub mod describe;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use describe::command_describe;
