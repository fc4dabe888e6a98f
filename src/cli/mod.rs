//! Command-line interface for monfix.
//!
//! Provides operational commands for provisioning, cleaning up and
//! inspecting monitor fixtures outside a test run.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli};
