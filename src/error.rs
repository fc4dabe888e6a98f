//! Error types for monfix operations.
//!
//! Defines the error taxonomy for the fixture lifecycle:
//! - Image pulls (terminal status line carries the engine's error)
//! - Network and container provisioning
//! - Container start and entrypoint health checks
//! - Address range generation
//! - Configuration loading
//!
//! None of these are retried anywhere: a single engine call failure is
//! fatal to the current lifecycle attempt.

use std::net::Ipv4Addr;

use thiserror::Error;

/// Errors that can occur while driving a fixture lifecycle.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("could not pull '{image}': {message}")]
    ImagePull { image: String, message: String },

    #[error("provisioning rejected by engine: {0}")]
    Provisioning(String),

    #[error("container start rejected by engine: {0}")]
    Start(String),

    #[error("container entrypoint exited with code {exit_code}")]
    HealthCheck { exit_code: i64, logs: Vec<String> },

    #[error("container reached neither a ready nor an exited state within {seconds}s")]
    StartupTimeout { seconds: u64 },

    #[error("container engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("engine call failed: {0}")]
    Engine(String),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors that can occur while generating an address range.
///
/// The range generator sweeps the last three octets only, so any end
/// address the odometer cannot reach is rejected up front instead of
/// looping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("end address {end} is below start address {start}")]
    EndBeforeStart { start: Ipv4Addr, end: Ipv4Addr },

    #[error("end address {end} is outside the first-octet sweep of {start}")]
    OutsideSweep { start: Ipv4Addr, end: Ipv4Addr },
}
