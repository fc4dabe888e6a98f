//! monfix: disposable monitor-container fixtures for integration tests.
//!
//! The harness pulls a monitor image, allocates an internal bridge
//! network with a precomputed subnet and static address, starts a
//! single-node monitor container, health-checks it, hands it to the test
//! body and unconditionally removes everything afterwards.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod fixture;
pub mod net;

pub use catalog::TagCatalog;
pub use config::HarnessConfig;
pub use engine::{ContainerEngine, DockerEngine};
pub use error::{HarnessError, RangeError};
pub use fixture::{FixtureController, FixtureState, MonitorFixture};
pub use net::generate_ips;
