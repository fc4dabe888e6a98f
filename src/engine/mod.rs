//! Container engine abstraction.
//!
//! The lifecycle controller only ever talks to the engine through the
//! [`ContainerEngine`] trait, so the whole lifecycle can be exercised in
//! tests against a scripted in-memory engine. The production
//! implementation is [`DockerEngine`], backed by the bollard client over
//! the local Docker socket.

pub mod docker;
pub mod spec;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::HarnessError;

pub use docker::DockerEngine;
pub use spec::{ContainerSpec, NetworkSpec};

/// Summary of a container as reported by a listing call.
#[derive(Debug, Clone)]
pub struct ContainerBrief {
    pub id: String,
    /// Names as the engine reports them (Docker prefixes a `/`).
    pub names: Vec<String>,
    pub labels: HashMap<String, String>,
}

/// Summary of a network as reported by a listing call.
#[derive(Debug, Clone)]
pub struct NetworkBrief {
    pub id: String,
    pub name: String,
    pub labels: HashMap<String, String>,
}

/// Container state as observed by a single inspect call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbedState {
    Created,
    Running,
    Exited { exit_code: i64 },
    Dead,
    Other(String),
}

/// Engine operations the fixture lifecycle needs.
///
/// Error mapping is part of the contract: pull failures surface as
/// [`HarnessError::ImagePull`], creation rejections as
/// [`HarnessError::Provisioning`], start rejections as
/// [`HarnessError::Start`], everything else as [`HarnessError::Engine`].
/// Removal of an already-absent resource is success, not an error.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Pulls an image, treating an error in the terminal status message of
    /// the pull stream as a failure carrying the engine's own message.
    async fn pull_image(&self, image: &str) -> Result<(), HarnessError>;

    /// Lists all containers, including stopped ones.
    async fn list_containers(&self) -> Result<Vec<ContainerBrief>, HarnessError>;

    /// Creates a container and returns its id. Does not start it.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, HarnessError>;

    async fn start_container(&self, id: &str) -> Result<(), HarnessError>;

    /// Inspects the container's current state.
    async fn probe_container(&self, id: &str) -> Result<ProbedState, HarnessError>;

    /// Collects the container's log output, one line per element.
    async fn container_logs(&self, id: &str) -> Result<Vec<String>, HarnessError>;

    /// Full inspect payload, for diagnostics reports.
    async fn inspect_container(&self, id: &str) -> Result<serde_json::Value, HarnessError>;

    /// Force-removes a container. Absence is success.
    async fn remove_container(&self, id: &str) -> Result<(), HarnessError>;

    async fn list_networks(&self) -> Result<Vec<NetworkBrief>, HarnessError>;

    /// Creates a network as described by the given [`NetworkSpec`]. The
    /// network is addressable by its name afterwards.
    async fn create_network(&self, spec: &NetworkSpec) -> Result<(), HarnessError>;

    /// Removes a network by name or id. Absence is success.
    async fn remove_network(&self, name: &str) -> Result<(), HarnessError>;
}
