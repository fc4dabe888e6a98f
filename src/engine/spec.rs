//! Request specs for engine-side resources.
//!
//! Both specs are plain data: they describe exactly what the lifecycle
//! controller asks the engine to create, and they are immutable once the
//! creation request has been issued.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// Specification for the monitor container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Image reference, e.g. `ceph/daemon:tag-build-master-jewel-centos-7`.
    pub image: String,
    /// Container name, unique per run when a run id is configured.
    pub name: String,
    /// Environment entries in `KEY=VALUE` form.
    pub env: Vec<String>,
    /// Name of the network the container attaches to.
    pub network: String,
    /// Static address inside the network's subnet.
    pub address: Ipv4Addr,
    /// Command to run, split into arguments.
    pub cmd: Option<Vec<String>>,
    /// Labels applied to the container, used by cleanup sweeps.
    pub labels: HashMap<String, String>,
}

impl ContainerSpec {
    pub fn new(
        image: impl Into<String>,
        name: impl Into<String>,
        network: impl Into<String>,
        address: Ipv4Addr,
    ) -> Self {
        Self {
            image: image.into(),
            name: name.into(),
            env: Vec::new(),
            network: network.into(),
            address,
            cmd: None,
            labels: HashMap::new(),
        }
    }

    pub fn with_env(mut self, env: Vec<String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_cmd(mut self, cmd: Vec<String>) -> Self {
        self.cmd = Some(cmd);
        self
    }

    pub fn with_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.labels = labels;
        self
    }
}

/// Specification for the fixture network.
///
/// Created before the container that references it, removed after that
/// container is gone: the engine refuses to delete a network that still
/// has attached endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub name: String,
    /// Driver kind; the harness always provisions `bridge` networks.
    pub driver: String,
    /// Internal networks get no external connectivity.
    pub internal: bool,
    /// IPAM pool subnet in CIDR form.
    pub subnet: String,
    /// IPAM pool gateway address.
    pub gateway: Ipv4Addr,
    pub labels: HashMap<String, String>,
}

impl NetworkSpec {
    pub fn bridge(name: impl Into<String>, subnet: impl Into<String>, gateway: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            driver: "bridge".to_string(),
            internal: true,
            subnet: subnet.into(),
            gateway,
            labels: HashMap::new(),
        }
    }

    pub fn with_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.labels = labels;
        self
    }
}
