//! Harness configuration.
//!
//! Everything the lifecycle asserts (subnet, gateway, resource names,
//! environment keys, delays, the tag catalog) lives here as data with
//! the documented defaults, loadable from a YAML file and overridable
//! programmatically. The subnet and gateway are made up: there is no sane
//! way to derive them, so the harness claims a private range and hands the
//! monitor a precomputed address inside it.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::TagCatalog;
use crate::error::HarnessError;
use crate::net::generate_ips;

/// Environment key telling the entrypoint which daemon role to assume.
pub const ENV_DAEMON: &str = "CEPH_DAEMON";
/// Environment key carrying the monitor's static address.
pub const ENV_MON_IP: &str = "MON_IP";
/// Environment key carrying the public network CIDR.
pub const ENV_PUBLIC_NETWORK: &str = "CEPH_PUBLIC_NETWORK";

/// Label key stamped on every resource the harness creates.
pub const HARNESS_LABEL: &str = "monfix.harness";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Subnet of the fixture network, CIDR form.
    pub subnet: String,
    /// Gateway of the fixture network.
    pub gateway: Ipv4Addr,
    /// Offset from the gateway to the first allocatable address.
    pub address_offset: u8,
    /// Base name of the monitor container.
    pub container_name: String,
    /// Base name of the fixture network.
    pub network_name: String,
    /// Daemon role passed to the entrypoint.
    pub daemon_kind: String,
    /// Command line run inside the container.
    pub command: Vec<String>,
    /// Suffix making resource names unique per run; `None` keeps the
    /// historical fixed names.
    pub run_id: Option<String>,
    /// How long the entrypoint gets to settle before a running container
    /// counts as ready.
    pub settle_delay_ms: u64,
    /// Interval between health-check probes.
    pub poll_interval_ms: u64,
    /// Hard deadline for the container to become ready or exit.
    pub startup_deadline_secs: u64,
    /// Image tags the suite may run against.
    pub catalog: TagCatalog,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            subnet: "172.172.172.0/16".to_string(),
            gateway: Ipv4Addr::new(172, 172, 172, 1),
            address_offset: 1,
            container_name: "pytest_ceph_mon".to_string(),
            network_name: "pytest_monitor".to_string(),
            daemon_kind: "MON".to_string(),
            command: vec!["ceph/daemon".to_string(), "mon".to_string()],
            run_id: None,
            settle_delay_ms: 500,
            poll_interval_ms: 100,
            startup_deadline_secs: 10,
            catalog: TagCatalog::default(),
        }
    }
}

impl HarnessConfig {
    /// Loads a config from a YAML file; absent keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&raw)?;
        Ok(config)
    }

    /// Tags a fresh run id onto the config so resource names cannot
    /// collide with a concurrently running suite.
    pub fn with_run_id(mut self) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.run_id = Some(id[..8].to_string());
        self
    }

    /// Container name with the run id applied, if any.
    pub fn scoped_container_name(&self) -> String {
        match &self.run_id {
            Some(id) => format!("{}_{}", self.container_name, id),
            None => self.container_name.clone(),
        }
    }

    /// Network name with the run id applied, if any.
    pub fn scoped_network_name(&self) -> String {
        match &self.run_id {
            Some(id) => format!("{}_{}", self.network_name, id),
            None => self.network_name.clone(),
        }
    }

    /// The monitor's static address: the gateway advanced by the
    /// configured offset.
    pub fn monitor_address(&self) -> Result<Ipv4Addr, HarnessError> {
        let range = generate_ips(self.gateway, None, Some(self.address_offset))?;
        range
            .last()
            .copied()
            .ok_or_else(|| HarnessError::Provisioning("empty address range".to_string()))
    }

    /// Environment handed to the monitor container.
    pub fn monitor_env(&self, address: Ipv4Addr) -> Vec<String> {
        vec![
            format!("{ENV_DAEMON}={}", self.daemon_kind),
            format!("{ENV_MON_IP}={address}"),
            format!("{ENV_PUBLIC_NETWORK}={}", self.subnet),
        ]
    }

    /// Labels stamped on created resources. The value scopes the label to
    /// this run so cleanup can tell its own resources from a neighbor's.
    pub fn labels(&self) -> HashMap<String, String> {
        let value = self.run_id.clone().unwrap_or_else(|| "default".to_string());
        HashMap::from([(HARNESS_LABEL.to_string(), value)])
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn startup_deadline(&self) -> Duration {
        Duration::from_secs(self.startup_deadline_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = HarnessConfig::default();
        assert_eq!(config.subnet, "172.172.172.0/16");
        assert_eq!(config.gateway, Ipv4Addr::new(172, 172, 172, 1));
        assert_eq!(config.scoped_container_name(), "pytest_ceph_mon");
        assert_eq!(config.scoped_network_name(), "pytest_monitor");
        assert_eq!(config.settle_delay(), Duration::from_millis(500));
        assert_eq!(config.catalog.len(), 11);
    }

    #[test]
    fn monitor_address_is_gateway_plus_offset() {
        let config = HarnessConfig::default();
        let address = config.monitor_address().unwrap();
        assert_eq!(address, Ipv4Addr::new(172, 172, 172, 2));
    }

    #[test]
    fn monitor_env_carries_the_fixed_keys() {
        let config = HarnessConfig::default();
        let env = config.monitor_env(Ipv4Addr::new(172, 172, 172, 2));
        assert_eq!(
            env,
            vec![
                "CEPH_DAEMON=MON".to_string(),
                "MON_IP=172.172.172.2".to_string(),
                "CEPH_PUBLIC_NETWORK=172.172.172.0/16".to_string(),
            ]
        );
    }

    #[test]
    fn run_id_scopes_names_and_labels() {
        let config = HarnessConfig::default().with_run_id();
        let id = config.run_id.clone().unwrap();
        assert_eq!(id.len(), 8);
        assert_eq!(
            config.scoped_container_name(),
            format!("pytest_ceph_mon_{id}")
        );
        assert_eq!(config.scoped_network_name(), format!("pytest_monitor_{id}"));
        assert_eq!(config.labels().get(HARNESS_LABEL), Some(&id));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "container_name: other_mon\nstartup_deadline_secs: 30").unwrap();

        let config = HarnessConfig::load(file.path()).unwrap();
        assert_eq!(config.container_name, "other_mon");
        assert_eq!(config.startup_deadline(), Duration::from_secs(30));
        assert_eq!(config.subnet, "172.172.172.0/16");
        assert_eq!(config.catalog.len(), 11);
    }

    #[test]
    fn config_round_trips_through_yaml() {
        let config = HarnessConfig::default();
        let raw = serde_yaml::to_string(&config).unwrap();
        let parsed: HarnessConfig = serde_yaml::from_str(&raw).unwrap();
        assert_eq!(parsed.subnet, config.subnet);
        assert_eq!(parsed.gateway, config.gateway);
        assert_eq!(parsed.catalog, config.catalog);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = HarnessConfig::load("/nonexistent/monfix.yaml").unwrap_err();
        assert!(matches!(err, HarnessError::Io(_)));
    }
}
