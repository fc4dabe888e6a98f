//! The per-test-class lifecycle controller.

use std::net::Ipv4Addr;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::HarnessConfig;
use crate::engine::{ContainerEngine, ContainerSpec, NetworkSpec, ProbedState};
use crate::error::HarnessError;

/// Where the controller currently is in the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    Idle,
    ProvisioningNetwork,
    ProvisioningContainer,
    Starting,
    HealthChecking,
    Ready,
    TearingDown,
    Removed,
    Failed,
}

impl std::fmt::Display for FixtureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixtureState::Idle => write!(f, "idle"),
            FixtureState::ProvisioningNetwork => write!(f, "provisioning network"),
            FixtureState::ProvisioningContainer => write!(f, "provisioning container"),
            FixtureState::Starting => write!(f, "starting"),
            FixtureState::HealthChecking => write!(f, "health-checking"),
            FixtureState::Ready => write!(f, "ready"),
            FixtureState::TearingDown => write!(f, "tearing down"),
            FixtureState::Removed => write!(f, "removed"),
            FixtureState::Failed => write!(f, "failed"),
        }
    }
}

/// Handle to a running, health-checked monitor container.
///
/// Only ever handed out after the health check passes; on any failure the
/// controller has already removed the resources and this handle does not
/// exist.
#[derive(Debug, Clone)]
pub struct MonitorFixture {
    pub container_id: String,
    pub container_name: String,
    pub network_name: String,
    /// Static address of the monitor inside the fixture subnet.
    pub address: Ipv4Addr,
    /// Image tag the monitor was started from.
    pub image: String,
    pub started_at: DateTime<Utc>,
}

/// Drives the monitor fixture lifecycle against a container engine.
///
/// The controller exclusively owns the network and container it creates
/// for the duration of one invocation. Repeated runs against the same
/// names are made safe by [`ensure_clean`](Self::ensure_clean); runs that
/// must coexist get unique names via
/// [`HarnessConfig::with_run_id`](crate::config::HarnessConfig::with_run_id).
pub struct FixtureController<E> {
    engine: E,
    config: HarnessConfig,
    state: FixtureState,
}

impl<E: ContainerEngine> FixtureController<E> {
    pub fn new(engine: E, config: HarnessConfig) -> Self {
        Self {
            engine,
            config,
            state: FixtureState::Idle,
        }
    }

    pub fn state(&self) -> FixtureState {
        self.state
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Removes any pre-existing resources carrying this run's names or
    /// label. Not-found is not an error, so running this twice in a row
    /// is a no-op; it exists precisely so an aborted earlier run cannot
    /// poison the next one.
    pub async fn ensure_clean(&self) -> Result<(), HarnessError> {
        let container_name = self.config.scoped_container_name();
        let network_name = self.config.scoped_network_name();
        let labels = self.config.labels();

        for container in self.engine.list_containers().await? {
            let name_match = container
                .names
                .iter()
                .any(|name| name.contains(&container_name));
            let label_match = labels
                .iter()
                .any(|(key, value)| container.labels.get(key) == Some(value));
            if name_match || label_match {
                debug!(id = %container.id, "removing stale container");
                self.engine.remove_container(&container.id).await?;
            }
        }

        for network in self.engine.list_networks().await? {
            let label_match = labels
                .iter()
                .any(|(key, value)| network.labels.get(key) == Some(value));
            if network.name == network_name || label_match {
                debug!(name = %network.name, "removing stale network");
                self.engine.remove_network(&network.name).await?;
            }
        }

        Ok(())
    }

    /// Best-effort sweep of every resource carrying the harness label,
    /// regardless of run id. Collects leftovers from aborted runs that
    /// used unique names. Returns how many resources were removed.
    pub async fn sweep_labeled(&self) -> Result<usize, HarnessError> {
        let mut removed = 0;

        for container in self.engine.list_containers().await? {
            if container.labels.contains_key(crate::config::HARNESS_LABEL) {
                self.engine.remove_container(&container.id).await?;
                removed += 1;
            }
        }
        for network in self.engine.list_networks().await? {
            if network.labels.contains_key(crate::config::HARNESS_LABEL) {
                self.engine.remove_network(&network.name).await?;
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Runs the full setup: clean slate, network, container, start,
    /// health check. On success the monitor is running with its static
    /// address and the caller owns the returned handle until it passes it
    /// back to [`teardown`](Self::teardown).
    pub async fn up(&mut self, tag: &str) -> Result<MonitorFixture, HarnessError> {
        info!(%tag, "provisioning monitor fixture");
        self.ensure_clean().await?;

        let address = self.config.monitor_address()?;

        self.state = FixtureState::ProvisioningNetwork;
        let network = NetworkSpec::bridge(
            self.config.scoped_network_name(),
            self.config.subnet.clone(),
            self.config.gateway,
        )
        .with_labels(self.config.labels());

        if let Err(err) = self.engine.create_network(&network).await {
            self.state = FixtureState::Failed;
            return Err(err);
        }

        self.state = FixtureState::ProvisioningContainer;
        let container = ContainerSpec::new(
            tag,
            self.config.scoped_container_name(),
            network.name.clone(),
            address,
        )
        .with_env(self.config.monitor_env(address))
        .with_cmd(self.config.command.clone())
        .with_labels(self.config.labels());

        let container_id = match self.provision_container(&container).await {
            Ok(id) => id,
            Err(err) => return Err(self.abort(None, &network.name, err).await),
        };

        self.state = FixtureState::Starting;
        if let Err(err) = self.engine.start_container(&container_id).await {
            return Err(self.abort(Some(&container_id), &network.name, err).await);
        }

        self.state = FixtureState::HealthChecking;
        if let Err(err) = self.await_entrypoint(&container_id).await {
            return Err(self.abort(Some(&container_id), &network.name, err).await);
        }

        self.state = FixtureState::Ready;
        info!(container = %container_id, %address, "monitor fixture ready");

        Ok(MonitorFixture {
            container_id,
            container_name: container.name,
            network_name: network.name,
            address,
            image: tag.to_string(),
            started_at: Utc::now(),
        })
    }

    /// Removes the container, then the network. Order matters: the engine
    /// refuses to delete a network that still has attached endpoints.
    /// Idempotent; resources already gone are not an error.
    pub async fn teardown(&mut self, fixture: &MonitorFixture) -> Result<(), HarnessError> {
        self.state = FixtureState::TearingDown;
        self.engine.remove_container(&fixture.container_id).await?;
        self.engine.remove_network(&fixture.network_name).await?;
        self.state = FixtureState::Removed;
        Ok(())
    }

    /// Pull first, then create: the engine only reports a missing or
    /// broken image through the pull stream's terminal status.
    async fn provision_container(&self, spec: &ContainerSpec) -> Result<String, HarnessError> {
        self.engine.pull_image(&spec.image).await?;
        self.engine.create_container(spec).await
    }

    /// Bounded poll for entrypoint completion. There is no way to observe
    /// the entrypoint script finishing, so a container still running once
    /// the settle delay has elapsed counts as ready; a nonzero exit at any
    /// probe is fatal, with the log tail attached for diagnostics.
    async fn await_entrypoint(&self, id: &str) -> Result<(), HarnessError> {
        let started = Instant::now();
        let settle = self.config.settle_delay();
        let deadline = self.config.startup_deadline();

        loop {
            tokio::time::sleep(self.config.poll_interval()).await;

            match self.engine.probe_container(id).await? {
                ProbedState::Exited { exit_code } if exit_code > 0 => {
                    warn!(%id, exit_code, "entrypoint exited abnormally");
                    return Err(HarnessError::HealthCheck {
                        exit_code,
                        logs: self.capture_logs(id).await,
                    });
                }
                // A clean exit means the entrypoint ran to completion.
                ProbedState::Exited { .. } => return Ok(()),
                ProbedState::Dead => {
                    return Err(HarnessError::HealthCheck {
                        exit_code: -1,
                        logs: self.capture_logs(id).await,
                    });
                }
                ProbedState::Running if started.elapsed() >= settle => return Ok(()),
                _ => {}
            }

            if started.elapsed() >= deadline {
                return Err(HarnessError::StartupTimeout {
                    seconds: deadline.as_secs(),
                });
            }
        }
    }

    async fn capture_logs(&self, id: &str) -> Vec<String> {
        match self.engine.container_logs(id).await {
            Ok(lines) => lines,
            Err(err) => {
                warn!(%err, "could not capture container logs");
                Vec::new()
            }
        }
    }

    /// Failure path: mark failed, then remove whatever exists so no
    /// orphaned resources survive the error. Cleanup failures are logged,
    /// never allowed to mask the original error.
    async fn abort(
        &mut self,
        container: Option<&str>,
        network: &str,
        err: HarnessError,
    ) -> HarnessError {
        self.state = FixtureState::Failed;

        if let Some(id) = container {
            if let Err(cleanup_err) = self.engine.remove_container(id).await {
                warn!(%cleanup_err, "could not remove container while aborting");
            }
        }
        if let Err(cleanup_err) = self.engine.remove_network(network).await {
            warn!(%cleanup_err, "could not remove network while aborting");
        }

        err
    }
}
