//! Docker implementation of the engine abstraction, using bollard.
//!
//! All calls go to the local daemon socket. The pull path mirrors the
//! streaming protocol: the daemon emits newline-delimited status messages
//! and the terminal one carries the overall result, so the last message's
//! error field decides whether the pull succeeded.

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions, LogOutput,
    LogsOptions, NetworkingConfig, RemoveContainerOptions, StartContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::{EndpointIpamConfig, EndpointSettings, Ipam, IpamConfig};
use bollard::network::{CreateNetworkOptions, ListNetworksOptions};
use bollard::Docker;
use futures::StreamExt;

use crate::engine::{
    ContainerBrief, ContainerEngine, ContainerSpec, NetworkBrief, NetworkSpec, ProbedState,
};
use crate::error::HarnessError;

/// Engine client backed by the local Docker daemon.
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connects to the daemon over the platform's local defaults
    /// (the unix socket on Linux).
    pub fn connect() -> Result<Self, HarnessError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| HarnessError::EngineUnavailable(e.to_string()))?;
        Ok(Self { docker })
    }

    /// Wraps an existing bollard handle.
    pub fn from_docker(docker: Docker) -> Self {
        Self { docker }
    }
}

fn is_not_found(err: &bollard::errors::Error) -> bool {
    matches!(
        err,
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn pull_image(&self, image: &str) -> Result<(), HarnessError> {
        let options = CreateImageOptions {
            from_image: image,
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);
        let mut terminal = None;

        while let Some(message) = stream.next().await {
            match message {
                Ok(info) => terminal = Some(info),
                Err(e) => {
                    return Err(HarnessError::ImagePull {
                        image: image.to_string(),
                        message: e.to_string(),
                    })
                }
            }
        }

        // The terminal status message carries the overall pull result.
        if let Some(error) = terminal.and_then(|info| info.error) {
            return Err(HarnessError::ImagePull {
                image: image.to_string(),
                message: error,
            });
        }

        Ok(())
    }

    async fn list_containers(&self) -> Result<Vec<ContainerBrief>, HarnessError> {
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };

        let summaries = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| HarnessError::Engine(format!("failed to list containers: {e}")))?;

        Ok(summaries
            .into_iter()
            .map(|summary| ContainerBrief {
                id: summary.id.unwrap_or_default(),
                names: summary.names.unwrap_or_default(),
                labels: summary.labels.unwrap_or_default(),
            })
            .collect())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, HarnessError> {
        // Bind the endpoint to the fixture network with the precomputed
        // static address; the monitor must know its own IP up front.
        let mut endpoints = HashMap::new();
        endpoints.insert(
            spec.network.clone(),
            EndpointSettings {
                ipam_config: Some(EndpointIpamConfig {
                    ipv4_address: Some(spec.address.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );

        let config = Config {
            image: Some(spec.image.clone()),
            env: if spec.env.is_empty() {
                None
            } else {
                Some(spec.env.clone())
            },
            cmd: spec.cmd.clone(),
            labels: Some(spec.labels.clone()),
            attach_stdin: Some(false),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            networking_config: Some(NetworkingConfig {
                endpoints_config: endpoints,
            }),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| HarnessError::Provisioning(format!("container creation failed: {e}")))?;

        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<(), HarnessError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| HarnessError::Start(e.to_string()))
    }

    async fn probe_container(&self, id: &str) -> Result<ProbedState, HarnessError> {
        let info = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| HarnessError::Engine(format!("failed to inspect container: {e}")))?;

        let state = info
            .state
            .ok_or_else(|| HarnessError::Engine("container has no state".to_string()))?;

        let status = state.status.map(|s| s.to_string()).unwrap_or_default();
        Ok(match status.as_str() {
            "created" => ProbedState::Created,
            "running" | "restarting" | "paused" => ProbedState::Running,
            "exited" => ProbedState::Exited {
                exit_code: state.exit_code.unwrap_or(-1),
            },
            "dead" => ProbedState::Dead,
            other => ProbedState::Other(other.to_string()),
        })
    }

    async fn container_logs(&self, id: &str) -> Result<Vec<String>, HarnessError> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            follow: false,
            timestamps: false,
            ..Default::default()
        };

        let mut stream = self.docker.logs(id, Some(options));
        let mut lines = Vec::new();

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(LogOutput::StdOut { message }) | Ok(LogOutput::StdErr { message }) => {
                    for line in String::from_utf8_lossy(&message).lines() {
                        lines.push(line.to_string());
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    return Err(HarnessError::Engine(format!("error reading logs: {e}")));
                }
            }
        }

        Ok(lines)
    }

    async fn inspect_container(&self, id: &str) -> Result<serde_json::Value, HarnessError> {
        let info = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| HarnessError::Engine(format!("failed to inspect container: {e}")))?;

        serde_json::to_value(info)
            .map_err(|e| HarnessError::Engine(format!("unserializable inspect payload: {e}")))
    }

    async fn remove_container(&self, id: &str) -> Result<(), HarnessError> {
        let options = RemoveContainerOptions {
            force: true,
            v: true,
            ..Default::default()
        };

        match self.docker.remove_container(id, Some(options)).await {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(HarnessError::Engine(format!(
                "failed to remove container: {e}"
            ))),
        }
    }

    async fn list_networks(&self) -> Result<Vec<NetworkBrief>, HarnessError> {
        let networks = self
            .docker
            .list_networks(None::<ListNetworksOptions<String>>)
            .await
            .map_err(|e| HarnessError::Engine(format!("failed to list networks: {e}")))?;

        Ok(networks
            .into_iter()
            .map(|network| NetworkBrief {
                id: network.id.unwrap_or_default(),
                name: network.name.unwrap_or_default(),
                labels: network.labels.unwrap_or_default(),
            })
            .collect())
    }

    async fn create_network(&self, spec: &NetworkSpec) -> Result<(), HarnessError> {
        let options = CreateNetworkOptions {
            name: spec.name.clone(),
            check_duplicate: true,
            driver: spec.driver.clone(),
            internal: spec.internal,
            ipam: Ipam {
                config: Some(vec![IpamConfig {
                    subnet: Some(spec.subnet.clone()),
                    gateway: Some(spec.gateway.to_string()),
                    ..Default::default()
                }]),
                ..Default::default()
            },
            labels: spec.labels.clone(),
            ..Default::default()
        };

        self.docker
            .create_network(options)
            .await
            .map(|_| ())
            .map_err(|e| HarnessError::Provisioning(format!("network creation failed: {e}")))
    }

    async fn remove_network(&self, name: &str) -> Result<(), HarnessError> {
        match self.docker.remove_network(name).await {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(HarnessError::Engine(format!(
                "failed to remove network: {e}"
            ))),
        }
    }
}
