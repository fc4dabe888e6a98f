//! Failure diagnostics for labeled harness containers.
//!
//! When a test fails, the most useful artifacts are the engine's inspect
//! payload and the container logs. Collection is deliberately lenient:
//! a diagnostics error must never mask the failure being diagnosed, so
//! anything that cannot be fetched is logged and skipped.

use serde::Serialize;
use tracing::warn;

use crate::config::HARNESS_LABEL;
use crate::engine::ContainerEngine;

/// Inspect payload plus log lines for one harness container.
#[derive(Debug, Serialize)]
pub struct ContainerReport {
    pub id: String,
    pub names: Vec<String>,
    pub inspect: serde_json::Value,
    pub log_lines: Vec<String>,
}

impl ContainerReport {
    /// Renders the report the way it is attached to a failing test:
    /// inspect section first, then the log tail.
    pub fn render(&self) -> String {
        let inspect = serde_json::to_string_pretty(&self.inspect)
            .unwrap_or_else(|_| self.inspect.to_string());
        let mut out = format!("inspect {:?}:\n{inspect}\n", self.id);
        out.push_str(&format!("logs {:?}:\n", self.id));
        for line in &self.log_lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Collects a report for every container carrying the harness label,
/// whatever state it is in.
pub async fn collect_diagnostics<E: ContainerEngine>(engine: &E) -> Vec<ContainerReport> {
    let containers = match engine.list_containers().await {
        Ok(containers) => containers,
        Err(err) => {
            warn!(%err, "could not list containers for diagnostics");
            return Vec::new();
        }
    };

    let mut reports = Vec::new();
    for container in containers {
        if !container.labels.contains_key(HARNESS_LABEL) {
            continue;
        }

        let inspect = match engine.inspect_container(&container.id).await {
            Ok(value) => value,
            Err(err) => {
                warn!(id = %container.id, %err, "could not inspect container");
                serde_json::Value::Null
            }
        };
        let log_lines = match engine.container_logs(&container.id).await {
            Ok(lines) => lines,
            Err(err) => {
                warn!(id = %container.id, %err, "could not fetch container logs");
                Vec::new()
            }
        };

        reports.push(ContainerReport {
            id: container.id,
            names: container.names,
            inspect,
            log_lines,
        });
    }

    reports
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_sections_inspect_then_logs() {
        let report = ContainerReport {
            id: "abc123".to_string(),
            names: vec!["/pytest_ceph_mon".to_string()],
            inspect: serde_json::json!({"State": {"ExitCode": 1}}),
            log_lines: vec!["mon setup failed".to_string()],
        };

        let rendered = report.render();
        let inspect_at = rendered.find("inspect \"abc123\":").unwrap();
        let logs_at = rendered.find("logs \"abc123\":").unwrap();
        assert!(inspect_at < logs_at);
        assert!(rendered.contains("mon setup failed"));
    }
}
