//! Best-effort health probes
//!
//! A probe answers "could this server plausibly start right now?" without
//! running it: launch commands are looked up on `PATH`, remote endpoints get
//! one timed GET, and container servers check that the docker daemon answers.
//! Every probe is bounded by a timeout and never retried.

use mcpsync_meta::ServerType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Default timeout for HTTP/SSE probes.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for the `docker info` availability query.
pub const DEFAULT_DOCKER_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of probing one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub healthy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HealthReport {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            detail: None,
        }
    }

    pub fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            healthy: false,
            detail: Some(detail.into()),
        }
    }
}

/// Something that can judge whether a server is reachable.
pub trait HealthProbe: Send + Sync {
    fn probe(&self, server_name: &str, config: &Value) -> HealthReport;
}

/// Probe backed by the local system: `PATH`, the network and docker.
#[derive(Debug, Clone)]
pub struct SystemHealthProbe {
    http_timeout: Duration,
    docker_timeout: Duration,
}

impl Default for SystemHealthProbe {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_TIMEOUT, DEFAULT_DOCKER_TIMEOUT)
    }
}

impl SystemHealthProbe {
    pub fn new(http_timeout: Duration, docker_timeout: Duration) -> Self {
        Self {
            http_timeout,
            docker_timeout,
        }
    }

    fn probe_process(&self, config: &Value) -> HealthReport {
        let Some(command) = config.get("command").and_then(Value::as_str).filter(|c| !c.is_empty())
        else {
            return HealthReport::unhealthy("Missing command");
        };

        if command == "docker" {
            return self.docker_available();
        }
        match which::which(command) {
            Ok(_) => HealthReport::healthy(),
            Err(_) => HealthReport::unhealthy(format!("Command '{command}' not found in PATH")),
        }
    }

    fn probe_url(&self, config: &Value) -> HealthReport {
        let Some(url) = config.get("url").and_then(Value::as_str).filter(|u| !u.is_empty()) else {
            return HealthReport::unhealthy("Missing URL");
        };

        let client = match reqwest::blocking::Client::builder()
            .timeout(self.http_timeout)
            .build()
        {
            Ok(client) => client,
            Err(e) => return HealthReport::unhealthy(format!("Error checking URL '{url}': {e}")),
        };

        match client.get(url).send() {
            Ok(response) if response.status().is_success() => HealthReport::healthy(),
            Ok(response) => HealthReport::unhealthy(format!(
                "Cannot reach URL '{url}': HTTP {}",
                response.status()
            )),
            Err(e) if e.is_timeout() => HealthReport::unhealthy(format!(
                "Timed out after {}s reaching URL '{url}'",
                self.http_timeout.as_secs()
            )),
            Err(e) => HealthReport::unhealthy(format!("Cannot reach URL '{url}': {e}")),
        }
    }

    fn docker_available(&self) -> HealthReport {
        if which::which("docker").is_err() {
            return HealthReport::unhealthy("Docker not found in PATH");
        }

        let mut child = match Command::new("docker")
            .arg("info")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return HealthReport::unhealthy(format!("Docker command failed: {e}")),
        };

        let deadline = Instant::now() + self.docker_timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return HealthReport::healthy(),
                Ok(Some(_)) => {
                    return HealthReport::unhealthy("Docker is not running or not accessible");
                }
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return HealthReport::unhealthy("Docker command timed out");
                }
                Ok(None) => thread::sleep(Duration::from_millis(50)),
                Err(e) => return HealthReport::unhealthy(format!("Error checking Docker: {e}")),
            }
        }
    }
}

impl HealthProbe for SystemHealthProbe {
    fn probe(&self, server_name: &str, config: &Value) -> HealthReport {
        tracing::debug!(server = server_name, "Checking server health");
        let report = match ServerType::of(config) {
            Some(ServerType::Stdio) => self.probe_process(config),
            Some(ServerType::Http | ServerType::Sse) => self.probe_url(config),
            Some(ServerType::Docker) => self.docker_available(),
            None => HealthReport::unhealthy(format!(
                "Unknown server type: {}",
                config.get("type").unwrap_or(&Value::Null)
            )),
        };
        if !report.healthy {
            tracing::debug!(server = server_name, detail = ?report.detail, "Health check failed");
        }
        report
    }
}

/// Health of a whole server map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub healthy: usize,
    pub total: usize,
    /// One `"<server>: <detail>"` line per unhealthy server
    pub issues: Vec<String>,
}

impl HealthSummary {
    pub fn all_healthy(&self) -> bool {
        self.healthy == self.total
    }
}

/// Probe every server, catching panics from the probe as failures.
pub fn health_check_all(probe: &dyn HealthProbe, servers: &Map<String, Value>) -> HealthSummary {
    let mut summary = HealthSummary {
        total: servers.len(),
        ..Default::default()
    };

    for (name, config) in servers {
        let report = guarded_probe(probe, name, config);
        if report.healthy {
            summary.healthy += 1;
        } else {
            let detail = report.detail.unwrap_or_else(|| "unhealthy".to_string());
            tracing::warn!(server = %name, %detail, "Server health check failed");
            summary.issues.push(format!("{name}: {detail}"));
        }
    }

    tracing::info!(
        healthy = summary.healthy,
        total = summary.total,
        "Health check completed"
    );
    summary
}

/// Run a probe, turning a panic into an unhealthy report.
pub(crate) fn guarded_probe(probe: &dyn HealthProbe, name: &str, config: &Value) -> HealthReport {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| probe.probe(name, config)))
        .unwrap_or_else(|payload| {
            HealthReport::unhealthy(format!("Health check error: {}", panic_message(payload.as_ref())))
        })
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedProbe(bool);

    impl HealthProbe for FixedProbe {
        fn probe(&self, _: &str, _: &Value) -> HealthReport {
            if self.0 {
                HealthReport::healthy()
            } else {
                HealthReport::unhealthy("down")
            }
        }
    }

    struct PanickingProbe;

    impl HealthProbe for PanickingProbe {
        fn probe(&self, _: &str, _: &Value) -> HealthReport {
            panic!("probe exploded")
        }
    }

    fn servers() -> Map<String, Value> {
        json!({"a": {"command": "npx"}, "b": {"type": "http", "url": "https://x"}})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn summary_counts_healthy_servers() {
        let summary = health_check_all(&FixedProbe(true), &servers());
        assert_eq!(summary.healthy, 2);
        assert!(summary.all_healthy());
        assert!(summary.issues.is_empty());
    }

    #[test]
    fn summary_lists_failures() {
        let summary = health_check_all(&FixedProbe(false), &servers());
        assert_eq!(summary.healthy, 0);
        assert_eq!(summary.issues, vec!["a: down", "b: down"]);
    }

    #[test]
    fn panicking_probe_is_unhealthy() {
        let report = guarded_probe(&PanickingProbe, "a", &json!({}));
        assert!(!report.healthy);
        assert!(report.detail.unwrap().contains("probe exploded"));
    }

    #[test]
    fn system_probe_reports_missing_fields() {
        let probe = SystemHealthProbe::default();
        assert_eq!(
            probe.probe("a", &json!({"type": "stdio"})),
            HealthReport::unhealthy("Missing command")
        );
        assert_eq!(
            probe.probe("b", &json!({"type": "sse"})),
            HealthReport::unhealthy("Missing URL")
        );
        assert!(!probe.probe("c", &json!({"type": "grpc"})).healthy);
    }

    #[test]
    fn system_probe_reports_unknown_command() {
        let probe = SystemHealthProbe::default();
        let report = probe.probe("a", &json!({"command": "definitely-not-a-real-binary-4821"}));
        assert_eq!(
            report.detail.as_deref(),
            Some("Command 'definitely-not-a-real-binary-4821' not found in PATH")
        );
    }
}
