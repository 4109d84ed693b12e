//! Service health snapshot
//!
//! Independently probes each service's well-known local health endpoint.
//! Each probe is isolated: a failure or timeout on one never prevents
//! checking the others. The result is a point-in-time observation, not
//! continuous monitoring.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::StackConfig;

/// A service and the endpoint that answers for its health
#[derive(Debug, Clone)]
pub struct ServiceEndpoint {
    pub name: &'static str,
    pub url: String,
}

/// Reachability of one service at probe time
#[derive(Debug, Clone)]
pub struct ServiceHealth {
    pub name: &'static str,
    pub url: String,
    pub reachable: bool,
    /// Error detail when unreachable
    pub detail: Option<String>,
}

/// Capability to probe one health URL
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Ok(status) when the endpoint answered, Err(reason) otherwise
    async fn probe(&self, url: &str) -> Result<u16, String>;
}

/// Probe backed by reqwest with a short per-request timeout
pub struct HttpHealthProbe {
    client: reqwest::Client,
}

impl HttpHealthProbe {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpHealthProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, url: &str) -> Result<u16, String> {
        match self.client.get(url).send().await {
            Ok(response) => Ok(response.status().as_u16()),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// The three well-known health endpoints of the stack
pub fn endpoints(config: &StackConfig) -> Vec<ServiceEndpoint> {
    vec![
        ServiceEndpoint {
            name: "inference",
            url: format!("http://localhost:{}/health", config.inference_port),
        },
        ServiceEndpoint {
            name: "backend",
            url: format!("http://localhost:{}/health", config.backend_port),
        },
        ServiceEndpoint {
            name: "ui",
            url: format!("http://localhost:{}/", config.ui_port),
        },
    ]
}

/// Probe every service, never short-circuiting on failure
pub async fn snapshot(
    services: &[ServiceEndpoint],
    probe: &dyn HealthProbe,
) -> Vec<ServiceHealth> {
    let mut results = Vec::with_capacity(services.len());

    for service in services {
        let health = match probe.probe(&service.url).await {
            Ok(status) if (200..300).contains(&status) => ServiceHealth {
                name: service.name,
                url: service.url.clone(),
                reachable: true,
                detail: None,
            },
            Ok(status) => ServiceHealth {
                name: service.name,
                url: service.url.clone(),
                reachable: false,
                detail: Some(format!("HTTP {}", status)),
            },
            Err(reason) => ServiceHealth {
                name: service.name,
                url: service.url.clone(),
                reachable: false,
                detail: Some(reason),
            },
        };
        debug!(
            "Probed {}: {}",
            health.name,
            if health.reachable { "up" } else { "down" }
        );
        results.push(health);
    }

    results
}
