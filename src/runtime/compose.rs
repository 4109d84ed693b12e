//! Container group control
//!
//! Brings a declared topology of containerized services up or down as a
//! single atomic group operation via the host's container engine. The
//! topology files themselves are opaque; engine failures are surfaced
//! verbatim.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Errors from container engine invocations
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("No container engine found (install docker or podman)")]
    RuntimeMissing,

    #[error("Failed to invoke {engine}: {reason}")]
    InvokeFailed { engine: String, reason: String },

    #[error("{engine} compose failed: {stderr}")]
    GroupFailed { engine: String, stderr: String },
}

/// Supported container engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerEngine {
    Docker,
    Podman,
}

impl ContainerEngine {
    pub fn binary(&self) -> &'static str {
        match self {
            ContainerEngine::Docker => "docker",
            ContainerEngine::Podman => "podman",
        }
    }
}

/// Detect an available container engine, preferring docker.
///
/// A forced engine skips probing the other but is still verified.
pub async fn detect_engine(
    forced: Option<ContainerEngine>,
) -> Result<ContainerEngine, ComposeError> {
    let candidates = match forced {
        Some(engine) => vec![engine],
        None => vec![ContainerEngine::Docker, ContainerEngine::Podman],
    };

    for engine in candidates {
        let available = Command::new(engine.binary())
            .arg("--version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false);
        if available {
            debug!("Using container engine: {}", engine.binary());
            return Ok(engine);
        }
    }

    Err(ComposeError::RuntimeMissing)
}

/// Arguments for bringing a topology up
pub fn up_args(file: &Path) -> Vec<String> {
    vec![
        "compose".to_string(),
        "-f".to_string(),
        file.to_string_lossy().into_owned(),
        "up".to_string(),
        "-d".to_string(),
    ]
}

/// Arguments for tearing a topology down
pub fn down_args(file: &Path) -> Vec<String> {
    vec![
        "compose".to_string(),
        "-f".to_string(),
        file.to_string_lossy().into_owned(),
        "down".to_string(),
    ]
}

/// Capability to start/stop a declared group of containerized services.
///
/// Injectable so orchestration can be tested without a container engine.
#[async_trait]
pub trait ComposeEngine: Send + Sync {
    async fn group_up(&self, file: &Path) -> Result<(), ComposeError>;
    async fn group_down(&self, file: &Path) -> Result<(), ComposeError>;
}

/// Compose controller shelling out to the detected engine
pub struct CliCompose {
    engine: ContainerEngine,
}

impl CliCompose {
    pub fn new(engine: ContainerEngine) -> Self {
        Self { engine }
    }

    async fn run(&self, args: Vec<String>) -> Result<(), ComposeError> {
        let binary = self.engine.binary();
        debug!("{} {}", binary, args.join(" "));

        let output = Command::new(binary)
            .args(&args)
            .output()
            .await
            .map_err(|e| ComposeError::InvokeFailed {
                engine: binary.to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ComposeError::GroupFailed {
                engine: binary.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl ComposeEngine for CliCompose {
    async fn group_up(&self, file: &Path) -> Result<(), ComposeError> {
        info!("Bringing up container group from {:?}", file);
        self.run(up_args(file)).await
    }

    async fn group_down(&self, file: &Path) -> Result<(), ComposeError> {
        info!("Tearing down container group from {:?}", file);
        self.run(down_args(file)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_up_args() {
        let args = up_args(&PathBuf::from("docker-compose.yml"));
        assert_eq!(args, vec!["compose", "-f", "docker-compose.yml", "up", "-d"]);
    }

    #[test]
    fn test_down_args() {
        let args = down_args(&PathBuf::from("docker-compose.native.yml"));
        assert_eq!(args, vec!["compose", "-f", "docker-compose.native.yml", "down"]);
    }

    #[test]
    fn test_engine_binaries() {
        assert_eq!(ContainerEngine::Docker.binary(), "docker");
        assert_eq!(ContainerEngine::Podman.binary(), "podman");
    }
}
