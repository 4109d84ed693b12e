//! Stack orchestration
//!
//! Sequences the lifecycle components for each operator command: setup,
//! start, stop, and status. All external effects (downloads, process
//! spawning, container engine calls, port and health probes, conflict
//! prompts) go through injected capability interfaces.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::StackConfig;

use super::assets::{self, AssetError, Downloader};
use super::compose::{ComposeEngine, ComposeError};
use super::environment::{self, Environment, Mode};
use super::health::{self, HealthProbe, ServiceHealth};
use super::ports::{ConflictDecision, ConflictPolicy, PortConflict, PortError, PortProbe};
use super::supervisor::{ProcessRunner, StopOutcome, Supervisor, SupervisorError};

/// Fatal conditions that abort the current command
#[derive(Error, Debug)]
pub enum StackError {
    #[error("Native mode is not supported on this host (requires macOS on Apple Silicon)")]
    EnvironmentUnsupported,

    #[error("Model asset missing: {0} (run `scenectl setup` first)")]
    AssetMissing(String),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error(transparent)]
    Compose(#[from] ComposeError),
}

/// Result of `setup`
#[derive(Debug, Clone, Copy)]
pub struct SetupReport {
    pub downloaded: usize,
    pub total: usize,
}

/// Result of `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartReport {
    /// All services brought up as containers
    Container,
    /// Native inference process plus sidecar containers
    Native { pid: u32, reused: bool },
}

/// Result of `stop`; teardown is best-effort across all targets
#[derive(Debug)]
pub struct StopReport {
    pub native: StopOutcome,
    pub failures: Vec<String>,
}

/// Orchestrates the whole stack for one invocation
pub struct Orchestrator {
    config: StackConfig,
    environment: Environment,
    downloader: Arc<dyn Downloader>,
    compose: Arc<dyn ComposeEngine>,
    probe: Arc<dyn PortProbe>,
    policy: Arc<dyn ConflictPolicy>,
    health: Arc<dyn HealthProbe>,
    supervisor: Supervisor,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: StackConfig,
        environment: Environment,
        downloader: Arc<dyn Downloader>,
        runner: Arc<dyn ProcessRunner>,
        compose: Arc<dyn ComposeEngine>,
        probe: Arc<dyn PortProbe>,
        policy: Arc<dyn ConflictPolicy>,
        health: Arc<dyn HealthProbe>,
    ) -> Self {
        let supervisor = Supervisor::new(runner, config.record_path(), config.inference_port);
        Self {
            config,
            environment,
            downloader,
            compose,
            probe,
            policy,
            health,
            supervisor,
        }
    }

    /// Idempotently provision the model assets
    pub async fn setup(&self) -> Result<SetupReport, StackError> {
        let specs = self.config.asset_specs();
        let downloaded = assets::provision(&specs, self.downloader.as_ref()).await?;
        Ok(SetupReport {
            downloaded,
            total: specs.len(),
        })
    }

    /// Start the stack in the selected mode
    pub async fn start(&self, forced: Option<Mode>) -> Result<StartReport, StackError> {
        let mode = environment::select_mode(forced, &self.environment);
        info!("Starting stack in {} mode", mode);

        match mode {
            Mode::Container => {
                self.compose.group_up(&self.config.compose_container).await?;
                Ok(StartReport::Container)
            }
            Mode::Native => self.start_native().await,
        }
    }

    async fn start_native(&self) -> Result<StartReport, StackError> {
        if !environment::supports_native(&self.environment) {
            return Err(StackError::EnvironmentUnsupported);
        }

        // Provisioning is a start-time precondition, independent of setup
        // having run.
        let specs = self.config.asset_specs();
        if let Some(spec) = assets::missing_assets(&specs).first() {
            return Err(StackError::AssetMissing(spec.name.clone()));
        }

        // A live process we already own means no duplicate spawn; a stale
        // record was dropped inside check_running.
        if let Some(pid) = self.supervisor.check_running()? {
            info!("Inference process {} already running, not spawning", pid);
            self.compose.group_up(&self.config.compose_native).await?;
            return Ok(StartReport::Native { pid, reused: true });
        }

        self.resolve_port_conflict().await?;

        let model_paths = specs.into_iter().map(|s| s.local_path).collect();
        let pid = self
            .supervisor
            .spawn(
                &self.config.inference_binary,
                &self.config.inference_args(),
                model_paths,
            )
            .await?;

        self.compose.group_up(&self.config.compose_native).await?;
        Ok(StartReport::Native { pid, reused: false })
    }

    /// Arbitrate the target port before a native spawn.
    ///
    /// The live probe is trusted over any persisted bookkeeping. On
    /// confirmation the container topology (the likely owner) is torn down
    /// and the port is re-probed; a declined or unresolved conflict is a
    /// hard failure so the port is never dual-bound.
    async fn resolve_port_conflict(&self) -> Result<(), StackError> {
        let port = self.config.inference_port;
        if !self.probe.is_port_open(port).await {
            return Ok(());
        }

        let conflict = PortConflict {
            port,
            likely_owner: "the containerized inference service".to_string(),
        };

        match self.policy.decide(&conflict) {
            ConflictDecision::Abort => Err(PortError::ConflictDeclined(port).into()),
            ConflictDecision::StopConflicting => {
                info!("Stopping conflicting container group to free port {}", port);
                self.compose.group_down(&self.config.compose_container).await?;
                if self.probe.is_port_open(port).await {
                    return Err(PortError::StillBound(port).into());
                }
                Ok(())
            }
        }
    }

    /// Tear down everything, regardless of which topology was last started.
    ///
    /// Both topology files and the native process are attempted
    /// independently; tearing down a non-running topology is a no-op.
    pub async fn stop(&self) -> StopReport {
        let mut failures = Vec::new();

        for file in [&self.config.compose_native, &self.config.compose_container] {
            if let Err(e) = self.compose.group_down(file).await {
                warn!("Teardown of {:?} failed: {}", file, e);
                failures.push(e.to_string());
            }
        }

        let native = match self.supervisor.stop().await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Native process teardown failed: {}", e);
                failures.push(e.to_string());
                StopOutcome::NothingRunning
            }
        };

        StopReport { native, failures }
    }

    /// Point-in-time health snapshot of all services
    pub async fn status(&self) -> Vec<ServiceHealth> {
        let endpoints = health::endpoints(&self.config);
        health::snapshot(&endpoints, self.health.as_ref()).await
    }

    /// Whether the native inference process is running: signal probe when a
    /// record exists, port probe otherwise
    pub async fn native_running(&self) -> bool {
        self.supervisor.is_running(self.probe.as_ref()).await
    }
}
