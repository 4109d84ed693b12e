//! Native inference process supervision
//!
//! Starts, stops, and queries the natively spawned inference server using a
//! durable ownership record. The record's presence never guarantees a live
//! process: liveness is always re-verified by signal probe before the record
//! is trusted, and a stale record is deleted silently.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::ports::PortProbe;

/// Errors that can occur during process supervision
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Failed to spawn inference process: {0}")]
    SpawnFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable record of a native process started by this orchestrator.
///
/// The sole on-disk orchestrator state. Written immediately after spawn,
/// deleted on stop or staleness detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeProcessRecord {
    pub pid: u32,
    pub port: u16,
    pub model_paths: Vec<PathBuf>,
}

impl NativeProcessRecord {
    /// Read the record, if one exists.
    ///
    /// An unreadable or unparseable file is treated as absent (stale state,
    /// not an invariant violation).
    pub fn load(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Unreadable ownership record at {:?}: {}", path, e);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Corrupt ownership record at {:?}: {}", path, e);
                None
            }
        }
    }

    /// Persist the record, creating the state directory if needed
    pub fn save(&self, path: &Path) -> Result<(), SupervisorError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SupervisorError::SpawnFailed(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Delete the record; a missing file is not an error
    pub fn remove(path: &Path) -> Result<(), SupervisorError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Capability interface over the host process table.
///
/// Injectable so supervision logic can be tested without spawning anything.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Spawn a detached process and return its pid
    async fn spawn_detached(&self, program: &str, args: &[String])
        -> Result<u32, SupervisorError>;

    /// Signal-probe liveness of a pid
    fn is_alive(&self, pid: u32) -> bool;

    /// Terminate a pid; returns false if the process was already gone
    fn terminate(&self, pid: u32) -> bool;

    /// Find the pid listening on a local TCP port, if any
    async fn port_listener_pid(&self, port: u16) -> Option<u32>;
}

/// Runner backed by the real host: tokio for spawning, sysinfo for the
/// process table, lsof for the port-to-pid lookup
pub struct HostProcessRunner;

#[async_trait]
impl ProcessRunner for HostProcessRunner {
    async fn spawn_detached(
        &self,
        program: &str,
        args: &[String],
    ) -> Result<u32, SupervisorError> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SupervisorError::SpawnFailed(format!("{}: {}", program, e)))?;

        // Dropping the handle leaves the process running after this
        // invocation exits (kill_on_drop is off by default).
        child.id().ok_or_else(|| {
            SupervisorError::SpawnFailed("process exited before a pid could be read".to_string())
        })
    }

    fn is_alive(&self, pid: u32) -> bool {
        let sys = sysinfo::System::new_all();
        sys.process(sysinfo::Pid::from_u32(pid)).is_some()
    }

    fn terminate(&self, pid: u32) -> bool {
        let sys = sysinfo::System::new_all();
        match sys.process(sysinfo::Pid::from_u32(pid)) {
            Some(process) => process
                .kill_with(sysinfo::Signal::Term)
                .unwrap_or_else(|| process.kill()),
            None => false,
        }
    }

    async fn port_listener_pid(&self, port: u16) -> Option<u32> {
        let output = Command::new("lsof")
            .args(["-ti", &format!("tcp:{}", port), "-sTCP:LISTEN"])
            .output()
            .await
            .ok()?;

        if !output.status.success() {
            return None;
        }
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()?
            .trim()
            .parse()
            .ok()
    }
}

/// Outcome of a stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// A recorded live process was terminated
    Stopped { pid: u32 },
    /// A record existed but its process was already gone; record removed
    AlreadyStopped,
    /// No record, but something listened on the target port and was
    /// terminated. No ownership guarantee on this path.
    StoppedUntracked { pid: u32 },
    /// No record and nothing listening
    NothingRunning,
}

/// Supervisor for the natively spawned inference process
pub struct Supervisor {
    runner: Arc<dyn ProcessRunner>,
    record_path: PathBuf,
    port: u16,
}

impl Supervisor {
    pub fn new(runner: Arc<dyn ProcessRunner>, record_path: PathBuf, port: u16) -> Self {
        Self {
            runner,
            record_path,
            port,
        }
    }

    /// Check for a process we already own.
    ///
    /// Returns the pid when the recorded process is live. A record whose
    /// process is gone is stale: it is deleted silently and `None` is
    /// returned so the caller proceeds to spawn.
    pub fn check_running(&self) -> Result<Option<u32>, SupervisorError> {
        let Some(record) = NativeProcessRecord::load(&self.record_path) else {
            return Ok(None);
        };

        if self.runner.is_alive(record.pid) {
            debug!("Inference process {} is already running", record.pid);
            return Ok(Some(record.pid));
        }

        debug!("Dropping stale ownership record for pid {}", record.pid);
        NativeProcessRecord::remove(&self.record_path)?;
        Ok(None)
    }

    /// Spawn the inference process detached and persist a fresh ownership
    /// record. Spawn failure is fatal.
    pub async fn spawn(
        &self,
        program: &str,
        args: &[String],
        model_paths: Vec<PathBuf>,
    ) -> Result<u32, SupervisorError> {
        let pid = self.runner.spawn_detached(program, args).await?;

        let record = NativeProcessRecord {
            pid,
            port: self.port,
            model_paths,
        };
        record.save(&self.record_path)?;

        info!("Spawned inference process {} on port {}", pid, self.port);
        Ok(pid)
    }

    /// Stop the native process.
    ///
    /// With a record: verify liveness, terminate if live, delete the record
    /// either way. Without one: scan the target port and terminate whatever
    /// listens there (documented risk: no ownership proof).
    pub async fn stop(&self) -> Result<StopOutcome, SupervisorError> {
        if let Some(record) = NativeProcessRecord::load(&self.record_path) {
            let outcome = if self.runner.is_alive(record.pid) {
                self.runner.terminate(record.pid);
                info!("Stopped inference process {}", record.pid);
                StopOutcome::Stopped { pid: record.pid }
            } else {
                debug!("Recorded process {} already gone", record.pid);
                StopOutcome::AlreadyStopped
            };
            NativeProcessRecord::remove(&self.record_path)?;
            return Ok(outcome);
        }

        match self.runner.port_listener_pid(self.port).await {
            Some(pid) => {
                warn!(
                    "No ownership record; terminating untracked listener {} on port {}",
                    pid, self.port
                );
                self.runner.terminate(pid);
                Ok(StopOutcome::StoppedUntracked { pid })
            }
            None => Ok(StopOutcome::NothingRunning),
        }
    }

    /// Liveness: signal probe when a record exists, port probe otherwise
    pub async fn is_running(&self, probe: &dyn PortProbe) -> bool {
        if let Some(record) = NativeProcessRecord::load(&self.record_path) {
            return self.runner.is_alive(record.pid);
        }
        probe.is_port_open(self.port).await
    }
}
