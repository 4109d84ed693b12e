//! Shared fakes for the capability interfaces, used across unit tests

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use super::assets::{AssetError, Downloader};
use super::compose::{ComposeEngine, ComposeError};
use super::health::HealthProbe;
use super::ports::PortProbe;
use super::supervisor::{ProcessRunner, SupervisorError};

/// Downloader that records requested URLs and writes a stub file
pub(crate) struct FakeDownloader {
    pub calls: Mutex<Vec<String>>,
    pub fail: bool,
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), AssetError> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.fail {
            return Err(AssetError::DownloadFailed {
                name: dest.file_name().unwrap().to_string_lossy().into_owned(),
                reason: "connection refused".to_string(),
            });
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, b"stub")?;
        Ok(())
    }
}

/// Runner over a fake process table
pub(crate) struct FakeRunner {
    pub alive: Mutex<HashSet<u32>>,
    pub spawned: Mutex<Vec<(String, Vec<String>)>>,
    pub next_pid: Mutex<u32>,
    pub listener: Mutex<Option<u32>>,
    pub fail_spawn: bool,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            alive: Mutex::new(HashSet::new()),
            spawned: Mutex::new(Vec::new()),
            next_pid: Mutex::new(1000),
            listener: Mutex::new(None),
            fail_spawn: false,
        }
    }

    pub fn with_alive(pid: u32) -> Self {
        let runner = Self::new();
        runner.alive.lock().unwrap().insert(pid);
        runner
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn spawn_detached(
        &self,
        program: &str,
        args: &[String],
    ) -> Result<u32, SupervisorError> {
        if self.fail_spawn {
            return Err(SupervisorError::SpawnFailed("no such binary".to_string()));
        }
        let mut next = self.next_pid.lock().unwrap();
        *next += 1;
        let pid = *next;
        self.alive.lock().unwrap().insert(pid);
        self.spawned
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));
        Ok(pid)
    }

    fn is_alive(&self, pid: u32) -> bool {
        self.alive.lock().unwrap().contains(&pid)
    }

    fn terminate(&self, pid: u32) -> bool {
        self.alive.lock().unwrap().remove(&pid)
    }

    async fn port_listener_pid(&self, _port: u16) -> Option<u32> {
        *self.listener.lock().unwrap()
    }
}

/// Compose engine that records group operations
pub(crate) struct FakeCompose {
    pub ups: Mutex<Vec<PathBuf>>,
    pub downs: Mutex<Vec<PathBuf>>,
}

impl FakeCompose {
    pub fn new() -> Self {
        Self {
            ups: Mutex::new(Vec::new()),
            downs: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ComposeEngine for FakeCompose {
    async fn group_up(&self, file: &Path) -> Result<(), ComposeError> {
        self.ups.lock().unwrap().push(file.to_path_buf());
        Ok(())
    }

    async fn group_down(&self, file: &Path) -> Result<(), ComposeError> {
        self.downs.lock().unwrap().push(file.to_path_buf());
        Ok(())
    }
}

/// Port probe answering from a scripted sequence, then "closed"
pub(crate) struct ScriptedProbe {
    responses: Mutex<VecDeque<bool>>,
}

impl ScriptedProbe {
    pub fn new(responses: &[bool]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().copied().collect()),
        }
    }
}

#[async_trait]
impl PortProbe for ScriptedProbe {
    async fn is_port_open(&self, _port: u16) -> bool {
        self.responses.lock().unwrap().pop_front().unwrap_or(false)
    }
}

/// Health probe for which every endpoint is down
pub(crate) struct NoHealth;

#[async_trait]
impl HealthProbe for NoHealth {
    async fn probe(&self, _url: &str) -> Result<u16, String> {
        Err("connection refused".to_string())
    }
}
