//! Port conflict detection and arbitration
//!
//! A live probe decides whether a port has a listener; the orchestrator
//! never trusts its own bookkeeping over this probe, since ownership
//! records can go stale when a process dies out-of-band. When the target
//! port is occupied, an injected decision policy arbitrates: stop the
//! conflicting service, or abort the start.

use std::io::{BufRead, Write};

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised during conflict resolution
#[derive(Error, Debug)]
pub enum PortError {
    #[error("Port {0} is in use and the conflict was declined")]
    ConflictDeclined(u16),

    #[error("Port {0} is still in use after stopping the conflicting service")]
    StillBound(u16),
}

/// A detected conflict on the target port
#[derive(Debug, Clone)]
pub struct PortConflict {
    pub port: u16,
    /// Human-readable hint about the likely owner
    pub likely_owner: String,
}

/// Outcome of a conflict decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictDecision {
    /// Stop the conflicting service and proceed with the start
    StopConflicting,
    /// Abort the start; the port stays with its current owner
    Abort,
}

/// Capability to check whether a port currently has a listener
#[async_trait]
pub trait PortProbe: Send + Sync {
    async fn is_port_open(&self, port: u16) -> bool;
}

/// Probe backed by a TCP connect to localhost
pub struct TcpPortProbe;

#[async_trait]
impl PortProbe for TcpPortProbe {
    async fn is_port_open(&self, port: u16) -> bool {
        tokio::net::TcpStream::connect(("127.0.0.1", port))
            .await
            .is_ok()
    }
}

/// Decision policy for an occupied target port.
///
/// Injectable so start logic is testable without a terminal.
pub trait ConflictPolicy: Send + Sync {
    fn decide(&self, conflict: &PortConflict) -> ConflictDecision;
}

/// Always stop the conflicting service
pub struct AutoConfirm;

impl ConflictPolicy for AutoConfirm {
    fn decide(&self, _conflict: &PortConflict) -> ConflictDecision {
        ConflictDecision::StopConflicting
    }
}

/// Always abort
pub struct AutoDeny;

impl ConflictPolicy for AutoDeny {
    fn decide(&self, _conflict: &PortConflict) -> ConflictDecision {
        ConflictDecision::Abort
    }
}

/// Prompt the operator on stdin and apply the answer
pub struct InteractivePrompt;

impl ConflictPolicy for InteractivePrompt {
    fn decide(&self, conflict: &PortConflict) -> ConflictDecision {
        print!(
            "Port {} is already in use (likely {}). Stop it and continue? [y/N] ",
            conflict.port, conflict.likely_owner
        );
        let _ = std::io::stdout().flush();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return ConflictDecision::Abort;
        }
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => ConflictDecision::StopConflicting,
            _ => ConflictDecision::Abort,
        }
    }
}
