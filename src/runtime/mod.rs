//! Service lifecycle runtime
//!
//! Environment classification, asset provisioning, native process
//! supervision, container group control, health probing, and the
//! orchestrator that sequences them per command.

pub mod assets;
pub mod compose;
pub mod environment;
pub mod health;
pub mod orchestrator;
pub mod ports;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod testutil;
