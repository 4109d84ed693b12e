//! scenectl - lifecycle orchestrator for the Scene Stealer local AI stack
//!
//! Manages a three-service application (inference server, API backend,
//! browser UI) deployable as a GPU-accelerated native process plus
//! containers, or as a fully containerized CPU-only stack.

pub mod cli;
pub mod config;
pub mod runtime;
