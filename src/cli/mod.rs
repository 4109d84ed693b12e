//! CLI for scenectl
//!
//! Top-level commands:
//! - `scenectl setup`  - Download the model assets
//! - `scenectl start`  - Start the stack in the selected mode
//! - `scenectl stop`   - Stop everything, regardless of prior state
//! - `scenectl status` - Health snapshot of all services

use clap::{ArgAction, Args, Parser, Subcommand};

mod display;

pub use display::*;

use crate::runtime::compose::ContainerEngine;
use crate::runtime::environment::Mode;

#[derive(Parser, Debug)]
#[command(name = "scenectl")]
#[command(about = "Manage the Scene Stealer local AI stack")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Force native mode (GPU inference as a host process)
    #[arg(long, global = true, conflicts_with = "container")]
    pub native: bool,

    /// Force container mode (CPU-only, all services containerized)
    #[arg(long, global = true)]
    pub container: bool,

    /// Use docker as the container engine
    #[arg(long, global = true, conflicts_with = "podman")]
    pub docker: bool,

    /// Use podman as the container engine
    #[arg(long, global = true)]
    pub podman: bool,

    /// Resolve port conflicts without prompting
    #[arg(short = 'y', long, global = true, conflicts_with = "non_interactive")]
    pub yes: bool,

    /// Never prompt; decline any port conflict
    #[arg(long, global = true)]
    pub non_interactive: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Trailing arguments shared by every command.
///
/// Unrecognized trailing flags are swallowed here and ignored with a
/// warning rather than rejected.
#[derive(Args, Debug)]
pub struct CommonArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    pub ignored: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download the model files the inference server needs
    Setup(CommonArgs),

    /// Start the stack (native on Apple Silicon, containers elsewhere)
    Start(CommonArgs),

    /// Stop the native process and both container topologies
    Stop(CommonArgs),

    /// Show which services are currently reachable
    Status(CommonArgs),
}

impl Cli {
    /// Mode forced by operator flag, if any
    pub fn forced_mode(&self) -> Option<Mode> {
        if self.native {
            Some(Mode::Native)
        } else if self.container {
            Some(Mode::Container)
        } else {
            None
        }
    }

    /// Container engine forced by operator flag, if any
    pub fn forced_engine(&self) -> Option<ContainerEngine> {
        if self.docker {
            Some(ContainerEngine::Docker)
        } else if self.podman {
            Some(ContainerEngine::Podman)
        } else {
            None
        }
    }

    /// Trailing arguments that were accepted but not recognized
    pub fn ignored_args(&self) -> &[String] {
        match &self.command {
            Commands::Setup(args)
            | Commands::Start(args)
            | Commands::Stop(args)
            | Commands::Status(args) => &args.ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_setup() {
        let cli = Cli::parse_from(["scenectl", "setup"]);
        assert!(matches!(cli.command, Commands::Setup(_)));
        assert_eq!(cli.forced_mode(), None);
    }

    #[test]
    fn test_parse_start_native() {
        let cli = Cli::parse_from(["scenectl", "start", "--native"]);
        assert!(matches!(cli.command, Commands::Start(_)));
        assert_eq!(cli.forced_mode(), Some(Mode::Native));
    }

    #[test]
    fn test_parse_start_container_override() {
        let cli = Cli::parse_from(["scenectl", "start", "--container"]);
        assert_eq!(cli.forced_mode(), Some(Mode::Container));
    }

    #[test]
    fn test_native_and_container_conflict() {
        let result = Cli::try_parse_from(["scenectl", "start", "--native", "--container"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_engine_flags() {
        let cli = Cli::parse_from(["scenectl", "start", "--podman"]);
        assert_eq!(cli.forced_engine(), Some(ContainerEngine::Podman));

        let cli = Cli::parse_from(["scenectl", "stop", "--docker"]);
        assert_eq!(cli.forced_engine(), Some(ContainerEngine::Docker));
    }

    #[test]
    fn test_unknown_command_rejected() {
        let result = Cli::try_parse_from(["scenectl", "restart"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unrecognized_trailing_flags_ignored() {
        let cli = Cli::parse_from(["scenectl", "status", "--frobnicate", "now"]);
        assert_eq!(cli.ignored_args(), ["--frobnicate", "now"]);
    }

    #[test]
    fn test_verbose_global() {
        let cli = Cli::parse_from(["scenectl", "-vvv", "status"]);
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_yes_flag() {
        let cli = Cli::parse_from(["scenectl", "start", "-y"]);
        assert!(cli.yes);
        assert!(!cli.non_interactive);
    }
}
