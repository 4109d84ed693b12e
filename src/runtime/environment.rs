//! Host environment classification and deployment mode selection
//!
//! Pure logic: raw OS/architecture signals map to a small closed
//! classification, and the classification plus an optional operator
//! override determine the deployment mode. Unknown values are valid
//! and propagate; classification never fails.

use std::fmt;

/// Host operating system classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    MacOs,
    Linux,
    Unknown,
}

/// Host CPU architecture classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostArch {
    Arm64,
    X86_64,
    Unknown,
}

/// Immutable snapshot of the host environment, computed fresh each run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Environment {
    pub os: HostOs,
    pub arch: HostArch,
}

/// Deployment topology for one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Inference runs as a directly spawned host process (GPU-accelerated);
    /// backend and UI run as containers
    Native,
    /// All services, including inference, run as containers (CPU-only)
    Container,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Native => write!(f, "native"),
            Mode::Container => write!(f, "container"),
        }
    }
}

/// Classify raw OS and architecture strings.
///
/// Inputs are the values of `std::env::consts::{OS, ARCH}`; anything
/// outside the recognized set classifies as `Unknown`.
pub fn classify(os: &str, arch: &str) -> Environment {
    let os = match os {
        "macos" => HostOs::MacOs,
        "linux" => HostOs::Linux,
        _ => HostOs::Unknown,
    };
    let arch = match arch {
        "aarch64" | "arm64" => HostArch::Arm64,
        "x86_64" => HostArch::X86_64,
        _ => HostArch::Unknown,
    };
    Environment { os, arch }
}

/// Probe the current host
pub fn probe() -> Environment {
    classify(std::env::consts::OS, std::env::consts::ARCH)
}

/// Whether the host qualifies for native (GPU-accelerated) inference
pub fn supports_native(env: &Environment) -> bool {
    env.os == HostOs::MacOs && env.arch == HostArch::Arm64
}

/// Select the deployment mode.
///
/// A forced mode always wins, regardless of the environment. Otherwise
/// Native iff the host is macOS on arm64, else Container.
pub fn select_mode(forced: Option<Mode>, env: &Environment) -> Mode {
    if let Some(mode) = forced {
        return mode;
    }
    if supports_native(env) {
        Mode::Native
    } else {
        Mode::Container
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_OS: [HostOs; 3] = [HostOs::MacOs, HostOs::Linux, HostOs::Unknown];
    const ALL_ARCH: [HostArch; 3] = [HostArch::Arm64, HostArch::X86_64, HostArch::Unknown];

    #[test]
    fn test_classify_known_values() {
        assert_eq!(
            classify("macos", "aarch64"),
            Environment {
                os: HostOs::MacOs,
                arch: HostArch::Arm64
            }
        );
        assert_eq!(
            classify("linux", "x86_64"),
            Environment {
                os: HostOs::Linux,
                arch: HostArch::X86_64
            }
        );
    }

    #[test]
    fn test_classify_unknown_propagates() {
        let env = classify("freebsd", "riscv64");
        assert_eq!(env.os, HostOs::Unknown);
        assert_eq!(env.arch, HostArch::Unknown);
    }

    #[test]
    fn test_mode_native_only_on_apple_silicon() {
        for os in ALL_OS {
            for arch in ALL_ARCH {
                let env = Environment { os, arch };
                let expected = if os == HostOs::MacOs && arch == HostArch::Arm64 {
                    Mode::Native
                } else {
                    Mode::Container
                };
                assert_eq!(select_mode(None, &env), expected, "os={:?} arch={:?}", os, arch);
            }
        }
    }

    #[test]
    fn test_forced_mode_always_wins() {
        for os in ALL_OS {
            for arch in ALL_ARCH {
                let env = Environment { os, arch };
                assert_eq!(select_mode(Some(Mode::Native), &env), Mode::Native);
                assert_eq!(select_mode(Some(Mode::Container), &env), Mode::Container);
            }
        }
    }

    #[test]
    fn test_container_override_despite_native_eligibility() {
        let env = classify("macos", "aarch64");
        assert!(supports_native(&env));
        assert_eq!(select_mode(Some(Mode::Container), &env), Mode::Container);
    }
}
