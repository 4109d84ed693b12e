//! Stack configuration
//!
//! Fixed topology of the Scene Stealer stack (service ports, compose files,
//! model assets) with environment variable overrides for every path.

use std::env;
use std::path::PathBuf;

use crate::runtime::assets::AssetSpec;

/// Hugging Face sources for the two model files the inference server needs.
const MODEL_URL: &str =
    "https://huggingface.co/mys/ggml_llava-v1.5-7b/resolve/main/ggml-model-q4_k.gguf";
const MMPROJ_URL: &str =
    "https://huggingface.co/mys/ggml_llava-v1.5-7b/resolve/main/mmproj-model-f16.gguf";

const MODEL_FILE: &str = "ggml-model-q4_k.gguf";
const MMPROJ_FILE: &str = "mmproj-model-f16.gguf";

/// Configuration for the whole stack.
///
/// Values are fixed defaults; `SCENECTL_*` environment variables override
/// paths and the inference binary for non-standard installs.
#[derive(Debug, Clone)]
pub struct StackConfig {
    /// Port the inference server binds (native or containerized)
    pub inference_port: u16,
    /// Port the API backend serves on
    pub backend_port: u16,
    /// Port the browser UI serves on
    pub ui_port: u16,
    /// Directory holding downloaded model files
    pub models_dir: PathBuf,
    /// Directory holding the native process ownership record
    pub state_dir: PathBuf,
    /// Compose file for native mode (backend + UI only)
    pub compose_native: PathBuf,
    /// Compose file for container mode (all services)
    pub compose_container: PathBuf,
    /// Binary used to spawn the native inference server
    pub inference_binary: String,
}

impl StackConfig {
    /// Build the configuration from defaults and environment overrides
    pub fn from_env() -> Self {
        let state_dir = env::var("SCENECTL_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".scenectl")
            });

        let models_dir = env::var("SCENECTL_MODELS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("models"));

        Self {
            inference_port: 8080,
            backend_port: 8000,
            ui_port: 3000,
            models_dir,
            state_dir,
            compose_native: env::var("SCENECTL_COMPOSE_NATIVE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("docker-compose.native.yml")),
            compose_container: env::var("SCENECTL_COMPOSE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("docker-compose.yml")),
            inference_binary: env::var("SCENECTL_LLAMA_BIN")
                .unwrap_or_else(|_| "llama-server".to_string()),
        }
    }

    /// The two model assets the native inference server requires.
    ///
    /// Existence of the local path is the sole provisioning check; no
    /// checksum or size verification is performed.
    pub fn asset_specs(&self) -> Vec<AssetSpec> {
        vec![
            AssetSpec {
                name: MODEL_FILE.to_string(),
                remote_url: MODEL_URL.to_string(),
                local_path: self.models_dir.join(MODEL_FILE),
            },
            AssetSpec {
                name: MMPROJ_FILE.to_string(),
                remote_url: MMPROJ_URL.to_string(),
                local_path: self.models_dir.join(MMPROJ_FILE),
            },
        ]
    }

    /// Path of the native process ownership record
    pub fn record_path(&self) -> PathBuf {
        self.state_dir.join("inference.json")
    }

    /// Arguments for spawning the native inference server
    pub fn inference_args(&self) -> Vec<String> {
        vec![
            "-m".to_string(),
            self.models_dir.join(MODEL_FILE).to_string_lossy().into_owned(),
            "--mmproj".to_string(),
            self.models_dir.join(MMPROJ_FILE).to_string_lossy().into_owned(),
            "--host".to_string(),
            "127.0.0.1".to_string(),
            "--port".to_string(),
            self.inference_port.to_string(),
            "-ngl".to_string(),
            "99".to_string(),
        ]
    }
}

impl Default for StackConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> StackConfig {
        StackConfig {
            inference_port: 8080,
            backend_port: 8000,
            ui_port: 3000,
            models_dir: PathBuf::from("models"),
            state_dir: PathBuf::from("/tmp/scenectl-test"),
            compose_native: PathBuf::from("docker-compose.native.yml"),
            compose_container: PathBuf::from("docker-compose.yml"),
            inference_binary: "llama-server".to_string(),
        }
    }

    #[test]
    fn test_asset_specs_cover_model_and_projector() {
        let config = StackConfig {
            models_dir: PathBuf::from("/tmp/models"),
            ..test_config()
        };
        let specs = config.asset_specs();
        assert_eq!(specs.len(), 2);
        assert_eq!(
            specs[0].local_path,
            PathBuf::from("/tmp/models/ggml-model-q4_k.gguf")
        );
        assert!(specs[1].remote_url.contains("mmproj"));
    }

    #[test]
    fn test_inference_args_bind_fixed_port() {
        let config = test_config();
        let args = config.inference_args();
        assert!(args.contains(&"--port".to_string()));
        assert!(args.contains(&"8080".to_string()));
        assert!(args.contains(&"--mmproj".to_string()));
    }

    #[test]
    fn test_record_path_under_state_dir() {
        let config = test_config();
        assert!(config.record_path().starts_with(&config.state_dir));
    }
}
