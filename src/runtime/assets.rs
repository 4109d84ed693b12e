//! Model asset provisioning
//!
//! Idempotently ensures the binary model files exist locally. Existence of
//! the local path is the sole check; files are never re-downloaded or
//! verified against a checksum.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during asset provisioning
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Download failed for '{name}': {reason}")]
    DownloadFailed { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A required binary asset: where to fetch it from and where it must live
#[derive(Debug, Clone)]
pub struct AssetSpec {
    /// Short name used in log and error messages
    pub name: String,
    /// Remote source URL
    pub remote_url: String,
    /// Fixed local destination
    pub local_path: PathBuf,
}

/// Capability to transfer a remote file to a local path.
///
/// Injectable so provisioning logic can be tested without a network.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), AssetError>;
}

/// Downloader backed by reqwest
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), AssetError> {
        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| url.to_string());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AssetError::DownloadFailed {
                name: name.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(AssetError::DownloadFailed {
                name,
                reason: format!("HTTP {} for {}", response.status(), url),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AssetError::DownloadFailed {
                name,
                reason: e.to_string(),
            })?;

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, &bytes)?;
        Ok(())
    }
}

/// Assets whose local path does not exist yet
pub fn missing_assets(specs: &[AssetSpec]) -> Vec<&AssetSpec> {
    specs.iter().filter(|s| !s.local_path.exists()).collect()
}

/// Ensure every asset exists locally, downloading the ones that do not.
///
/// Returns the number of assets actually downloaded. A failed transfer is
/// fatal for the provisioning step and names the specific asset.
pub async fn provision(
    specs: &[AssetSpec],
    downloader: &dyn Downloader,
) -> Result<usize, AssetError> {
    let mut downloaded = 0;

    for spec in specs {
        if spec.local_path.exists() {
            debug!("Asset '{}' already present, skipping", spec.name);
            continue;
        }

        info!("Downloading '{}' from {}", spec.name, spec.remote_url);
        downloader.download(&spec.remote_url, &spec.local_path).await?;
        downloaded += 1;
    }

    Ok(downloaded)
}
