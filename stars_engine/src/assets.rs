//! # Product asset storage
//!
//! Product files live in a single flat directory. A stored file is named after the transport's file handle and the
//! original file name, `<dir>/<handle>_<name>`, and that path is the asset reference saved in the product row.
use std::path::{Path, PathBuf};

use log::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetStoreError {
    #[error("Could not access the asset directory {0}: {1}")]
    DirectoryError(String, std::io::Error),
    #[error("Could not write asset {0}: {1}")]
    WriteError(String, std::io::Error),
    #[error("Could not read asset {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("The asset reference {0} is outside the asset directory")]
    ForeignReference(String),
}

#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

/// Strips everything from a file name that could make it escape the asset directory.
pub fn sanitise_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = base.chars().map(|c| if c.is_control() || c == ':' { '_' } else { c }).collect::<String>();
    let cleaned = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace()).replace("..", "_");
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

fn is_clean(name: Option<&str>) -> bool {
    name.map(|n| sanitise_file_name(n) == n).unwrap_or(false)
}

impl AssetStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the asset directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<(), AssetStoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AssetStoreError::DirectoryError(self.root.display().to_string(), e))?;
        debug!("📁️ Asset directory {} is ready", self.root.display());
        Ok(())
    }

    /// The path an asset with the given transport handle and original name is stored under.
    pub fn asset_path(&self, handle: &str, file_name: &str) -> PathBuf {
        let handle = sanitise_file_name(handle);
        let file_name = sanitise_file_name(file_name);
        self.root.join(format!("{handle}_{file_name}"))
    }

    /// Writes the asset and returns its reference.
    pub async fn store(&self, handle: &str, file_name: &str, contents: &[u8]) -> Result<String, AssetStoreError> {
        self.ensure_dir().await?;
        let path = self.asset_path(handle, file_name);
        let asset_ref = path.display().to_string();
        tokio::fs::write(&path, contents).await.map_err(|e| AssetStoreError::WriteError(asset_ref.clone(), e))?;
        info!("📁️ Stored asset {asset_ref} ({} bytes)", contents.len());
        Ok(asset_ref)
    }

    pub async fn read(&self, asset_ref: &str) -> Result<Vec<u8>, AssetStoreError> {
        let path = self.checked_path(asset_ref)?;
        tokio::fs::read(&path).await.map_err(|e| AssetStoreError::ReadError(asset_ref.to_string(), e))
    }

    /// Deletes the asset. Failure is logged and otherwise ignored. Returns `true` if a file was removed.
    pub async fn remove(&self, asset_ref: &str) -> bool {
        let path = match self.checked_path(asset_ref) {
            Ok(p) => p,
            Err(e) => {
                warn!("📁️ Not removing asset. {e}");
                return false;
            },
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("📁️ Removed asset {asset_ref}");
                true
            },
            Err(e) => {
                warn!("📁️ Could not remove asset {asset_ref}: {e}");
                false
            },
        }
    }

    /// Asset references are only trusted if they name a file directly inside the asset directory.
    fn checked_path(&self, asset_ref: &str) -> Result<PathBuf, AssetStoreError> {
        let path = PathBuf::from(asset_ref);
        match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) if parent == self.root.as_path() && is_clean(name.to_str()) => Ok(path),
            _ => Err(AssetStoreError::ForeignReference(asset_ref.to_string())),
        }
    }
}
