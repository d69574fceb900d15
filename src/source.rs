//! Upstream repository synchronization
//!
//! Maintains a local working copy of the upstream source repository by
//! shelling out to git: full clone when the copy is missing, fast-forward
//! pull otherwise. The working copy is read-only to the rest of the
//! pipeline; only this module mutates it.

use crate::error::{VigilError, VigilResult};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Provider of the upstream working copy
#[async_trait]
pub trait Source: Send + Sync {
    /// Bring the working copy up to date and return the resulting short
    /// revision identifier.
    async fn sync(&self) -> VigilResult<String>;
}

/// Source backed by a git repository
pub struct GitSource {
    url: String,
    path: PathBuf,
}

impl GitSource {
    pub fn new(url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
        }
    }

    /// Default working-copy location for a URL: a digest-named directory
    /// under `state_dir`, so distinct upstreams never collide.
    pub fn default_path(state_dir: &Path, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        state_dir.join("repos").join(&hex::encode(digest)[..12])
    }

    /// Path of the local working copy
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn exec(&self, context: &str, args: &[&str]) -> VigilResult<std::process::Output> {
        debug!("Executing: git {:?}", args);

        let output = Command::new("git")
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| VigilError::SourceUnavailable {
                context: context.to_string(),
                reason: e.to_string(),
                code: None,
            })?;

        if !output.status.success() {
            return Err(VigilError::SourceUnavailable {
                context: context.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                code: output.status.code(),
            });
        }

        Ok(output)
    }

    async fn clone_repo(&self) -> VigilResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| VigilError::io("creating working-copy parent directory", e))?;
        }

        let path = self.path.display().to_string();
        self.exec("clone", &["clone", "--quiet", &self.url, &path])
            .await?;
        Ok(())
    }

    async fn pull(&self) -> VigilResult<()> {
        let path = self.path.display().to_string();
        self.exec("pull", &["-C", &path, "pull", "--ff-only", "--quiet"])
            .await?;
        Ok(())
    }

    async fn head_revision(&self) -> VigilResult<String> {
        let path = self.path.display().to_string();
        let output = self
            .exec("rev-parse", &["-C", &path, "rev-parse", "--short", "HEAD"])
            .await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl Source for GitSource {
    async fn sync(&self) -> VigilResult<String> {
        if self.path.join(".git").is_dir() {
            info!("Updating working copy at {}", self.path.display());
            self.pull().await?;
        } else {
            info!("Cloning {} into {}", self.url, self.path.display());
            self.clone_repo().await?;
        }

        self.head_revision().await
    }
}
