//! Full snapshot regeneration
//!
//! Rebuilds the cached history wholesale: the export collaborator emits a
//! line-delimited record set, the compaction collaborator turns it into
//! one JSON array document, and the result replaces the snapshot through
//! a temp-file rename so a reader never observes a partially written
//! document. The intermediate line-delimited file is discarded afterward.

use crate::error::{VigilError, VigilResult};
use crate::toolchain::Toolchain;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::info;

/// Regenerates the snapshot from the upstream working copy
pub struct Rebuilder {
    toolchain: Arc<dyn Toolchain>,
    snapshot_path: PathBuf,
}

impl Rebuilder {
    pub fn new(toolchain: Arc<dyn Toolchain>, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            toolchain,
            snapshot_path: snapshot_path.into(),
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Replace the snapshot with a freshly exported history
    pub async fn rebuild(&self) -> VigilResult<()> {
        if let Some(parent) = self.snapshot_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| VigilError::io("creating snapshot directory", e))?;
        }

        let lines = self.snapshot_path.with_extension("jsonl");
        let staged = self.snapshot_path.with_extension("json.tmp");

        self.toolchain.export_history(&lines).await?;
        self.toolchain.compact(&lines, &staged).await?;

        fs::rename(&staged, &self.snapshot_path)
            .await
            .map_err(|e| VigilError::RebuildFailed {
                stage: "swap".to_string(),
                reason: e.to_string(),
                code: None,
            })?;

        fs::remove_file(&lines)
            .await
            .map_err(|e| VigilError::RebuildFailed {
                stage: "cleanup".to_string(),
                reason: e.to_string(),
                code: None,
            })?;

        info!("Snapshot rebuilt at {}", self.snapshot_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::MockToolchain;
    use tempfile::TempDir;

    #[tokio::test]
    async fn rebuild_writes_array_snapshot_and_discards_lines() {
        let dir = TempDir::new().unwrap();
        let snapshot = dir.path().join("history.json");
        let rebuilder = Rebuilder::new(Arc::new(MockToolchain::new()), &snapshot);

        rebuilder.rebuild().await.unwrap();

        let parsed: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&snapshot).unwrap()).unwrap();
        assert_eq!(parsed.len(), 2);

        // No intermediate or staged files left behind
        assert!(!dir.path().join("history.jsonl").exists());
        assert!(!dir.path().join("history.json.tmp").exists());
    }

    #[tokio::test]
    async fn failed_export_leaves_existing_snapshot_untouched() {
        let dir = TempDir::new().unwrap();
        let snapshot = dir.path().join("history.json");
        std::fs::write(&snapshot, r#"[{"entry":"old"}]"#).unwrap();

        let chain = MockToolchain {
            fail_export: true,
            ..MockToolchain::new()
        };
        let rebuilder = Rebuilder::new(Arc::new(chain), &snapshot);

        let err = rebuilder.rebuild().await.unwrap_err();
        assert!(matches!(err, VigilError::RebuildFailed { .. }));
        assert_eq!(
            std::fs::read_to_string(&snapshot).unwrap(),
            r#"[{"entry":"old"}]"#
        );
    }

    #[tokio::test]
    async fn rebuild_replaces_rather_than_appends() {
        let dir = TempDir::new().unwrap();
        let snapshot = dir.path().join("history.json");
        std::fs::write(&snapshot, r#"[{"entry":"old"}]"#).unwrap();

        let rebuilder = Rebuilder::new(Arc::new(MockToolchain::new()), &snapshot);
        rebuilder.rebuild().await.unwrap();

        let content = std::fs::read_to_string(&snapshot).unwrap();
        assert!(!content.contains("old"));
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[tokio::test]
    async fn rebuild_creates_snapshot_directory() {
        let dir = TempDir::new().unwrap();
        let snapshot = dir.path().join("nested/deep/history.json");

        let rebuilder = Rebuilder::new(Arc::new(MockToolchain::new()), &snapshot);
        rebuilder.rebuild().await.unwrap();

        assert!(snapshot.exists());
    }
}
