//! External collaborator invocation
//!
//! Everything the pipeline delegates to other programs goes through the
//! `Toolchain` trait: history export, JSONL compaction, the incremental
//! metadata refresh and the audit task. `ProcessToolchain` shells out to
//! the configured binaries; tests substitute in-process mocks.

use crate::error::{VigilError, VigilResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Mode selectors understood by the data tool
pub mod modes {
    pub const LINEAR_HISTORY: &str = "linear-history";
    pub const UPDATE_METADATA: &str = "update-metadata";
    pub const AUDIT_RECENT: &str = "audit-recent";
}

/// External collaborators of the sync pipeline
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Full-rebuild collaborator: emit the complete line-delimited history
    /// to `dest`, one JSON record per line.
    async fn export_history(&self, dest: &Path) -> VigilResult<()>;

    /// Compaction collaborator: turn the line-delimited records in `src`
    /// into a single JSON array document at `dest`, replacing it.
    async fn compact(&self, src: &Path, dest: &Path) -> VigilResult<()>;

    /// Incremental-refresh collaborator; no inputs beyond prior state.
    async fn refresh_metadata(&self) -> VigilResult<()>;

    /// Audit task over an identifier list; `request` permits network calls.
    async fn audit_recent(&self, ids_file: &Path, request: bool) -> VigilResult<()>;
}

/// Toolchain that invokes the real external binaries
///
/// Data-tool modes run inside the upstream working copy so the tool sees
/// the synced source tree.
pub struct ProcessToolchain {
    data_cmd: String,
    jq_cmd: String,
    workdir: PathBuf,
}

impl ProcessToolchain {
    pub fn new(
        data_cmd: impl Into<String>,
        jq_cmd: impl Into<String>,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            data_cmd: data_cmd.into(),
            jq_cmd: jq_cmd.into(),
            workdir: workdir.into(),
        }
    }

    fn data_command(&self, mode: &str) -> Command {
        let mut cmd = Command::new(&self.data_cmd);
        cmd.arg(mode).current_dir(&self.workdir);
        cmd
    }
}

#[async_trait]
impl Toolchain for ProcessToolchain {
    async fn export_history(&self, dest: &Path) -> VigilResult<()> {
        debug!("Exporting linear history to {}", dest.display());

        let out = std::fs::File::create(dest)
            .map_err(|e| VigilError::io(format!("creating {}", dest.display()), e))?;

        let output = self
            .data_command(modes::LINEAR_HISTORY)
            .stdout(Stdio::from(out))
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| VigilError::RebuildFailed {
                stage: "export".to_string(),
                reason: format!("{} {}: {e}", self.data_cmd, modes::LINEAR_HISTORY),
                code: None,
            })?;

        if !output.status.success() {
            return Err(VigilError::RebuildFailed {
                stage: "export".to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                code: output.status.code(),
            });
        }

        Ok(())
    }

    async fn compact(&self, src: &Path, dest: &Path) -> VigilResult<()> {
        debug!("Compacting {} into {}", src.display(), dest.display());

        let out = std::fs::File::create(dest)
            .map_err(|e| VigilError::io(format!("creating {}", dest.display()), e))?;

        let output = Command::new(&self.jq_cmd)
            .args(["--slurp", "."])
            .arg(src)
            .stdout(Stdio::from(out))
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| VigilError::RebuildFailed {
                stage: "compact".to_string(),
                reason: format!("{}: {e}", self.jq_cmd),
                code: None,
            })?;

        if !output.status.success() {
            return Err(VigilError::RebuildFailed {
                stage: "compact".to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                code: output.status.code(),
            });
        }

        Ok(())
    }

    async fn refresh_metadata(&self) -> VigilResult<()> {
        debug!("Running incremental metadata refresh");

        // Collaborator output flows straight to the operator's terminal;
        // long refreshes report their own progress.
        let status = self
            .data_command(modes::UPDATE_METADATA)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| VigilError::RefreshFailed {
                reason: format!("{} {}: {e}", self.data_cmd, modes::UPDATE_METADATA),
                code: None,
            })?;

        if !status.success() {
            return Err(VigilError::RefreshFailed {
                reason: format!("exited with status {}", status.code().unwrap_or(-1)),
                code: status.code(),
            });
        }

        Ok(())
    }

    async fn audit_recent(&self, ids_file: &Path, request: bool) -> VigilResult<()> {
        debug!("Running audit task over {}", ids_file.display());

        let mut cmd = self.data_command(modes::AUDIT_RECENT);
        cmd.arg(ids_file);
        if request {
            cmd.arg("--request");
        }

        let status = cmd
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| VigilError::TaskFailed {
                name: modes::AUDIT_RECENT.to_string(),
                reason: format!("{}: {e}", self.data_cmd),
                code: None,
            })?;

        if !status.success() {
            return Err(VigilError::TaskFailed {
                name: modes::AUDIT_RECENT.to_string(),
                reason: format!("exited with status {}", status.code().unwrap_or(-1)),
                code: status.code(),
            });
        }

        Ok(())
    }
}

/// In-process toolchain double used by pipeline tests
#[cfg(test)]
pub(crate) struct MockToolchain {
    pub export_calls: std::sync::atomic::AtomicUsize,
    pub refresh_calls: std::sync::atomic::AtomicUsize,
    pub audit_calls: std::sync::atomic::AtomicUsize,
    pub records: Vec<serde_json::Value>,
    pub fail_export: bool,
    pub fail_refresh: bool,
}

#[cfg(test)]
impl MockToolchain {
    pub fn new() -> Self {
        Self {
            export_calls: std::sync::atomic::AtomicUsize::new(0),
            refresh_calls: std::sync::atomic::AtomicUsize::new(0),
            audit_calls: std::sync::atomic::AtomicUsize::new(0),
            records: vec![serde_json::json!({"entry": 1}), serde_json::json!({"entry": 2})],
            fail_export: false,
            fail_refresh: false,
        }
    }

    pub fn exports(&self) -> usize {
        self.export_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn audits(&self) -> usize {
        self.audit_calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl Toolchain for MockToolchain {
    async fn export_history(&self, dest: &Path) -> VigilResult<()> {
        self.export_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if self.fail_export {
            return Err(VigilError::RebuildFailed {
                stage: "export".to_string(),
                reason: "mock failure".to_string(),
                code: Some(3),
            });
        }

        let lines: Vec<String> = self.records.iter().map(|r| r.to_string()).collect();
        tokio::fs::write(dest, lines.join("\n") + "\n")
            .await
            .map_err(|e| VigilError::io("writing mock export", e))
    }

    async fn compact(&self, src: &Path, dest: &Path) -> VigilResult<()> {
        let content = tokio::fs::read_to_string(src)
            .await
            .map_err(|e| VigilError::io("reading mock export", e))?;

        let records: Vec<serde_json::Value> = content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<Result<_, _>>()?;

        tokio::fs::write(dest, serde_json::to_vec(&records)?)
            .await
            .map_err(|e| VigilError::io("writing mock snapshot", e))
    }

    async fn refresh_metadata(&self) -> VigilResult<()> {
        self.refresh_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if self.fail_refresh {
            return Err(VigilError::RefreshFailed {
                reason: "mock failure".to_string(),
                code: Some(7),
            });
        }
        Ok(())
    }

    async fn audit_recent(&self, _ids_file: &Path, _request: bool) -> VigilResult<()> {
        self.audit_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}
