//! Configuration schema for Vigil
//!
//! Configuration is stored at `~/.config/vigil/config.toml`

use crate::error::{VigilError, VigilResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream source repository
    pub upstream: UpstreamConfig,

    /// Snapshot output
    pub snapshot: SnapshotConfig,

    /// External tool binaries
    pub tools: ToolsConfig,

    /// Scheduling settings
    pub schedule: ScheduleConfig,

    /// Audit task settings
    pub audit: AuditConfig,
}

impl Config {
    /// The configured upstream URL, or an error when left unset
    pub fn upstream_url(&self) -> VigilResult<&str> {
        if self.upstream.url.is_empty() {
            return Err(VigilError::UpstreamNotConfigured);
        }
        Ok(&self.upstream.url)
    }
}

/// Upstream source repository settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Clone URL of the source repository
    pub url: String,

    /// Local working-copy path (derived from the URL if unset)
    pub path: Option<PathBuf>,
}

/// Snapshot output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Snapshot document path (defaults to history.json in the state dir)
    pub path: Option<PathBuf>,
}

/// External tool binaries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Data tool carrying the pipeline subcommands
    pub data: String,

    /// JSON compactor
    pub jq: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            data: "vigil-data".to_string(),
            jq: "jq".to_string(),
        }
    }
}

/// Scheduling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds between iterations in daemon mode
    pub delay_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { delay_secs: 60 }
    }
}

/// Audit task settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Identifier list consumed by the audit task (task disabled if unset)
    pub ids_file: Option<PathBuf>,

    /// Minimum seconds between audit runs
    pub interval_secs: u64,

    /// Allow the audit task to perform network requests
    pub request: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            ids_file: None,
            interval_secs: 3600,
            request: true,
        }
    }
}
