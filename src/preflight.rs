//! External tool preflight
//!
//! Every pipeline pass shells out to git, the data tool and jq. These
//! checks verify the tools are runnable before the first iteration
//! starts, so a missing binary surfaces as one clear error instead of a
//! failure halfway through a pass.

use crate::config::Config;
use crate::error::{VigilError, VigilResult};
use std::process::Stdio;
use tokio::process::Command;

/// Required tools for the given configuration, with install hints
pub fn required(config: &Config) -> Vec<(String, String)> {
    vec![
        (
            "git".to_string(),
            "Install git from your package manager".to_string(),
        ),
        (
            config.tools.data.clone(),
            "Set tools.data in the config file to the data tool binary".to_string(),
        ),
        (
            config.tools.jq.clone(),
            "Install jq from your package manager".to_string(),
        ),
    ]
}

/// Check whether `program --version` runs successfully
pub async fn probe(program: &str) -> VigilResult<bool> {
    match Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
    {
        Ok(status) => Ok(status.success()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(VigilError::command_failed(format!("{program} --version"), e)),
    }
}

/// Verify every required tool is runnable
pub async fn check_all(config: &Config) -> VigilResult<()> {
    for (name, hint) in required(config) {
        if !probe(&name).await? {
            return Err(VigilError::MissingDependency { name, hint });
        }
    }
    Ok(())
}
