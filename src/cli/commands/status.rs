//! Status command - check required tools and show persisted state

use crate::config::{Config, ConfigManager};
use crate::error::VigilResult;
use crate::preflight;
use crate::state::{self, LAST_REVISION};
use crate::toolchain::modes;
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Execute the status command
pub async fn execute(config: &Config) -> VigilResult<()> {
    println!("{}", style("Vigil System Status").bold().cyan());
    println!();

    let mut all_ok = true;

    println!("{}", style("Tools:").bold());
    for (name, hint) in preflight::required(config) {
        match preflight::probe(&name).await {
            Ok(true) => println!("  {} {}", CHECK, style(&name).green()),
            Ok(false) => {
                all_ok = false;
                println!("  {} {} - {}", CROSS, style(&name).red(), hint);
            }
            Err(e) => {
                all_ok = false;
                println!("  {} {} - {}", WARN, style(&name).yellow(), e);
            }
        }
    }

    println!();
    println!("{}", style("Upstream:").bold());
    match config.upstream_url() {
        Ok(url) => println!("  {} {}", CHECK, url),
        Err(_) => {
            all_ok = false;
            println!(
                "  {} {} - set upstream.url in the config file",
                CROSS,
                style("Not configured").red()
            );
        }
    }

    println!();
    println!("{}", style("State:").bold());
    show_state(config).await?;

    println!();
    if all_ok {
        println!("{}", style("All critical checks passed").green().bold());
    } else {
        println!(
            "{}",
            style("Some checks failed - see above for details")
                .yellow()
                .bold()
        );
    }

    Ok(())
}

async fn show_state(config: &Config) -> VigilResult<()> {
    let store_dir = ConfigManager::store_dir();

    match state::peek(&store_dir, LAST_REVISION).await? {
        Some(revision) => println!(
            "  {} Last synced revision: {}",
            CHECK,
            style(revision).cyan()
        ),
        None => println!("  {} No revision recorded yet", WARN),
    }

    let snapshot = config
        .snapshot
        .path
        .clone()
        .unwrap_or_else(ConfigManager::default_snapshot_path);
    match tokio::fs::metadata(&snapshot).await {
        Ok(meta) => println!(
            "  {} Snapshot: {} ({} bytes)",
            CHECK,
            snapshot.display(),
            meta.len()
        ),
        Err(_) => println!("  {} Snapshot not built yet", WARN),
    }

    let marker_key = format!("throttle/{}", modes::AUDIT_RECENT);
    match state::peek(&store_dir, &marker_key).await? {
        Some(stamp) => println!("  {} Audit task last attempted: {}", CHECK, stamp),
        None => println!("  {} Audit task has not run yet", WARN),
    }

    Ok(())
}
