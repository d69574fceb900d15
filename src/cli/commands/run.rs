//! Run command - execute the sync pipeline once or as a daemon

use crate::cli::args::RunArgs;
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, ConfigManager};
use crate::error::VigilResult;
use crate::preflight;
use crate::scheduler::{AuditStatus, IterationReport, Scheduler, SchedulerOptions};
use crate::source::GitSource;
use crate::state::{FsStateStore, StateStore};
use crate::toolchain::{ProcessToolchain, Toolchain};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Execute the run command
pub async fn execute(args: RunArgs, config: &Config) -> VigilResult<()> {
    preflight::check_all(config).await?;

    let url = config.upstream_url()?.to_string();
    let state_dir = ConfigManager::state_dir();

    let repo_path = config
        .upstream
        .path
        .clone()
        .unwrap_or_else(|| GitSource::default_path(&state_dir, &url));
    let snapshot_path = config
        .snapshot
        .path
        .clone()
        .unwrap_or_else(ConfigManager::default_snapshot_path);
    debug!("Working copy: {}", repo_path.display());
    debug!("Snapshot: {}", snapshot_path.display());

    let source = Box::new(GitSource::new(url, repo_path.clone()));
    let toolchain: Arc<dyn Toolchain> = Arc::new(ProcessToolchain::new(
        &config.tools.data,
        &config.tools.jq,
        &repo_path,
    ));
    let store: Arc<dyn StateStore> = Arc::new(FsStateStore::new(ConfigManager::store_dir()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let scheduler = Scheduler::new(
        source,
        toolchain,
        store,
        clock,
        snapshot_path,
        SchedulerOptions {
            delay: Duration::from_secs(config.schedule.delay_secs),
            audit_interval: Duration::from_secs(config.audit.interval_secs),
            ids_file: config.audit.ids_file.clone(),
            audit_request: config.audit.request,
        },
    );

    if args.daemon {
        info!(
            "Entering daemon mode ({}s between passes)",
            config.schedule.delay_secs
        );

        let (stop_tx, stop_rx) = watch::channel(false);
        tokio::select! {
            result = scheduler.run_loop(stop_rx) => result,
            _ = tokio::signal::ctrl_c() => {
                let _ = stop_tx.send(true);
                println!();
                println!("{} Interrupted, exiting", style("✓").green());
                Ok(())
            }
        }
    } else {
        let pb = create_progress_bar("Running sync pass...");
        let report = match scheduler.run_once().await {
            Ok(report) => {
                pb.finish_and_clear();
                report
            }
            Err(e) => {
                pb.finish_and_clear();
                return Err(e);
            }
        };

        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &IterationReport) {
    println!(
        "{} Upstream synced at revision {}",
        style("✓").green(),
        style(&report.revision).cyan()
    );
    if report.rebuilt {
        println!("  Snapshot:   rebuilt");
    } else {
        println!("  Snapshot:   already current");
    }
    println!("  Refresh:    done");
    match report.audit {
        AuditStatus::Ran => println!("  Audit task: ran"),
        AuditStatus::Throttled => println!("  Audit task: skipped (throttled)"),
        AuditStatus::Disabled => println!("  Audit task: disabled (no identifier list)"),
    }
}

fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
