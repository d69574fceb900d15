//! Iteration pipeline and scheduling loop
//!
//! One iteration: sync the upstream, check the change gate, rebuild the
//! snapshot if the upstream moved, run the unconditional incremental
//! refresh, then offer the throttled audit task. Iterations are strictly
//! sequential and fail fast: the first error aborts the pass and, in
//! loop mode, the whole process. No retries, no backoff.

use crate::clock::Clock;
use crate::error::VigilResult;
use crate::gate::ChangeGate;
use crate::rebuild::Rebuilder;
use crate::source::Source;
use crate::state::StateStore;
use crate::throttle::{Throttle, ThrottleOutcome};
use crate::toolchain::{modes, Toolchain};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Audit-task outcome for one iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    /// The task ran this pass
    Ran,
    /// Within the minimum interval, skipped
    Throttled,
    /// No identifier list configured
    Disabled,
}

/// Summary of one completed iteration
#[derive(Debug)]
pub struct IterationReport {
    pub revision: String,
    pub rebuilt: bool,
    pub audit: AuditStatus,
}

/// Scheduling knobs, resolved from configuration
pub struct SchedulerOptions {
    /// Delay between the end of one iteration and the start of the next
    pub delay: Duration,
    /// Minimum interval between audit-task runs
    pub audit_interval: Duration,
    /// Identifier list consumed by the audit task; `None` disables it
    pub ids_file: Option<PathBuf>,
    /// Whether the audit task may perform network requests
    pub audit_request: bool,
}

/// Drives iterations either once or forever
pub struct Scheduler {
    source: Box<dyn Source>,
    toolchain: Arc<dyn Toolchain>,
    gate: ChangeGate,
    rebuilder: Rebuilder,
    throttle: Throttle,
    clock: Arc<dyn Clock>,
    opts: SchedulerOptions,
}

impl Scheduler {
    pub fn new(
        source: Box<dyn Source>,
        toolchain: Arc<dyn Toolchain>,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        snapshot_path: impl Into<PathBuf>,
        opts: SchedulerOptions,
    ) -> Self {
        Self {
            gate: ChangeGate::new(store.clone()),
            throttle: Throttle::new(store, clock.clone()),
            rebuilder: Rebuilder::new(toolchain.clone(), snapshot_path),
            source,
            toolchain,
            clock,
            opts,
        }
    }

    /// Run exactly one iteration
    pub async fn run_once(&self) -> VigilResult<IterationReport> {
        let revision = self.source.sync().await?;
        let changed = self.gate.check_and_advance(&revision).await?;

        if changed {
            self.rebuilder.rebuild().await?;
        } else {
            debug!("Snapshot already current for {revision}");
        }

        self.toolchain.refresh_metadata().await?;

        let audit = match &self.opts.ids_file {
            Some(ids) => {
                let outcome = self
                    .throttle
                    .try_run(
                        modes::AUDIT_RECENT,
                        self.opts.audit_interval,
                        self.toolchain.audit_recent(ids, self.opts.audit_request),
                    )
                    .await?;
                match outcome {
                    ThrottleOutcome::Ran => AuditStatus::Ran,
                    ThrottleOutcome::Skipped => AuditStatus::Throttled,
                }
            }
            None => {
                debug!("No identifier list configured, audit task disabled");
                AuditStatus::Disabled
            }
        };

        Ok(IterationReport {
            revision,
            rebuilt: changed,
            audit,
        })
    }

    /// Run iterations forever with a fixed delay between passes
    ///
    /// Returns `Ok(())` once `stop` flips to true, or the first error.
    /// The stop flag is consulted between iterations only; an in-progress
    /// sleep finishes first.
    pub async fn run_loop(&self, stop: watch::Receiver<bool>) -> VigilResult<()> {
        loop {
            if *stop.borrow() {
                info!("Stop requested, leaving loop");
                return Ok(());
            }

            let report = self.run_once().await?;
            info!(
                "Iteration complete at {} (rebuilt: {}, audit: {:?})",
                report.revision, report.rebuilt, report.audit
            );

            self.clock.sleep(self.opts.delay).await;
        }
    }
}
