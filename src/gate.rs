//! Change detection over the upstream revision
//!
//! Compares the freshly synced revision against the stored one and
//! advances the stored record as part of detecting the change. Note the
//! record moves when a change is observed, not when the rebuild it
//! triggers completes: if that rebuild fails, the record already points
//! at the new revision and the next pass treats the cache as current.

use crate::error::VigilResult;
use crate::state::{StateStore, LAST_REVISION};
use std::sync::Arc;
use tracing::{debug, info};

/// Decides whether the upstream moved since the last recorded revision
pub struct ChangeGate {
    store: Arc<dyn StateStore>,
}

impl ChangeGate {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Report whether `revision` differs from the stored record, updating
    /// the record when it does. A missing record counts as changed.
    pub async fn check_and_advance(&self, revision: &str) -> VigilResult<bool> {
        match self.store.get(LAST_REVISION).await? {
            Some(prev) if prev == revision => {
                debug!("Upstream unchanged at {revision}");
                Ok(false)
            }
            prev => {
                match prev {
                    Some(prev) => info!("Upstream moved: {prev} -> {revision}"),
                    None => info!("First sync, recording revision {revision}"),
                }
                self.store.set(LAST_REVISION, revision).await?;
                Ok(true)
            }
        }
    }
}
