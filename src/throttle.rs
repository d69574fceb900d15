//! Minimum-interval gating for named tasks
//!
//! Runs a task at most once per configured interval across repeated
//! calls and across process restarts, persisting the last attempt time
//! as a state entry. A skipped run is a normal outcome, not an error.

use crate::clock::Clock;
use crate::error::VigilResult;
use crate::state::StateStore;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// What `try_run` did with the wrapped task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleOutcome {
    /// The task was invoked
    Ran,
    /// The interval has not elapsed yet
    Skipped,
}

/// Interval gate keyed by task name
pub struct Throttle {
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
}

impl Throttle {
    pub fn new(store: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    fn marker_key(task: &str) -> String {
        format!("throttle/{task}")
    }

    /// Invoke `work` unless it already ran within `min_interval`.
    ///
    /// The marker records the attempt, not the completion: it is written
    /// before the task runs, so a failing task does not retry on the next
    /// pass either.
    pub async fn try_run<F>(
        &self,
        task: &str,
        min_interval: Duration,
        work: F,
    ) -> VigilResult<ThrottleOutcome>
    where
        F: Future<Output = VigilResult<()>> + Send,
    {
        let key = Self::marker_key(task);
        let now = self.clock.now();

        if let Some(raw) = self.store.get(&key).await? {
            match raw.parse::<DateTime<Utc>>() {
                Ok(last) => {
                    let elapsed = now.signed_duration_since(last);
                    if elapsed.num_seconds() < min_interval.as_secs() as i64 {
                        debug!(
                            "Skipping '{task}', last ran {}s ago",
                            elapsed.num_seconds()
                        );
                        return Ok(ThrottleOutcome::Skipped);
                    }
                }
                Err(_) => warn!("Discarding unreadable throttle marker for '{task}'"),
            }
        }

        self.store.set(&key, &now.to_rfc3339()).await?;
        work.await?;
        Ok(ThrottleOutcome::Ran)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::error::VigilError;
    use crate::state::MemoryStateStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const HOUR: Duration = Duration::from_secs(3600);

    fn throttle(store: Arc<MemoryStateStore>, clock: Arc<MockClock>) -> Throttle {
        Throttle::new(store, clock)
    }

    #[tokio::test]
    async fn first_call_runs_and_writes_marker() {
        let store = Arc::new(MemoryStateStore::new());
        let clock = Arc::new(MockClock::at(Utc::now()));
        let t = throttle(store.clone(), clock.clone());

        let ran = AtomicUsize::new(0);
        let outcome = t
            .try_run("audit-recent", HOUR, async {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(outcome, ThrottleOutcome::Ran);
        assert_eq!(ran.load(Ordering::SeqCst), 1);

        let marker = store.get("throttle/audit-recent").await.unwrap().unwrap();
        assert_eq!(marker.parse::<DateTime<Utc>>().unwrap(), clock.now());
    }

    #[tokio::test]
    async fn runs_at_most_once_within_interval() {
        let store = Arc::new(MemoryStateStore::new());
        let clock = Arc::new(MockClock::at(Utc::now()));
        let t = throttle(store.clone(), clock.clone());

        let ran = AtomicUsize::new(0);
        for _ in 0..5 {
            t.try_run("audit-recent", HOUR, async {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();
            clock.advance(chrono::Duration::minutes(1));
        }

        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn thirty_minutes_is_too_soon_sixty_one_is_not() {
        let now = Utc::now();
        let clock = Arc::new(MockClock::at(now));

        let store = Arc::new(MemoryStateStore::new().with(
            "throttle/audit-recent",
            &(now - chrono::Duration::minutes(30)).to_rfc3339(),
        ));
        let outcome = throttle(store, clock.clone())
            .try_run("audit-recent", HOUR, async { Ok(()) })
            .await
            .unwrap();
        assert_eq!(outcome, ThrottleOutcome::Skipped);

        let store = Arc::new(MemoryStateStore::new().with(
            "throttle/audit-recent",
            &(now - chrono::Duration::minutes(61)).to_rfc3339(),
        ));
        let store2 = store.clone();
        let outcome = throttle(store, clock.clone())
            .try_run("audit-recent", HOUR, async { Ok(()) })
            .await
            .unwrap();
        assert_eq!(outcome, ThrottleOutcome::Ran);

        // Marker advanced to the time of this attempt
        let marker = store2.get("throttle/audit-recent").await.unwrap().unwrap();
        assert_eq!(marker.parse::<DateTime<Utc>>().unwrap(), now);
    }

    #[tokio::test]
    async fn marker_advances_even_when_task_fails() {
        let store = Arc::new(MemoryStateStore::new());
        let clock = Arc::new(MockClock::at(Utc::now()));
        let t = throttle(store.clone(), clock.clone());

        let result = t
            .try_run("audit-recent", HOUR, async {
                Err(VigilError::TaskFailed {
                    name: "audit-recent".to_string(),
                    reason: "boom".to_string(),
                    code: Some(2),
                })
            })
            .await;

        assert!(result.is_err());
        assert!(store
            .get("throttle/audit-recent")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn corrupt_marker_counts_as_absent() {
        let store =
            Arc::new(MemoryStateStore::new().with("throttle/audit-recent", "not-a-timestamp"));
        let clock = Arc::new(MockClock::at(Utc::now()));

        let ran = AtomicUsize::new(0);
        let outcome = throttle(store, clock)
            .try_run("audit-recent", HOUR, async {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(outcome, ThrottleOutcome::Ran);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
