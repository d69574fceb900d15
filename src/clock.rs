//! Injectable time source
//!
//! Scheduling decisions (throttle eligibility, the inter-iteration delay)
//! go through the `Clock` trait so tests can run them without real
//! wall-clock time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Abstract time source
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;

    /// Suspend the current task for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by system time and tokio timers
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Manually advanced clock for tests; `sleep` records the requested
/// duration and returns immediately.
#[cfg(test)]
pub(crate) struct MockClock {
    now: std::sync::Mutex<DateTime<Utc>>,
    pub slept: std::sync::Mutex<Vec<Duration>>,
}

#[cfg(test)]
impl MockClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
            slept: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn advance(&self, delta: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += delta;
    }
}

#[cfg(test)]
#[async_trait]
impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_clock_advances() {
        let start = Utc::now();
        let clock = MockClock::at(start);
        clock.advance(chrono::Duration::minutes(5));
        assert_eq!(clock.now(), start + chrono::Duration::minutes(5));
    }

    #[tokio::test]
    async fn mock_clock_records_sleeps() {
        let clock = MockClock::at(Utc::now());
        clock.sleep(Duration::from_secs(60)).await;
        assert_eq!(clock.slept.lock().unwrap().as_slice(), &[Duration::from_secs(60)]);
    }
}
