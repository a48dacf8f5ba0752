//! Call pacing for rate-limited TTS services.

use std::time::Duration;
use tokio::time::Instant;

/// Spaces out calls so that at most one starts per `interval`.
///
/// The interval is measured from the moment the previous call was marked
/// finished, so a slow call never eats into the pause that follows it.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last_finished: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_finished: None,
        }
    }

    /// Sleep until the next call is allowed. The first call never waits.
    pub async fn wait(&self) {
        if let Some(last) = self.last_finished {
            match last.checked_add(self.interval) {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => tokio::time::sleep(self.interval).await,
            }
        }
    }

    /// Record that a call just finished.
    pub fn mark(&mut self) {
        self.last_finished = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_call_does_not_wait() {
        let pacer = Pacer::new(Duration::from_secs(2));
        let start = Instant::now();
        pacer.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_full_interval_after_mark() {
        let mut pacer = Pacer::new(Duration::from_secs(2));
        pacer.mark();

        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_spent_elsewhere_counts() {
        let mut pacer = Pacer::new(Duration::from_secs(2));
        pacer.mark();
        tokio::time::sleep(Duration::from_secs(5)).await;

        let start = Instant::now();
        pacer.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval() {
        let mut pacer = Pacer::new(Duration::ZERO);
        pacer.mark();
        let start = Instant::now();
        pacer.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(pacer.interval, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_interval_does_not_overflow() {
        let mut pacer = Pacer::new(Duration::MAX);
        pacer.mark();
        let waited = tokio::time::timeout(Duration::from_secs(60), pacer.wait()).await;
        assert!(waited.is_err());
    }
}
