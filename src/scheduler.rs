//! Periodic background refresh.

use crate::refresh::Refresher;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

/// Spawn a task that refreshes every `period` until aborted.
///
/// With `immediate` the first refresh runs right away, otherwise one
/// period after spawning. A failed refresh is logged and the next one
/// still runs on schedule.
pub fn spawn_scheduler(
    refresher: Arc<Refresher>,
    period: Duration,
    immediate: bool,
) -> JoinHandle<()> {
    let start = if immediate {
        Instant::now()
    } else {
        Instant::now() + period
    };

    tokio::spawn(async move {
        let mut ticker = interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Scheduler started, refreshing every {}s", period.as_secs());

        loop {
            ticker.tick().await;
            if let Err(e) = refresher.refresh().await {
                error!("Scheduled refresh failed: {}", e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refresh::tests::{sample_feed, StaticSource};
    use crate::storage::ReportStore;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    const PERIOD: Duration = Duration::from_secs(60);

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    /// Yield until the source has been asked for records `expected` times.
    /// Refresh writes complete on the blocking pool.
    async fn wait_for_calls(source: &StaticSource, expected: usize) {
        while source.calls.load(Ordering::SeqCst) < expected {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_first_refresh() {
        let temp_dir = TempDir::new().unwrap();
        let source = Arc::new(StaticSource::ok(sample_feed()));
        let refresher = Arc::new(Refresher::new(
            source.clone(),
            ReportStore::new(temp_dir.path()),
        ));

        let handle = spawn_scheduler(refresher, PERIOD, true);
        wait_for_calls(&source, 1).await;

        tokio::time::advance(PERIOD).await;
        wait_for_calls(&source, 2).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_first_refresh() {
        let temp_dir = TempDir::new().unwrap();
        let source = Arc::new(StaticSource::ok(sample_feed()));
        let refresher = Arc::new(Refresher::new(
            source.clone(),
            ReportStore::new(temp_dir.path()),
        ));

        let handle = spawn_scheduler(refresher, PERIOD, false);
        settle().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        tokio::time::advance(PERIOD).await;
        wait_for_calls(&source, 1).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_scheduler() {
        let temp_dir = TempDir::new().unwrap();
        let source = Arc::new(StaticSource::failing());
        let refresher = Arc::new(Refresher::new(
            source.clone(),
            ReportStore::new(temp_dir.path()),
        ));

        let handle = spawn_scheduler(refresher, PERIOD, true);
        settle().await;
        tokio::time::advance(PERIOD).await;
        settle().await;
        tokio::time::advance(PERIOD).await;
        settle().await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert!(!handle.is_finished());
        handle.abort();
    }
}
