//! Periodic lifecycle sweep on the tokio runtime.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::{Connection, DutyHourLifecycleManager, LifecycleReport, WindowFilter, WindowStore};

/// Spawns a task that runs [`DutyHourLifecycleManager::archive_expired_windows`]
/// on a fixed interval.
pub struct LifecycleSweeper;

/// Handle to a running sweeper.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    reports: watch::Receiver<Option<LifecycleReport>>,
    join: JoinHandle<u64>,
}

impl LifecycleSweeper {
    /// Start sweeping every `interval`. The first sweep runs immediately.
    ///
    /// Storage errors are logged and the next tick tries again.
    pub fn spawn<S>(
        manager: Arc<DutyHourLifecycleManager<S>>,
        interval: Duration,
        filter: Option<WindowFilter>,
    ) -> SweeperHandle
    where
        S: WindowStore + Connection + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let (report_tx, report_rx) = watch::channel(None);

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut runs = 0_u64;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match manager.archive_expired_windows(filter.as_ref()).await {
                            Ok(report) => {
                                runs += 1;
                                tracing::debug!(
                                    "sweep {} archived {} and purged {} windows",
                                    runs,
                                    report.archived,
                                    report.purged
                                );
                                report_tx.send_replace(Some(report));
                            }
                            Err(e) => tracing::error!("lifecycle sweep failed: {}", e),
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("lifecycle sweeper stopped after {} runs", runs);
            runs
        });

        SweeperHandle {
            shutdown: shutdown_tx,
            reports: report_rx,
            join,
        }
    }
}

impl SweeperHandle {
    /// Report of the most recent successful sweep.
    pub fn last_report(&self) -> Option<LifecycleReport> {
        *self.reports.borrow()
    }

    /// Wait until a successful sweep has been reported after this call.
    pub async fn next_report(&mut self) -> Option<LifecycleReport> {
        self.reports.changed().await.ok()?;
        *self.reports.borrow_and_update()
    }

    /// Stop the sweeper and return the number of successful runs.
    pub async fn shutdown(self) -> u64 {
        let _ = self.shutdown.send(true);
        match self.join.await {
            Ok(runs) => runs,
            Err(e) => {
                tracing::error!("lifecycle sweeper task failed: {}", e);
                0
            }
        }
    }
}
