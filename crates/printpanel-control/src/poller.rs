//! Status poll loop.

use crate::task::{PeriodicTask, TickOutcome};
use printpanel_core::Driver;
use std::sync::Arc;
use std::time::Duration;

/// Periodic status poll against the shared driver.
///
/// Pure device-side work: no UI state is touched and no lock is shared
/// with the view refresher. A failed poll is logged and left to the
/// driver's own retry policy; the loop itself never retries.
pub struct StatusPoller {
    task: PeriodicTask,
}

impl StatusPoller {
    /// Start polling at the given interval
    pub fn start(driver: Arc<dyn Driver>, interval: Duration) -> Self {
        let task = PeriodicTask::spawn("status-poll", interval, move || {
            if let Err(err) = driver.poll_status() {
                tracing::debug!(error = %err, "status poll failed");
            }
            TickOutcome::Continue
        });
        Self { task }
    }

    /// Request cancellation; no further poll tick runs after the current
    /// sleep boundary. Never blocks.
    pub fn cancel(&self) {
        self.task.cancel();
    }

    /// Check whether the loop has been asked to stop
    pub fn is_cancelled(&self) -> bool {
        self.task.is_cancelled()
    }

    /// Wait up to `timeout` for the poll thread to exit
    pub fn join_for(&self, timeout: Duration) -> bool {
        self.task.join_for(timeout)
    }
}
