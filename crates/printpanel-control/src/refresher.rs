//! View refresh loop.

use crate::panels::{JogPanel, StatusPanel, ToolPanelBinding};
use crate::task::{PeriodicTask, TickOutcome};
use printpanel_core::{Driver, RefreshError};
use std::sync::Arc;
use std::time::Duration;

/// Signal invoked at most once when the refresh loop detects an
/// unrecoverable integrity failure; the owning session uses it to tear
/// itself down.
pub type IntegrityFailureSignal = Box<dyn Fn(RefreshError) + Send + Sync>;

/// Periodic status fan-out to the visible sub-panels.
///
/// Each tick reads one consistent snapshot and pushes it into the jog
/// panel and every tool panel. A transient read miss is logged and the
/// tick skipped; a structural integrity failure is treated as an
/// unexpected disconnect: the loop signals the owner and exits. Failures
/// never escape the loop.
pub struct ViewRefresher {
    task: PeriodicTask,
}

impl ViewRefresher {
    /// Start refreshing at the given interval
    pub fn start(
        driver: Arc<dyn Driver>,
        jog_panel: Arc<JogPanel>,
        tool_panels: Vec<ToolPanelBinding>,
        on_integrity_failure: IntegrityFailureSignal,
        interval: Duration,
    ) -> Self {
        let task = PeriodicTask::spawn("view-refresh", interval, move || {
            match refresh_once(driver.as_ref(), &jog_panel, &tool_panels) {
                Ok(()) => TickOutcome::Continue,
                Err(err @ RefreshError::Transient { .. }) => {
                    tracing::warn!(error = %err, "status refresh missed, retrying next tick");
                    TickOutcome::Continue
                }
                Err(err) => {
                    tracing::error!(error = %err, "machine state integrity failure, closing control session");
                    on_integrity_failure(err);
                    TickOutcome::Stop
                }
            }
        });
        Self { task }
    }

    /// Request cancellation; no further refresh tick runs after the
    /// current sleep boundary. Never blocks.
    pub fn cancel(&self) {
        self.task.cancel();
    }

    /// Check whether the loop has been asked to stop (or stopped itself)
    pub fn is_cancelled(&self) -> bool {
        self.task.is_cancelled()
    }

    /// Wait up to `timeout` for the refresh thread to exit
    pub fn join_for(&self, timeout: Duration) -> bool {
        self.task.join_for(timeout)
    }
}

fn refresh_once(
    driver: &dyn Driver,
    jog_panel: &JogPanel,
    tool_panels: &[ToolPanelBinding],
) -> Result<(), RefreshError> {
    let snapshot = driver.query_status()?;
    jog_panel.update_status(&snapshot)?;
    for binding in tool_panels {
        binding.panel.update_status(&snapshot)?;
    }
    Ok(())
}
