//! Driver interface to the attached machine.
//!
//! The driver owns the wire protocol and any retry policy; this workspace
//! consumes it as an opaque command/query surface shared by the status
//! poller, the view refresher, and user action handlers.

use crate::error::DriverError;
use crate::machine::{AxisSet, StatusSnapshot, ToolId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a homing move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HomeDirection {
    /// Toward the axis maximum end-stop
    Positive,
    /// Toward the axis minimum end-stop
    Negative,
}

impl fmt::Display for HomeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HomeDirection::Positive => write!(f, "+"),
            HomeDirection::Negative => write!(f, "-"),
        }
    }
}

/// Command/query interface for one attached machine.
///
/// Implementations must tolerate concurrent invocation: both periodic
/// loops and any number of user action handlers share one driver. Any
/// command may report [`DriverError::Busy`], which callers surface as a
/// logged, non-fatal failure of that single action.
pub trait Driver: Send + Sync {
    /// Drop any cached position so the next poll queries the device
    fn invalidate_position(&self);

    /// Request fresh status from the device. Called once per poll tick;
    /// failed requests are not retried by the caller.
    fn poll_status(&self) -> Result<(), DriverError>;

    /// Read a consistent status snapshot
    fn query_status(&self) -> Result<StatusSnapshot, DriverError>;

    /// Power the stepper drives
    fn enable_drives(&self) -> Result<(), DriverError>;

    /// Cut power to the stepper drives
    fn disable_drives(&self) -> Result<(), DriverError>;

    /// Home the given axes in one direction
    fn home_axes(&self, axes: &AxisSet, direction: HomeDirection) -> Result<(), DriverError>;

    /// Make the given tool the machine's active tool
    fn select_tool(&self, tool: ToolId) -> Result<(), DriverError>;
}
