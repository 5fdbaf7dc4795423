//! # Printpanel Control
//!
//! Session lifecycle and polling coordination for the machine control
//! panel: at most one live session per machine, two independent periodic
//! background loops against a shared driver, and an exactly-once teardown
//! path that may be triggered concurrently from a background thread, the
//! UI thread, or a failure inside the refresh loop.

pub mod homing;
pub mod panels;
pub mod poller;
pub mod refresher;
pub mod registry;
pub mod session;
pub mod task;
pub mod ui;

pub use homing::{homing_commands, HomingCommand};
pub use panels::{
    bind_tool_panels, ExtruderPanel, JogPanel, StatusPanel, ToolPanelBinding, ToolTabs,
};
pub use poller::StatusPoller;
pub use refresher::ViewRefresher;
pub use registry::{global_registry, init_global_registry, SessionRegistry, WindowFactory};
pub use session::{CloseReason, ControlSession, SessionState};
pub use task::{CancelToken, PeriodicTask, TickOutcome, DEFAULT_TICK_INTERVAL};
pub use ui::{DispatchQueue, UiDispatcher, WindowHost};
