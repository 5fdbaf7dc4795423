//! # Printpanel
//!
//! Control-panel session core for a single attached 3D-printer-class
//! machine: manual-control session lifecycle, status polling, view
//! refresh, and exactly-once teardown.
//!
//! ## Architecture
//!
//! Printpanel is organized as a workspace with two crates:
//!
//! 1. **printpanel-core** - machine data model, driver interface, event bus
//! 2. **printpanel-control** - session registry, control session, periodic
//!    loops, UI-thread dispatch
//!
//! Rendering is left to the embedding application: it implements
//! [`WindowHost`] and [`UiDispatcher`] for its toolkit, hands a
//! [`WindowFactory`] to the [`SessionRegistry`], and obtains sessions
//! exclusively through [`SessionRegistry::get_or_create`].

pub use printpanel_core::{
    Axis, AxisSet, Driver, DriverError, Endstops, Error, HomeDirection, MachineEvent,
    MachineEventBus, MachineHandle, MachineId, MachineModel, MachineState, Position,
    RefreshError, Result, StatusSnapshot, SubscriptionId, ToolId, ToolKind, ToolModel,
    ToolStatus,
};

pub use printpanel_control::{
    bind_tool_panels, global_registry, homing_commands, init_global_registry, CancelToken,
    CloseReason, ControlSession, DispatchQueue, ExtruderPanel, HomingCommand, JogPanel,
    PeriodicTask, SessionRegistry, SessionState, StatusPanel, StatusPoller, TickOutcome,
    ToolPanelBinding, ToolTabs, UiDispatcher, ViewRefresher, WindowFactory, WindowHost,
    DEFAULT_TICK_INTERVAL,
};

/// Initialize logging for the host application
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_names(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
