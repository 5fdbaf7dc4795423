//! # Printpanel Core
//!
//! Core types and traits for the printpanel control-panel session core.
//! Provides the machine data model, the driver command/query interface,
//! the machine notification bus, and the error types shared by the
//! control crate.

pub mod driver;
pub mod error;
pub mod events;
pub mod machine;

pub use driver::{Driver, HomeDirection};
pub use error::{DriverError, Error, RefreshError, Result};
pub use events::{MachineEvent, MachineEventBus, SubscriptionId};
pub use machine::{
    Axis, AxisSet, Endstops, MachineHandle, MachineId, MachineModel, MachineState, Position,
    StatusSnapshot, ToolId, ToolKind, ToolModel, ToolStatus,
};
