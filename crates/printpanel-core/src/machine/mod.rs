//! Machine data model
//!
//! This module provides:
//! - Axis and end-stop declarations
//! - Tool identity, classification, and the attached tool list
//! - The machine model with its mutable tool selection
//! - The machine handle binding identity, model, driver, and notifications

pub mod state;

pub use state::{MachineState, Position, StatusSnapshot, ToolStatus};

use crate::driver::Driver;
use crate::events::MachineEventBus;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Motion axis of the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl Axis {
    /// Get all axes in declaration order
    pub fn all() -> &'static [Axis] {
        &[Axis::X, Axis::Y, Axis::Z]
    }

    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "X"),
            Axis::Y => write!(f, "Y"),
            Axis::Z => write!(f, "Z"),
        }
    }
}

/// Ordered set of axes addressed by a single homing command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AxisSet(Vec<Axis>);

impl AxisSet {
    /// Create a set containing one axis
    pub fn single(axis: Axis) -> Self {
        Self(vec![axis])
    }

    /// Create a set from any axis collection; duplicates are dropped and
    /// the result is kept in declaration order
    pub fn from_axes(axes: impl IntoIterator<Item = Axis>) -> Self {
        let mut inner: Vec<Axis> = axes.into_iter().collect();
        inner.sort();
        inner.dedup();
        Self(inner)
    }

    /// Check whether the set contains an axis
    pub fn contains(&self, axis: Axis) -> bool {
        self.0.contains(&axis)
    }

    /// Iterate the axes in order
    pub fn iter(&self) -> impl Iterator<Item = Axis> + '_ {
        self.0.iter().copied()
    }

    /// Number of axes in the set
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Axis> for AxisSet {
    fn from_iter<I: IntoIterator<Item = Axis>>(iter: I) -> Self {
        Self::from_axes(iter)
    }
}

impl fmt::Display for AxisSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, axis) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", axis)?;
        }
        Ok(())
    }
}

/// Per-axis end-stop declaration.
///
/// Presence of a limit sensor on one end of an axis determines which homing
/// commands are valid for that axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endstops {
    /// Limit sensor at the axis minimum
    pub has_min: bool,
    /// Limit sensor at the axis maximum
    pub has_max: bool,
}

impl Endstops {
    /// No end-stops on either end
    pub const NONE: Endstops = Endstops {
        has_min: false,
        has_max: false,
    };

    /// Create an end-stop declaration
    pub fn new(has_min: bool, has_max: bool) -> Self {
        Self { has_min, has_max }
    }

    /// Check whether either end has a sensor
    pub fn any(&self) -> bool {
        self.has_min || self.has_max
    }
}

/// Tool identifier as reported by the machine definition
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ToolId(
    /// The numeric tool index.
    pub u32,
);

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Tool classification.
///
/// Only recognized kinds get a control sub-panel; everything else is
/// carried as `Unsupported` so it can be logged and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolKind {
    /// Filament extruder head
    Extruder,
    /// Any tool kind this panel cannot drive
    Unsupported(String),
}

impl ToolKind {
    /// Parse the machine-reported kind string
    pub fn parse(kind: &str) -> Self {
        match kind {
            "extruder" => ToolKind::Extruder,
            other => ToolKind::Unsupported(other.to_string()),
        }
    }

    /// Check whether this kind gets a control sub-panel
    pub fn has_panel(&self) -> bool {
        matches!(self, ToolKind::Extruder)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolKind::Extruder => write!(f, "extruder"),
            ToolKind::Unsupported(kind) => write!(f, "{}", kind),
        }
    }
}

/// One attached tool as declared by the machine definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolModel {
    /// The tool's identifier.
    pub id: ToolId,
    /// The tool's classification.
    pub kind: ToolKind,
    /// The tool's display name.
    pub name: String,
}

impl ToolModel {
    /// Create a tool model from machine-reported fields
    pub fn new(id: u32, kind: &str, name: impl Into<String>) -> Self {
        Self {
            id: ToolId(id),
            kind: ToolKind::parse(kind),
            name: name.into(),
        }
    }
}

/// Machine definition plus its mutable tool selection.
///
/// The tool list and end-stop declarations are fixed at construction; only
/// the current tool changes, guarded for concurrent access from UI action
/// handlers and the refresh loop.
#[derive(Debug)]
pub struct MachineModel {
    tools: Vec<ToolModel>,
    endstops: [Endstops; 3],
    current_tool: Mutex<Option<ToolId>>,
}

impl MachineModel {
    /// Create a model with the given ordered tool list and no end-stops.
    /// The first tool, if any, starts selected.
    pub fn new(tools: Vec<ToolModel>) -> Self {
        let current = tools.first().map(|t| t.id);
        Self {
            tools,
            endstops: [Endstops::NONE; 3],
            current_tool: Mutex::new(current),
        }
    }

    /// Declare the end-stop configuration of one axis
    pub fn with_endstops(mut self, axis: Axis, endstops: Endstops) -> Self {
        self.endstops[axis.index()] = endstops;
        self
    }

    /// Get the ordered list of attached tools
    pub fn tools(&self) -> &[ToolModel] {
        &self.tools
    }

    /// Look up a tool by id
    pub fn tool(&self, id: ToolId) -> Option<&ToolModel> {
        self.tools.iter().find(|t| t.id == id)
    }

    /// Get the end-stop declaration of an axis
    pub fn endstops(&self, axis: Axis) -> Endstops {
        self.endstops[axis.index()]
    }

    /// Get the currently selected tool, if any
    pub fn current_tool(&self) -> Option<ToolId> {
        *self.current_tool.lock()
    }

    /// Select a tool by id. Unknown ids are rejected and leave the current
    /// selection untouched.
    pub fn select_tool(&self, id: ToolId) -> bool {
        if self.tool(id).is_none() {
            tracing::warn!(tool = %id, "ignoring selection of unknown tool");
            return false;
        }
        *self.current_tool.lock() = Some(id);
        true
    }
}

/// Opaque machine identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineId(Uuid);

impl MachineId {
    /// Create a new unique machine id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MachineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Machine({})", &self.0.to_string()[..8])
    }
}

/// Handle for one physical machine: identity plus command/query surface.
///
/// At most one control session may be bound to a given handle at a time;
/// sessions hold a non-owning `Arc` and compare identity by [`MachineId`].
pub struct MachineHandle {
    id: MachineId,
    name: String,
    model: MachineModel,
    driver: Arc<dyn Driver>,
    events: MachineEventBus,
}

impl MachineHandle {
    /// Create a handle for one attached machine
    pub fn new(
        name: impl Into<String>,
        model: MachineModel,
        driver: Arc<dyn Driver>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: MachineId::new(),
            name: name.into(),
            model,
            driver,
            events: MachineEventBus::default(),
        })
    }

    /// Get the machine's opaque identity
    pub fn id(&self) -> MachineId {
        self.id
    }

    /// Get the machine's display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the machine model
    pub fn model(&self) -> &MachineModel {
        &self.model
    }

    /// Get the shared driver interface
    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Get the state-change notification source
    pub fn events(&self) -> &MachineEventBus {
        &self.events
    }
}

impl fmt::Debug for MachineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("tools", &self.model.tools().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_kind_parse() {
        assert_eq!(ToolKind::parse("extruder"), ToolKind::Extruder);
        assert!(ToolKind::parse("extruder").has_panel());

        let kind = ToolKind::parse("mill");
        assert_eq!(kind, ToolKind::Unsupported("mill".to_string()));
        assert!(!kind.has_panel());
    }

    #[test]
    fn test_axis_set_dedup_and_order() {
        let set = AxisSet::from_axes([Axis::Z, Axis::X, Axis::Z]);
        assert_eq!(set.len(), 2);
        let axes: Vec<Axis> = set.iter().collect();
        assert_eq!(axes, vec![Axis::X, Axis::Z]);
        assert_eq!(set.to_string(), "X,Z");
    }

    #[test]
    fn test_model_tool_selection() {
        let model = MachineModel::new(vec![
            ToolModel::new(0, "extruder", "left"),
            ToolModel::new(1, "extruder", "right"),
        ]);
        assert_eq!(model.current_tool(), Some(ToolId(0)));

        assert!(model.select_tool(ToolId(1)));
        assert_eq!(model.current_tool(), Some(ToolId(1)));

        // Unknown tool leaves the selection alone
        assert!(!model.select_tool(ToolId(9)));
        assert_eq!(model.current_tool(), Some(ToolId(1)));
    }

    #[test]
    fn test_model_endstops() {
        let model = MachineModel::new(Vec::new())
            .with_endstops(Axis::X, Endstops::new(true, false))
            .with_endstops(Axis::Z, Endstops::new(false, true));

        assert!(model.endstops(Axis::X).has_min);
        assert!(!model.endstops(Axis::X).has_max);
        assert_eq!(model.endstops(Axis::Y), Endstops::NONE);
        assert!(model.endstops(Axis::Z).has_max);
        assert!(!model.endstops(Axis::Y).any());
    }

    #[test]
    fn test_machine_id_display() {
        let id = MachineId::new();
        let shown = id.to_string();
        assert!(shown.starts_with("Machine("));
        assert_ne!(MachineId::new(), id);
    }
}
