//! Live machine status types pushed to the control-panel views.

use super::ToolId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Machine state snapshot delivered with state-change notifications.
///
/// Control sessions react only to transitions into "building",
/// "not connected", or "resetting"; everything else keeps manual control
/// available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineState {
    /// Machine is attached and responding
    pub connected: bool,
    /// Machine is executing a build
    pub building: bool,
    /// Machine is going through a reset
    pub resetting: bool,
}

impl MachineState {
    /// Connected, idle machine
    pub fn ready() -> Self {
        Self {
            connected: true,
            building: false,
            resetting: false,
        }
    }

    /// Machine no longer attached
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            building: false,
            resetting: false,
        }
    }

    /// True while the machine may be driven manually; false exactly when a
    /// control session must shut down (building, disconnected, or
    /// resetting)
    pub fn allows_manual_control(&self) -> bool {
        self.connected && !self.building && !self.resetting
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.connected {
            write!(f, "disconnected")
        } else if self.resetting {
            write!(f, "resetting")
        } else if self.building {
            write!(f, "building")
        } else {
            write!(f, "ready")
        }
    }
}

/// Current head position in millimeters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X-axis position
    pub x: f64,
    /// Y-axis position
    pub y: f64,
    /// Z-axis position
    pub z: f64,
}

impl Position {
    /// Create a new position
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X:{:.3} Y:{:.3} Z:{:.3}", self.x, self.y, self.z)
    }
}

/// Per-tool live status
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolStatus {
    /// Measured temperature in degrees Celsius
    pub temperature: f64,
    /// Target temperature in degrees Celsius
    pub target_temperature: f64,
    /// Whether the tool motor is powered
    pub motor_enabled: bool,
}

/// Consistent machine status snapshot read once per refresh tick.
///
/// The poll and refresh loops run unordered with respect to each other, so
/// every consumer reads a whole snapshot rather than assuming the other
/// loop has just run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Current head position
    pub position: Position,
    /// Live status per attached tool
    pub tools: HashMap<ToolId, ToolStatus>,
}

impl StatusSnapshot {
    /// Look up the status of one tool
    pub fn tool(&self, id: ToolId) -> Option<&ToolStatus> {
        self.tools.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_control_predicate() {
        assert!(MachineState::ready().allows_manual_control());
        assert!(!MachineState::disconnected().allows_manual_control());
        assert!(!MachineState {
            building: true,
            ..MachineState::ready()
        }
        .allows_manual_control());
        assert!(!MachineState {
            resetting: true,
            ..MachineState::ready()
        }
        .allows_manual_control());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(MachineState::ready().to_string(), "ready");
        assert_eq!(MachineState::disconnected().to_string(), "disconnected");
        let building = MachineState {
            building: true,
            ..MachineState::ready()
        };
        assert_eq!(building.to_string(), "building");
    }

    #[test]
    fn test_snapshot_tool_lookup() {
        let mut snapshot = StatusSnapshot::default();
        snapshot.tools.insert(
            ToolId(1),
            ToolStatus {
                temperature: 212.0,
                target_temperature: 220.0,
                motor_enabled: true,
            },
        );

        assert!(snapshot.tool(ToolId(1)).is_some());
        assert!(snapshot.tool(ToolId(2)).is_none());
        assert_eq!(snapshot.position.to_string(), "X:0.000 Y:0.000 Z:0.000");
    }
}
