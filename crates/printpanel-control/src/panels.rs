//! View bindings for the jog and tool sub-panels.
//!
//! Rendering lives elsewhere; these wrappers hold the last pushed state
//! and enforce the structural checks the refresh loop depends on.

use parking_lot::Mutex;
use printpanel_core::{
    MachineModel, Position, RefreshError, StatusSnapshot, ToolId, ToolModel, ToolStatus,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Receives one status snapshot per refresh tick
pub trait StatusPanel: Send + Sync {
    /// Push fresh status into the panel
    fn update_status(&self, snapshot: &StatusSnapshot) -> Result<(), RefreshError>;
}

/// Jog sub-panel binding: tracks the position it displays
#[derive(Debug, Default)]
pub struct JogPanel {
    position: Mutex<Position>,
    updates: AtomicU64,
}

impl JogPanel {
    /// Create a jog panel binding
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get the last position pushed into the panel
    pub fn position(&self) -> Position {
        *self.position.lock()
    }

    /// Get the number of status pushes this panel has received
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::SeqCst)
    }
}

impl StatusPanel for JogPanel {
    fn update_status(&self, snapshot: &StatusSnapshot) -> Result<(), RefreshError> {
        *self.position.lock() = snapshot.position;
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Extruder sub-panel binding for one tool
#[derive(Debug)]
pub struct ExtruderPanel {
    tool: ToolModel,
    status: Mutex<ToolStatus>,
    updates: AtomicU64,
}

impl ExtruderPanel {
    /// Create a panel binding for one extruder
    pub fn new(tool: ToolModel) -> Arc<Self> {
        Arc::new(Self {
            tool,
            status: Mutex::new(ToolStatus::default()),
            updates: AtomicU64::new(0),
        })
    }

    /// Get the tool this panel is bound to
    pub fn tool(&self) -> &ToolModel {
        &self.tool
    }

    /// Get the last status pushed into the panel
    pub fn status(&self) -> ToolStatus {
        *self.status.lock()
    }

    /// Get the number of status pushes this panel has received
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::SeqCst)
    }
}

impl StatusPanel for ExtruderPanel {
    fn update_status(&self, snapshot: &StatusSnapshot) -> Result<(), RefreshError> {
        // A bound tool missing from the snapshot means the machine and the
        // panel disagree about what is attached.
        let status = snapshot.tool(self.tool.id).ok_or_else(|| {
            RefreshError::integrity(format!(
                "tool {} vanished from machine status",
                self.tool.id
            ))
        })?;
        *self.status.lock() = *status;
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Pairing of a tool with its visible sub-panel
#[derive(Debug, Clone)]
pub struct ToolPanelBinding {
    /// The bound tool.
    pub tool: ToolModel,
    /// The tool's sub-panel.
    pub panel: Arc<ExtruderPanel>,
}

/// Build tool panel bindings from the machine's declared tool list.
///
/// Only extruders get a sub-panel; other kinds are logged and skipped.
/// Returns the bindings in tool-list order and the index of the initially
/// selected tab (the machine's current tool, when it has a panel).
pub fn bind_tool_panels(model: &MachineModel) -> (Vec<ToolPanelBinding>, Option<usize>) {
    let mut bindings = Vec::new();
    let mut selected = None;

    for tool in model.tools() {
        if !tool.kind.has_panel() {
            tracing::warn!(tool = %tool.name, kind = %tool.kind, "unsupported tool for control panel");
            continue;
        }
        tracing::debug!(tool = %tool.name, "creating panel for tool");
        if model.current_tool() == Some(tool.id) {
            selected = Some(bindings.len());
        }
        bindings.push(ToolPanelBinding {
            tool: tool.clone(),
            panel: ExtruderPanel::new(tool.clone()),
        });
    }

    (bindings, selected)
}

/// Tool tab strip: remembers which tab is visible and reports which tool a
/// tab change should activate on the machine.
#[derive(Debug)]
pub struct ToolTabs {
    bindings: Vec<ToolPanelBinding>,
    selected: Mutex<Option<usize>>,
}

impl ToolTabs {
    /// Create a tab strip over the given bindings
    pub fn new(bindings: Vec<ToolPanelBinding>, selected: Option<usize>) -> Self {
        Self {
            bindings,
            selected: Mutex::new(selected),
        }
    }

    /// Get the bindings in tab order
    pub fn bindings(&self) -> &[ToolPanelBinding] {
        &self.bindings
    }

    /// Get the index of the visible tab, if any
    pub fn selected(&self) -> Option<usize> {
        *self.selected.lock()
    }

    /// Mark `index` as the visible tab, returning the tool that should
    /// become the machine's active tool. Out-of-range indices are ignored.
    pub fn set_selected(&self, index: usize) -> Option<ToolId> {
        let binding = self.bindings.get(index)?;
        *self.selected.lock() = Some(index);
        Some(binding.tool.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printpanel_core::ToolModel;

    fn three_tool_model() -> MachineModel {
        let model = MachineModel::new(vec![
            ToolModel::new(1, "extruder", "A"),
            ToolModel::new(2, "unknown", "B"),
            ToolModel::new(3, "extruder", "C"),
        ]);
        model.select_tool(ToolId(3));
        model
    }

    #[test]
    fn test_unsupported_tools_are_skipped() {
        let model = three_tool_model();
        let (bindings, selected) = bind_tool_panels(&model);

        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].tool.id, ToolId(1));
        assert_eq!(bindings[1].tool.id, ToolId(3));
        // The panel for the current tool starts selected
        assert_eq!(selected, Some(1));
    }

    #[test]
    fn test_tab_change_reports_tool() {
        let model = three_tool_model();
        let (bindings, selected) = bind_tool_panels(&model);
        let tabs = ToolTabs::new(bindings, selected);

        assert_eq!(tabs.set_selected(0), Some(ToolId(1)));
        assert_eq!(tabs.selected(), Some(0));

        // Out of range leaves the selection alone
        assert_eq!(tabs.set_selected(5), None);
        assert_eq!(tabs.selected(), Some(0));
    }

    #[test]
    fn test_jog_panel_records_position() {
        let panel = JogPanel::new();
        let snapshot = StatusSnapshot {
            position: Position::new(10.0, -2.5, 0.3),
            ..StatusSnapshot::default()
        };

        panel.update_status(&snapshot).unwrap();
        assert_eq!(panel.position(), Position::new(10.0, -2.5, 0.3));
        assert_eq!(panel.update_count(), 1);
    }

    #[test]
    fn test_extruder_panel_integrity_on_vanished_tool() {
        let panel = ExtruderPanel::new(ToolModel::new(3, "extruder", "C"));
        let snapshot = StatusSnapshot::default();

        let err = panel.update_status(&snapshot).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(panel.update_count(), 0);
    }

    #[test]
    fn test_extruder_panel_records_status() {
        let panel = ExtruderPanel::new(ToolModel::new(1, "extruder", "A"));
        let mut snapshot = StatusSnapshot::default();
        snapshot.tools.insert(
            ToolId(1),
            ToolStatus {
                temperature: 198.5,
                target_temperature: 210.0,
                motor_enabled: true,
            },
        );

        panel.update_status(&snapshot).unwrap();
        assert_eq!(panel.status().target_temperature, 210.0);
        assert!(panel.status().motor_enabled);
    }
}
