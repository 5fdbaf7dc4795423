//! Homing command derivation.
//!
//! The set of homing commands offered to the user is data-driven: each
//! axis contributes a negative-direction command only when it declares a
//! minimum end-stop and a positive-direction command only when it declares
//! a maximum end-stop. Axes with no end-stops are omitted entirely.

use printpanel_core::{Axis, AxisSet, HomeDirection, MachineModel};

/// One entry in the homing menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomingCommand {
    /// Axes moved by this command.
    pub axes: AxisSet,
    /// Direction of travel.
    pub direction: HomeDirection,
    /// User-facing label, e.g. `Home X-`.
    pub label: String,
}

/// Derive the homing commands valid for this machine's end-stop
/// configuration
pub fn homing_commands(model: &MachineModel) -> Vec<HomingCommand> {
    let mut commands = Vec::new();
    for &axis in Axis::all() {
        let endstops = model.endstops(axis);
        if endstops.has_min {
            commands.push(HomingCommand {
                axes: AxisSet::single(axis),
                direction: HomeDirection::Negative,
                label: format!("Home {}-", axis),
            });
        }
        if endstops.has_max {
            commands.push(HomingCommand {
                axes: AxisSet::single(axis),
                direction: HomeDirection::Positive,
                label: format!("Home {}+", axis),
            });
        }
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use printpanel_core::Endstops;

    #[test]
    fn test_min_only_axis_offers_negative_home() {
        let model =
            MachineModel::new(Vec::new()).with_endstops(Axis::X, Endstops::new(true, false));

        let commands = homing_commands(&model);
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].label, "Home X-");
        assert_eq!(commands[0].direction, HomeDirection::Negative);
        assert!(commands[0].axes.contains(Axis::X));
    }

    #[test]
    fn test_axis_without_endstops_is_omitted() {
        let model = MachineModel::new(Vec::new());
        assert!(homing_commands(&model).is_empty());
    }

    #[test]
    fn test_full_endstop_configuration() {
        let model = MachineModel::new(Vec::new())
            .with_endstops(Axis::X, Endstops::new(true, true))
            .with_endstops(Axis::Z, Endstops::new(false, true));

        let labels: Vec<String> = homing_commands(&model)
            .into_iter()
            .map(|c| c.label)
            .collect();
        assert_eq!(labels, vec!["Home X-", "Home X+", "Home Z+"]);
    }
}
