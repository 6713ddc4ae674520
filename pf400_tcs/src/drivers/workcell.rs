use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{JointPose, TcsError};

/// Fixed workcell geometry: taught routing poses, module boundaries, and
/// gripper/plate dimensions. Loaded from JSON alongside the location store;
/// the defaults describe the reference workcell the driver was brought up on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Workcell {
    /// Safe intermediate arm configuration used to route between locations.
    pub neutral_joints: JointPose,
    /// Wrist angle of the neutral configuration, restored before retracting.
    pub neutral_wrist: f64,
    /// Vertical rail clearance added above a target when parking the rails.
    pub rail_clearance: f64,
    /// Turntable location used to change plate orientation mid-transfer.
    pub rotation_deck: JointPose,
    /// Parking location for lids.
    pub lid_deck: JointPose,
    /// Z-rail offset between a plate pose and its lid grip pose.
    pub lid_height: f64,
    /// Module frame boundaries on the Y axis; the end effector must cross
    /// back over these on Y alone before any neutral transition.
    pub module_left_y: f64,
    pub module_right_y: f64,
    /// Gripper setpoints, in millimeters.
    pub gripper_open_width: f64,
    pub gripper_closed_width: f64,
    /// Nominal plate width the grasp search starts from.
    pub plate_width: f64,
    /// Release opening width, wider than the widest plate corner.
    pub release_width: f64,
    /// Finger speed (percent) and squeeze force (newtons) for grasps.
    pub grasp_speed: u8,
    pub grasp_force: i8,
    pub release_speed: u8,
    /// Approach offset above a plate location on the vertical rail.
    pub approach_height: f64,
    /// Straight-up retract distance after a grasp or release.
    pub retract_height: f64,
    /// Deck-center compensation applied when rotating a plate in place.
    pub deck_rotation_x_shift: f64,
    pub deck_rotation_y_shift: f64,
    /// Extra vertical rail height for the -90 degree deck geometry offset.
    pub deck_lift: f64,
}

impl Workcell {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TcsError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            TcsError::Configuration(format!("cannot read workcell file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            TcsError::Configuration(format!("cannot parse workcell file {}: {}", path.display(), e))
        })
    }
}

impl Default for Workcell {
    fn default() -> Self {
        Self {
            neutral_joints: JointPose::new(400.0, 1.400, 177.101, 536.757, 77.0, 0.0),
            neutral_wrist: 536.757,
            rail_clearance: 60.0,
            rotation_deck: JointPose::new(262.550, 20.608, 119.290, 662.570, 0.0, 574.367),
            lid_deck: JointPose::new(260.550, 20.608, 119.290, 662.570, 0.0, 574.367),
            lid_height: 7.0,
            module_left_y: -420.0,
            module_right_y: 220.0,
            gripper_open_width: 130.0,
            gripper_closed_width: 77.0,
            plate_width: 123.0,
            release_width: 130.0,
            grasp_speed: 100,
            grasp_force: 10,
            release_speed: 100,
            approach_height: 60.0,
            retract_height: 60.0,
            deck_rotation_x_shift: 3.5,
            deck_rotation_y_shift: 29.0,
            deck_lift: 5.0,
        }
    }
}
