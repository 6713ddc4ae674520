use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::state::PlateState;
use crate::{JointPose, PlateRotation, ProfileSlot, TcsError};

use super::Pf400Driver;

/// Terminal state of one composite plate operation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationOutcome {
    Completed,
    Aborted(AbortReason),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The grasp search exhausted its width floor without finding a plate.
    PlateMissing,
}

impl Pf400Driver {
    /// If the end effector sits beyond a module boundary, pull it back
    /// across on the Y axis alone before anything else moves, so the arm
    /// cannot retract through a module frame.
    pub async fn move_gripper_safe_zone(&self) -> Result<(), TcsError> {
        let pose = self.cartesian_state().await?;
        if pose.y <= self.workcell.module_left_y {
            self.move_in_one_axis(ProfileSlot::Slow, 0.0, self.workcell.module_left_y - pose.y, 0.0)
                .await?;
        } else if pose.y >= self.workcell.module_right_y {
            self.move_in_one_axis(ProfileSlot::Slow, 0.0, self.workcell.module_right_y - pose.y, 0.0)
                .await?;
        }
        Ok(())
    }

    /// Returns the wrist to its neutral angle, after the safe-zone guard.
    pub async fn move_gripper_neutral(&self) -> Result<(), TcsError> {
        self.move_gripper_safe_zone().await?;
        let mut pose = self.joint_state().await?;
        pose.wrist = self.workcell.neutral_wrist;
        self.move_joint(&pose, ProfileSlot::Slow, false, false).await
    }

    /// Folds the arm to the neutral configuration without moving the rails.
    pub async fn move_arm_neutral(&self) -> Result<(), TcsError> {
        let current = self.joint_state().await?;
        let mut pose = self.workcell.neutral_joints;
        pose.rail_z = current.rail_z;
        pose.rail_x = current.rail_x;
        self.move_joint(&pose, ProfileSlot::Slow, false, false).await
    }

    /// Parks the rails for a target location, with vertical clearance above
    /// it. `None` keeps the corresponding rail where it is.
    pub async fn move_rails_neutral(
        &self,
        v_rail: Option<f64>,
        h_rail: Option<f64>,
    ) -> Result<(), TcsError> {
        let current = self.joint_state().await?;
        let mut pose = self.workcell.neutral_joints;
        pose.rail_z = v_rail.unwrap_or(current.rail_z) + self.workcell.rail_clearance;
        pose.rail_x = h_rail.unwrap_or(current.rail_x);
        self.move_joint(&pose, ProfileSlot::Slow, false, false).await
    }

    /// Full neutral transition: gripper, then arm, then rails aligned to
    /// `target` (or the current location when `None`).
    pub async fn move_all_joints_neutral(
        &self,
        target: Option<&JointPose>,
    ) -> Result<(), TcsError> {
        let target = match target {
            Some(pose) => *pose,
            None => self.joint_state().await?,
        };
        self.move_gripper_neutral().await?;
        self.move_arm_neutral().await?;
        self.move_rails_neutral(Some(target.rail_z), Some(target.rail_x)).await
    }

    /// Recomputes a deck pose with the plate rotated by `rotation_deg`
    /// around the deck center, compensating the deck-center offset and the
    /// side-dependent yaw sign.
    pub fn rotated_pose(
        &self,
        pose: &JointPose,
        rotation_deg: f64,
    ) -> Result<JointPose, TcsError> {
        let (mut cartesian, phi, rail) = self.kinematics().forward(pose);

        if rotation_deg == -90.0 {
            cartesian.y += self.workcell.deck_rotation_y_shift;
            cartesian.x -= self.workcell.deck_rotation_x_shift;
        } else if rotation_deg == 90.0 {
            cartesian.y -= self.workcell.deck_rotation_y_shift;
            cartesian.x += self.workcell.deck_rotation_x_shift;
        }

        // Yaw sign flips with the side of the rail the location sits on.
        if cartesian.y < 0.0 {
            cartesian.yaw += rotation_deg;
        } else {
            cartesian.yaw -= rotation_deg;
        }

        let mut solution = self
            .kinematics()
            .inverse(&cartesian, phi, rail)
            .into_iter()
            .next()
            .ok_or_else(|| {
                TcsError::Configuration(format!(
                    "no joint solution for rotated pose at ({:.1}, {:.1})",
                    cartesian.x, cartesian.y
                ))
            })?;
        solution.gripper = pose.gripper;
        Ok(solution)
    }

    /// Fixes a location whose recorded orientation contradicts its rotation
    /// tag. Only clearly stale recordings are corrected: the recorded yaw
    /// must be inside the tolerance window around zero while a non-zero
    /// rotation was requested. Ambiguous recordings are left alone.
    pub fn check_plate_orientation(
        &self,
        pose: &JointPose,
        rotation: PlateRotation,
    ) -> Result<JointPose, TcsError> {
        let (cartesian, _, _) = self.kinematics().forward(pose);
        let tolerance = self.config.orientation_tolerance_deg;
        if rotation.degrees() != 0.0 && cartesian.yaw.abs() < tolerance {
            info!(yaw = cartesian.yaw, "correcting stale location orientation");
            return self.rotated_pose(pose, -rotation.degrees());
        }
        Ok(*pose)
    }

    /// Picks a plate: neutral, above the source, down with the gripper
    /// open, grasp, straight-up retract, back to neutral. The retract and
    /// neutral happen even when the plate is missing so the arm never stays
    /// parked inside a module; the missing plate then surfaces as
    /// `PlateMissing`.
    pub async fn pick_plate(&self, source: &JointPose) -> Result<(), TcsError> {
        let source = *source;
        let above = source.lifted(self.workcell.approach_height);

        self.move_all_joints_neutral(Some(&source)).await?;
        self.move_joint(&above, ProfileSlot::Fast, false, false).await?;
        self.move_joint(&source, ProfileSlot::Fast, false, true).await?;
        let grasped = self
            .grasp_plate(self.workcell.plate_width, self.workcell.grasp_speed, self.workcell.grasp_force)
            .await?;
        self.move_in_one_axis(ProfileSlot::Slow, 0.0, 0.0, self.workcell.retract_height).await?;
        self.move_all_joints_neutral(Some(&source)).await?;

        if grasped == PlateState::Missing {
            return Err(TcsError::PlateMissing);
        }
        Ok(())
    }

    /// Places the held plate: neutral, above the target, down, release,
    /// straight-up retract, back to neutral.
    pub async fn place_plate(&self, target: &JointPose) -> Result<(), TcsError> {
        let target = *target;
        let above = target.lifted(self.workcell.approach_height);

        self.move_all_joints_neutral(Some(&target)).await?;
        self.move_joint(&above, ProfileSlot::Slow, false, false).await?;
        self.move_joint(&target, ProfileSlot::Slow, false, false).await?;
        self.release_plate(self.workcell.release_width, self.workcell.release_speed).await?;
        self.move_in_one_axis(ProfileSlot::Slow, 0.0, 0.0, self.workcell.retract_height).await?;
        self.move_all_joints_neutral(Some(&target)).await
    }

    /// Changes the held plate's orientation on the rotation deck: set it
    /// down, let go, re-grasp rotated by `rotation_deg`. A -90 degree
    /// rotation lifts the vertical rail by the deck offset before the
    /// transition and removes it after.
    pub async fn rotate_plate_on_deck(&self, rotation_deg: f64) -> Result<(), TcsError> {
        let mut target = self.workcell.rotation_deck;

        if rotation_deg == -90.0 {
            target = self.rotated_pose(&target, -rotation_deg)?;
            target.rail_z += self.workcell.deck_lift;
        }

        let above = target.lifted(self.workcell.approach_height);
        self.move_all_joints_neutral(Some(&target)).await?;
        self.move_joint(&above, ProfileSlot::Slow, false, false).await?;
        self.move_joint(&target, ProfileSlot::Slow, false, false).await?;
        self.release_plate(self.workcell.release_width, self.workcell.release_speed).await?;
        self.move_in_one_axis(ProfileSlot::Slow, 0.0, 0.0, self.workcell.retract_height).await?;

        if rotation_deg == -90.0 {
            target.rail_z -= self.workcell.deck_lift;
        }

        // Come back at the new orientation and take the plate again.
        target = self.rotated_pose(&target, rotation_deg)?;
        let above = target.lifted(self.workcell.approach_height);
        self.move_joint(&above, ProfileSlot::Slow, false, false).await?;
        self.move_joint(&target, ProfileSlot::Slow, false, true).await?;
        let grasped = self
            .grasp_plate(self.workcell.plate_width, self.workcell.grasp_speed, self.workcell.grasp_force)
            .await?;
        self.move_in_one_axis(ProfileSlot::Slow, 0.0, 0.0, self.workcell.retract_height).await?;
        self.move_all_joints_neutral(Some(&target)).await?;

        if grasped == PlateState::Missing {
            return Err(TcsError::PlateMissing);
        }
        Ok(())
    }

    /// Transfers a plate from `source` to `target`, routing through the
    /// rotation deck when the two rotation tags differ. Aborts cleanly,
    /// without ever approaching the target, when the source turns out to be
    /// empty.
    pub async fn transfer(
        &self,
        source: &JointPose,
        target: &JointPose,
        source_rotation_tag: &str,
        target_rotation_tag: &str,
    ) -> Result<OperationOutcome, TcsError> {
        let source_rotation = PlateRotation::from_tag(source_rotation_tag)?;
        let target_rotation = PlateRotation::from_tag(target_rotation_tag)?;

        let source = self.check_plate_orientation(source, source_rotation)?;
        let target = self.check_plate_orientation(target, target_rotation)?;

        self.force_initialize().await?;

        match self.pick_plate(&source).await {
            Ok(()) => {}
            Err(TcsError::PlateMissing) => {
                warn!("transfer aborted, no plate at the source");
                return Ok(OperationOutcome::Aborted(AbortReason::PlateMissing));
            }
            Err(e) => return Err(e),
        }

        match (source_rotation, target_rotation) {
            (PlateRotation::Wide, PlateRotation::Narrow) => {
                self.rotate_plate_on_deck(-source_rotation.degrees()).await?;
            }
            (PlateRotation::Narrow, PlateRotation::Wide) => {
                self.rotate_plate_on_deck(target_rotation.degrees()).await?;
            }
            _ => {}
        }

        self.place_plate(&target).await?;
        info!("transfer completed");
        Ok(OperationOutcome::Completed)
    }

    /// Lifts the lid off the plate at `target` and parks it on the lid deck.
    pub async fn remove_lid(
        &self,
        target: &JointPose,
        rotation_tag: &str,
    ) -> Result<OperationOutcome, TcsError> {
        let rotation = PlateRotation::from_tag(rotation_tag)?;

        self.force_initialize().await?;

        let mut target = self.check_plate_orientation(target, rotation)?;
        target.rail_z += self.workcell.lid_height;

        match self.pick_plate(&target).await {
            Ok(()) => {}
            Err(TcsError::PlateMissing) => {
                warn!("remove_lid aborted, no lid at the target");
                return Ok(OperationOutcome::Aborted(AbortReason::PlateMissing));
            }
            Err(e) => return Err(e),
        }

        if rotation == PlateRotation::Wide {
            // The lid deck holds lids at 0 degrees.
            self.rotate_plate_on_deck(-rotation.degrees()).await?;
        }

        let lid_deck = self.workcell.lid_deck;
        self.place_plate(&lid_deck).await?;
        info!("lid removed");
        Ok(OperationOutcome::Completed)
    }

    /// Takes the parked lid from the lid deck and puts it back on the plate
    /// at `target`.
    pub async fn replace_lid(
        &self,
        target: &JointPose,
        rotation_tag: &str,
    ) -> Result<OperationOutcome, TcsError> {
        let rotation = PlateRotation::from_tag(rotation_tag)?;

        self.force_initialize().await?;

        let lid_deck = self.workcell.lid_deck;
        match self.pick_plate(&lid_deck).await {
            Ok(()) => {}
            Err(TcsError::PlateMissing) => {
                warn!("replace_lid aborted, no lid parked on the lid deck");
                return Ok(OperationOutcome::Aborted(AbortReason::PlateMissing));
            }
            Err(e) => return Err(e),
        }

        if rotation == PlateRotation::Wide {
            self.rotate_plate_on_deck(rotation.degrees()).await?;
        }

        let mut target = self.check_plate_orientation(target, rotation)?;
        target.rail_z += self.workcell.lid_height;
        self.place_plate(&target).await?;
        info!("lid replaced");
        Ok(OperationOutcome::Completed)
    }
}
