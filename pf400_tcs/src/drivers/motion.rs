use tracing::{info, warn};

use crate::protocol::{parse_cartesian, parse_joints, tokens, TcsCommand};
use crate::state::PlateState;
use crate::{CartesianPose, JointPose, MotionProfile, ProfileSlot, TcsError};

use super::Pf400Driver;

impl Pf400Driver {
    /// Current joint snapshot from `wherej`.
    pub async fn joint_state(&self) -> Result<JointPose, TcsError> {
        let reply = self.execute(&TcsCommand::WhereJoints).await?;
        parse_joints(&reply)
    }

    /// Current end-effector pose from `whereC`.
    pub async fn cartesian_state(&self) -> Result<CartesianPose, TcsError> {
        let reply = self.execute(&TcsCommand::WhereCartesian).await?;
        parse_cartesian(&reply)
    }

    pub async fn gripper_width(&self) -> Result<f64, TcsError> {
        Ok(self.joint_state().await?.gripper)
    }

    /// Open iff the fingers sit measurably wider than the closed setpoint.
    pub async fn gripper_is_open(&self) -> Result<bool, TcsError> {
        let width = self.gripper_width().await?;
        Ok(width > self.workcell.gripper_closed_width + 1.0)
    }

    /// Joint-space move.
    ///
    /// The gripper flags are mutually exclusive; requesting both is a
    /// configuration error caught before anything is sent. With neither flag
    /// set the gripper axis is carried over from the live state, not taken
    /// from the caller's pose, so an unrelated joint move can never move the
    /// fingers as a side effect. The caller's pose is never mutated.
    pub async fn move_joint(
        &self,
        target: &JointPose,
        profile: ProfileSlot,
        gripper_close: bool,
        gripper_open: bool,
    ) -> Result<(), TcsError> {
        if gripper_close && gripper_open {
            return Err(TcsError::Configuration(
                "gripper cannot be opened and closed in the same move".to_string(),
            ));
        }

        let mut pose = *target;
        pose.gripper = if gripper_close {
            self.workcell.gripper_closed_width
        } else if gripper_open {
            self.workcell.gripper_open_width
        } else {
            self.gripper_width().await?
        };

        self.execute(&TcsCommand::MoveJoints { profile, pose }).await?;
        Ok(())
    }

    /// Cartesian-space move.
    pub async fn move_cartesian(
        &self,
        target: &CartesianPose,
        profile: ProfileSlot,
    ) -> Result<(), TcsError> {
        self.execute(&TcsCommand::MoveCartesian { profile, pose: *target }).await?;
        Ok(())
    }

    /// Moves the end effector by millimeter deltas applied to the live
    /// cartesian read, re-issued as a cartesian move.
    pub async fn move_in_one_axis(
        &self,
        profile: ProfileSlot,
        dx: f64,
        dy: f64,
        dz: f64,
    ) -> Result<(), TcsError> {
        let mut pose = self.cartesian_state().await?;
        pose.x += dx;
        pose.y += dy;
        pose.z += dz;
        self.move_cartesian(&pose, profile).await
    }

    /// Force-controlled grasp with a bounded linear width search.
    ///
    /// A "no plate" reply narrows the width by 1 mm and tries again; this is
    /// a search for the true plate edge, not fault recovery, and it
    /// terminates at the configured floor with `PlateState::Missing`. The
    /// device outcome travels in the returned plate state; callers decide
    /// whether missing aborts their sequence.
    pub async fn grasp_plate(
        &self,
        width: f64,
        speed: u8,
        force: i8,
    ) -> Result<PlateState, TcsError> {
        let floor = self.config.grasp_width_floor;
        let mut width = width;
        loop {
            let reply = self.execute(&TcsCommand::GraspPlate { width, speed, force }).await?;
            match tokens(&reply).get(1).copied() {
                Some("-1") => {
                    info!(width, "plate grasped");
                    self.set_plate_state(PlateState::Held).await;
                    return Ok(PlateState::Held);
                }
                Some("0") if width > floor => {
                    width -= 1.0;
                }
                Some("0") => {
                    warn!(floor, "no plate found down to the width floor");
                    self.set_plate_state(PlateState::Missing).await;
                    return Ok(PlateState::Missing);
                }
                _ => {
                    return Err(TcsError::Protocol(format!("unexpected grasp reply: {reply:?}")));
                }
            }
        }
    }

    /// Single-shot release.
    pub async fn release_plate(&self, width: f64, speed: u8) -> Result<(), TcsError> {
        let reply = self.execute(&TcsCommand::ReleasePlate { width, speed }).await?;
        match tokens(&reply).first().copied() {
            Some("0") => {
                self.set_plate_state(PlateState::Empty).await;
                Ok(())
            }
            _ => {
                warn!(%reply, "plate was not released");
                Err(TcsError::ReleaseFailed)
            }
        }
    }

    pub async fn set_gripper_open(&self, width: f64) -> Result<(), TcsError> {
        self.execute(&TcsCommand::GripOpenPos(width)).await?;
        Ok(())
    }

    pub async fn set_gripper_close(&self, width: f64) -> Result<(), TcsError> {
        self.execute(&TcsCommand::GripClosePos(width)).await?;
        Ok(())
    }

    /// Writes the two fixed default profiles into slots 1 and 2.
    pub async fn write_default_profiles(&self) -> Result<(), TcsError> {
        self.execute(&TcsCommand::WriteProfile {
            slot: ProfileSlot::Slow,
            profile: MotionProfile::slow(),
        })
        .await?;
        self.execute(&TcsCommand::WriteProfile {
            slot: ProfileSlot::Fast,
            profile: MotionProfile::fast(),
        })
        .await?;
        Ok(())
    }

    /// Writes a caller-supplied profile into slot 3, the only
    /// user-programmable slot. Rejects any parameter count other than 8.
    pub async fn write_custom_profile(&self, values: &[f64]) -> Result<(), TcsError> {
        let profile = MotionProfile::from_values(values)?;
        self.execute(&TcsCommand::WriteProfile { slot: ProfileSlot::Custom, profile }).await?;
        Ok(())
    }
}
