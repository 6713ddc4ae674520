use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CartesianPose, JointPose, MotionProfile, ProfileSlot};

/// One line-oriented TCS command. Each variant renders to exactly one ASCII
/// line and is answered by exactly one terminated reply; there is no
/// pipelining on this link.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum TcsCommand {
    /// `hp 1`:enable high power.
    EnablePower,
    /// `hp 0`:disable high power.
    DisablePower,
    /// `hp`:query the power state.
    QueryPower,
    /// `attach <n>`:bind the control channel to robot `n`.
    Attach(u8),
    /// `attach`:query the attach state.
    QueryAttach,
    /// `home`:home all axes. Blocks on the controller side.
    Home,
    /// `pd <station>`:proximity of the arm to a taught reference station,
    /// used as the homed-position probe.
    QueryHomeProximity(u32),
    /// `sysState`:overall controller state code.
    QuerySystemState,
    /// `state`:motion phase ordinal (0 power off, 1 idle, 2/3 moving).
    QueryMotionState,
    /// `wherej`:current joint values.
    WhereJoints,
    /// `whereC`:current cartesian pose plus rail offset.
    WhereCartesian,
    /// `movej <profile> <6 joint values>`.
    MoveJoints { profile: ProfileSlot, pose: JointPose },
    /// `MoveC <profile> <6 cartesian values>`.
    MoveCartesian { profile: ProfileSlot, pose: CartesianPose },
    /// `GripOpenPos <mm>`:taught gripper open setpoint.
    GripOpenPos(f64),
    /// `GripClosePos <mm>`:taught gripper closed setpoint.
    GripClosePos(f64),
    /// `GraspPlate <width> <speed> <force>`:force-controlled grasp.
    GraspPlate { width: f64, speed: u8, force: i8 },
    /// `ReleasePlate <width> <speed>`.
    ReleasePlate { width: f64, speed: u8 },
    /// `Profile <slot> <8 values>`:write a motion profile slot.
    WriteProfile { slot: ProfileSlot, profile: MotionProfile },
    /// `mode <0|1>`:nonverbose/verbose reply framing.
    Mode(u8),
    /// `selectrobot <n>`:route subsequent commands to robot `n`.
    SelectRobot(u8),
}

impl fmt::Display for TcsCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TcsCommand::EnablePower => write!(f, "hp 1"),
            TcsCommand::DisablePower => write!(f, "hp 0"),
            TcsCommand::QueryPower => write!(f, "hp"),
            TcsCommand::Attach(id) => write!(f, "attach {}", id),
            TcsCommand::QueryAttach => write!(f, "attach"),
            TcsCommand::Home => write!(f, "home"),
            TcsCommand::QueryHomeProximity(station) => write!(f, "pd {}", station),
            TcsCommand::QuerySystemState => write!(f, "sysState"),
            TcsCommand::QueryMotionState => write!(f, "state"),
            TcsCommand::WhereJoints => write!(f, "wherej"),
            TcsCommand::WhereCartesian => write!(f, "whereC"),
            TcsCommand::MoveJoints { profile, pose } => {
                write!(f, "movej {} {}", profile.id(), pose.render())
            }
            TcsCommand::MoveCartesian { profile, pose } => {
                write!(f, "MoveC {} {}", profile.id(), pose.render())
            }
            TcsCommand::GripOpenPos(width) => write!(f, "GripOpenPos {}", width),
            TcsCommand::GripClosePos(width) => write!(f, "GripClosePos {}", width),
            TcsCommand::GraspPlate { width, speed, force } => {
                write!(f, "GraspPlate {} {} {}", width, speed, force)
            }
            TcsCommand::ReleasePlate { width, speed } => {
                write!(f, "ReleasePlate {} {}", width, speed)
            }
            TcsCommand::WriteProfile { slot, profile } => {
                write!(f, "Profile {} {}", slot.id(), profile.render())
            }
            TcsCommand::Mode(mode) => write!(f, "mode {}", mode),
            TcsCommand::SelectRobot(id) => write!(f, "selectrobot {}", id),
        }
    }
}
