use crate::{CartesianPose, JointPose};

/// Coordinate-transform capability consumed by the choreography layer and the
/// workcell explorer. Implementations live outside this crate (the `sim`
/// crate ships one); the driver holds a reference and never does the math
/// itself.
pub trait Kinematics: Send + Sync {
    /// Maps a joint snapshot to the end-effector pose, the wrist phi angle in
    /// degrees, and the horizontal rail position in millimeters.
    fn forward(&self, joints: &JointPose) -> (CartesianPose, f64, f64);

    /// Candidate joint solutions reaching `target` with wrist angle `phi` at
    /// rail position `rail`, best candidate first. Empty when the target is
    /// out of reach.
    fn inverse(&self, target: &CartesianPose, phi: f64, rail: f64) -> Vec<JointPose>;
}
