use pf400_tcs::kinematics::Kinematics;
use pf400_tcs::{CartesianPose, JointPose};

use crate::robot_config::Pf400Geometry;

/// Planar two-link kinematics for the PF400: the shoulder and elbow place
/// the gripper center in the XY plane, the wrist sets the yaw, and the two
/// rails carry Z and the lateral offset unchanged.
#[derive(Debug, Clone, Default)]
pub struct Pf400Kinematics {
    geometry: Pf400Geometry,
}

impl Pf400Kinematics {
    pub fn new(geometry: Pf400Geometry) -> Self {
        Self { geometry }
    }
}

/// Wraps an angle in degrees into [-180, 180).
fn normalize_deg(deg: f64) -> f64 {
    ((deg % 360.0) + 540.0) % 360.0 - 180.0
}

impl Kinematics for Pf400Kinematics {
    fn forward(&self, joints: &JointPose) -> (CartesianPose, f64, f64) {
        let a2 = self.geometry.upper_arm;
        let a3 = self.geometry.forearm;
        let t2 = joints.shoulder.to_radians();
        let t23 = (joints.shoulder + joints.elbow).to_radians();

        let yaw = normalize_deg(joints.shoulder + joints.elbow + joints.wrist);
        let pose = CartesianPose {
            x: a2 * t2.cos() + a3 * t23.cos(),
            y: a2 * t2.sin() + a3 * t23.sin(),
            z: joints.rail_z,
            yaw,
            pitch: 0.0,
            roll: 0.0,
        };
        (pose, yaw, joints.rail_x)
    }

    fn inverse(&self, target: &CartesianPose, phi: f64, rail: f64) -> Vec<JointPose> {
        let a2 = self.geometry.upper_arm;
        let a3 = self.geometry.forearm;

        let reach_sq = target.x * target.x + target.y * target.y;
        let cos_elbow = (reach_sq - a2 * a2 - a3 * a3) / (2.0 * a2 * a3);
        if !(-1.0..=1.0).contains(&cos_elbow) {
            return Vec::new();
        }

        let elbow_mag = cos_elbow.acos();
        // Elbow-positive first; it matches the taught workcell poses.
        [elbow_mag, -elbow_mag]
            .into_iter()
            .map(|t3| {
                let k1 = a2 + a3 * t3.cos();
                let k2 = a3 * t3.sin();
                let t2 = target.y.atan2(target.x) - k2.atan2(k1);

                let shoulder = t2.to_degrees();
                let elbow = t3.to_degrees();
                // Offset keeps the wrist in the controller's positive range
                // while preserving the commanded yaw modulo 360.
                let wrist = normalize_deg(phi - shoulder - elbow) + 720.0;

                JointPose {
                    rail_z: target.z,
                    shoulder,
                    elbow,
                    wrist,
                    gripper: 0.0,
                    rail_x: rail,
                }
            })
            .collect()
    }
}
