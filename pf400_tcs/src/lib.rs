use serde::{Deserialize, Serialize};

pub mod errors;
pub use errors::*;

pub mod protocol;
pub mod state;
pub mod kinematics;
pub mod locations;

#[cfg(feature = "driver")]
pub mod drivers;
#[cfg(feature = "driver")]
pub mod explorer;

/// One snapshot of the six PF400 axes, in controller units:
/// millimeters for the two rails and the gripper, degrees for the arm joints.
///
/// Axis order on the wire is `rail_z shoulder elbow wrist gripper rail_x`,
/// matching the controller's `wherej`/`movej` argument order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct JointPose {
    pub rail_z: f64,
    pub shoulder: f64,
    pub elbow: f64,
    pub wrist: f64,
    pub gripper: f64,
    pub rail_x: f64,
}

impl JointPose {
    pub fn new(rail_z: f64, shoulder: f64, elbow: f64, wrist: f64, gripper: f64, rail_x: f64) -> Self {
        Self { rail_z, shoulder, elbow, wrist, gripper, rail_x }
    }

    pub fn from_values(v: [f64; 6]) -> Self {
        Self::new(v[0], v[1], v[2], v[3], v[4], v[5])
    }

    pub fn values(&self) -> [f64; 6] {
        [self.rail_z, self.shoulder, self.elbow, self.wrist, self.gripper, self.rail_x]
    }

    /// Same pose with the vertical rail raised by `dz` millimeters.
    pub fn lifted(&self, dz: f64) -> Self {
        let mut pose = *self;
        pose.rail_z += dz;
        pose
    }

    /// Space-separated axis values as the controller expects them.
    pub fn render(&self) -> String {
        self.values().map(|v| v.to_string()).join(" ")
    }
}

/// End-effector pose at the kinematics boundary. The rail offset travels
/// alongside this as a separate value, never inside it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct CartesianPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl CartesianPose {
    pub fn from_values(v: [f64; 6]) -> Self {
        Self { x: v[0], y: v[1], z: v[2], yaw: v[3], pitch: v[4], roll: v[5] }
    }

    pub fn values(&self) -> [f64; 6] {
        [self.x, self.y, self.z, self.yaw, self.pitch, self.roll]
    }

    pub fn render(&self) -> String {
        self.values().map(|v| v.to_string()).join(" ")
    }
}

/// The eight tuning parameters of one controller motion profile slot.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    pub speed: f64,
    pub speed2: f64,
    pub acceleration: f64,
    pub deceleration: f64,
    pub accel_ramp: f64,
    pub decel_ramp: f64,
    pub in_range: f64,
    pub straight: f64,
}

impl MotionProfile {
    /// Builds a profile from a raw parameter list. The controller's `Profile`
    /// verb takes exactly eight values; any other count is a caller error.
    pub fn from_values(values: &[f64]) -> Result<Self, TcsError> {
        if values.len() != 8 {
            return Err(TcsError::Configuration(format!(
                "motion profile takes 8 parameters, {} were given",
                values.len()
            )));
        }
        Ok(Self {
            speed: values[0],
            speed2: values[1],
            acceleration: values[2],
            deceleration: values[3],
            accel_ramp: values[4],
            decel_ramp: values[5],
            in_range: values[6],
            straight: values[7],
        })
    }

    pub fn values(&self) -> [f64; 8] {
        [
            self.speed,
            self.speed2,
            self.acceleration,
            self.deceleration,
            self.accel_ramp,
            self.decel_ramp,
            self.in_range,
            self.straight,
        ]
    }

    pub fn render(&self) -> String {
        self.values().map(|v| v.to_string()).join(" ")
    }

    /// Default slot-1 profile, used for approach and carry moves.
    pub fn slow() -> Self {
        Self {
            speed: 45.0,
            speed2: 0.0,
            acceleration: 100.0,
            deceleration: 100.0,
            accel_ramp: 0.1,
            decel_ramp: 0.1,
            in_range: 10.0,
            straight: 0.0,
        }
    }

    /// Default slot-2 profile, used for free-air transit moves.
    pub fn fast() -> Self {
        Self {
            speed: 100.0,
            speed2: 0.0,
            acceleration: 100.0,
            deceleration: 100.0,
            accel_ramp: 0.1,
            decel_ramp: 0.1,
            in_range: 10.0,
            straight: 0.0,
        }
    }
}

/// Controller profile slots. Slots 1 and 2 hold the fixed defaults written at
/// initialization; slot 3 is the only slot callers may overwrite.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, int_enum::IntEnum)]
#[repr(u8)]
pub enum ProfileSlot {
    Slow = 1,
    Fast = 2,
    Custom = 3,
}

impl ProfileSlot {
    pub fn id(self) -> u8 {
        self as u8
    }
}

/// Logical plate orientation on a deck. "narrow" (or an empty tag) is the 0
/// degree convention, "wide" is 90 degrees.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlateRotation {
    Narrow,
    Wide,
}

impl PlateRotation {
    pub fn from_tag(tag: &str) -> Result<Self, TcsError> {
        match tag.to_ascii_lowercase().as_str() {
            "" | "narrow" => Ok(Self::Narrow),
            "wide" => Ok(Self::Wide),
            other => Err(TcsError::Configuration(format!(
                "unknown plate rotation tag: {other:?} (expected \"narrow\", \"wide\" or \"\")"
            ))),
        }
    }

    pub fn degrees(self) -> f64 {
        match self {
            Self::Narrow => 0.0,
            Self::Wide => 90.0,
        }
    }
}
