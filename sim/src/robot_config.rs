use serde::{Deserialize, Serialize};

/// Link geometry of the PF400 arm: two rotary links in the horizontal plane,
/// carried by the vertical and horizontal rails. Lengths in millimeters.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Pf400Geometry {
    /// Shoulder-to-elbow link length.
    pub upper_arm: f64,
    /// Elbow-to-gripper-center link length.
    pub forearm: f64,
}

impl Default for Pf400Geometry {
    fn default() -> Self {
        Self { upper_arm: 302.0, forearm: 289.0 }
    }
}
