use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::drivers::Pf400Driver;
use crate::{JointPose, ProfileSlot, TcsError};

/// Which camera faces the module being scanned at a rail stop.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSide {
    Left,
    Right,
}

/// Vision capability consumed by the explorer: look at one side of the rail
/// and report the module identifier printed there, if any. Camera access and
/// QR decoding live behind this boundary.
pub trait ModuleScanner: Send + Sync {
    fn scan(&self, side: ScanSide) -> Option<String>;
}

/// Scan-pattern tuning. The defaults match the reference workcell: four rail
/// stops one module pitch apart.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExplorerConfig {
    pub scan_stops: u32,
    /// Rail travel between stops, in millimeters.
    pub rail_step: f64,
    /// Module frame depth used when mirroring a right-side target.
    pub module_length: f64,
    /// X offset from the robot origin to the right-side module row.
    pub robot_x_offset: f64,
    /// Gripper width stored into discovered approach poses.
    pub open_gripper: f64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            scan_stops: 4,
            rail_step: 660.0,
            module_length: 50.0,
            robot_x_offset: 700.0,
            open_gripper: 127.0,
        }
    }
}

/// Drives the arm through a fixed scan pattern along the rail and populates
/// a module-identifier to approach-pose map from what the scanner sees.
pub struct WorkcellExplorer {
    driver: Pf400Driver,
    scanner: Box<dyn ModuleScanner>,
    config: ExplorerConfig,
    locations: HashMap<String, JointPose>,
}

impl WorkcellExplorer {
    pub fn new(driver: Pf400Driver, scanner: Box<dyn ModuleScanner>, config: ExplorerConfig) -> Self {
        Self { driver, scanner, config, locations: HashMap::new() }
    }

    pub fn locations(&self) -> &HashMap<String, JointPose> {
        &self.locations
    }

    /// Runs the scan pattern: for each rail stop, close the gripper, move
    /// there, scan both sides, and record any module not seen at the
    /// previous stop.
    pub async fn explore(&mut self) -> Result<&HashMap<String, JointPose>, TcsError> {
        self.driver.force_initialize().await?;
        self.driver.move_all_joints_neutral(None).await?;

        let mut stop = self.driver.joint_state().await?;
        let mut last_left: Option<String> = None;
        let mut last_right: Option<String> = None;

        for _ in 0..self.config.scan_stops {
            self.driver.move_joint(&stop, ProfileSlot::Fast, true, false).await?;

            if let Some(name) = self.scanner.scan(ScanSide::Left) {
                if last_left.as_deref() != Some(&name) {
                    let pose = self.module_target(&stop, ScanSide::Left)?;
                    info!(module = %name, "module found on the left");
                    self.locations.insert(name.clone(), pose);
                    last_left = Some(name);
                }
            }

            if let Some(name) = self.scanner.scan(ScanSide::Right) {
                if last_right.as_deref() != Some(&name) {
                    let pose = self.module_target(&stop, ScanSide::Right)?;
                    info!(module = %name, "module found on the right");
                    self.locations.insert(name.clone(), pose);
                    last_right = Some(name);
                }
            }

            stop.rail_x += self.config.rail_step;
        }

        info!(modules = self.locations.len(), "workcell exploration completed");
        Ok(&self.locations)
    }

    /// Approach pose for the module seen from `stop`. Left-side modules are
    /// taken where the arm points; right-side targets are mirrored across
    /// the rail and pushed out by the module length and the robot-to-module
    /// X offset.
    fn module_target(&self, stop: &JointPose, side: ScanSide) -> Result<JointPose, TcsError> {
        let (mut cartesian, phi, _) = self.driver.kinematics().forward(stop);

        if side == ScanSide::Right {
            cartesian.x = (cartesian.x - self.config.robot_x_offset) - self.config.module_length;
            cartesian.y = -cartesian.y;
        }

        let mut pose = self
            .driver
            .kinematics()
            .inverse(&cartesian, phi, stop.rail_x)
            .into_iter()
            .next()
            .ok_or_else(|| {
                TcsError::Configuration(format!(
                    "no joint solution for module target at ({:.1}, {:.1})",
                    cartesian.x, cartesian.y
                ))
            })?;
        pose.gripper = self.config.open_gripper;
        pose.rail_z = cartesian.z;
        pose.rail_x = stop.rail_x;
        Ok(pose)
    }
}
