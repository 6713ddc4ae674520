use tokio::time::sleep;
use std::time::Duration;
use tracing::{info, warn};

use crate::protocol::TcsCommand;
use crate::state::{AttachState, HomeState, PowerState, RobotState};
use crate::TcsError;

use super::Pf400Driver;

impl Pf400Driver {
    /// Drives the robot from whatever state it is in to fully initialized
    /// and ready.
    ///
    /// Each attempt refreshes the state and remediates only the failing
    /// sub-states: enable power, attach the control channel, home, then
    /// rewrite the default motion profiles and gripper setpoints. Transient
    /// controller faults during remediation are absorbed and retried; after
    /// the configured attempt cap the driver gives up with
    /// `InitializationFailed` instead of looping forever.
    pub async fn force_initialize(&self) -> Result<(), TcsError> {
        let cap = self.config.init_attempts;
        for attempt in 1..=cap {
            let state = self.refresh_state().await;
            if state.is_ready() {
                self.clear_fault().await;
                return Ok(());
            }
            info!(attempt, cap, "robot not ready, remediating");
            self.remediate(&state).await;
        }

        if self.refresh_state().await.is_ready() {
            self.clear_fault().await;
            return Ok(());
        }
        warn!(cap, "robot failed to reach ready state");
        Err(TcsError::InitializationFailed(cap))
    }

    /// One remediation pass. Individual command faults are logged by the
    /// protocol engine and deliberately not propagated; the readiness
    /// re-check decides whether the pass worked.
    async fn remediate(&self, state: &RobotState) {
        if state.power != PowerState::On {
            let _ = self.execute(&TcsCommand::EnablePower).await;
            sleep(Duration::from_millis(self.config.power_settle_ms)).await;
        }

        if state.attach != AttachState::Attached {
            let _ = self.execute(&TcsCommand::Attach(self.config.robot_id)).await;
            sleep(Duration::from_millis(self.config.attach_settle_ms)).await;
        }

        if state.home != HomeState::Homed {
            let _ = self.execute(&TcsCommand::Home).await;
            sleep(Duration::from_millis(self.config.home_settle_ms)).await;
        }

        let _ = self.write_default_profiles().await;
        let _ = self.set_gripper_open(self.workcell.gripper_open_width).await;
        let _ = self.set_gripper_close(self.workcell.gripper_closed_width).await;
    }
}
