use std::sync::Arc;

use pf400_tcs::drivers::{Pf400Driver, Pf400DriverConfig, Workcell};
use pf400_tcs::{JointPose, TcsError};
use sim::Pf400Kinematics;
use tracing::info;

/// Moves a plate from the liquid handler deck to the sealer nest. Point the
/// address at a real TCS, or run the `sim` binary first and leave the
/// default in place.
#[tokio::main]
async fn main() -> Result<(), TcsError> {
    tracing_subscriber::fmt().init();

    let addr = std::env::args().nth(1).unwrap_or_else(|| "127.0.0.1".to_string());
    let config = Pf400DriverConfig::new(addr, 10100);

    let driver =
        Pf400Driver::connect(config, Workcell::default(), Arc::new(Pf400Kinematics::default()))
            .await?;
    info!("connected");

    driver.force_initialize().await?;
    let state = driver.state().await;
    info!(?state, "robot initialized");

    let ot2_deck = JointPose::new(262.550, 20.608, 119.290, 662.570, 0.0, 574.367);
    let sealer = JointPose::new(231.788, 26.154, 115.144, 661.672, 0.0, 995.074);

    let outcome = driver.transfer(&ot2_deck, &sealer, "narrow", "narrow").await?;
    info!(?outcome, "transfer finished");

    driver.disconnect().await
}
