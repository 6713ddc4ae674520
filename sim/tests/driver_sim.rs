use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pf400_tcs::drivers::{OperationOutcome, AbortReason, Pf400Driver, Pf400DriverConfig, Workcell};
use pf400_tcs::explorer::{ExplorerConfig, ModuleScanner, ScanSide, WorkcellExplorer};
use pf400_tcs::state::{PlateState, PowerState};
use pf400_tcs::{JointPose, PlateRotation, ProfileSlot, TcsError};
use sim::{Pf400Kinematics, SimBehavior, SimTcs};

/// Taught poses borrowed from the reference workcell.
fn hudson() -> JointPose {
    JointPose::new(262.550, 20.608, 119.290, 662.570, 0.0, 574.367)
}

fn thermocycler() -> JointPose {
    JointPose::new(281.0, 4.271, 95.676, 706.535, 126.0, -916.454)
}

async fn start(behavior: SimBehavior) -> (Pf400Driver, SimTcs) {
    start_with(behavior, |_| {}).await
}

async fn start_with(
    behavior: SimBehavior,
    tweak: impl FnOnce(&mut Pf400DriverConfig),
) -> (Pf400Driver, SimTcs) {
    let server = SimTcs::spawn("127.0.0.1:0", behavior).await.expect("sim failed to bind");

    let mut config = Pf400DriverConfig::new(server.addr.ip().to_string(), server.addr.port() as u32);
    // The simulator settles instantly; do not sit in real-hardware waits.
    config.power_settle_ms = 0;
    config.attach_settle_ms = 0;
    config.home_settle_ms = 0;
    config.busy_poll_ms = 2;
    config.busy_timeout_ms = 2_000;
    tweak(&mut config);

    let driver = Pf400Driver::connect(config, Workcell::default(), Arc::new(Pf400Kinematics::default()))
        .await
        .expect("driver failed to connect");
    (driver, server)
}

#[tokio::test]
async fn connect_defaults_to_nonverbose_framing() {
    let (_driver, server) = start(SimBehavior::default()).await;

    let sim = server.state.lock().await;
    assert_eq!(sim.mode, 0);
    assert_eq!(sim.selected_robot, None);
}

#[tokio::test]
async fn connect_in_verbose_mode_also_selects_the_robot() {
    let (driver, server) = start_with(SimBehavior::default(), |config| {
        config.mode = 1;
        config.robot_id = 1;
    })
    .await;

    {
        let sim = server.state.lock().await;
        assert_eq!(sim.mode, 1);
        assert_eq!(sim.selected_robot, Some(1));
    }

    // The session stays usable after the verbose handshake.
    driver.force_initialize().await.expect("initialization failed");
    assert!(driver.refresh_state().await.is_ready());
}

#[tokio::test]
async fn refresh_is_idempotent_without_intervening_commands() {
    let (driver, _server) = start(SimBehavior::default()).await;
    driver.force_initialize().await.expect("initialization failed");

    let first = driver.refresh_state().await;
    let second = driver.refresh_state().await;
    assert_eq!(first, second);
    assert!(first.is_ready());
}

#[tokio::test]
async fn refresh_reports_not_ready_before_initialization() {
    let (driver, _server) = start(SimBehavior::default()).await;
    let state = driver.refresh_state().await;
    assert_eq!(state.power, PowerState::Off);
    assert!(!state.is_ready());
}

#[tokio::test]
async fn move_joint_carries_gripper_axis_over_from_live_state() {
    let (driver, server) = start(SimBehavior::default()).await;
    driver.force_initialize().await.expect("initialization failed");

    let live_width = server.state.lock().await.joints.gripper;
    let mut target = hudson();
    target.gripper = 999.0; // must be ignored
    driver.move_joint(&target, ProfileSlot::Slow, false, false).await.expect("move failed");

    assert_eq!(server.state.lock().await.joints.gripper, live_width);
    assert_eq!(target.gripper, 999.0);
}

#[tokio::test]
async fn move_joint_rejects_conflicting_gripper_flags() {
    let (driver, server) = start(SimBehavior::default()).await;
    driver.force_initialize().await.expect("initialization failed");
    let motions_before = server.state.lock().await.motion_log.len();

    let result = driver.move_joint(&hudson(), ProfileSlot::Slow, true, true).await;
    assert!(matches!(result, Err(TcsError::Configuration(_))));
    // Rejected before anything was sent.
    assert_eq!(server.state.lock().await.motion_log.len(), motions_before);
}

#[tokio::test]
async fn grasp_search_terminates_at_the_width_floor() {
    let behavior = SimBehavior { plate_present: false, ..SimBehavior::default() };
    let (driver, server) = start(behavior).await;
    driver.force_initialize().await.expect("initialization failed");

    let outcome = driver.grasp_plate(123.0, 100, 10).await.expect("grasp exchange failed");
    assert_eq!(outcome, PlateState::Missing);
    assert_eq!(driver.plate_state().await, PlateState::Missing);

    let attempts = server.state.lock().await.grasp_attempts.clone();
    assert_eq!(attempts.len(), 44); // 123 down to 80 inclusive
    assert_eq!(attempts.first(), Some(&123.0));
    assert_eq!(attempts.last(), Some(&80.0));
    assert!(attempts.iter().all(|w| *w >= 80.0));
}

#[tokio::test]
async fn transfer_aborts_without_approaching_the_target_when_plate_is_missing() {
    let behavior = SimBehavior { plate_present: false, ..SimBehavior::default() };
    let (driver, server) = start(behavior).await;

    let source = hudson();
    let target = thermocycler();
    let outcome = driver.transfer(&source, &target, "narrow", "narrow").await.expect("transfer errored");
    assert_eq!(outcome, OperationOutcome::Aborted(AbortReason::PlateMissing));

    // The target rail position never shows up in any motion command.
    let motions = server.state.lock().await.motion_log.clone();
    assert!(!motions.is_empty());
    assert!(motions.iter().all(|line| !line.contains("-916.454")));
}

#[tokio::test]
async fn transfer_completes_and_releases_the_plate() {
    let (driver, _server) = start(SimBehavior::default()).await;

    let outcome = driver
        .transfer(&hudson(), &thermocycler(), "narrow", "narrow")
        .await
        .expect("transfer errored");
    assert_eq!(outcome, OperationOutcome::Completed);
    assert_eq!(driver.plate_state().await, PlateState::Empty);
}

#[tokio::test]
async fn transfer_routes_through_the_rotation_deck_when_tags_differ() {
    let (driver, server) = start(SimBehavior::default()).await;

    let outcome = driver
        .transfer(&hudson(), &thermocycler(), "narrow", "wide")
        .await
        .expect("transfer errored");
    assert_eq!(outcome, OperationOutcome::Completed);

    // Four grasps would be two transfers; one plain pick plus the deck
    // re-grasp means exactly two.
    let grasps = server.state.lock().await.grasp_attempts.len();
    assert_eq!(grasps, 2);
}

#[tokio::test]
async fn transfer_rejects_unknown_rotation_tags_before_moving() {
    let (driver, server) = start(SimBehavior::default()).await;

    let result = driver.transfer(&hudson(), &thermocycler(), "diagonal", "narrow").await;
    assert!(matches!(result, Err(TcsError::Configuration(_))));
    assert!(server.state.lock().await.motion_log.is_empty());
}

#[tokio::test]
async fn orientation_correction_skips_clearly_rotated_recordings() {
    let (driver, _server) = start(SimBehavior::default()).await;

    // Recorded yaw of 45 degrees: outside the +/-10 degree stale window.
    let pose_45 = JointPose::new(262.550, 20.608, 119.290, 265.102, 0.0, 574.367);
    let corrected = driver.check_plate_orientation(&pose_45, PlateRotation::Wide).unwrap();
    assert_eq!(corrected, pose_45);
}

#[tokio::test]
async fn orientation_correction_fixes_stale_zero_yaw_recordings() {
    let (driver, _server) = start(SimBehavior::default()).await;

    // Recorded yaw of 0 degrees while a wide placement was requested.
    let pose_0 = JointPose::new(262.550, 20.608, 119.290, 580.102, 0.0, 574.367);
    let corrected = driver.check_plate_orientation(&pose_0, PlateRotation::Wide).unwrap();
    assert_ne!(corrected, pose_0);
    assert_eq!(corrected.gripper, pose_0.gripper);

    // A narrow request never corrects.
    let untouched = driver.check_plate_orientation(&pose_0, PlateRotation::Narrow).unwrap();
    assert_eq!(untouched, pose_0);
}

#[tokio::test]
async fn commands_wait_for_running_motion_to_finish() {
    let behavior = SimBehavior { busy_polls_after_move: 4, ..SimBehavior::default() };
    let (driver, server) = start(behavior).await;
    driver.force_initialize().await.expect("initialization failed");

    driver.move_joint(&hudson(), ProfileSlot::Fast, false, false).await.expect("move failed");
    // The follow-up query may only go out once the four busy polls drained.
    let joints = driver.joint_state().await.expect("query failed");
    assert_eq!(joints.rail_x, hudson().rail_x);
    assert_eq!(server.state.lock().await.busy_polls_left, 0);
}

#[tokio::test]
async fn busy_wait_is_bounded_by_the_configured_timeout() {
    let behavior = SimBehavior { busy_polls_after_move: u32::MAX, ..SimBehavior::default() };
    let (driver, server) = start_with(behavior, |config| {
        config.busy_timeout_ms = 100;
        config.busy_poll_ms = 5;
    })
    .await;

    // Arm the simulator as ready without homing (homing is a motion and
    // would itself trip the scripted busy phase).
    {
        let mut sim = server.state.lock().await;
        sim.power = true;
        sim.attached = true;
        sim.homed = true;
    }

    driver.move_joint(&hudson(), ProfileSlot::Fast, false, false).await.expect("move failed");
    let result = driver.joint_state().await;
    assert!(matches!(result, Err(TcsError::DeviceBusyTimeout)));
}

#[tokio::test]
async fn caller_poses_are_never_mutated_by_a_transfer() {
    let (driver, _server) = start(SimBehavior::default()).await;

    let source = hudson();
    let target = thermocycler();
    let source_before = source;
    let target_before = target;

    driver.transfer(&source, &target, "narrow", "narrow").await.expect("transfer errored");

    assert_eq!(source, source_before);
    assert_eq!(target, target_before);
}

#[tokio::test]
async fn force_initialize_gives_up_after_the_attempt_cap() {
    let behavior = SimBehavior { refuse_power: true, ..SimBehavior::default() };
    let (driver, server) = start_with(behavior, |config| {
        config.init_attempts = 2;
    })
    .await;

    let result = driver.force_initialize().await;
    assert_eq!(result, Err(TcsError::InitializationFailed(2)));
    // One power-enable request per remediation attempt, no runaway retry.
    assert_eq!(server.state.lock().await.power_on_requests, 2);
}

#[tokio::test]
async fn gripper_open_query_tracks_the_closed_setpoint() {
    let (driver, _server) = start(SimBehavior::default()).await;
    driver.force_initialize().await.expect("initialization failed");

    // The simulated fingers start wider than the closed setpoint.
    assert!(driver.gripper_is_open().await.expect("query failed"));

    driver.move_joint(&hudson(), ProfileSlot::Slow, true, false).await.expect("move failed");
    assert!(!driver.gripper_is_open().await.expect("query failed"));
}

#[tokio::test]
async fn custom_profile_writes_only_accept_eight_parameters() {
    let (driver, _server) = start(SimBehavior::default()).await;

    driver
        .write_custom_profile(&[30.0, 0.0, 80.0, 80.0, 0.1, 0.1, 10.0, 0.0])
        .await
        .expect("profile write failed");

    let short = driver.write_custom_profile(&[30.0, 0.0]).await;
    assert!(matches!(short, Err(TcsError::Configuration(_))));
}

/// Reports one module label on the left camera for the first two rail stops
/// and a different one for the rest; nothing on the right.
struct LeftRowScanner {
    left_calls: AtomicUsize,
}

impl ModuleScanner for LeftRowScanner {
    fn scan(&self, side: ScanSide) -> Option<String> {
        match side {
            ScanSide::Left => {
                let stop = self.left_calls.fetch_add(1, Ordering::SeqCst);
                Some(if stop < 2 { "sealer".to_string() } else { "peeler".to_string() })
            }
            ScanSide::Right => None,
        }
    }
}

#[tokio::test]
async fn explorer_records_each_module_once() {
    let (driver, _server) = start(SimBehavior::default()).await;

    let scanner = Box::new(LeftRowScanner { left_calls: AtomicUsize::new(0) });
    let config = ExplorerConfig::default();
    let mut explorer = WorkcellExplorer::new(driver, scanner, config.clone());

    let found = explorer.explore().await.expect("exploration failed").clone();
    assert_eq!(found.len(), 2);

    // Seeing the same label at consecutive stops records it once, at the
    // stop where it first appeared.
    let sealer = found.get("sealer").expect("sealer not recorded");
    let peeler = found.get("peeler").expect("peeler not recorded");
    assert_eq!(sealer.rail_x, 0.0);
    assert_eq!(peeler.rail_x, 2.0 * config.rail_step);
    assert_eq!(sealer.gripper, config.open_gripper);
}

#[tokio::test]
async fn remove_and_replace_lid_round_trip() {
    let (driver, _server) = start(SimBehavior::default()).await;

    let plate = hudson();
    let removed = driver.remove_lid(&plate, "narrow").await.expect("remove_lid errored");
    assert_eq!(removed, OperationOutcome::Completed);

    let replaced = driver.replace_lid(&plate, "narrow").await.expect("replace_lid errored");
    assert_eq!(replaced, OperationOutcome::Completed);
    assert_eq!(driver.plate_state().await, PlateState::Empty);
}
