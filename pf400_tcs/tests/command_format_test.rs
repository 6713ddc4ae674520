use pf400_tcs::protocol::TcsCommand;
use pf400_tcs::{CartesianPose, JointPose, MotionProfile, ProfileSlot};

#[test]
fn test_status_queries_render_bare_verbs() {
    assert_eq!(TcsCommand::QueryPower.to_string(), "hp");
    assert_eq!(TcsCommand::QueryAttach.to_string(), "attach");
    assert_eq!(TcsCommand::QuerySystemState.to_string(), "sysState");
    assert_eq!(TcsCommand::QueryMotionState.to_string(), "state");
    assert_eq!(TcsCommand::WhereJoints.to_string(), "wherej");
    assert_eq!(TcsCommand::WhereCartesian.to_string(), "whereC");
}

#[test]
fn test_power_and_attach_render_with_arguments() {
    assert_eq!(TcsCommand::EnablePower.to_string(), "hp 1");
    assert_eq!(TcsCommand::DisablePower.to_string(), "hp 0");
    assert_eq!(TcsCommand::Attach(1).to_string(), "attach 1");
    assert_eq!(TcsCommand::QueryHomeProximity(2800).to_string(), "pd 2800");
    assert_eq!(TcsCommand::Mode(0).to_string(), "mode 0");
    assert_eq!(TcsCommand::SelectRobot(1).to_string(), "selectrobot 1");
}

#[test]
fn test_movej_renders_profile_then_six_axis_values() {
    // Axis order on the wire: rail_z shoulder elbow wrist gripper rail_x.
    let pose = JointPose::new(262.55, 20.608, 119.29, 662.57, 0.0, 574.367);
    let command = TcsCommand::MoveJoints { profile: ProfileSlot::Fast, pose };

    assert_eq!(command.to_string(), "movej 2 262.55 20.608 119.29 662.57 0 574.367");
}

#[test]
fn test_movec_renders_cartesian_pose() {
    let pose = CartesianPose { x: 61.5, y: 292.5, z: 262.55, yaw: 45.0, pitch: 0.0, roll: 0.0 };
    let command = TcsCommand::MoveCartesian { profile: ProfileSlot::Slow, pose };

    assert_eq!(command.to_string(), "MoveC 1 61.5 292.5 262.55 45 0 0");
}

#[test]
fn test_gripper_commands_render_mixed_case_verbs() {
    // The TCS verb set is case sensitive and inconsistent; the renderings
    // must match the controller's spelling exactly.
    assert_eq!(TcsCommand::GripOpenPos(130.0).to_string(), "GripOpenPos 130");
    assert_eq!(TcsCommand::GripClosePos(77.0).to_string(), "GripClosePos 77");
    assert_eq!(
        TcsCommand::GraspPlate { width: 123.0, speed: 100, force: 10 }.to_string(),
        "GraspPlate 123 100 10"
    );
    assert_eq!(
        TcsCommand::ReleasePlate { width: 130.0, speed: 100 }.to_string(),
        "ReleasePlate 130 100"
    );
}

#[test]
fn test_profile_write_renders_slot_and_eight_values() {
    let command = TcsCommand::WriteProfile {
        slot: ProfileSlot::Slow,
        profile: MotionProfile::slow(),
    };
    assert_eq!(command.to_string(), "Profile 1 45 0 100 100 0.1 0.1 10 0");

    let command = TcsCommand::WriteProfile {
        slot: ProfileSlot::Fast,
        profile: MotionProfile::fast(),
    };
    assert_eq!(command.to_string(), "Profile 2 100 0 100 100 0.1 0.1 10 0");
}

#[test]
fn test_custom_profile_arity_is_enforced() {
    assert!(MotionProfile::from_values(&[45.0, 0.0, 100.0, 100.0, 0.1, 0.1, 10.0, 0.0]).is_ok());

    let too_few = MotionProfile::from_values(&[45.0, 0.0, 100.0]);
    assert!(matches!(too_few, Err(pf400_tcs::TcsError::Configuration(_))));

    let too_many = MotionProfile::from_values(&[0.0; 9]);
    assert!(matches!(too_many, Err(pf400_tcs::TcsError::Configuration(_))));
}
