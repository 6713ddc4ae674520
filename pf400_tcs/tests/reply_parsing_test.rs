use pf400_tcs::protocol::{parse_cartesian, parse_joints, payload_token, tokens};
use pf400_tcs::state::{
    parse_attach, parse_home, parse_init, parse_movement, parse_power, AttachState, HomeState,
    InitState, MovementState, PowerState,
};
use pf400_tcs::{TcsError, TcsFaultCode};

#[test]
fn test_reply_tokenization() {
    assert_eq!(tokens("0 21"), vec!["0", "21"]);
    assert_eq!(payload_token("0 21"), Some("21"));
    assert_eq!(payload_token("0"), None);
}

#[test]
fn test_wherej_reply_parses_six_axes() {
    let reply = "0 262.55 20.608 119.29 662.57 123.1 574.367";
    let pose = parse_joints(reply).unwrap();

    assert_eq!(pose.rail_z, 262.55);
    assert_eq!(pose.shoulder, 20.608);
    assert_eq!(pose.elbow, 119.29);
    assert_eq!(pose.wrist, 662.57);
    assert_eq!(pose.gripper, 123.1);
    assert_eq!(pose.rail_x, 574.367);
}

#[test]
fn test_wherej_reply_with_wrong_axis_count_is_rejected() {
    assert!(matches!(parse_joints("0 1 2 3"), Err(TcsError::Protocol(_))));
    assert!(matches!(parse_joints("0"), Err(TcsError::Protocol(_))));
    assert!(matches!(parse_joints("0 a b c d e f"), Err(TcsError::Protocol(_))));
}

#[test]
fn test_wherec_reply_drops_the_trailing_rail_offset() {
    // whereC answers: status, x y z yaw pitch roll, then the rail offset.
    let reply = "0 61.5 292.5 262.55 45 0 0 574.367";
    let pose = parse_cartesian(reply).unwrap();

    assert_eq!(pose.x, 61.5);
    assert_eq!(pose.y, 292.5);
    assert_eq!(pose.z, 262.55);
    assert_eq!(pose.yaw, 45.0);

    assert!(matches!(parse_cartesian("0 1 2 3"), Err(TcsError::Protocol(_))));
}

#[test]
fn test_status_sentinels() {
    assert_eq!(parse_power("0 1"), PowerState::On);
    assert_eq!(parse_power("0 0"), PowerState::Off);
    // A leading "-" token means the query itself failed.
    assert_eq!(parse_power("-1046"), PowerState::Unknown);
    assert_eq!(parse_power(""), PowerState::Unknown);

    assert_eq!(parse_attach("0 1"), AttachState::Attached);
    assert_eq!(parse_attach("0 0"), AttachState::Detached);
    assert_eq!(parse_attach("-1048 0"), AttachState::Unknown);

    assert_eq!(parse_home("0 1"), HomeState::Homed);
    assert_eq!(parse_home("0 0"), HomeState::NotHomed);
}

#[test]
fn test_sysstate_codes() {
    // 21 is fully initialized; any code carrying a 7 digit is still pending.
    assert_eq!(parse_init("0 21"), InitState::Initialized);
    assert_eq!(parse_init("0 7"), InitState::NotInitialized);
    assert_eq!(parse_init("0 17"), InitState::NotInitialized);
    assert_eq!(parse_init("-1"), InitState::Unknown);
}

#[test]
fn test_motion_phase_ordinals() {
    assert_eq!(parse_movement("0 0"), Some(MovementState::PowerOff));
    assert_eq!(parse_movement("0 1"), Some(MovementState::Stopping));
    assert_eq!(parse_movement("0 2"), Some(MovementState::Accelerating));
    assert_eq!(parse_movement("0 3"), Some(MovementState::Decelerating));
    assert_eq!(parse_movement("0 9"), None);
    assert_eq!(parse_movement("-1009"), None);

    assert!(!MovementState::Stopping.in_motion());
    assert!(MovementState::Accelerating.in_motion());
    assert!(MovementState::Decelerating.in_motion());
}

#[test]
fn test_fault_classification() {
    assert_eq!(TcsFaultCode::from_reply("-1046"), Some(TcsFaultCode::PowerNotEnabled));
    assert_eq!(TcsFaultCode::from_reply("-1614"), Some(TcsFaultCode::NoKinematicSolution));
    assert_eq!(
        TcsFaultCode::from_reply("-1012 extra context"),
        Some(TcsFaultCode::InvalidParameter)
    );

    // Unknown negative tokens still classify as faults.
    assert_eq!(TcsFaultCode::from_reply("-9999"), Some(TcsFaultCode::UnrecognizedTcsFault));

    // Success and data replies are not faults.
    assert_eq!(TcsFaultCode::from_reply("0"), None);
    assert_eq!(TcsFaultCode::from_reply("0 21"), None);
    assert_eq!(TcsFaultCode::from_reply(""), None);
    assert_eq!(TcsFaultCode::from_reply("ok"), None);
}

#[test]
fn test_fault_messages_are_human_readable() {
    assert_eq!(TcsFaultCode::PowerNotEnabled.token(), -1046);
    assert!(!TcsFaultCode::PowerNotEnabled.message().is_empty());
    assert!(!TcsFaultCode::UnrecognizedTcsFault.message().is_empty());
}
