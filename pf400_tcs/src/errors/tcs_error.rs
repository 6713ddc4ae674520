use std::error::Error;
use std::fmt;
use int_enum::IntEnum;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum TcsError {
    /// The transport failed before a full exchange completed.
    Protocol(String),
    /// The controller answered with a fault token instead of data.
    Device(TcsFaultCode),
    /// Invalid caller input, rejected before any motion is attempted.
    Configuration(String),
    /// The grasp width search reached its floor without finding a plate.
    PlateMissing,
    /// The controller reported the gripper did not open on release.
    ReleaseFailed,
    /// The robot stayed in motion past the configured busy timeout.
    DeviceBusyTimeout,
    /// Recovery exhausted its attempt cap without reaching ready state.
    InitializationFailed(u32),
    /// The socket closed under us.
    Disconnected,
}

impl Error for TcsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl fmt::Display for TcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TcsError::Protocol(ref msg) => write!(f, "protocol error: {}", msg),
            TcsError::Device(ref code) => {
                write!(f, "controller fault {}: {}", code.token(), code.message())
            }
            TcsError::Configuration(ref msg) => write!(f, "configuration error: {}", msg),
            TcsError::PlateMissing => write!(f, "no plate found at the grasp location"),
            TcsError::ReleaseFailed => write!(f, "plate was not released"),
            TcsError::DeviceBusyTimeout => {
                write!(f, "robot stayed in motion past the busy timeout")
            }
            TcsError::InitializationFailed(attempts) => {
                write!(f, "robot failed to initialize after {} attempts", attempts)
            }
            TcsError::Disconnected => write!(f, "controller connection lost"),
        }
    }
}

/// Fault tokens the TCS replies with in place of data. Any reply whose first
/// token is a negative number is a fault; tokens outside this table map to
/// `UnrecognizedTcsFault`.
#[repr(i32)]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, IntEnum)]
pub enum TcsFaultCode {
    TimeoutNoResponse = -1009,
    InvalidParameter = -1012,
    IllegalValue = -1021,
    TooFewArguments = -1026,
    TooManyArguments = -1027,
    PowerNotEnabled = -1046,
    RobotNotAttached = -1048,
    RobotAlreadyAttached = -1049,
    RobotNotHomed = -1050,
    CommandMotionInProgress = -1600,
    MotionAborted = -1603,
    SoftEnvelopeError = -1609,
    HardEnvelopeError = -1610,
    JointOutOfRange = -1612,
    CartesianOutOfRange = -1613,
    NoKinematicSolution = -1614,
    GripperTimeout = -1702,
    GripperForceNotReached = -1703,
    PlateNotDetected = -1704,
    EStopAsserted = -2801,
    HardwareNotReady = -2802,
    AmplifierFault = -2803,
    EncoderFault = -2804,
    DuplicateHomeRequest = -2806,
    UnrecognizedTcsFault = -1,
}

impl TcsFaultCode {
    /// Classifies a raw reply line. Returns a fault only when the first token
    /// is a negative number, which is how the TCS flags errors.
    pub fn from_reply(reply: &str) -> Option<TcsFaultCode> {
        let token = reply.split_whitespace().next()?;
        let value: i32 = token.parse().ok()?;
        if value >= 0 {
            return None;
        }
        Some(TcsFaultCode::try_from(value).unwrap_or(TcsFaultCode::UnrecognizedTcsFault))
    }

    pub fn token(&self) -> i32 {
        *self as i32
    }

    pub fn message(&self) -> &str {
        match self {
            TcsFaultCode::TimeoutNoResponse => "Timeout, no response.",
            TcsFaultCode::InvalidParameter => "Invalid parameter.",
            TcsFaultCode::IllegalValue => "Illegal value.",
            TcsFaultCode::TooFewArguments => "Too few arguments.",
            TcsFaultCode::TooManyArguments => "Too many arguments.",
            TcsFaultCode::PowerNotEnabled => "High power is not enabled.",
            TcsFaultCode::RobotNotAttached => "Robot is not attached.",
            TcsFaultCode::RobotAlreadyAttached => "Robot is already attached.",
            TcsFaultCode::RobotNotHomed => "Robot is not homed.",
            TcsFaultCode::CommandMotionInProgress => "Command rejected, motion in progress.",
            TcsFaultCode::MotionAborted => "Motion aborted.",
            TcsFaultCode::SoftEnvelopeError => "Soft envelope exceeded.",
            TcsFaultCode::HardEnvelopeError => "Hard envelope exceeded.",
            TcsFaultCode::JointOutOfRange => "Joint target out of range.",
            TcsFaultCode::CartesianOutOfRange => "Cartesian target out of range.",
            TcsFaultCode::NoKinematicSolution => "No kinematic solution.",
            TcsFaultCode::GripperTimeout => "Gripper move timed out.",
            TcsFaultCode::GripperForceNotReached => "Gripper force not reached.",
            TcsFaultCode::PlateNotDetected => "Plate not detected.",
            TcsFaultCode::EStopAsserted => "Emergency stop is asserted.",
            TcsFaultCode::HardwareNotReady => "Hardware is not ready.",
            TcsFaultCode::AmplifierFault => "Amplifier fault.",
            TcsFaultCode::EncoderFault => "Encoder fault.",
            TcsFaultCode::DuplicateHomeRequest => "Robot is already homed.",
            TcsFaultCode::UnrecognizedTcsFault => "Unrecognized TCS fault token.",
        }
    }
}
