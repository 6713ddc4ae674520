use int_enum::IntEnum;
use serde::{Deserialize, Serialize};

use crate::protocol::payload_token;
use crate::TcsFaultCode;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Off,
    On,
    Unknown,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachState {
    Detached,
    Attached,
    Unknown,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeState {
    NotHomed,
    Homed,
    Unknown,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    NotInitialized,
    Initialized,
    Unknown,
}

/// Motion phase ordinal as reported by the `state` query. Anything at or
/// above `Accelerating` means the arm is physically moving and the controller
/// will not accept another motion command.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, IntEnum)]
#[repr(u8)]
pub enum MovementState {
    PowerOff = 0,
    Stopping = 1,
    Accelerating = 2,
    Decelerating = 3,
}

impl MovementState {
    pub fn in_motion(self) -> bool {
        self as u8 >= 2
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultState {
    Clear,
    /// A fault absorbed during a status refresh; the refresh carried on.
    Warning(TcsFaultCode),
    /// A fault returned for an issued command.
    Error(TcsFaultCode),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlateState {
    Empty,
    Held,
    Missing,
}

/// Aggregate robot state. Created once per driver, refreshed by polling and
/// by motion side effects, and degraded to `Unknown` sub-states on
/// connection loss rather than torn down.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct RobotState {
    pub power: PowerState,
    pub attach: AttachState,
    pub home: HomeState,
    pub init: InitState,
    pub movement: MovementState,
    pub fault: FaultState,
    pub plate: PlateState,
}

impl Default for RobotState {
    fn default() -> Self {
        Self {
            power: PowerState::Unknown,
            attach: AttachState::Unknown,
            home: HomeState::Unknown,
            init: InitState::Unknown,
            movement: MovementState::PowerOff,
            fault: FaultState::Clear,
            plate: PlateState::Empty,
        }
    }
}

impl RobotState {
    /// Ready iff every polled sub-state is at its positive terminal value.
    /// Any `Unknown` makes the robot not-ready.
    pub fn is_ready(&self) -> bool {
        self.power == PowerState::On
            && self.attach == AttachState::Attached
            && self.home == HomeState::Homed
            && self.init == InitState::Initialized
    }

    /// Marks every polled sub-state unknown, keeping plate tracking as-is.
    pub fn degrade(&mut self) {
        self.power = PowerState::Unknown;
        self.attach = AttachState::Unknown;
        self.home = HomeState::Unknown;
        self.init = InitState::Unknown;
    }
}

// Reply sentinels, per the controller's status conventions: a leading "-"
// token means the query itself failed, a "0" payload means that sub-state is
// not at its terminal value.

fn payload(reply: &str) -> Option<&str> {
    let first = reply.split_whitespace().next()?;
    if first.starts_with('-') {
        return None;
    }
    payload_token(reply)
}

pub fn parse_power(reply: &str) -> PowerState {
    match payload(reply) {
        Some("0") => PowerState::Off,
        Some(_) => PowerState::On,
        None => PowerState::Unknown,
    }
}

pub fn parse_attach(reply: &str) -> AttachState {
    match payload(reply) {
        Some("0") => AttachState::Detached,
        Some(_) => AttachState::Attached,
        None => AttachState::Unknown,
    }
}

pub fn parse_home(reply: &str) -> HomeState {
    match payload(reply) {
        Some("0") => HomeState::NotHomed,
        Some(_) => HomeState::Homed,
        None => HomeState::Unknown,
    }
}

/// `sysState` code 21 is the fully initialized terminal value; codes carrying
/// a 7 digit (7, 17, 27) report a subsystem still pending.
pub fn parse_init(reply: &str) -> InitState {
    match payload(reply) {
        Some(code) if code.contains('7') => InitState::NotInitialized,
        Some(_) => InitState::Initialized,
        None => InitState::Unknown,
    }
}

pub fn parse_movement(reply: &str) -> Option<MovementState> {
    let code: u8 = payload(reply)?.parse().ok()?;
    MovementState::try_from(code).ok()
}
