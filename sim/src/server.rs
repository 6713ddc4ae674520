use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use pf400_tcs::kinematics::Kinematics;
use pf400_tcs::{CartesianPose, JointPose};

use crate::kinematics::Pf400Kinematics;

/// Scripted simulator behavior, fixed for the lifetime of the server.
#[derive(Debug, Clone)]
pub struct SimBehavior {
    /// Whether a plate sits wherever the gripper grasps.
    pub plate_present: bool,
    /// How many `state` polls report the arm still moving after each motion
    /// command.
    pub busy_polls_after_move: u32,
    /// When set, `hp 1` is accepted but power never comes on; drives the
    /// permanently-not-ready recovery scenario.
    pub refuse_power: bool,
}

impl Default for SimBehavior {
    fn default() -> Self {
        Self { plate_present: true, busy_polls_after_move: 0, refuse_power: false }
    }
}

/// Mutable simulated robot state, shared with tests for assertions.
#[derive(Debug, Clone)]
pub struct SimState {
    pub power: bool,
    pub attached: bool,
    pub homed: bool,
    pub joints: JointPose,
    pub plate_present: bool,
    pub busy_polls_left: u32,
    /// Every grasp width the client tried, in order.
    pub grasp_attempts: Vec<f64>,
    /// Every `movej`/`MoveC`/`home` line received, in order.
    pub motion_log: Vec<String>,
    pub power_on_requests: u32,
    pub state_polls: u32,
    /// Last reply framing mode the client requested.
    pub mode: u8,
    pub selected_robot: Option<u8>,
}

impl SimState {
    fn new(behavior: &SimBehavior) -> Self {
        Self {
            power: false,
            attached: false,
            homed: false,
            joints: JointPose::new(400.0, 1.400, 177.101, 536.757, 90.0, 0.0),
            plate_present: behavior.plate_present,
            busy_polls_left: 0,
            grasp_attempts: Vec::new(),
            motion_log: Vec::new(),
            power_on_requests: 0,
            state_polls: 0,
            mode: 0,
            selected_robot: None,
        }
    }

    fn ready(&self) -> bool {
        self.power && self.attached && self.homed
    }
}

/// A TCS that exists only as software: accepts line commands on a TCP socket
/// and answers them from the simulated robot state, with the same status
/// sentinels and fault tokens the physical controller uses.
pub struct SimTcs {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<SimState>>,
    handle: JoinHandle<()>,
}

impl SimTcs {
    /// Binds `addr` (use port 0 for an ephemeral test port) and serves
    /// connections until dropped.
    pub async fn spawn(addr: &str, behavior: SimBehavior) -> std::io::Result<SimTcs> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(SimState::new(&behavior)));
        info!(%addr, "simulated TCS listening");

        let server_state = state.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, peer)) = listener.accept().await else { break };
                debug!(%peer, "client connected");
                let conn_state = server_state.clone();
                let conn_behavior = behavior.clone();
                tokio::spawn(async move {
                    let _ = serve_connection(stream, conn_state, conn_behavior).await;
                });
            }
        });

        Ok(SimTcs { addr, state, handle })
    }
}

impl Drop for SimTcs {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_connection(
    stream: TcpStream,
    state: Arc<Mutex<SimState>>,
    behavior: SimBehavior,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let reply = {
            let mut state = state.lock().await;
            handle_line(line, &mut state, &behavior)
        };
        debug!(command = %line, %reply, "exchange");
        write_half.write_all(format!("{reply}\r\n").as_bytes()).await?;
    }
    Ok(())
}

fn parse_floats(tokens: &[&str]) -> Option<Vec<f64>> {
    tokens.iter().map(|t| t.parse::<f64>().ok()).collect()
}

fn handle_line(line: &str, state: &mut SimState, behavior: &SimBehavior) -> String {
    let kinematics = Pf400Kinematics::default();
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.as_slice() {
        ["mode", mode] => {
            let Ok(mode) = mode.parse::<u8>() else { return "-1021".to_string() };
            state.mode = mode;
            "0".to_string()
        }
        ["selectrobot", robot] => {
            let Ok(robot) = robot.parse::<u8>() else { return "-1021".to_string() };
            state.selected_robot = Some(robot);
            "0".to_string()
        }

        ["hp"] => format!("0 {}", u8::from(state.power)),
        ["hp", "1"] => {
            state.power_on_requests += 1;
            if !behavior.refuse_power {
                state.power = true;
            }
            "0".to_string()
        }
        ["hp", "0"] => {
            state.power = false;
            "0".to_string()
        }

        ["attach"] => format!("0 {}", u8::from(state.attached)),
        ["attach", _] => {
            if state.power {
                state.attached = true;
                "0 1".to_string()
            } else {
                "-1046".to_string()
            }
        }

        ["home"] => {
            if state.power && state.attached {
                state.homed = true;
                state.busy_polls_left = behavior.busy_polls_after_move;
                state.motion_log.push(line.to_string());
                "0".to_string()
            } else {
                "-1046".to_string()
            }
        }

        ["pd", _] => format!("0 {}", u8::from(state.homed)),
        ["sysState"] => {
            if state.ready() {
                "0 21".to_string()
            } else {
                "0 7".to_string()
            }
        }

        ["state"] => {
            state.state_polls += 1;
            let phase = if !state.power {
                0
            } else if state.busy_polls_left > 0 {
                state.busy_polls_left -= 1;
                2
            } else {
                1
            };
            format!("0 {phase}")
        }

        ["wherej"] => format!("0 {}", state.joints.render()),
        ["whereC"] => {
            let (cartesian, _, rail) = kinematics.forward(&state.joints);
            format!("0 {} {}", cartesian.render(), rail)
        }

        ["movej", _profile, rest @ ..] if rest.len() == 6 => {
            if !state.ready() {
                return "-1046".to_string();
            }
            let Some(values) = parse_floats(rest) else { return "-1021".to_string() };
            state.motion_log.push(line.to_string());
            state.joints = JointPose::from_values([
                values[0], values[1], values[2], values[3], values[4], values[5],
            ]);
            state.busy_polls_left = behavior.busy_polls_after_move;
            "0".to_string()
        }

        ["MoveC", _profile, rest @ ..] if rest.len() == 6 => {
            if !state.ready() {
                return "-1046".to_string();
            }
            let Some(values) = parse_floats(rest) else { return "-1021".to_string() };
            let target = CartesianPose::from_values([
                values[0], values[1], values[2], values[3], values[4], values[5],
            ]);
            let gripper = state.joints.gripper;
            let rail = state.joints.rail_x;
            let Some(mut solution) =
                kinematics.inverse(&target, target.yaw, rail).into_iter().next()
            else {
                return "-1614".to_string();
            };
            solution.gripper = gripper;
            state.motion_log.push(line.to_string());
            state.joints = solution;
            state.busy_polls_left = behavior.busy_polls_after_move;
            "0".to_string()
        }

        ["GripOpenPos", _] | ["GripClosePos", _] => "0".to_string(),

        ["GraspPlate", width, _speed, _force] => {
            let Ok(width) = width.parse::<f64>() else { return "-1021".to_string() };
            state.grasp_attempts.push(width);
            if state.plate_present {
                state.joints.gripper = width;
                "0 -1".to_string()
            } else {
                "0 0".to_string()
            }
        }

        ["ReleasePlate", width, _speed] => {
            let Ok(width) = width.parse::<f64>() else { return "-1021".to_string() };
            state.joints.gripper = width;
            "0".to_string()
        }

        ["Profile", _slot, rest @ ..] if rest.len() == 8 => match parse_floats(rest) {
            Some(_) => "0".to_string(),
            None => "-1021".to_string(),
        },
        ["Profile", ..] => "-1026".to_string(),

        _ => "-1012".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> (SimState, SimBehavior) {
        let behavior = SimBehavior::default();
        (SimState::new(&behavior), behavior)
    }

    #[test]
    fn power_up_sequence_reaches_ready() {
        let (mut state, behavior) = fresh();
        assert_eq!(handle_line("sysState", &mut state, &behavior), "0 7");
        handle_line("hp 1", &mut state, &behavior);
        handle_line("attach 1", &mut state, &behavior);
        handle_line("home", &mut state, &behavior);
        assert_eq!(handle_line("sysState", &mut state, &behavior), "0 21");
        assert_eq!(handle_line("hp", &mut state, &behavior), "0 1");
        assert_eq!(handle_line("pd 2800", &mut state, &behavior), "0 1");
    }

    #[test]
    fn attach_without_power_is_a_fault() {
        let (mut state, behavior) = fresh();
        assert_eq!(handle_line("attach 1", &mut state, &behavior), "-1046");
    }

    #[test]
    fn movej_updates_joints_and_logs() {
        let (mut state, behavior) = fresh();
        handle_line("hp 1", &mut state, &behavior);
        handle_line("attach 1", &mut state, &behavior);
        handle_line("home", &mut state, &behavior);
        assert_eq!(handle_line("movej 2 300 10 120 600 95 500", &mut state, &behavior), "0");
        assert_eq!(state.joints.rail_z, 300.0);
        assert_eq!(state.joints.gripper, 95.0);
        assert_eq!(state.motion_log.len(), 2);
    }

    #[test]
    fn unknown_verbs_return_the_invalid_parameter_token() {
        let (mut state, behavior) = fresh();
        assert_eq!(handle_line("frobnicate", &mut state, &behavior), "-1012");
    }

    #[test]
    fn grasp_reports_no_plate_when_deck_is_empty() {
        let (mut state, behavior) = fresh();
        state.plate_present = false;
        assert_eq!(handle_line("GraspPlate 123 100 10", &mut state, &behavior), "0 0");
        assert_eq!(state.grasp_attempts, vec![123.0]);
    }
}
