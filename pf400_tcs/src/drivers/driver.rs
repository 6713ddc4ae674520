use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::kinematics::Kinematics;
use crate::protocol::TcsCommand;
use crate::state::{
    parse_attach, parse_home, parse_init, parse_movement, parse_power, FaultState, MovementState,
    PlateState, RobotState,
};
use crate::{TcsError, TcsFaultCode};

use super::{Pf400DriverConfig, Workcell};

/// One side of the line-oriented TCS link. Commands go out newline
/// terminated; every command is answered by exactly one `\r\n` terminated
/// reply, matched by position since the protocol has no pipelining.
struct TcsLink {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TcsLink {
    fn new(stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self { reader: BufReader::new(read_half), writer: write_half }
    }

    /// Sends one command line and reads the one reply that answers it.
    async fn exchange(&mut self, line: &str) -> Result<String, TcsError> {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(|e| TcsError::Protocol(format!("send failed: {e}")))?;

        let mut reply = String::new();
        let n = self
            .reader
            .read_line(&mut reply)
            .await
            .map_err(|e| TcsError::Protocol(format!("receive failed: {e}")))?;
        if n == 0 {
            return Err(TcsError::Disconnected);
        }
        Ok(reply.trim_end().to_string())
    }
}

/// Driver for one physical PF400 over its TCS command socket.
///
/// The link mutex is the sole serialization point: every command, including
/// status polling, passes through [`Pf400Driver::execute`], so concurrent
/// callers can never interleave mid-frame on the one physical robot.
#[derive(Clone)]
pub struct Pf400Driver {
    pub config: Pf400DriverConfig,
    pub workcell: Workcell,
    link: Arc<Mutex<TcsLink>>,
    state: Arc<Mutex<RobotState>>,
    kinematics: Arc<dyn Kinematics>,
}

impl Pf400Driver {
    /// Connects to the controller with bounded retries and switches the TCS
    /// into nonverbose reply framing. The robot is left un-initialized;
    /// callers (and every composite operation) go through
    /// [`Pf400Driver::force_initialize`] before the first physical move.
    pub async fn connect(
        config: Pf400DriverConfig,
        workcell: Workcell,
        kinematics: Arc<dyn Kinematics>,
    ) -> Result<Pf400Driver, TcsError> {
        config.validate().map_err(TcsError::Configuration)?;

        let addr = config.connection_url();
        let stream = connect_with_retries(&addr, config.connect_retries).await?;
        info!(%addr, "connected to TCS");

        let driver = Self {
            config,
            workcell,
            link: Arc::new(Mutex::new(TcsLink::new(stream))),
            state: Arc::new(Mutex::new(RobotState::default())),
            kinematics,
        };
        driver.init_connection_mode().await?;
        Ok(driver)
    }

    /// Sets the configured reply framing. Verbose mode additionally routes
    /// the session to the configured robot unit.
    async fn init_connection_mode(&self) -> Result<(), TcsError> {
        let mut link = self.link.lock().await;
        let reply = link.exchange(&TcsCommand::Mode(self.config.mode).to_string()).await?;
        debug!(mode = self.config.mode, %reply, "connection mode set");
        if self.config.mode == 1 {
            let reply =
                link.exchange(&TcsCommand::SelectRobot(self.config.robot_id).to_string()).await?;
            debug!(robot = self.config.robot_id, %reply, "robot selected");
        }
        Ok(())
    }

    pub async fn disconnect(&self) -> Result<(), TcsError> {
        let mut link = self.link.lock().await;
        link.writer
            .shutdown()
            .await
            .map_err(|e| TcsError::Protocol(format!("shutdown failed: {e}")))?;
        self.state.lock().await.degrade();
        info!("disconnected from TCS");
        Ok(())
    }

    pub fn kinematics(&self) -> &Arc<dyn Kinematics> {
        &self.kinematics
    }

    /// Sends one command and classifies its reply.
    ///
    /// Holds the link lock for the whole exchange. Before sending, waits for
    /// any running motion to finish: the controller will not answer a second
    /// motion command until the first completes, and parking an unrelated
    /// command behind it indefinitely would freeze the channel, so the wait
    /// is bounded by the configured busy timeout.
    ///
    /// An empty reply is success with no payload. A reply carrying a fault
    /// token is a `Device` error; anything else is the payload.
    pub async fn execute(&self, command: &TcsCommand) -> Result<String, TcsError> {
        let mut link = self.link.lock().await;

        if !matches!(command, TcsCommand::QueryMotionState) {
            self.wait_motion_idle(&mut link).await?;
        }

        let line = command.to_string();
        debug!(">> {line}");
        let reply = match link.exchange(&line).await {
            Ok(reply) => reply,
            Err(e) => {
                self.state.lock().await.degrade();
                return Err(e);
            }
        };

        if let Some(code) = TcsFaultCode::from_reply(&reply) {
            warn!(command = %line, code = code.token(), "{}", code.message());
            self.state.lock().await.fault = FaultState::Error(code);
            return Err(TcsError::Device(code));
        }

        debug!("<< {reply}");
        Ok(reply)
    }

    /// Polls the motion phase until the arm is no longer physically moving,
    /// bounded by the busy timeout. Called with the link lock already held.
    async fn wait_motion_idle(&self, link: &mut TcsLink) -> Result<(), TcsError> {
        let started = Instant::now();
        loop {
            let reply = link.exchange(&TcsCommand::QueryMotionState.to_string()).await?;
            match parse_movement(&reply) {
                Some(movement) => {
                    self.state.lock().await.movement = movement;
                    if !movement.in_motion() {
                        return Ok(());
                    }
                }
                // Unreadable phase: do not block the channel on it.
                None => return Ok(()),
            }
            if started.elapsed() >= self.config.busy_timeout() {
                warn!("robot still moving after {:?}", self.config.busy_timeout());
                return Err(TcsError::DeviceBusyTimeout);
            }
            sleep(self.config.busy_poll()).await;
        }
    }

    /// Re-polls every sub-state and returns the fresh aggregate.
    ///
    /// Never fails: a query that errors downgrades its own sub-state to
    /// `Unknown` (recording the fault as a warning) instead of aborting the
    /// whole refresh.
    pub async fn refresh_state(&self) -> RobotState {
        let power = self.query(&TcsCommand::QueryPower).await.map(|r| parse_power(&r));
        let attach = self.query(&TcsCommand::QueryAttach).await.map(|r| parse_attach(&r));
        let home = self
            .query(&TcsCommand::QueryHomeProximity(self.config.home_reference_station))
            .await
            .map(|r| parse_home(&r));
        let init = self.query(&TcsCommand::QuerySystemState).await.map(|r| parse_init(&r));
        let movement = self
            .query(&TcsCommand::QueryMotionState)
            .await
            .ok()
            .and_then(|r| parse_movement(&r));

        let mut state = self.state.lock().await;
        state.power = power.unwrap_or(crate::state::PowerState::Unknown);
        state.attach = attach.unwrap_or(crate::state::AttachState::Unknown);
        state.home = home.unwrap_or(crate::state::HomeState::Unknown);
        state.init = init.unwrap_or(crate::state::InitState::Unknown);
        if let Some(movement) = movement {
            state.movement = movement;
        }
        debug!(state = ?*state, "state refreshed");
        *state
    }

    /// A refresh-path query: device faults are absorbed into the fault
    /// sub-state so a transient error degrades one reading, not the refresh.
    async fn query(&self, command: &TcsCommand) -> Result<String, TcsError> {
        match self.execute(command).await {
            Ok(reply) => Ok(reply),
            Err(TcsError::Device(code)) => {
                self.state.lock().await.fault = FaultState::Warning(code);
                Err(TcsError::Device(code))
            }
            Err(e) => Err(e),
        }
    }

    /// Last known aggregate state without touching the wire.
    pub async fn state(&self) -> RobotState {
        *self.state.lock().await
    }

    pub async fn movement_state(&self) -> MovementState {
        self.state.lock().await.movement
    }

    pub async fn plate_state(&self) -> PlateState {
        self.state.lock().await.plate
    }

    pub(crate) async fn set_plate_state(&self, plate: PlateState) {
        self.state.lock().await.plate = plate;
    }

    pub(crate) async fn clear_fault(&self) {
        self.state.lock().await.fault = FaultState::Clear;
    }
}

async fn connect_with_retries(addr: &str, retries: u32) -> Result<TcpStream, TcsError> {
    for attempt in 1..=retries {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                warn!(%addr, attempt, "connect failed: {e}");
                if attempt == retries {
                    return Err(TcsError::Protocol(format!(
                        "could not reach {addr} after {retries} attempts: {e}"
                    )));
                }
                sleep(Duration::from_secs(2)).await;
            }
        }
    }
    Err(TcsError::Disconnected)
}
