use std::net::ToSocketAddrs;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection and policy knobs for one PF400 driver instance.
///
/// The empirical constants from the choreography layer live here rather than
/// in the code: the grasp-search floor, the orientation-correction tie-break
/// window, and the recovery attempt cap are all tunable per deployment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Pf400DriverConfig {
    pub addr: String,
    pub port: u32,
    /// TCP connect attempts before giving up.
    pub connect_retries: u32,
    /// Robot unit bound by `attach` on multi-robot controllers.
    pub robot_id: u8,
    /// Reply framing requested at connect: 0 nonverbose, 1 verbose. Verbose
    /// framing also routes the session to `robot_id` via `selectrobot`.
    pub mode: u8,
    /// Taught station probed by `pd` as the homed-position reference.
    pub home_reference_station: u32,
    /// Upper bound on waiting for a running motion to finish before a new
    /// command is sent. Exceeding it surfaces `DeviceBusyTimeout`.
    pub busy_timeout_ms: u64,
    /// Interval between motion-state polls while waiting.
    pub busy_poll_ms: u64,
    /// Recovery attempt cap for `force_initialize`.
    pub init_attempts: u32,
    /// Physical settle time after enabling power.
    pub power_settle_ms: u64,
    /// Physical settle time after attaching.
    pub attach_settle_ms: u64,
    /// Blocking wait after issuing `home`.
    pub home_settle_ms: u64,
    /// Lowest width the grasp search may try before declaring the plate
    /// missing, in millimeters.
    pub grasp_width_floor: f64,
    /// Recorded-yaw window inside which a non-zero rotation request is taken
    /// as evidence of a stale recording, in degrees.
    pub orientation_tolerance_deg: f64,
}

impl Pf400DriverConfig {
    pub fn new(addr: String, port: u32) -> Self {
        Self { addr, port, ..Self::default() }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.addr.is_empty() {
            return Err("address cannot be empty".to_string());
        }
        if self.port == 0 {
            return Err("port number must be greater than 0".to_string());
        }
        if self.connect_retries == 0 {
            return Err("connect retries must be greater than 0".to_string());
        }
        if self.mode > 1 {
            return Err("connection mode must be 0 (nonverbose) or 1 (verbose)".to_string());
        }
        if self.init_attempts == 0 {
            return Err("initialization attempt cap must be greater than 0".to_string());
        }
        if self.grasp_width_floor <= 0.0 {
            return Err("grasp width floor must be positive".to_string());
        }
        Ok(())
    }

    pub fn connection_url(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }

    /// Resolves the address to a `SocketAddr` string, or an error message if
    /// it cannot be resolved.
    pub fn resolve(&self) -> Result<String, String> {
        match self.connection_url().to_socket_addrs() {
            Ok(mut iter) => match iter.next() {
                Some(socket_addr) => Ok(socket_addr.to_string()),
                None => Err("could not resolve address".to_string()),
            },
            Err(_) => Err("invalid address format".to_string()),
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn busy_poll(&self) -> Duration {
        Duration::from_millis(self.busy_poll_ms)
    }
}

impl Default for Pf400DriverConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1".to_string(),
            // First robot program port on the controller (10x00).
            port: 10100,
            connect_retries: 3,
            robot_id: 1,
            mode: 0,
            home_reference_station: 2800,
            busy_timeout_ms: 30_000,
            busy_poll_ms: 100,
            init_attempts: 3,
            power_settle_ms: 6_000,
            attach_settle_ms: 6_000,
            home_settle_ms: 10_000,
            grasp_width_floor: 80.0,
            orientation_tolerance_deg: 10.0,
        }
    }
}
