// Library exports for the PF400 TCS simulator

pub mod robot_config;
pub mod kinematics;
pub mod server;

pub use kinematics::Pf400Kinematics;
pub use robot_config::Pf400Geometry;
pub use server::{SimBehavior, SimState, SimTcs};
