mod command;
mod reply;

pub use command::*;
pub use reply::*;
