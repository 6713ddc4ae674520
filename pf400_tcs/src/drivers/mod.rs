mod driver;
pub use driver::*;

mod driver_config;
pub use driver_config::*;

mod workcell;
pub use workcell::*;

mod recovery;

mod motion;

mod choreography;
pub use choreography::*;
