mod tcs_error;
pub use tcs_error::*;
