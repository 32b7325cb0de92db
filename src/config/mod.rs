// This module re-exports important pieces for convenience,
// so we can "use crate::config::*" easily.
pub mod backend;
pub mod logging;
pub mod store;
pub mod types;

pub use backend::*;
pub use logging::*;
pub use store::*;
pub use types::*;
