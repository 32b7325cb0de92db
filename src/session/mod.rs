//! Session lifecycle: who is logged in, and with which credential.

pub mod outcome;
pub mod phase;
pub mod store;

pub use outcome::{LoginFailure, LoginResult};
pub use phase::SessionPhase;
pub use store::SessionStore;
