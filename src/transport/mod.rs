//! The shared HTTP client every backend call goes through.
//!
//! It attaches the current credential to outgoing requests and turns a 401
//! response into a global "authorization lost" event.

pub mod client;
pub mod error;
pub mod events;

pub use client::ApiClient;
pub use error::ApiError;
pub use events::{AuthEvent, AuthEventListener, AuthEvents};
