//! Library exports for lmsportal, shared between the binary and tests.

pub mod api;
pub mod commands;
pub mod config;
pub mod guard;
pub mod models;
pub mod navigation;
pub mod session;
pub mod startup;
pub mod state;
pub mod store;
pub mod transport;
pub mod utils;
