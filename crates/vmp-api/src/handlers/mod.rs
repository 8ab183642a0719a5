//! Request handlers.

pub mod basic;
pub mod channels;
pub mod common;
pub mod devices;
pub mod gateway;
pub mod queries;

pub use crate::server::ServerState;
