//! HTTP facade for the VMP device query service.
//!
//! Holds each query request open until its correlated device reply, an
//! explicit failure or the command deadline resolves it, and renders the
//! outcome in the unified response envelope.

pub mod handlers;
pub mod models;
pub mod server;
pub mod shutdown;

pub use server::{ServerState, create_router, run};
