//! Shared foundations for the VMP device query service.
//!
//! Provides:
//! - Configuration defaults, environment variable names and the server config loader
//! - The workspace-wide error type

pub mod config;
pub mod error;

pub use config::ServerConfig;
pub use error::{Error, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
