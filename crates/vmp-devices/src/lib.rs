//! Device and channel directory for the VMP device query service.
//!
//! The correlation engine only consumes devices through two narrow seams:
//! - [`DeviceDirectory`] for records, channels and pagination
//! - [`LivenessTracker`] for online/offline state
//!
//! In-memory implementations of both ship here so the service runs end to end.

pub mod directory;
pub mod liveness;
pub mod model;

pub use directory::{DeviceDirectory, DirectoryError, MemoryDirectory, SeedData};
pub use liveness::{LivenessTracker, OnlineRegistry};
pub use model::{
    ChannelFilter, Device, DeviceChannel, DeviceUpdate, Page, StreamMode, StreamModeError,
};
