//! Handler tests module.

pub mod basic;
pub mod channels;
pub mod devices;
pub mod gateway;
pub mod queries;
