//! CLI command implementations.

pub mod config;
pub mod geocode;
pub mod order;
