//! Headmouse Common Utilities
//!
//! Shared infrastructure for all headmouse crates:
//! - Error types and result aliases
//! - Tick clocks and rate control for the polling loop
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
