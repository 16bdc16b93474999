//! Headmouse Transducer
//!
//! Maps head-orientation samples to relative pointer motion, one tick at a
//! time:
//! - **Dead zone:** suppress jitter around the neutral pose
//! - **Clamp and scale:** bound the usable angle range, convert degrees to
//!   pointer units with the dead-zone offset removed
//! - **Consumption:** velocity (rate) or position (absolute offset with
//!   fractional remainder carry)
//!
//! This crate is pure computation: no I/O, no platform dependencies, no
//! allocation on the tick path.

pub mod axis;
pub mod config;
pub mod sample;
pub mod state;
pub mod transducer;

pub use config::{Mode, TransducerConfig};
pub use sample::{OrientationSample, PointerDelta};
pub use state::TransducerState;
pub use transducer::{advance, Transducer};
