//! Tick inputs and outputs.

use serde::{Deserialize, Serialize};

/// One orientation reading from the tracking source, in degrees.
///
/// Positive yaw turns right, positive pitch looks up. Roll is carried for
/// logging and traces only; it never drives the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrientationSample {
    pub yaw_degrees: f64,
    pub pitch_degrees: f64,
    #[serde(default)]
    pub roll_degrees: f64,
}

impl OrientationSample {
    pub fn new(yaw_degrees: f64, pitch_degrees: f64, roll_degrees: f64) -> Self {
        Self {
            yaw_degrees,
            pitch_degrees,
            roll_degrees,
        }
    }

    /// A sample with zero roll.
    pub fn yaw_pitch(yaw_degrees: f64, pitch_degrees: f64) -> Self {
        Self::new(yaw_degrees, pitch_degrees, 0.0)
    }

    /// The neutral pose.
    pub fn neutral() -> Self {
        Self::default()
    }
}

/// Relative pointer motion produced by one tick.
///
/// `dy` uses the pitch convention (positive = up). Sinks convert to screen
/// coordinates with [`PointerDelta::screen_motion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PointerDelta {
    pub dx: i32,
    pub dy: i32,
}

impl PointerDelta {
    pub const ZERO: PointerDelta = PointerDelta { dx: 0, dy: 0 };

    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    pub fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// Motion in screen space, where positive Y points down.
    pub fn screen_motion(&self) -> (i32, i32) {
        (self.dx, self.dy.saturating_neg())
    }
}
