//! Mutable per-transducer accumulator.

/// Motion already emitted, per axis, in pointer units.
///
/// Only position mode writes to it, and only in whole emitted steps, so
/// `desired - applied` is exactly the remainder still owed to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransducerState {
    applied_yaw: f64,
    applied_pitch: f64,
}

impl TransducerState {
    /// Neutral state: nothing emitted yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied_yaw(&self) -> f64 {
        self.applied_yaw
    }

    pub fn applied_pitch(&self) -> f64 {
        self.applied_pitch
    }

    /// Back to neutral. Used on recenter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn applied_yaw_mut(&mut self) -> &mut f64 {
        &mut self.applied_yaw
    }

    pub(crate) fn applied_pitch_mut(&mut self) -> &mut f64 {
        &mut self.applied_pitch
    }
}
