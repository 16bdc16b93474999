//! The per-tick orientation-to-pointer step.

use headmouse_common::config::TuningConfig;
use headmouse_common::error::HeadmouseResult;

use crate::axis::AxisConfig;
use crate::config::{Mode, TransducerConfig};
use crate::sample::{OrientationSample, PointerDelta};
use crate::state::TransducerState;

/// Advance one tick.
///
/// Never fails and never panics: NaN angles leave their axis untouched,
/// infinite angles are clamped, and every emitted step is bounded by the
/// axis range. `elapsed_secs` only matters in velocity mode.
pub fn advance(
    sample: &OrientationSample,
    elapsed_secs: f64,
    config: &TransducerConfig,
    state: &mut TransducerState,
) -> PointerDelta {
    let yaw = config.yaw_axis();
    let pitch = config.pitch_axis();

    match config.mode {
        Mode::Velocity => {
            let elapsed = config.effective_elapsed(elapsed_secs);
            PointerDelta {
                dx: velocity_step(&yaw, sample.yaw_degrees, elapsed),
                dy: pitch.map_or(0, |axis| velocity_step(&axis, sample.pitch_degrees, elapsed)),
            }
        }
        Mode::Position => {
            let dx = position_step(&yaw, sample.yaw_degrees, state.applied_yaw_mut());
            let dy = match pitch {
                Some(axis) => position_step(&axis, sample.pitch_degrees, state.applied_pitch_mut()),
                None => 0,
            };
            PointerDelta { dx, dy }
        }
    }
}

/// Rate control: each tick stands alone, no remainder is carried.
fn velocity_step(axis: &AxisConfig, angle: f64, elapsed: f64) -> i32 {
    let step = (axis.desired(angle) * elapsed).round_ties_even();
    let bound = axis.step_bound();
    to_units(step.max(-bound).min(bound))
}

/// Position tracking with remainder carry.
///
/// Ties round to even: mirrored poses emit mirrored steps, and a carried
/// remainder of +/-0.5 rounds to 0 instead of flipping the accumulator.
///
/// Emits the rounded difference between the desired offset and what has
/// already been applied, then adds the emitted integer (not the desired
/// value) to the accumulator. A step larger than the axis bound only occurs
/// when the sample crosses most of the range in one tick; the excess stays
/// owed and is emitted on following ticks.
fn position_step(axis: &AxisConfig, angle: f64, applied: &mut f64) -> i32 {
    if angle.is_nan() {
        return 0;
    }
    if axis.is_dead(angle) {
        *applied = 0.0;
        return 0;
    }

    let desired = axis.desired(angle);
    let bound = axis.step_bound();
    let step = (desired - *applied).round_ties_even().max(-bound).min(bound);
    if !step.is_finite() {
        return 0;
    }
    *applied += step;
    to_units(step)
}

fn to_units(step: f64) -> i32 {
    if step.is_finite() {
        // `as` saturates at the i32 range.
        step as i32
    } else {
        0
    }
}

/// A transducer owning its configuration and accumulator.
#[derive(Debug, Clone)]
pub struct Transducer {
    config: TransducerConfig,
    state: TransducerState,
}

impl Transducer {
    /// Create a transducer in the neutral state.
    pub fn new(config: TransducerConfig) -> HeadmouseResult<Self> {
        config.validate()?;
        tracing::debug!(
            mode = ?config.mode,
            sensitivity = config.sensitivity,
            pitch_enabled = config.pitch_enabled(),
            "Transducer configured"
        );
        Ok(Self {
            config,
            state: TransducerState::new(),
        })
    }

    /// Create a transducer from file-level tuning.
    pub fn from_tuning(tuning: &TuningConfig) -> HeadmouseResult<Self> {
        Self::new(TransducerConfig::from_tuning(tuning)?)
    }

    /// Advance one tick with a fresh sample.
    pub fn advance(&mut self, sample: &OrientationSample, elapsed_secs: f64) -> PointerDelta {
        advance(sample, elapsed_secs, &self.config, &mut self.state)
    }

    /// Advance one tick when the source had nothing to offer.
    ///
    /// A missing sample means "no change": the accumulator is left alone
    /// instead of being driven toward the neutral pose.
    pub fn skip(&mut self) -> PointerDelta {
        PointerDelta::ZERO
    }

    /// The source has just re-zeroed its neutral pose; drop whatever was
    /// accumulated against the old one.
    pub fn recenter(&mut self) {
        self.state.reset();
    }

    pub fn config(&self) -> &TransducerConfig {
        &self.config
    }

    pub fn state(&self) -> &TransducerState {
        &self.state
    }
}
