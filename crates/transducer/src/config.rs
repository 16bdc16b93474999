//! Transducer configuration.

use headmouse_common::config::{TuningConfig, TuningMode};
use headmouse_common::error::{HeadmouseError, HeadmouseResult};
use serde::{Deserialize, Serialize};

use crate::axis::AxisConfig;

/// How orientation is consumed into pointer motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Deviation beyond the dead zone is a pointer rate (units per second
    /// per degree = sensitivity). Nothing is accumulated between ticks.
    Velocity,
    /// Deviation beyond the dead zone is an absolute pointer offset; each
    /// tick emits the integer step toward it and carries the remainder.
    Position,
}

impl From<TuningMode> for Mode {
    fn from(mode: TuningMode) -> Self {
        match mode {
            TuningMode::Velocity => Mode::Velocity,
            TuningMode::Position => Mode::Position,
        }
    }
}

/// Fixed tuning for one transducer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransducerConfig {
    /// Pointer units per degree beyond the dead zone.
    pub sensitivity: f64,

    /// Extra factor applied to pitch. `0.0` disables the pitch axis.
    pub y_sensitivity_multiplier: f64,

    pub dead_zone_yaw_degrees: f64,
    pub dead_zone_pitch_degrees: f64,

    /// Orientation magnitudes beyond these are clamped.
    pub max_yaw_degrees: f64,
    pub max_pitch_degrees: f64,

    pub mode: Mode,

    /// Longest interval one velocity tick may integrate, in seconds.
    pub max_elapsed_secs: f64,
}

impl Default for TransducerConfig {
    fn default() -> Self {
        Self::from_tuning_unchecked(&TuningConfig::default())
    }
}

impl TransducerConfig {
    /// Build from file-level tuning, rejecting unusable values.
    pub fn from_tuning(tuning: &TuningConfig) -> HeadmouseResult<Self> {
        let config = Self::from_tuning_unchecked(tuning);
        config.validate()?;
        Ok(config)
    }

    fn from_tuning_unchecked(tuning: &TuningConfig) -> Self {
        Self {
            sensitivity: tuning.sensitivity,
            y_sensitivity_multiplier: tuning.y_sensitivity_multiplier,
            dead_zone_yaw_degrees: tuning.dead_zone_yaw_degrees,
            dead_zone_pitch_degrees: tuning.dead_zone_pitch_degrees,
            max_yaw_degrees: tuning.max_yaw_degrees,
            max_pitch_degrees: tuning.max_pitch_degrees,
            mode: tuning.mode.into(),
            max_elapsed_secs: tuning.max_elapsed_secs,
        }
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> HeadmouseResult<()> {
        if !(self.sensitivity.is_finite() && self.sensitivity > 0.0) {
            return Err(HeadmouseError::config(format!(
                "sensitivity must be a positive number, got {}",
                self.sensitivity
            )));
        }
        if !(self.y_sensitivity_multiplier.is_finite() && self.y_sensitivity_multiplier >= 0.0) {
            return Err(HeadmouseError::config(format!(
                "y_sensitivity_multiplier must be >= 0, got {}",
                self.y_sensitivity_multiplier
            )));
        }
        check_axis_range("yaw", self.dead_zone_yaw_degrees, self.max_yaw_degrees)?;
        if self.pitch_enabled() {
            check_axis_range("pitch", self.dead_zone_pitch_degrees, self.max_pitch_degrees)?;
        }
        if !(self.max_elapsed_secs.is_finite()
            && self.max_elapsed_secs > 0.0
            && self.max_elapsed_secs <= 1.0)
        {
            return Err(HeadmouseError::config(format!(
                "max_elapsed_secs must be in (0, 1], got {}",
                self.max_elapsed_secs
            )));
        }
        Ok(())
    }

    pub fn pitch_enabled(&self) -> bool {
        self.y_sensitivity_multiplier > 0.0
    }

    /// Per-axis parameters for yaw.
    pub fn yaw_axis(&self) -> AxisConfig {
        AxisConfig::new(
            self.dead_zone_yaw_degrees,
            self.max_yaw_degrees,
            self.sensitivity,
        )
    }

    /// Per-axis parameters for pitch, or `None` when pitch is disabled.
    pub fn pitch_axis(&self) -> Option<AxisConfig> {
        self.pitch_enabled().then(|| {
            AxisConfig::new(
                self.dead_zone_pitch_degrees,
                self.max_pitch_degrees,
                self.sensitivity * self.y_sensitivity_multiplier,
            )
        })
    }

    /// Elapsed time as a velocity tick may use it: non-finite or negative
    /// values count as zero, long gaps are capped.
    pub fn effective_elapsed(&self, elapsed_secs: f64) -> f64 {
        if !elapsed_secs.is_finite() || elapsed_secs <= 0.0 {
            return 0.0;
        }
        let cap = if self.max_elapsed_secs.is_finite() && self.max_elapsed_secs > 0.0 {
            self.max_elapsed_secs.min(1.0)
        } else {
            0.0
        };
        elapsed_secs.min(cap)
    }
}

fn check_axis_range(axis: &str, dead_zone: f64, max: f64) -> HeadmouseResult<()> {
    if !(dead_zone.is_finite() && dead_zone >= 0.0) {
        return Err(HeadmouseError::config(format!(
            "{axis} dead zone must be >= 0, got {dead_zone}"
        )));
    }
    if !(max.is_finite() && max >= dead_zone) {
        return Err(HeadmouseError::config(format!(
            "{axis} max range must be finite and >= its dead zone ({dead_zone}), got {max}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_tuning_defaults() {
        let config = TransducerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mode, Mode::Position);
        assert!(!config.pitch_enabled());
        assert!(config.pitch_axis().is_none());
    }

    #[test]
    fn test_rejects_non_positive_sensitivity() {
        let mut tuning = TuningConfig::default();
        tuning.sensitivity = 0.0;
        assert!(TransducerConfig::from_tuning(&tuning).is_err());

        tuning.sensitivity = f64::NAN;
        assert!(TransducerConfig::from_tuning(&tuning).is_err());
    }

    #[test]
    fn test_rejects_max_below_dead_zone() {
        let mut tuning = TuningConfig::default();
        tuning.max_yaw_degrees = 1.0;
        let err = TransducerConfig::from_tuning(&tuning).unwrap_err();
        assert!(err.to_string().contains("yaw max range"));
    }

    #[test]
    fn test_pitch_range_only_checked_when_enabled() {
        let mut tuning = TuningConfig::default();
        tuning.max_pitch_degrees = 0.0;
        assert!(TransducerConfig::from_tuning(&tuning).is_ok());

        tuning.y_sensitivity_multiplier = 0.25;
        assert!(TransducerConfig::from_tuning(&tuning).is_err());
    }

    #[test]
    fn test_pitch_axis_scale_includes_multiplier() {
        let config = TransducerConfig {
            y_sensitivity_multiplier: 0.25,
            ..TransducerConfig::default()
        };
        let pitch = config.pitch_axis().unwrap();
        assert!((pitch.scale() - 25.0 * 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_effective_elapsed_sanitizes() {
        let config = TransducerConfig::default();
        assert_eq!(config.effective_elapsed(f64::NAN), 0.0);
        assert_eq!(config.effective_elapsed(-0.5), 0.0);
        assert_eq!(config.effective_elapsed(0.016), 0.016);
        assert_eq!(config.effective_elapsed(5.0), 0.1);
        assert_eq!(config.effective_elapsed(f64::INFINITY), 0.0);
    }
}
