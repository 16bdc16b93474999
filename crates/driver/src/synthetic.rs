//! Generated head motion for dry runs and drift checks.
//!
//! Angles are a pure function of the tick index and tick rate, so a run is
//! reproducible regardless of wall-clock jitter.

use headmouse_common::error::HeadmouseResult;
use headmouse_transducer::OrientationSample;

use crate::OrientationSource;

/// Motion pattern, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pattern {
    /// Constant pose.
    Hold { yaw: f64, pitch: f64 },
    /// Yaw sine wave with a half-amplitude pitch wave at twice the period.
    Sweep { amplitude: f64, period_secs: f64 },
    /// Cycle yaw through 0, +amplitude, 0, -amplitude, holding each for
    /// `dwell_ticks`.
    Steps { amplitude: f64, dwell_ticks: u64 },
}

impl Pattern {
    /// Orientation at `tick` for a loop running at `tick_rate_hz`.
    pub fn at(&self, tick: u64, tick_rate_hz: u32) -> OrientationSample {
        match *self {
            Pattern::Hold { yaw, pitch } => OrientationSample::yaw_pitch(yaw, pitch),
            Pattern::Sweep {
                amplitude,
                period_secs,
            } => {
                let t = tick as f64 / f64::from(tick_rate_hz.max(1));
                let phase = std::f64::consts::TAU * t / period_secs.max(f64::EPSILON);
                OrientationSample::yaw_pitch(
                    amplitude * phase.sin(),
                    0.5 * amplitude * (0.5 * phase).sin(),
                )
            }
            Pattern::Steps {
                amplitude,
                dwell_ticks,
            } => {
                let level = (tick / dwell_ticks.max(1)) % 4;
                let yaw = match level {
                    1 => amplitude,
                    3 => -amplitude,
                    _ => 0.0,
                };
                OrientationSample::yaw_pitch(yaw, 0.0)
            }
        }
    }
}

pub struct SyntheticSource {
    pattern: Pattern,
    tick_rate_hz: u32,
    tick: u64,
    limit: Option<u64>,
}

impl SyntheticSource {
    pub fn new(pattern: Pattern, tick_rate_hz: u32) -> Self {
        Self {
            pattern,
            tick_rate_hz: tick_rate_hz.max(1),
            tick: 0,
            limit: None,
        }
    }

    /// Stop after `ticks` samples.
    pub fn with_limit(mut self, ticks: u64) -> Self {
        self.limit = Some(ticks);
        self
    }

    pub fn ticks_generated(&self) -> u64 {
        self.tick
    }
}

impl OrientationSource for SyntheticSource {
    fn poll(&mut self) -> HeadmouseResult<Option<OrientationSample>> {
        if self.is_exhausted() {
            return Ok(None);
        }
        let sample = self.pattern.at(self.tick, self.tick_rate_hz);
        self.tick += 1;
        Ok(Some(sample))
    }

    fn recenter(&mut self) -> HeadmouseResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "synthetic"
    }

    fn is_exhausted(&self) -> bool {
        self.limit.is_some_and(|limit| self.tick >= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_cycle() {
        let pattern = Pattern::Steps {
            amplitude: 12.0,
            dwell_ticks: 3,
        };
        let yaws: Vec<f64> = (0..12).map(|t| pattern.at(t, 500).yaw_degrees).collect();
        assert_eq!(
            yaws,
            vec![0.0, 0.0, 0.0, 12.0, 12.0, 12.0, 0.0, 0.0, 0.0, -12.0, -12.0, -12.0]
        );
    }

    #[test]
    fn test_sweep_is_periodic() {
        let pattern = Pattern::Sweep {
            amplitude: 20.0,
            period_secs: 2.0,
        };
        let quarter = pattern.at(250, 500);
        assert!((quarter.yaw_degrees - 20.0).abs() < 1e-9);
        let start = pattern.at(0, 500);
        let full = pattern.at(2000, 500);
        assert!((start.yaw_degrees - full.yaw_degrees).abs() < 1e-9);
    }

    #[test]
    fn test_limit_exhausts_source() {
        let mut source = SyntheticSource::new(Pattern::Hold { yaw: 5.0, pitch: 1.0 }, 100)
            .with_limit(2);
        assert_eq!(
            source.poll().unwrap(),
            Some(OrientationSample::yaw_pitch(5.0, 1.0))
        );
        assert!(source.poll().unwrap().is_some());
        assert!(source.is_exhausted());
        assert_eq!(source.poll().unwrap(), None);
        assert_eq!(source.ticks_generated(), 2);
    }
}
