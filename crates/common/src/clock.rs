//! Clock and timing utilities for the polling loop.
//!
//! - `SessionClock` anchors trace timestamps to the moment a run started.
//! - `TickClock` measures the elapsed time between consecutive ticks.
//! - `RateController` throttles periodic work (status logging) to a rate.

use std::time::Instant;

/// A session clock that provides monotonic timestamps relative to
/// a fixed epoch (the moment the run started).
#[derive(Debug, Clone)]
pub struct SessionClock {
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl SessionClock {
    /// Create a new session clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Get nanoseconds elapsed since the session started.
    pub fn elapsed_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Wall-clock time at session start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Convert an elapsed nanosecond value to seconds.
    pub fn ns_to_secs(ns: u64) -> f64 {
        ns as f64 / 1_000_000_000.0
    }

    /// Convert seconds to nanoseconds.
    pub fn secs_to_ns(secs: f64) -> u64 {
        (secs * 1_000_000_000.0) as u64
    }
}

/// Measures the time between successive ticks.
///
/// The first lap reports zero elapsed time, so the first tick after startup
/// never integrates an arbitrary amount of motion.
#[derive(Debug, Default)]
pub struct TickClock {
    last: Option<Instant>,
}

impl TickClock {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Seconds since the previous call to `lap_secs`.
    pub fn lap_secs(&mut self) -> f64 {
        self.lap_at(Instant::now())
    }

    /// Same as `lap_secs` with an explicit "now" (for tests and replays).
    pub fn lap_at(&mut self, now: Instant) -> f64 {
        let elapsed = match self.last {
            Some(last) => now.saturating_duration_since(last).as_secs_f64(),
            None => 0.0,
        };
        self.last = Some(now);
        elapsed
    }

    /// Forget the previous tick; the next lap reports zero.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Rate controller for periodic work.
#[derive(Debug)]
pub struct RateController {
    target_interval_ns: u64,
    last_tick_ns: Option<u64>,
}

impl RateController {
    /// Create a controller targeting the given Hz rate.
    pub fn new(target_hz: u32) -> Self {
        Self {
            target_interval_ns: 1_000_000_000 / target_hz.max(1) as u64,
            last_tick_ns: None,
        }
    }

    /// Check if enough time has passed for the next tick.
    /// Returns true and updates internal state if ready.
    /// The first call always returns true.
    pub fn should_tick(&mut self, current_ns: u64) -> bool {
        match self.last_tick_ns {
            None => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            Some(last) if current_ns >= last + self.target_interval_ns => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            _ => false,
        }
    }

    /// Target interval in nanoseconds.
    pub fn interval_ns(&self) -> u64 {
        self.target_interval_ns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_session_clock_elapsed() {
        let clock = SessionClock::start();
        assert!(clock.elapsed_ns() < 1_000_000_000);
        assert!(!clock.epoch_wall().is_empty());
    }

    #[test]
    fn test_ns_to_secs_conversion() {
        assert!((SessionClock::ns_to_secs(1_500_000_000) - 1.5).abs() < 1e-9);
        assert_eq!(SessionClock::secs_to_ns(2.0), 2_000_000_000);
    }

    #[test]
    fn test_tick_clock_first_lap_is_zero() {
        let mut clock = TickClock::new();
        let start = Instant::now();
        assert_eq!(clock.lap_at(start), 0.0);

        let elapsed = clock.lap_at(start + Duration::from_millis(16));
        assert!((elapsed - 0.016).abs() < 1e-9);

        clock.reset();
        assert_eq!(clock.lap_at(start + Duration::from_millis(40)), 0.0);
    }

    #[test]
    fn test_tick_clock_never_negative() {
        let mut clock = TickClock::new();
        let start = Instant::now() + Duration::from_millis(100);
        clock.lap_at(start);
        assert_eq!(clock.lap_at(start - Duration::from_millis(50)), 0.0);
    }

    #[test]
    fn test_rate_controller() {
        let mut ctrl = RateController::new(60);
        assert!(ctrl.should_tick(0)); // first tick always fires
        assert!(!ctrl.should_tick(1_000_000)); // 1ms later, too soon
        assert!(ctrl.should_tick(17_000_000)); // ~17ms later, should fire (60Hz ~ 16.67ms)
    }
}
