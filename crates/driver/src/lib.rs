//! Headmouse Driver
//!
//! Runs the fixed-rate tick loop around the transducer: polls an
//! orientation source, advances the transducer, and forwards pointer motion
//! to a sink. Uses pluggable backends:
//!
//! - **Sources:** opentrack UDP, trace replay, synthetic motion
//! - **Sinks:** uinput virtual mouse (Linux), log-only
//! - **Controls:** evdev key-state polling (Linux) for cancel, recenter,
//!   and pause
//!
//! Sessions can be recorded as append-only JSONL traces.

pub mod backends;
pub mod permissions;
pub mod replay;
pub mod synthetic;
pub mod trace;
pub mod writer;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use headmouse_common::clock::{RateController, SessionClock, TickClock};
use headmouse_common::error::HeadmouseResult;
use headmouse_transducer::{OrientationSample, PointerDelta, Transducer};

use crate::trace::{TraceEvent, TraceHeader, TRACE_SCHEMA_VERSION};
use crate::writer::TraceWriter;

/// Supplies the latest head orientation once per tick.
pub trait OrientationSource: Send {
    /// Latest sample, or `None` if nothing usable is available this tick.
    fn poll(&mut self) -> HeadmouseResult<Option<OrientationSample>>;

    /// Treat the current pose as neutral from now on.
    fn recenter(&mut self) -> HeadmouseResult<()>;

    /// Source name for logging.
    fn name(&self) -> &str;

    /// Whether the source will never produce another sample.
    fn is_exhausted(&self) -> bool {
        false
    }
}

/// Accepts relative pointer motion and hands it to the OS.
pub trait PointerSink: Send {
    /// Inject one delta. `delta.dy` uses the pitch convention; sinks flip it
    /// to screen space themselves.
    fn inject(&mut self, delta: PointerDelta) -> HeadmouseResult<()>;

    /// Sink name for logging.
    fn name(&self) -> &str;
}

/// User controls sampled once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlState {
    /// Stop the loop.
    pub cancel: bool,
    /// Recenter was requested since the previous poll (edge, not level).
    pub recenter: bool,
    /// Motion is suspended while held.
    pub paused: bool,
}

/// Polls cancel/recenter/pause state.
pub trait ControlSignals: Send {
    fn poll(&mut self) -> HeadmouseResult<ControlState>;
}

/// Why a tick produced no motion without consulting the transducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Paused,
    NoSample,
    SourceError,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A nonzero delta was sent to the sink.
    Emitted(PointerDelta),
    /// The transducer ran and produced no motion.
    Idle,
    Skipped(SkipReason),
    Cancelled,
}

/// Counters for a finished (or running) session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u64,
    pub emitted: u64,
    pub skipped: u64,
    pub source_errors: u64,
    pub recenters: u64,
    /// Sum of emitted deltas, pitch convention.
    pub total_dx: i64,
    pub total_dy: i64,
}

/// The tick loop.
pub struct TickDriver {
    source: Box<dyn OrientationSource>,
    sink: Box<dyn PointerSink>,
    controls: Box<dyn ControlSignals>,
    transducer: Transducer,
    tick_rate_hz: u32,
    tick_clock: TickClock,
    session: SessionClock,
    trace: Option<TraceWriter>,
    stop_flag: Arc<AtomicBool>,
    status_rate: RateController,
    last_sample: Option<OrientationSample>,
    stats: RunStats,
}

impl TickDriver {
    pub fn new(
        source: Box<dyn OrientationSource>,
        sink: Box<dyn PointerSink>,
        controls: Box<dyn ControlSignals>,
        transducer: Transducer,
        tick_rate_hz: u32,
    ) -> Self {
        Self {
            source,
            sink,
            controls,
            transducer,
            tick_rate_hz: tick_rate_hz.max(1),
            tick_clock: TickClock::new(),
            session: SessionClock::start(),
            trace: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            status_rate: RateController::new(10),
            last_sample: None,
            stats: RunStats::default(),
        }
    }

    /// Record every tick to a JSONL trace at `path`.
    pub fn record_to(&mut self, path: impl AsRef<std::path::Path>) -> HeadmouseResult<()> {
        let header = TraceHeader {
            schema_version: TRACE_SCHEMA_VERSION.to_string(),
            epoch_wall: self.session.epoch_wall().to_string(),
            tick_rate_hz: self.tick_rate_hz,
            mode: self.transducer.config().mode,
            source: self.source.name().to_string(),
        };
        let writer = TraceWriter::create(path, &header)?;
        tracing::info!(path = %writer.path().display(), "Recording trace");
        self.trace = Some(writer);
        Ok(())
    }

    /// Run one tick, measuring elapsed time with the tick clock.
    pub fn tick(&mut self) -> HeadmouseResult<TickOutcome> {
        let elapsed = self.tick_clock.lap_secs();
        self.tick_with_elapsed(elapsed)
    }

    /// Run one tick with an explicit elapsed time (seconds since the
    /// previous tick).
    pub fn tick_with_elapsed(&mut self, elapsed_secs: f64) -> HeadmouseResult<TickOutcome> {
        self.stats.ticks += 1;
        let now_ns = self.session.elapsed_ns();

        let controls = self.controls.poll().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Control poll failed");
            ControlState::default()
        });

        if controls.cancel {
            tracing::info!("Cancel requested");
            return Ok(TickOutcome::Cancelled);
        }

        if controls.recenter {
            // The source and the accumulator must agree on the new neutral
            // pose before this tick's sample is consumed.
            if let Err(e) = self.source.recenter() {
                tracing::warn!(error = %e, source = %self.source.name(), "Source recenter failed");
            }
            self.transducer.recenter();
            self.stats.recenters += 1;
            self.record(TraceEvent::recenter(now_ns))?;
            tracing::info!("Recentered");
        }

        if controls.paused {
            self.stats.skipped += 1;
            return Ok(TickOutcome::Skipped(SkipReason::Paused));
        }

        let sample = match self.source.poll() {
            Ok(Some(sample)) => sample,
            Ok(None) => {
                self.transducer.skip();
                self.stats.skipped += 1;
                self.record(TraceEvent::gap(now_ns))?;
                return Ok(TickOutcome::Skipped(SkipReason::NoSample));
            }
            Err(e) => {
                tracing::warn!(error = %e, source = %self.source.name(), "Orientation source error");
                self.transducer.skip();
                self.stats.skipped += 1;
                self.stats.source_errors += 1;
                self.record(TraceEvent::gap(now_ns))?;
                return Ok(TickOutcome::Skipped(SkipReason::SourceError));
            }
        };

        self.last_sample = Some(sample);
        self.record(TraceEvent::sample(now_ns, &sample).with_elapsed(elapsed_secs))?;

        let delta = self.transducer.advance(&sample, elapsed_secs);
        if delta.is_zero() {
            return Ok(TickOutcome::Idle);
        }

        self.sink.inject(delta)?;
        self.stats.emitted += 1;
        self.stats.total_dx += delta.dx as i64;
        self.stats.total_dy += delta.dy as i64;
        self.record(TraceEvent::delta(now_ns, delta))?;
        tracing::trace!(dx = delta.dx, dy = delta.dy, "Pointer delta");

        Ok(TickOutcome::Emitted(delta))
    }

    /// Run the loop until cancelled, stopped, or the source is exhausted.
    pub async fn run(&mut self) -> HeadmouseResult<RunStats> {
        tracing::info!(
            source = %self.source.name(),
            sink = %self.sink.name(),
            mode = ?self.transducer.config().mode,
            tick_rate_hz = self.tick_rate_hz,
            "Tick driver started"
        );

        let period = Duration::from_secs_f64(1.0 / self.tick_rate_hz as f64);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        self.tick_clock.reset();

        while !self.stop_flag.load(Ordering::Relaxed) {
            interval.tick().await;

            if self.tick()? == TickOutcome::Cancelled {
                break;
            }
            if self.source.is_exhausted() {
                tracing::info!(source = %self.source.name(), "Source exhausted");
                break;
            }
            self.log_status();
        }

        if let Some(trace) = self.trace.as_mut() {
            trace.flush()?;
        }

        tracing::info!(
            ticks = self.stats.ticks,
            emitted = self.stats.emitted,
            skipped = self.stats.skipped,
            recenters = self.stats.recenters,
            "Tick driver stopped"
        );
        Ok(self.stats.clone())
    }

    fn log_status(&mut self) {
        if !self.status_rate.should_tick(self.session.elapsed_ns()) {
            return;
        }
        if let Some(sample) = self.last_sample {
            let state = self.transducer.state();
            tracing::debug!(
                yaw = format_args!("{:.3}", sample.yaw_degrees),
                pitch = format_args!("{:.3}", sample.pitch_degrees),
                roll = format_args!("{:.3}", sample.roll_degrees),
                applied_yaw = state.applied_yaw(),
                applied_pitch = state.applied_pitch(),
                "Orientation"
            );
        }
    }

    fn record(&mut self, event: TraceEvent) -> HeadmouseResult<()> {
        match self.trace.as_mut() {
            Some(trace) => trace.write_event(&event),
            None => Ok(()),
        }
    }

    /// Set the stop flag.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Get the stop flag for external coordination (e.g. Ctrl-C).
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn transducer(&self) -> &Transducer {
        &self.transducer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{RecordingSink, ScriptedControls, ScriptedSource};
    use headmouse_transducer::{Mode, TransducerConfig};

    fn position_transducer() -> Transducer {
        Transducer::new(TransducerConfig::default()).unwrap()
    }

    fn driver(
        samples: Vec<Option<OrientationSample>>,
        controls: Vec<ControlState>,
        transducer: Transducer,
    ) -> (TickDriver, RecordingSink) {
        let sink = RecordingSink::new();
        let driver = TickDriver::new(
            Box::new(ScriptedSource::new(samples)),
            Box::new(sink.clone()),
            Box::new(ScriptedControls::new(controls)),
            transducer,
            500,
        );
        (driver, sink)
    }

    #[test]
    fn test_emits_and_forwards_to_sink() {
        let yaw10 = Some(OrientationSample::yaw_pitch(10.0, 0.0));
        let (mut driver, sink) = driver(vec![yaw10, yaw10], vec![], position_transducer());

        assert_eq!(
            driver.tick_with_elapsed(0.002).unwrap(),
            TickOutcome::Emitted(PointerDelta::new(188, 0))
        );
        assert_eq!(driver.tick_with_elapsed(0.002).unwrap(), TickOutcome::Idle);
        assert_eq!(sink.deltas(), vec![PointerDelta::new(188, 0)]);
        assert_eq!(driver.stats().total_dx, 188);
    }

    #[test]
    fn test_missing_sample_keeps_state() {
        let samples = vec![
            Some(OrientationSample::yaw_pitch(10.0, 0.0)),
            None,
            Some(OrientationSample::yaw_pitch(10.0, 0.0)),
        ];
        let (mut driver, sink) = driver(samples, vec![], position_transducer());

        driver.tick_with_elapsed(0.002).unwrap();
        let before = *driver.transducer().state();
        assert_eq!(
            driver.tick_with_elapsed(0.002).unwrap(),
            TickOutcome::Skipped(SkipReason::NoSample)
        );
        assert_eq!(driver.transducer().state(), &before);

        // No false recentering: the same pose produces no further motion.
        assert_eq!(driver.tick_with_elapsed(0.002).unwrap(), TickOutcome::Idle);
        assert_eq!(sink.deltas().len(), 1);
    }

    #[test]
    fn test_recenter_resets_in_same_tick() {
        let samples = vec![
            Some(OrientationSample::yaw_pitch(20.0, 0.0)),
            // After recentering the source reports the held pose as neutral.
            Some(OrientationSample::neutral()),
        ];
        let controls = vec![
            ControlState::default(),
            ControlState {
                recenter: true,
                ..Default::default()
            },
        ];
        let (mut driver, sink) = driver(samples, controls, position_transducer());

        driver.tick_with_elapsed(0.002).unwrap();
        assert_eq!(driver.tick_with_elapsed(0.002).unwrap(), TickOutcome::Idle);
        assert_eq!(driver.stats().recenters, 1);
        assert_eq!(sink.deltas(), vec![PointerDelta::new(438, 0)]);
    }

    #[test]
    fn test_pause_skips_without_polling_source() {
        let samples = vec![Some(OrientationSample::yaw_pitch(10.0, 0.0))];
        let controls = vec![ControlState {
            paused: true,
            ..Default::default()
        }];
        let (mut driver, sink) = driver(samples, controls, position_transducer());

        assert_eq!(
            driver.tick_with_elapsed(0.002).unwrap(),
            TickOutcome::Skipped(SkipReason::Paused)
        );
        // The sample is still pending and is consumed once unpaused.
        assert_eq!(
            driver.tick_with_elapsed(0.002).unwrap(),
            TickOutcome::Emitted(PointerDelta::new(188, 0))
        );
        assert_eq!(sink.deltas().len(), 1);
    }

    /// Sink that keeps what it would hand to the OS, in screen space.
    #[derive(Clone, Default)]
    struct ScreenSink {
        moves: Arc<std::sync::Mutex<Vec<(i32, i32)>>>,
    }

    impl PointerSink for ScreenSink {
        fn inject(&mut self, delta: PointerDelta) -> HeadmouseResult<()> {
            self.moves.lock().unwrap().push(delta.screen_motion());
            Ok(())
        }

        fn name(&self) -> &str {
            "screen"
        }
    }

    #[test]
    fn test_looking_up_moves_pointer_up_on_screen() {
        let config = TransducerConfig {
            y_sensitivity_multiplier: 0.25,
            ..TransducerConfig::default()
        };
        let sink = ScreenSink::default();
        let mut driver = TickDriver::new(
            Box::new(ScriptedSource::new(vec![
                Some(OrientationSample::yaw_pitch(0.0, 10.5)),
                Some(OrientationSample::yaw_pitch(0.0, -10.5)),
            ])),
            Box::new(sink.clone()),
            Box::new(ScriptedControls::new(vec![])),
            Transducer::new(config).unwrap(),
            500,
        );

        // (10.5 - 2.5) * 25 * 0.25 = 50 units of upward pitch.
        assert_eq!(
            driver.tick_with_elapsed(0.002).unwrap(),
            TickOutcome::Emitted(PointerDelta::new(0, 50))
        );
        driver.tick_with_elapsed(0.002).unwrap();
        assert_eq!(*sink.moves.lock().unwrap(), vec![(0, -50), (0, 100)]);
        assert_eq!(driver.stats().total_dy, -50);
    }

    #[test]
    fn test_cancel_stops_before_polling() {
        let controls = vec![ControlState {
            cancel: true,
            ..Default::default()
        }];
        let (mut driver, sink) = driver(
            vec![Some(OrientationSample::yaw_pitch(10.0, 0.0))],
            controls,
            position_transducer(),
        );
        assert_eq!(driver.tick_with_elapsed(0.002).unwrap(), TickOutcome::Cancelled);
        assert!(sink.deltas().is_empty());
    }

    #[tokio::test]
    async fn test_run_until_source_exhausted() {
        let config = TransducerConfig {
            mode: Mode::Velocity,
            sensitivity: 200.0,
            dead_zone_yaw_degrees: 20.0,
            max_yaw_degrees: 10_000.0,
            ..TransducerConfig::default()
        };
        let samples = vec![Some(OrientationSample::yaw_pitch(50.0, 0.0)); 5];
        let (mut driver, sink) = driver(samples, vec![], Transducer::new(config).unwrap());

        let stats = driver.run().await.unwrap();
        assert_eq!(stats.ticks, 5);
        // The first tick has no elapsed time yet, later ones integrate motion.
        assert!(sink.deltas().iter().all(|d| d.dx > 0 && d.dy == 0));
        assert_eq!(stats.emitted as usize, sink.deltas().len());
    }

    #[tokio::test]
    async fn test_stop_flag_ends_run() {
        let (mut driver, _sink) = driver(
            vec![Some(OrientationSample::neutral()); 1000],
            vec![],
            position_transducer(),
        );
        driver.stop();
        let stats = driver.run().await.unwrap();
        assert_eq!(stats.ticks, 0);
    }
}
