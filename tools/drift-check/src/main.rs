use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use headmouse_common::config::TuningConfig;
use headmouse_common::error::HeadmouseResult;
use headmouse_driver::backends::{NoControls, RecordingSink};
use headmouse_driver::synthetic::{Pattern, SyntheticSource};
use headmouse_driver::{OrientationSource, TickDriver, TickOutcome};
use headmouse_transducer::{Mode, OrientationSample, PointerDelta, Transducer, TransducerConfig};
use tracing_subscriber::EnvFilter;

/// Residual allowed between the emitted total and the desired offset.
const POSITION_TOLERANCE: f64 = 0.5 + 1e-9;

#[derive(Parser, Debug)]
#[command(author, version, about = "Long-run drift and boundedness check for the headmouse transducer", long_about = None)]
struct Args {
    /// Number of ticks to run
    #[arg(long, default_value_t = 60_000)]
    ticks: u64,

    /// Simulated tick rate (Hz)
    #[arg(long, default_value_t = 500)]
    tick_rate: u32,

    /// Synthetic motion pattern
    #[arg(long, value_enum, default_value = "sweep")]
    pattern: PatternArg,

    /// Motion amplitude (degrees)
    #[arg(long, default_value_t = 20.0)]
    amplitude: f64,

    /// Sweep period (seconds)
    #[arg(long, default_value_t = 4.0)]
    period_secs: f64,

    /// Drop every Nth sample (0 disables dropouts)
    #[arg(long, default_value_t = 7)]
    gap_every: u64,

    /// Consumption mode
    #[arg(long, value_enum, default_value = "position")]
    mode: ModeArg,

    /// Pitch multiplier (0 disables the pitch axis)
    #[arg(long, default_value_t = 0.25)]
    y_multiplier: f64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PatternArg {
    Sweep,
    Steps,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Velocity,
    Position,
}

/// Synthetic source that drops every Nth sample, as a lossy tracker would.
struct DropoutSource {
    inner: SyntheticSource,
    gap_every: u64,
    polled: u64,
}

impl OrientationSource for DropoutSource {
    fn poll(&mut self) -> HeadmouseResult<Option<OrientationSample>> {
        let sample = self.inner.poll()?;
        self.polled += 1;
        if self.gap_every > 0 && self.polled % self.gap_every == 0 {
            return Ok(None);
        }
        Ok(sample)
    }

    fn recenter(&mut self) -> HeadmouseResult<()> {
        self.inner.recenter()
    }

    fn name(&self) -> &str {
        "synthetic-dropout"
    }

    fn is_exhausted(&self) -> bool {
        self.inner.is_exhausted()
    }
}

/// Emitted motion since the axis last entered its dead zone.
#[derive(Default)]
struct AxisTracker {
    segment: i64,
    max_error: f64,
    max_step: i32,
    violations: u64,
}

#[derive(Default)]
struct Summary {
    samples: u64,
    gaps: u64,
    emitted: u64,
    yaw: AxisTracker,
    pitch: AxisTracker,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let tuning = TuningConfig {
        y_sensitivity_multiplier: args.y_multiplier,
        ..Default::default()
    };
    let mut config = TransducerConfig::from_tuning(&tuning).context("Invalid tuning")?;
    config.mode = match args.mode {
        ModeArg::Velocity => Mode::Velocity,
        ModeArg::Position => Mode::Position,
    };
    let transducer = Transducer::new(config.clone()).context("Invalid transducer config")?;

    let pattern = match args.pattern {
        PatternArg::Sweep => Pattern::Sweep {
            amplitude: args.amplitude,
            period_secs: args.period_secs,
        },
        PatternArg::Steps => Pattern::Steps {
            amplitude: args.amplitude,
            dwell_ticks: u64::from(args.tick_rate / 2),
        },
    };

    tracing::info!("Starting drift check");
    tracing::info!(
        "Pattern: {:?}, mode: {:?}, ticks: {}, gap every: {}",
        pattern,
        config.mode,
        args.ticks,
        args.gap_every
    );

    let source = DropoutSource {
        inner: SyntheticSource::new(pattern, args.tick_rate).with_limit(args.ticks),
        gap_every: args.gap_every,
        polled: 0,
    };
    let sink = RecordingSink::new();
    let mut driver = TickDriver::new(
        Box::new(source),
        Box::new(sink.clone()),
        Box::new(NoControls),
        transducer,
        args.tick_rate,
    );

    let dt = 1.0 / f64::from(args.tick_rate.max(1));
    let yaw_axis = config.yaw_axis();
    let pitch_axis = config.pitch_axis();
    let mut summary = Summary::default();

    for tick in 0..args.ticks {
        let outcome = driver.tick_with_elapsed(dt)?;
        let delta = match outcome {
            TickOutcome::Emitted(delta) => delta,
            TickOutcome::Idle => PointerDelta::ZERO,
            TickOutcome::Skipped(_) => {
                summary.gaps += 1;
                continue;
            }
            TickOutcome::Cancelled => anyhow::bail!("Driver cancelled without a cancel source"),
        };
        summary.samples += 1;
        if !delta.is_zero() {
            summary.emitted += 1;
        }

        let sample = pattern.at(tick, args.tick_rate);
        check_axis(
            &mut summary.yaw,
            &yaw_axis,
            sample.yaw_degrees,
            delta.dx,
            &config,
            dt,
            tick,
            "yaw",
        );
        match pitch_axis {
            Some(ref axis) => check_axis(
                &mut summary.pitch,
                axis,
                sample.pitch_degrees,
                delta.dy,
                &config,
                dt,
                tick,
                "pitch",
            ),
            None if delta.dy != 0 => {
                summary.pitch.violations += 1;
                tracing::warn!(tick, dy = delta.dy, "Pitch disabled but motion emitted");
            }
            None => {}
        }
    }

    let recorded: (i64, i64) = sink
        .deltas()
        .iter()
        .fold((0, 0), |(x, y), d| (x + i64::from(d.dx), y + i64::from(d.dy)));
    let stats = driver.stats();
    let sink_consistent = recorded == (stats.total_dx, stats.total_dy);

    println!("---------------------------------------------------");
    println!("Summary:");
    println!("Samples: {} ({} dropped)", summary.samples, summary.gaps);
    println!("Pointer moves: {}", summary.emitted);
    for (name, axis) in [("Yaw", &summary.yaw), ("Pitch", &summary.pitch)] {
        println!(
            "{name}: max step {}, max residual {:.3}, violations {}",
            axis.max_step, axis.max_error, axis.violations
        );
    }
    println!(
        "Sink total: dx={} dy={} ({})",
        recorded.0,
        recorded.1,
        if sink_consistent { "consistent" } else { "MISMATCH" }
    );

    let violations = summary.yaw.violations + summary.pitch.violations;
    if violations == 0 && sink_consistent {
        println!("SUCCESS: No drift or unbounded steps detected.");
        Ok(())
    } else {
        println!("FAILURE: Drift or unbounded steps detected.");
        anyhow::bail!("{violations} violation(s) over {} ticks", args.ticks);
    }
}

#[allow(clippy::too_many_arguments)]
fn check_axis(
    tracker: &mut AxisTracker,
    axis: &headmouse_transducer::axis::AxisConfig,
    angle: f64,
    step: i32,
    config: &TransducerConfig,
    dt: f64,
    tick: u64,
    name: &str,
) {
    tracker.max_step = tracker.max_step.max(step.abs());
    if f64::from(step.abs()) > axis.step_bound() {
        tracker.violations += 1;
        tracing::warn!(tick, axis = name, step, bound = axis.step_bound(), "Step out of bounds");
    }

    match config.mode {
        Mode::Position => {
            if axis.is_dead(angle) {
                if step != 0 {
                    tracker.violations += 1;
                    tracing::warn!(tick, axis = name, step, "Motion inside dead zone");
                }
                tracker.segment = 0;
                return;
            }
            tracker.segment += i64::from(step);
            let error = (tracker.segment as f64 - axis.desired(angle)).abs();
            tracker.max_error = tracker.max_error.max(error);
            if error > POSITION_TOLERANCE {
                tracker.violations += 1;
                tracing::warn!(tick, axis = name, error, "Pointer drifted from head pose");
            }
        }
        Mode::Velocity => {
            let expected = (axis.desired(angle) * config.effective_elapsed(dt))
                .round_ties_even()
                .clamp(-axis.step_bound(), axis.step_bound());
            let error = (f64::from(step) - expected).abs();
            tracker.max_error = tracker.max_error.max(error);
            if error > 0.0 {
                tracker.violations += 1;
                tracing::warn!(tick, axis = name, step, expected, "Unexpected velocity step");
            }
        }
    }
}
