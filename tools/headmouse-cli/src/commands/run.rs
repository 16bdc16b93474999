//! Run the pointer driver.

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use headmouse_common::config::{AppConfig, SinkKind, SourceKind};
use headmouse_driver::backends::{self, LogSink, OpenTrackSource};
use headmouse_driver::replay::ReplaySource;
use headmouse_driver::synthetic::{Pattern, SyntheticSource};
use headmouse_driver::{OrientationSource, PointerSink, TickDriver};
use headmouse_transducer::Transducer;

use crate::PatternArg;

pub struct RunOptions {
    pub trace: Option<PathBuf>,
    pub pattern: PatternArg,
    pub amplitude: f64,
    pub duration_secs: Option<f64>,
    pub record: Option<PathBuf>,
}

pub async fn run(config: AppConfig, options: RunOptions) -> anyhow::Result<()> {
    let transducer = Transducer::from_tuning(&config.tuning)
        .map_err(|e| anyhow::anyhow!("Invalid tuning: {e}"))?;
    let settings = &config.driver;

    let source = open_source(&config, &options)?;
    let sink: Box<dyn PointerSink> = match settings.sink {
        SinkKind::Uinput => backends::open_uinput_sink()?,
        SinkKind::Log => Box::new(LogSink::new()),
    };
    let controls = backends::detect_controls(settings);

    let mut driver = TickDriver::new(source, sink, controls, transducer, settings.tick_rate_hz);
    if let Some(ref path) = options.record {
        driver.record_to(path)?;
    }

    let stop = driver.stop_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, stopping");
            stop.store(true, Ordering::SeqCst);
        }
    });

    if let Some(ref key) = settings.cancel_key {
        println!("Running. Press {key} or Ctrl-C to stop.");
    } else {
        println!("Running. Press Ctrl-C to stop.");
    }

    let stats = driver.run().await?;

    println!();
    println!("Session finished:");
    println!("  Ticks: {}", stats.ticks);
    println!("  Pointer moves: {}", stats.emitted);
    println!("  Skipped ticks: {}", stats.skipped);
    if stats.source_errors > 0 {
        println!("  Source errors: {}", stats.source_errors);
    }
    println!("  Recenters: {}", stats.recenters);
    println!("  Net motion: dx={} dy={}", stats.total_dx, stats.total_dy);
    if let Some(path) = options.record {
        println!("  Trace: {}", path.display());
    }

    Ok(())
}

fn open_source(
    config: &AppConfig,
    options: &RunOptions,
) -> anyhow::Result<Box<dyn OrientationSource>> {
    let settings = &config.driver;
    let source: Box<dyn OrientationSource> = match settings.source {
        SourceKind::Opentrack => Box::new(OpenTrackSource::bind(&settings.opentrack_bind)?),
        SourceKind::Replay => {
            let path = options
                .trace
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--source replay requires --trace <PATH>"))?;
            Box::new(ReplaySource::open(path)?)
        }
        SourceKind::Synthetic => {
            let pattern = match options.pattern {
                PatternArg::Hold => Pattern::Hold {
                    yaw: options.amplitude,
                    pitch: 0.0,
                },
                PatternArg::Sweep => Pattern::Sweep {
                    amplitude: options.amplitude,
                    period_secs: 4.0,
                },
                PatternArg::Steps => Pattern::Steps {
                    amplitude: options.amplitude,
                    dwell_ticks: u64::from(settings.tick_rate_hz),
                },
            };
            let mut source = SyntheticSource::new(pattern, settings.tick_rate_hz);
            if let Some(secs) = options.duration_secs {
                let ticks = (secs.max(0.0) * f64::from(settings.tick_rate_hz)).round() as u64;
                source = source.with_limit(ticks);
            }
            Box::new(source)
        }
    };
    Ok(source)
}
