//! Show configuration or trace information.

use std::path::PathBuf;

use headmouse_common::config::{config_file_path, AppConfig};
use headmouse_driver::trace::{Trace, TraceEventKind};
use headmouse_transducer::TransducerConfig;

pub fn run(
    config: &AppConfig,
    config_path: Option<PathBuf>,
    trace: Option<PathBuf>,
) -> anyhow::Result<()> {
    match trace {
        Some(path) => show_trace(path),
        None => show_config(config, config_path.unwrap_or_else(config_file_path)),
    }
}

fn show_config(config: &AppConfig, path: PathBuf) -> anyhow::Result<()> {
    println!(
        "Config file: {} {}",
        path.display(),
        if path.exists() { "" } else { "(not found, using defaults)" }
    );
    println!();

    match TransducerConfig::from_tuning(&config.tuning) {
        Ok(transducer) => {
            let yaw = transducer.yaw_axis();
            println!("Transducer ({:?} mode):", transducer.mode);
            println!(
                "  Yaw: dead zone {}°, max {}°, {} units/°, step bound {}",
                yaw.dead_zone(),
                yaw.max(),
                yaw.scale(),
                yaw.step_bound()
            );
            match transducer.pitch_axis() {
                Some(pitch) => println!(
                    "  Pitch: dead zone {}°, max {}°, {} units/°, step bound {}",
                    pitch.dead_zone(),
                    pitch.max(),
                    pitch.scale(),
                    pitch.step_bound()
                ),
                None => println!("  Pitch: disabled"),
            }
        }
        Err(e) => println!("Transducer: invalid tuning ({e})"),
    }
    println!();

    println!("Effective configuration:");
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn show_trace(path: PathBuf) -> anyhow::Result<()> {
    let trace = Trace::load(&path).map_err(|e| anyhow::anyhow!("Failed to load trace: {e}"))?;

    println!("Trace: {}", path.display());
    match trace.header {
        Some(ref header) => {
            println!("  Schema: {}", header.schema_version);
            println!("  Started: {}", header.epoch_wall);
            println!("  Tick rate: {} Hz", header.tick_rate_hz);
            println!("  Mode: {:?}", header.mode);
            if !header.source.is_empty() {
                println!("  Source: {}", header.source);
            }
        }
        None => println!("  (no header)"),
    }

    let count = |f: fn(&TraceEventKind) -> bool| {
        trace.events.iter().filter(|e| f(&e.kind)).count()
    };
    let gaps = count(|k| matches!(k, TraceEventKind::Gap));
    let recenters = count(|k| matches!(k, TraceEventKind::Recenter));
    let deltas = count(|k| matches!(k, TraceEventKind::Delta { .. }));
    let duration = trace
        .events
        .last()
        .map(|e| e.timestamp_secs())
        .unwrap_or_default();

    println!();
    println!("Events:");
    println!("  Samples: {}", trace.sample_count());
    println!("  Gaps: {gaps}");
    println!("  Recenters: {recenters}");
    println!("  Deltas: {deltas}");
    println!("  Duration: {duration:.2}s");

    Ok(())
}
