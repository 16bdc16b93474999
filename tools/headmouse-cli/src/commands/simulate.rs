//! Re-run a recorded trace offline.

use std::path::PathBuf;

use headmouse_common::config::{AppConfig, TuningMode};
use headmouse_driver::replay;
use headmouse_driver::trace::Trace;
use headmouse_transducer::{Mode, Transducer};

pub fn run(
    config: AppConfig,
    path: PathBuf,
    mode: Option<TuningMode>,
    strict: bool,
) -> anyhow::Result<()> {
    let trace =
        Trace::load(&path).map_err(|e| anyhow::anyhow!("Failed to load trace: {e}"))?;

    let mut tuning = config.tuning;
    if let Some(mode) = mode {
        tuning.mode = mode;
    } else if let Some(ref header) = trace.header {
        tuning.mode = match header.mode {
            Mode::Velocity => TuningMode::Velocity,
            Mode::Position => TuningMode::Position,
        };
    }

    let mut transducer = Transducer::from_tuning(&tuning)
        .map_err(|e| anyhow::anyhow!("Invalid tuning: {e}"))?;
    let report = replay::simulate(&trace, &mut transducer);

    println!("Simulated {}", path.display());
    println!("  Mode: {:?}", transducer.config().mode);
    println!("  Ticks: {} ({} gaps)", report.ticks, report.gaps);
    println!("  Recenters: {}", report.recenters);
    println!("  Pointer moves: {}", report.emitted);
    println!("  Net motion: dx={} dy={}", report.total_dx, report.total_dy);
    println!(
        "  Final accumulator: yaw={:.3} pitch={:.3}",
        transducer.state().applied_yaw(),
        transducer.state().applied_pitch()
    );

    if report.matches_recording() {
        println!("  Recorded deltas reproduced exactly.");
        return Ok(());
    }

    println!(
        "  {} tick(s) differ from the recording (first at tick {}).",
        report.mismatches,
        report.first_mismatch.unwrap_or_default()
    );
    if strict {
        anyhow::bail!("simulation diverged from the recorded deltas");
    }
    Ok(())
}
