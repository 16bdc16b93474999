//! Orientation source that plays back a recorded trace.
//!
//! Each poll consumes the next sample or gap record; recorded recenters and
//! deltas are skipped. Playback is paced by the tick loop, not by the
//! recorded timestamps.

use std::collections::VecDeque;
use std::path::Path;

use headmouse_common::error::HeadmouseResult;
use headmouse_transducer::{OrientationSample, PointerDelta, Transducer};

use crate::trace::{Trace, TraceEventKind};
use crate::OrientationSource;

pub struct ReplaySource {
    readings: VecDeque<Option<OrientationSample>>,
    total: usize,
    ignored_recenters: usize,
}

impl ReplaySource {
    pub fn from_trace(trace: &Trace) -> Self {
        let mut readings = VecDeque::with_capacity(trace.events.len());
        let mut ignored_recenters = 0;

        for event in &trace.events {
            match event.kind {
                TraceEventKind::Sample { .. } => readings.push_back(event.orientation()),
                TraceEventKind::Gap => readings.push_back(None),
                TraceEventKind::Recenter => ignored_recenters += 1,
                TraceEventKind::Delta { .. } => {}
            }
        }

        if ignored_recenters > 0 {
            tracing::info!(
                ignored_recenters,
                "Recorded recenters are not replayed live; use `headmouse simulate` for exact playback"
            );
        }

        Self {
            total: readings.len(),
            readings,
            ignored_recenters,
        }
    }

    pub fn open(path: &Path) -> HeadmouseResult<Self> {
        let trace = Trace::load(path)?;
        tracing::info!(path = %path.display(), events = trace.events.len(), "Loaded trace for replay");
        Ok(Self::from_trace(&trace))
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn ignored_recenters(&self) -> usize {
        self.ignored_recenters
    }
}

impl OrientationSource for ReplaySource {
    fn poll(&mut self) -> HeadmouseResult<Option<OrientationSample>> {
        Ok(self.readings.pop_front().flatten())
    }

    fn recenter(&mut self) -> HeadmouseResult<()> {
        // Recorded angles are already relative to the recorded neutral pose.
        Ok(())
    }

    fn name(&self) -> &str {
        "replay"
    }

    fn is_exhausted(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Outcome of feeding a trace through a transducer offline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationReport {
    /// Sample and gap records consumed.
    pub ticks: u64,
    pub gaps: u64,
    pub recenters: u64,
    /// Nonzero deltas produced by the transducer.
    pub emitted: u64,
    pub total_dx: i64,
    pub total_dy: i64,
    /// Ticks whose produced delta differs from the recorded one.
    pub mismatches: u64,
    /// Tick index of the first mismatch.
    pub first_mismatch: Option<u64>,
}

impl SimulationReport {
    pub fn matches_recording(&self) -> bool {
        self.mismatches == 0
    }
}

/// Re-run a recorded session through `transducer`, exactly as the tick loop
/// did: recenters are applied, gaps skip, and each sample is advanced with
/// its recorded elapsed time (or the timestamp difference for traces that
/// lack one). Each produced delta is compared with the delta recorded for
/// the same tick, if any.
pub fn simulate(trace: &Trace, transducer: &mut Transducer) -> SimulationReport {
    let mut report = SimulationReport::default();
    let mut previous_tick_ns: Option<u64> = None;
    let events = &trace.events;

    for (index, event) in events.iter().enumerate() {
        match event.kind {
            TraceEventKind::Recenter => {
                transducer.recenter();
                report.recenters += 1;
            }
            TraceEventKind::Gap => {
                transducer.skip();
                report.ticks += 1;
                report.gaps += 1;
                previous_tick_ns = Some(event.timestamp_ns);
            }
            TraceEventKind::Sample { .. } => {
                let elapsed = event.elapsed_secs().unwrap_or_else(|| {
                    previous_tick_ns.map_or(0.0, |prev| {
                        event.timestamp_ns.saturating_sub(prev) as f64 / 1_000_000_000.0
                    })
                });
                previous_tick_ns = Some(event.timestamp_ns);

                let sample = event.orientation().unwrap_or_default();
                let produced = transducer.advance(&sample, elapsed);
                let recorded = events
                    .get(index + 1)
                    .and_then(|next| next.pointer_delta())
                    .unwrap_or(PointerDelta::ZERO);

                if produced != recorded {
                    report.mismatches += 1;
                    report.first_mismatch.get_or_insert(report.ticks);
                }
                if !produced.is_zero() {
                    report.emitted += 1;
                    report.total_dx += i64::from(produced.dx);
                    report.total_dy += i64::from(produced.dy);
                }
                report.ticks += 1;
            }
            TraceEventKind::Delta { .. } => {}
        }
    }

    report
}
