//! Trace event types for recorded sessions.
//!
//! Traces are append-only JSONL. The first line is `# {header}`, every
//! following line is one [`TraceEvent`]. Non-finite angles are written as
//! `null` and read back as NaN.

use serde::{Deserialize, Serialize};

use headmouse_common::error::{HeadmouseError, HeadmouseResult};
use headmouse_transducer::{Mode, OrientationSample, PointerDelta};

pub const TRACE_SCHEMA_VERSION: &str = "1.0";

/// Monotonic timestamp in nanoseconds since session start.
pub type TimestampNs = u64;

/// Session metadata written as the first trace line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceHeader {
    pub schema_version: String,

    /// Wall-clock time at session start (RFC 3339).
    pub epoch_wall: String,

    pub tick_rate_hz: u32,

    /// Consumption mode the deltas were produced with.
    pub mode: Mode,

    /// Name of the orientation source.
    #[serde(default)]
    pub source: String,
}

/// One recorded tick event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    #[serde(rename = "t")]
    pub timestamp_ns: TimestampNs,

    #[serde(flatten)]
    pub kind: TraceEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEventKind {
    /// Orientation reading, degrees.
    Sample {
        yaw: Option<f64>,
        pitch: Option<f64>,
        #[serde(default)]
        roll: Option<f64>,
        /// Elapsed seconds handed to the transducer on this tick.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dt: Option<f64>,
    },

    /// The source had no sample for this tick.
    Gap,

    /// Neutral pose was reset.
    Recenter,

    /// Pointer motion emitted, pitch convention (positive dy = up).
    Delta { dx: i32, dy: i32 },
}

impl TraceEvent {
    pub fn sample(timestamp_ns: TimestampNs, sample: &OrientationSample) -> Self {
        Self {
            timestamp_ns,
            kind: TraceEventKind::Sample {
                yaw: finite(sample.yaw_degrees),
                pitch: finite(sample.pitch_degrees),
                roll: finite(sample.roll_degrees),
                dt: None,
            },
        }
    }

    /// Attach the tick's elapsed time to a sample event.
    pub fn with_elapsed(mut self, elapsed_secs: f64) -> Self {
        if let TraceEventKind::Sample { ref mut dt, .. } = self.kind {
            *dt = finite(elapsed_secs);
        }
        self
    }

    /// Elapsed seconds recorded with a sample event.
    pub fn elapsed_secs(&self) -> Option<f64> {
        match self.kind {
            TraceEventKind::Sample { dt, .. } => dt,
            _ => None,
        }
    }

    pub fn gap(timestamp_ns: TimestampNs) -> Self {
        Self {
            timestamp_ns,
            kind: TraceEventKind::Gap,
        }
    }

    pub fn recenter(timestamp_ns: TimestampNs) -> Self {
        Self {
            timestamp_ns,
            kind: TraceEventKind::Recenter,
        }
    }

    pub fn delta(timestamp_ns: TimestampNs, delta: PointerDelta) -> Self {
        Self {
            timestamp_ns,
            kind: TraceEventKind::Delta {
                dx: delta.dx,
                dy: delta.dy,
            },
        }
    }

    /// Timestamp as fractional seconds since session start.
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp_ns as f64 / 1_000_000_000.0
    }

    /// The orientation carried by a sample event.
    pub fn orientation(&self) -> Option<OrientationSample> {
        match self.kind {
            TraceEventKind::Sample { yaw, pitch, roll, .. } => Some(OrientationSample::new(
                yaw.unwrap_or(f64::NAN),
                pitch.unwrap_or(f64::NAN),
                roll.unwrap_or(f64::NAN),
            )),
            _ => None,
        }
    }

    /// The motion carried by a delta event.
    pub fn pointer_delta(&self) -> Option<PointerDelta> {
        match self.kind {
            TraceEventKind::Delta { dx, dy } => Some(PointerDelta::new(dx, dy)),
            _ => None,
        }
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// A parsed trace file.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    pub header: Option<TraceHeader>,
    pub events: Vec<TraceEvent>,
}

impl Trace {
    pub fn load(path: &std::path::Path) -> HeadmouseResult<Self> {
        if !path.exists() {
            return Err(HeadmouseError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        parse_trace(&content)
    }

    pub fn sample_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, TraceEventKind::Sample { .. }))
            .count()
    }
}

/// Parse trace content. The header line is optional; blank lines and other
/// `#` lines are skipped.
pub fn parse_trace(content: &str) -> HeadmouseResult<Trace> {
    let mut trace = Trace::default();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            if trace.header.is_none() && trace.events.is_empty() {
                trace.header = serde_json::from_str(comment.trim()).ok();
            }
            continue;
        }
        let event = serde_json::from_str(line).map_err(|e| {
            HeadmouseError::trace(format!("line {}: invalid trace event: {e}", index + 1))
        })?;
        trace.events.push(event);
    }

    Ok(trace)
}
