//! Append-only trace writer for crash-safe session recording.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use headmouse_common::error::{HeadmouseError, HeadmouseResult};

use crate::trace::{TraceEvent, TraceHeader};

/// Writes trace events to a JSONL file.
pub struct TraceWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    events_written: u64,
}

impl TraceWriter {
    /// Create a new trace writer, writing the header as the first line.
    pub fn create(path: impl AsRef<Path>, header: &TraceHeader) -> HeadmouseResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        let mut writer = BufWriter::new(file);

        let header_json = serde_json::to_string(header)?;
        writeln!(writer, "# {header_json}")
            .map_err(|e| HeadmouseError::trace(format!("Failed to write header: {e}")))?;

        Ok(Self {
            writer,
            path,
            events_written: 0,
        })
    }

    /// Write a single event as a JSONL line.
    pub fn write_event(&mut self, event: &TraceEvent) -> HeadmouseResult<()> {
        let json = serde_json::to_string(event)?;
        writeln!(self.writer, "{json}")
            .map_err(|e| HeadmouseError::trace(format!("Failed to write event: {e}")))?;
        self.events_written += 1;

        // A 500 Hz session writes about 1000 lines a second.
        if self.events_written % 1000 == 0 {
            self.flush()?;
        }

        Ok(())
    }

    /// Flush buffered writes to disk.
    pub fn flush(&mut self) -> HeadmouseResult<()> {
        self.writer
            .flush()
            .map_err(|e| HeadmouseError::trace(format!("Failed to flush trace: {e}")))?;
        Ok(())
    }

    pub fn events_written(&self) -> u64 {
        self.events_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TraceWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{parse_trace, TRACE_SCHEMA_VERSION};
    use headmouse_transducer::{Mode, OrientationSample, PointerDelta};

    #[test]
    fn test_trace_writer_output_parses_back() {
        let dir = std::env::temp_dir().join("headmouse_test_writer");
        let _ = std::fs::remove_dir_all(&dir);

        let path = dir.join("session.jsonl");
        let header = TraceHeader {
            schema_version: TRACE_SCHEMA_VERSION.to_string(),
            epoch_wall: "2026-01-01T00:00:00Z".to_string(),
            tick_rate_hz: 500,
            mode: Mode::Position,
            source: "synthetic".to_string(),
        };

        {
            let mut writer = TraceWriter::create(&path, &header).unwrap();
            writer
                .write_event(&TraceEvent::sample(
                    0,
                    &OrientationSample::new(10.0, 1.0, 0.5),
                ))
                .unwrap();
            writer
                .write_event(&TraceEvent::delta(0, PointerDelta::new(188, 0)))
                .unwrap();
            writer.write_event(&TraceEvent::gap(2_000_000)).unwrap();
            assert_eq!(writer.events_written(), 3);
        }

        // Dropping the writer flushed it.
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4);
        assert!(content.starts_with("# "));

        let trace = parse_trace(&content).unwrap();
        assert_eq!(trace.header, Some(header));
        assert_eq!(trace.events.len(), 3);
        assert_eq!(trace.sample_count(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }
}
