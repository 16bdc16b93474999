//! Source, sink, and control backend implementations.
//!
//! Platform backends live in submodules; the in-memory backends here are
//! used by tests, replays, and dry runs.

pub mod opentrack;

#[cfg(target_os = "linux")]
pub mod keyboard;
#[cfg(target_os = "linux")]
pub mod uinput;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use headmouse_common::config::DriverSettings;
use headmouse_common::error::HeadmouseResult;
use headmouse_transducer::{OrientationSample, PointerDelta};

use crate::{ControlSignals, ControlState, OrientationSource, PointerSink};

pub use opentrack::OpenTrackSource;

/// Source backed by an in-memory sequence. `None` entries are ticks with no
/// sample. Exhausted once the sequence is consumed.
pub struct ScriptedSource {
    samples: VecDeque<Option<OrientationSample>>,
    recenters: u32,
}

impl ScriptedSource {
    pub fn new(samples: Vec<Option<OrientationSample>>) -> Self {
        Self {
            samples: samples.into(),
            recenters: 0,
        }
    }

    pub fn recenters(&self) -> u32 {
        self.recenters
    }
}

impl OrientationSource for ScriptedSource {
    fn poll(&mut self) -> HeadmouseResult<Option<OrientationSample>> {
        Ok(self.samples.pop_front().flatten())
    }

    fn recenter(&mut self) -> HeadmouseResult<()> {
        self.recenters += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn is_exhausted(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Sink that keeps every delta in memory. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct RecordingSink {
    deltas: Arc<Mutex<Vec<PointerDelta>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deltas(&self) -> Vec<PointerDelta> {
        self.deltas
            .lock()
            .map(|deltas| deltas.clone())
            .unwrap_or_default()
    }
}

impl PointerSink for RecordingSink {
    fn inject(&mut self, delta: PointerDelta) -> HeadmouseResult<()> {
        if let Ok(mut deltas) = self.deltas.lock() {
            deltas.push(delta);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Sink that only logs motion, in screen coordinates.
#[derive(Default)]
pub struct LogSink {
    injected: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PointerSink for LogSink {
    fn inject(&mut self, delta: PointerDelta) -> HeadmouseResult<()> {
        let (x, y) = delta.screen_motion();
        self.injected += 1;
        tracing::info!(x, y, n = self.injected, "Pointer move");
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Controls that never signal anything.
pub struct NoControls;

impl ControlSignals for NoControls {
    fn poll(&mut self) -> HeadmouseResult<ControlState> {
        Ok(ControlState::default())
    }
}

/// Controls replayed from a sequence, then idle.
pub struct ScriptedControls {
    states: VecDeque<ControlState>,
}

impl ScriptedControls {
    pub fn new(states: Vec<ControlState>) -> Self {
        Self {
            states: states.into(),
        }
    }
}

impl ControlSignals for ScriptedControls {
    fn poll(&mut self) -> HeadmouseResult<ControlState> {
        Ok(self.states.pop_front().unwrap_or_default())
    }
}

/// Open the uinput virtual mouse.
#[cfg(target_os = "linux")]
pub fn open_uinput_sink() -> HeadmouseResult<Box<dyn PointerSink>> {
    let sink = uinput::UinputSink::new(uinput::DEVICE_NAME)?;
    tracing::info!(device = uinput::DEVICE_NAME, "Using uinput sink");
    Ok(Box::new(sink))
}

#[cfg(not(target_os = "linux"))]
pub fn open_uinput_sink() -> HeadmouseResult<Box<dyn PointerSink>> {
    Err(headmouse_common::error::HeadmouseError::unsupported(
        "uinput pointer injection is only available on Linux",
    ))
}

/// Build key-state controls from the configured key names, falling back to
/// no controls when keyboards cannot be read.
#[cfg(target_os = "linux")]
pub fn detect_controls(settings: &DriverSettings) -> Box<dyn ControlSignals> {
    let bindings = match keyboard::KeyBindings::from_settings(settings) {
        Ok(bindings) => bindings,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid key binding, keyboard controls disabled");
            return Box::new(NoControls);
        }
    };
    if bindings.is_empty() {
        return Box::new(NoControls);
    }

    match keyboard::EvdevKeyControls::open(bindings) {
        Ok(controls) => {
            tracing::info!(keyboards = controls.device_count(), "Using evdev key controls");
            Box::new(controls)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Keyboard state unavailable; only Ctrl-C will stop the loop"
            );
            Box::new(NoControls)
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn detect_controls(_settings: &DriverSettings) -> Box<dyn ControlSignals> {
    tracing::warn!("Key-state controls are not implemented for this platform; using Ctrl-C only");
    Box::new(NoControls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_source_exhausts() {
        let mut source = ScriptedSource::new(vec![
            Some(OrientationSample::yaw_pitch(1.0, 2.0)),
            None,
        ]);
        assert!(!source.is_exhausted());
        assert_eq!(
            source.poll().unwrap(),
            Some(OrientationSample::yaw_pitch(1.0, 2.0))
        );
        assert_eq!(source.poll().unwrap(), None);
        assert!(source.is_exhausted());
        assert_eq!(source.poll().unwrap(), None);

        source.recenter().unwrap();
        assert_eq!(source.recenters(), 1);
    }

    #[test]
    fn test_recording_sink_clones_share_buffer() {
        let sink = RecordingSink::new();
        let mut handle = sink.clone();
        handle.inject(PointerDelta::new(1, 2)).unwrap();
        assert_eq!(sink.deltas(), vec![PointerDelta::new(1, 2)]);
    }

    #[test]
    fn test_scripted_controls_go_idle() {
        let mut controls = ScriptedControls::new(vec![ControlState {
            recenter: true,
            ..Default::default()
        }]);
        assert!(controls.poll().unwrap().recenter);
        assert_eq!(controls.poll().unwrap(), ControlState::default());
    }
}
