//! Key-state controls read from evdev keyboards.
//!
//! Keys are polled, not streamed: each tick asks every keyboard which keys
//! are currently down. Recenter fires on the press edge; cancel and pause
//! act on the held level.

use evdev::{Device, Key};

use headmouse_common::config::DriverSettings;
use headmouse_common::error::{HeadmouseError, HeadmouseResult};

use crate::{ControlSignals, ControlState};

/// Keys the controls react to. `None` disables a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyBindings {
    pub cancel: Option<Key>,
    pub recenter: Option<Key>,
    pub pause: Option<Key>,
}

impl KeyBindings {
    pub fn from_settings(settings: &DriverSettings) -> HeadmouseResult<Self> {
        Ok(Self {
            cancel: settings.cancel_key.as_deref().map(parse_key).transpose()?,
            recenter: settings.recenter_key.as_deref().map(parse_key).transpose()?,
            pause: settings.pause_key.as_deref().map(parse_key).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.cancel.is_none() && self.recenter.is_none() && self.pause.is_none()
    }

    fn keys(&self) -> impl Iterator<Item = Key> {
        [self.cancel, self.recenter, self.pause].into_iter().flatten()
    }
}

/// Resolve a key name such as "KEY_F8" (the `KEY_` prefix is optional,
/// case-insensitive).
pub fn parse_key(name: &str) -> HeadmouseResult<Key> {
    let upper = name.trim().to_ascii_uppercase();
    let bare = upper.strip_prefix("KEY_").unwrap_or(&upper);
    let key = match bare {
        "ESC" => Key::KEY_ESC,
        "F1" => Key::KEY_F1,
        "F2" => Key::KEY_F2,
        "F3" => Key::KEY_F3,
        "F4" => Key::KEY_F4,
        "F5" => Key::KEY_F5,
        "F6" => Key::KEY_F6,
        "F7" => Key::KEY_F7,
        "F8" => Key::KEY_F8,
        "F9" => Key::KEY_F9,
        "F10" => Key::KEY_F10,
        "F11" => Key::KEY_F11,
        "F12" => Key::KEY_F12,
        "LEFTCTRL" => Key::KEY_LEFTCTRL,
        "RIGHTCTRL" => Key::KEY_RIGHTCTRL,
        "LEFTALT" => Key::KEY_LEFTALT,
        "RIGHTALT" => Key::KEY_RIGHTALT,
        "LEFTSHIFT" => Key::KEY_LEFTSHIFT,
        "RIGHTSHIFT" => Key::KEY_RIGHTSHIFT,
        "LEFTMETA" => Key::KEY_LEFTMETA,
        "RIGHTMETA" => Key::KEY_RIGHTMETA,
        "CAPSLOCK" => Key::KEY_CAPSLOCK,
        "SCROLLLOCK" => Key::KEY_SCROLLLOCK,
        "PAUSE" => Key::KEY_PAUSE,
        "INSERT" => Key::KEY_INSERT,
        "HOME" => Key::KEY_HOME,
        "END" => Key::KEY_END,
        "PAGEUP" => Key::KEY_PAGEUP,
        "PAGEDOWN" => Key::KEY_PAGEDOWN,
        "SPACE" => Key::KEY_SPACE,
        _ => {
            return Err(HeadmouseError::config(format!(
                "unsupported key name '{name}'"
            )))
        }
    };
    Ok(key)
}

pub struct EvdevKeyControls {
    devices: Vec<Device>,
    bindings: KeyBindings,
    recenter_was_down: bool,
    all_lost_reported: bool,
}

impl EvdevKeyControls {
    /// Open every readable device that reports at least one bound key.
    pub fn open(bindings: KeyBindings) -> HeadmouseResult<Self> {
        let devices: Vec<Device> = evdev::enumerate()
            .map(|(_, device)| device)
            .filter(|device| {
                device
                    .supported_keys()
                    .map_or(false, |keys| bindings.keys().any(|key| keys.contains(key)))
            })
            .collect();

        if devices.is_empty() {
            return Err(HeadmouseError::controls(
                "no readable keyboard under /dev/input reports the bound keys (is the user in the 'input' group?)",
            ));
        }

        for device in &devices {
            tracing::debug!(name = device.name().unwrap_or("unnamed"), "Watching keyboard");
        }

        Ok(Self {
            devices,
            bindings,
            recenter_was_down: false,
            all_lost_reported: false,
        })
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    fn is_down(&self, key: Option<Key>, held: &[Key]) -> bool {
        key.map_or(false, |key| held.contains(&key))
    }
}

/// Gather the held keys reported by each device. A device that fails to
/// answer is removed from the list with a single warning.
fn collect_held<D>(
    devices: &mut Vec<D>,
    mut read_held: impl FnMut(&D) -> std::io::Result<Vec<Key>>,
) -> Vec<Key> {
    let mut held = Vec::new();
    devices.retain(|device| match read_held(device) {
        Ok(keys) => {
            held.extend(keys);
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "Keyboard stopped responding, no longer watching it");
            false
        }
    });
    held
}

impl ControlSignals for EvdevKeyControls {
    fn poll(&mut self) -> HeadmouseResult<ControlState> {
        let bindings = self.bindings;
        let held = collect_held(&mut self.devices, |device| {
            let state = device.get_key_state()?;
            Ok(bindings.keys().filter(|key| state.contains(*key)).collect())
        });

        if self.devices.is_empty() {
            self.recenter_was_down = false;
            if self.all_lost_reported {
                return Ok(ControlState::default());
            }
            self.all_lost_reported = true;
            return Err(HeadmouseError::controls(
                "every watched keyboard is gone; cancel, recenter and pause keys are inactive",
            ));
        }

        let recenter_down = self.is_down(self.bindings.recenter, &held);
        let recenter = recenter_down && !self.recenter_was_down;
        self.recenter_was_down = recenter_down;

        Ok(ControlState {
            cancel: self.is_down(self.bindings.cancel, &held),
            recenter,
            paused: self.is_down(self.bindings.pause, &held),
        })
    }
}
