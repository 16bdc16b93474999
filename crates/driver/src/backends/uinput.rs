//! Virtual relative mouse via `/dev/uinput`.

use std::os::unix::fs::MetadataExt;

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key, RelativeAxisType};

use headmouse_common::error::{HeadmouseError, HeadmouseResult};
use headmouse_transducer::PointerDelta;

use crate::PointerSink;

pub const DEVICE_NAME: &str = "headmouse virtual pointer";
pub const UINPUT_PATH: &str = "/dev/uinput";

pub struct UinputSink {
    device: VirtualDevice,
}

impl UinputSink {
    pub fn new(name: &str) -> HeadmouseResult<Self> {
        // Desktop environments only treat a relative device as a mouse when
        // it also advertises a button.
        let mut keys = AttributeSet::<Key>::new();
        keys.insert(Key::BTN_LEFT);
        keys.insert(Key::BTN_RIGHT);

        let mut axes = AttributeSet::<RelativeAxisType>::new();
        axes.insert(RelativeAxisType::REL_X);
        axes.insert(RelativeAxisType::REL_Y);

        let device = VirtualDeviceBuilder::new()
            .and_then(|builder| builder.name(name).with_keys(&keys))
            .and_then(|builder| builder.with_relative_axes(&axes))
            .and_then(|builder| builder.build())
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    HeadmouseError::PermissionDenied {
                        message: uinput_diagnostic(),
                    }
                } else {
                    HeadmouseError::sink(format!("Failed to create uinput device: {e}"))
                }
            })?;

        Ok(Self { device })
    }

    /// Whether this process can open the uinput device for writing.
    pub fn is_supported() -> bool {
        std::fs::OpenOptions::new()
            .write(true)
            .open(UINPUT_PATH)
            .is_ok()
    }
}

impl PointerSink for UinputSink {
    fn inject(&mut self, delta: PointerDelta) -> HeadmouseResult<()> {
        let (x, y) = delta.screen_motion();
        let mut events = Vec::with_capacity(2);
        if x != 0 {
            events.push(InputEvent::new(
                EventType::RELATIVE,
                RelativeAxisType::REL_X.0,
                x,
            ));
        }
        if y != 0 {
            events.push(InputEvent::new(
                EventType::RELATIVE,
                RelativeAxisType::REL_Y.0,
                y,
            ));
        }
        if events.is_empty() {
            return Ok(());
        }

        // emit() appends the SYN_REPORT.
        self.device
            .emit(&events)
            .map_err(|e| HeadmouseError::sink(format!("uinput write failed: {e}")))
    }

    fn name(&self) -> &str {
        "uinput"
    }
}

/// Explain why `/dev/uinput` could not be opened.
pub fn uinput_diagnostic() -> String {
    let uid = unsafe { libc::geteuid() };
    let gid = unsafe { libc::getegid() };

    match std::fs::metadata(UINPUT_PATH) {
        Ok(meta) => {
            let mode = meta.mode() & 0o777;
            let owner = meta.uid();
            let group = meta.gid();
            format!(
                "device={UINPUT_PATH} mode={mode:o} owner_uid={owner} owner_gid={group} process_uid={uid} process_gid={gid}; grant write access, e.g. a udev rule KERNEL==\"uinput\", GROUP=\"input\", MODE=\"0660\" and membership in the 'input' group"
            )
        }
        Err(err) => format!(
            "device={UINPUT_PATH} unavailable ({err}); load the module with: sudo modprobe uinput"
        ),
    }
}
