//! Capability detection and guidance.
//!
//! Which capabilities are required depends on the configured source and
//! sink: a log-only replay needs nothing from the system.

use std::net::UdpSocket;
use std::path::Path;

use headmouse_common::config::{DriverSettings, SinkKind, SourceKind};

/// A system capability the driver may need.
#[derive(Debug, Clone)]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub required: bool,
    pub fix_instructions: Option<String>,
}

impl Capability {
    /// Required but unavailable.
    pub fn is_blocking(&self) -> bool {
        self.required && !self.available
    }
}

/// Check all capabilities for the given settings.
pub fn check_capabilities(settings: &DriverSettings) -> Vec<Capability> {
    vec![
        check_uinput_access(settings.sink == SinkKind::Uinput),
        check_keyboard_access(),
        check_opentrack_port(
            &settings.opentrack_bind,
            settings.source == SourceKind::Opentrack,
        ),
    ]
}

#[cfg(target_os = "linux")]
fn uinput_writable() -> bool {
    crate::backends::uinput::UinputSink::is_supported()
}

#[cfg(not(target_os = "linux"))]
fn uinput_writable() -> bool {
    false
}

/// Check that the uinput device can be opened for writing.
fn check_uinput_access(required: bool) -> Capability {
    let exists = Path::new("/dev/uinput").exists();
    let available = exists && uinput_writable();

    Capability {
        name: "Virtual Pointer (uinput)".to_string(),
        description: "Write access to /dev/uinput for pointer injection".to_string(),
        available,
        required,
        fix_instructions: if !exists {
            Some("Load the uinput module: sudo modprobe uinput".to_string())
        } else if !available {
            Some(
                "Allow the input group to write uinput, e.g. udev rule KERNEL==\"uinput\", GROUP=\"input\", MODE=\"0660\", then: sudo usermod -aG input $USER (logout required)"
                    .to_string(),
            )
        } else {
            None
        },
    }
}

/// Check that at least one evdev node is readable (cancel/recenter keys).
fn check_keyboard_access() -> Capability {
    let readable = std::fs::read_dir("/dev/input")
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|entry| entry.file_name().to_string_lossy().starts_with("event"))
                .any(|entry| std::fs::File::open(entry.path()).is_ok())
        })
        .unwrap_or(false);

    Capability {
        name: "Keyboard Controls".to_string(),
        description: "Read access to /dev/input/event* for cancel, recenter, and pause keys"
            .to_string(),
        available: readable,
        required: false, // Ctrl-C still stops the loop
        fix_instructions: if readable {
            None
        } else {
            Some(
                "Add user to input group: sudo usermod -aG input $USER (logout required)"
                    .to_string(),
            )
        },
    }
}

/// Check that the opentrack UDP port can be bound.
fn check_opentrack_port(bind: &str, required: bool) -> Capability {
    let result = UdpSocket::bind(bind);
    let available = result.is_ok();

    Capability {
        name: "opentrack UDP".to_string(),
        description: format!("Receive head pose datagrams on {bind}"),
        available,
        required,
        fix_instructions: result.err().map(|e| {
            format!(
                "Cannot bind {bind} ({e}); stop the other listener or change driver.opentrack_bind"
            )
        }),
    }
}

/// Print a user-friendly capability report.
pub fn print_capability_report(capabilities: &[Capability]) {
    println!("Headmouse System Capabilities:");
    println!("{}", "-".repeat(60));

    for cap in capabilities {
        let status = if cap.available {
            "[OK]"
        } else if cap.required {
            "[MISSING - REQUIRED]"
        } else {
            "[MISSING - OPTIONAL]"
        };

        println!("  {} {}: {}", status, cap.name, cap.description);

        if let Some(ref fix) = cap.fix_instructions {
            println!("    Fix: {fix}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirements_follow_settings() {
        let settings = DriverSettings {
            source: SourceKind::Synthetic,
            sink: SinkKind::Log,
            opentrack_bind: "127.0.0.1:0".to_string(),
            ..Default::default()
        };
        let caps = check_capabilities(&settings);
        assert_eq!(caps.len(), 3);
        assert!(caps.iter().all(|cap| !cap.required));
        assert!(caps.iter().all(|cap| !cap.is_blocking()));
    }

    #[test]
    fn test_ephemeral_port_is_bindable() {
        let cap = check_opentrack_port("127.0.0.1:0", true);
        assert!(cap.available);
        assert!(cap.fix_instructions.is_none());
    }

    #[test]
    fn test_occupied_port_reports_fix() {
        let holder = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = holder.local_addr().unwrap().to_string();
        let cap = check_opentrack_port(&addr, true);
        assert!(!cap.available);
        assert!(cap.is_blocking());
        assert!(cap.fix_instructions.unwrap().contains(&addr));
    }
}
