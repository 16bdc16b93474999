//! Application configuration.
//!
//! The configuration is read once at startup and never reloaded; the
//! transducer treats its tuning as fixed for the life of the process.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{HeadmouseError, HeadmouseResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Orientation-to-pointer tuning.
    pub tuning: TuningConfig,

    /// Tick loop, source, sink and key bindings.
    pub driver: DriverSettings,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// How orientation is consumed into pointer motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TuningMode {
    /// Deviation drives a pointer rate.
    Velocity,
    /// Deviation maps to an absolute pointer offset.
    #[default]
    Position,
}

/// Raw tuning values as written in the config file.
///
/// These are validated when the transducer is built from them; nothing here
/// is checked on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Pointer units per degree beyond the dead zone.
    pub sensitivity: f64,

    /// Extra factor for the pitch axis; 0 disables pitch.
    pub y_sensitivity_multiplier: f64,

    pub dead_zone_yaw_degrees: f64,
    pub dead_zone_pitch_degrees: f64,

    /// Orientation beyond these magnitudes is clamped.
    pub max_yaw_degrees: f64,
    pub max_pitch_degrees: f64,

    pub mode: TuningMode,

    /// Upper bound on the elapsed time a single velocity tick may integrate.
    pub max_elapsed_secs: f64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        // Tuned for a 3200x2000 desktop with a 1000 DPI mouse: the full
        // yaw range maps to 650 pointer units, pitch (when enabled) to 100.
        let sensitivity = 25.0;
        let dead_zone = 2.5;
        Self {
            sensitivity,
            y_sensitivity_multiplier: 0.0,
            dead_zone_yaw_degrees: dead_zone,
            dead_zone_pitch_degrees: dead_zone,
            max_yaw_degrees: 650.0 / sensitivity + dead_zone,
            max_pitch_degrees: 100.0 / (sensitivity * 0.25) + dead_zone,
            mode: TuningMode::Position,
            max_elapsed_secs: 0.1,
        }
    }
}

/// Where orientation samples come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// opentrack "UDP over network" output.
    #[default]
    Opentrack,
    /// A recorded JSONL trace.
    Replay,
    /// Generated test motion.
    Synthetic,
}

/// Where pointer deltas go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Linux uinput virtual mouse.
    #[default]
    Uinput,
    /// Log deltas only.
    Log,
}

/// Tick loop and I/O settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    /// Target tick rate (Hz). Not guaranteed exact.
    pub tick_rate_hz: u32,

    pub source: SourceKind,
    pub sink: SinkKind,

    /// Local address the opentrack receiver binds to.
    pub opentrack_bind: String,

    /// evdev key names (e.g. "KEY_F8").
    pub cancel_key: Option<String>,
    pub recenter_key: Option<String>,
    pub pause_key: Option<String>,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            tick_rate_hz: 500,
            source: SourceKind::Opentrack,
            sink: SinkKind::Uinput,
            opentrack_bind: "127.0.0.1:4242".to_string(),
            cancel_key: Some("KEY_F8".to_string()),
            recenter_key: Some("KEY_RIGHTCTRL".to_string()),
            pause_key: Some("KEY_LEFTALT".to_string()),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "headmouse_driver=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Missing or malformed files are errors.
    pub fn load_from(path: &Path) -> HeadmouseResult<Self> {
        if !path.exists() {
            return Err(HeadmouseError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        tracing::debug!(?path, "Loaded config");
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> HeadmouseResult<PathBuf> {
        let config_path = config_file_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> HeadmouseResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("headmouse").join("config.json")
}
