use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/yamp/config.toml` or `~/.config/yamp/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `YAMP__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub polling: PollingSettings,
    pub ui: UiSettings,
    pub controls: ControlsSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Where the playback engine listens. Commands are posted to
    /// `{base_url}/invoke/{command}`.
    pub base_url: String,
    /// Per-command timeout (milliseconds). A call that takes longer counts
    /// as the engine being unavailable.
    pub request_timeout_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:7878".to_string(),
            request_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// How often the transport state is polled while the library or
    /// now-playing view is shown (milliseconds).
    pub interval_ms: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self { interval_ms: 500 }
    }
}

impl PollingSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Whether the library cursor starts in "follow playback" mode.
    pub follow_playback: bool,

    /// The text rendered in the sidebar title box.
    pub header_text: String,

    /// Which track fields to show in the transport bar, and in what order.
    ///
    /// Example: ["artist", "title", "album"]
    pub now_playing_track_fields: Vec<TrackDisplayField>,

    /// Separator used to join `now_playing_track_fields`.
    pub now_playing_track_separator: String,

    /// Which time fields to show in the transport bar, and in what order.
    ///
    /// Example: ["elapsed", "total", "remaining"]
    pub now_playing_time_fields: Vec<TimeField>,

    /// Separator used to join `now_playing_time_fields`.
    pub now_playing_time_separator: String,

    /// How long an error notice stays in the status line (milliseconds).
    pub notice_ttl_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            follow_playback: true,
            header_text: " yamp ".to_string(),
            now_playing_track_fields: vec![TrackDisplayField::Display],
            now_playing_track_separator: " - ".to_string(),
            now_playing_time_fields: vec![TimeField::Elapsed, TimeField::Total, TimeField::Remaining],
            now_playing_time_separator: " / ".to_string(),
            notice_ttl_ms: 5000,
        }
    }
}

impl UiSettings {
    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to seek when pressing `H` / `L`.
    pub scrub_seconds: u64,
    /// Volume change per `+` / `-` press, in `(0, 1]`.
    pub volume_step: f32,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            scrub_seconds: 5,
            volume_step: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` wins when set.
    pub level: String,
    /// Log file. Defaults to `$XDG_STATE_HOME/yamp/yamp.log`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeField {
    Elapsed,
    Total,
    Remaining,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    /// `Artist - Title`, or the best available name.
    Display,
    Title,
    Artist,
    Album,
    Filename,
    Path,
}
