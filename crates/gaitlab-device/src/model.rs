use serde::{Deserialize, Serialize};

/// `GET /status` payload. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stream_fps: Option<u32>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub camera_endpoint: Option<String>,
    #[serde(default)]
    pub uptime_sec: Option<f64>,
}

impl DeviceStatus {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("Unnamed")
    }

    pub fn uptime(&self) -> String {
        format_uptime(self.uptime_sec.unwrap_or(0.0))
    }
}

/// One `GET /logs` entry; the device reports lines it could not parse as
/// `{error, raw}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogEntry {
    Record {
        #[serde(default)]
        time: String,
        #[serde(default)]
        level: String,
        msg: String,
    },
    Unparsed {
        error: String,
        #[serde(default)]
        raw: String,
    },
}

impl LogEntry {
    pub fn line(&self) -> String {
        match self {
            LogEntry::Record { time, level, msg } => format!("{time} [{level}] {msg}"),
            LogEntry::Unparsed { error, raw } => format!("unparsed ({error}): {raw}"),
        }
    }
}

/// Editable device configuration, sent as the `/start_trial` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    pub stream_fps: Option<u32>,
    pub enabled: bool,
    pub camera_endpoint: String,
}

impl DeviceConfig {
    pub fn from_status(status: &DeviceStatus) -> Self {
        Self {
            name: status.name.clone().unwrap_or_default(),
            stream_fps: status.stream_fps,
            enabled: status.enabled.unwrap_or(false),
            camera_endpoint: status.camera_endpoint.clone().unwrap_or_default(),
        }
    }
}

pub fn format_uptime(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours}h {minutes}m {secs}s")
}
