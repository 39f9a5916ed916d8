use crate::model::{DeviceConfig, DeviceStatus, LogEntry};
use gaitlab_core::settings::DeviceSettings;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceError {
    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },
    #[error("device unreachable: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    Rename { name: String },
    StartTrial(DeviceConfig),
    StopTrial,
    ListFiles,
    Restart,
}

impl DeviceCommand {
    pub fn path(&self) -> &'static str {
        match self {
            DeviceCommand::Rename { .. } => "/rename",
            DeviceCommand::StartTrial(_) => "/start_trial",
            DeviceCommand::StopTrial => "/stop_trial",
            DeviceCommand::ListFiles => "/files",
            DeviceCommand::Restart => "/restart",
        }
    }

    pub fn body(&self) -> Option<Value> {
        match self {
            DeviceCommand::Rename { name } => Some(json!({ "name": name })),
            DeviceCommand::StartTrial(config) => serde_json::to_value(config).ok(),
            _ => None,
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            DeviceCommand::Rename { .. } => "Device renamed successfully!",
            DeviceCommand::StartTrial(_) => "Trial started successfully!",
            DeviceCommand::StopTrial => "Trial stopped successfully!",
            DeviceCommand::ListFiles => "File listing initiated!",
            DeviceCommand::Restart => "Device restart initiated!",
        }
    }

    /// Whether status should be re-read once the command succeeds.
    pub fn refreshes_status(&self) -> bool {
        !matches!(self, DeviceCommand::Restart)
    }
}

/// Seam between the panel and the device's REST API.
pub trait DeviceApi {
    fn status(&self) -> Result<DeviceStatus, DeviceError>;
    fn logs(&self) -> Result<Vec<LogEntry>, DeviceError>;
    fn send(&self, command: &DeviceCommand) -> Result<Value, DeviceError>;
}

#[derive(Debug, Clone)]
pub struct HttpDeviceClient {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpDeviceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn from_settings(settings: &DeviceSettings) -> Self {
        Self::new(&settings.base_url, settings.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json(&self, path: &str) -> Result<Value, DeviceError> {
        let response = self
            .agent
            .get(&self.endpoint(path))
            .set("Accept", "application/json")
            .call()
            .map_err(map_ureq_error)?;
        response
            .into_json::<Value>()
            .map_err(|e| DeviceError::Decode(e.to_string()))
    }

    fn post_json(&self, path: &str, body: Option<Value>) -> Result<Value, DeviceError> {
        let request = self
            .agent
            .post(&self.endpoint(path))
            .set("Content-Type", "application/json");
        let response = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        }
        .map_err(map_ureq_error)?;
        let text = response
            .into_string()
            .map_err(|e| DeviceError::Decode(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| DeviceError::Decode(e.to_string()))
    }
}

fn map_ureq_error(err: ureq::Error) -> DeviceError {
    match err {
        ureq::Error::Status(status, response) => DeviceError::Http {
            status,
            reason: response.status_text().to_string(),
        },
        ureq::Error::Transport(transport) => DeviceError::Transport(transport.to_string()),
    }
}

/// Anything but a JSON array reads as an empty log; malformed entries are kept
/// as [`LogEntry::Unparsed`].
pub fn parse_logs(value: Value) -> Vec<LogEntry> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| {
                serde_json::from_value::<LogEntry>(item.clone()).unwrap_or_else(|err| {
                    LogEntry::Unparsed {
                        error: err.to_string(),
                        raw: item.to_string(),
                    }
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}

impl DeviceApi for HttpDeviceClient {
    fn status(&self) -> Result<DeviceStatus, DeviceError> {
        let value = self.get_json("/status")?;
        serde_json::from_value(value).map_err(|e| DeviceError::Decode(e.to_string()))
    }

    fn logs(&self) -> Result<Vec<LogEntry>, DeviceError> {
        self.get_json("/logs").map(parse_logs)
    }

    fn send(&self, command: &DeviceCommand) -> Result<Value, DeviceError> {
        log::info!("POST {}{}", self.base_url, command.path());
        self.post_json(command.path(), command.body())
    }
}
