use crate::client::{DeviceCommand, DeviceError};
use crate::model::{DeviceConfig, DeviceStatus, LogEntry};
use gaitlab_core::settings::DeviceSettings;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Error,
    Success,
}

/// Dismissable message that clears itself at `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
    pub expires_at: Instant,
}

/// UI-side state of the device control panel.
#[derive(Debug, Clone)]
pub struct DevicePanel {
    status: Option<DeviceStatus>,
    logs: Vec<LogEntry>,
    config: DeviceConfig,
    pending: usize,
    banner: Option<Banner>,
    success_for: Duration,
    error_for: Duration,
}

impl DevicePanel {
    pub fn new(success_for: Duration, error_for: Duration) -> Self {
        Self {
            status: None,
            logs: Vec::new(),
            config: DeviceConfig::default(),
            pending: 0,
            banner: None,
            success_for,
            error_for,
        }
    }

    pub fn from_settings(settings: &DeviceSettings) -> Self {
        Self::new(settings.success_banner(), settings.error_banner())
    }

    pub fn status(&self) -> Option<&DeviceStatus> {
        self.status.as_ref()
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DeviceConfig {
        &mut self.config
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    /// A request left for the device; actions stay disabled until it settles.
    pub fn begin_request(&mut self) {
        self.pending += 1;
    }

    fn settle(&mut self) {
        self.pending = self.pending.saturating_sub(1);
    }

    fn raise(&mut self, kind: BannerKind, message: String, now: Instant) {
        let ttl = match kind {
            BannerKind::Error => self.error_for,
            BannerKind::Success => self.success_for,
        };
        self.banner = Some(Banner {
            kind,
            message,
            expires_at: now + ttl,
        });
    }

    pub fn dismiss(&mut self) {
        self.banner = None;
    }

    /// Drop the banner once its delay has passed.
    pub fn tick(&mut self, now: Instant) {
        if self.banner.as_ref().is_some_and(|b| now >= b.expires_at) {
            self.banner = None;
        }
    }

    /// Fold a status fetch; a fresh status also resets the editable config.
    /// Polls never decrement the request counter.
    pub fn apply_status(&mut self, result: Result<DeviceStatus, DeviceError>, now: Instant) {
        match result {
            Ok(status) => {
                self.config = DeviceConfig::from_status(&status);
                self.status = Some(status);
                if self
                    .banner
                    .as_ref()
                    .is_some_and(|b| b.kind == BannerKind::Error)
                {
                    self.banner = None;
                }
            }
            Err(err) => {
                log::warn!("status fetch failed: {err}");
                self.raise(BannerKind::Error, err.to_string(), now);
            }
        }
    }

    pub fn apply_logs(&mut self, result: Result<Vec<LogEntry>, DeviceError>, now: Instant) {
        self.settle();
        match result {
            Ok(logs) => self.logs = logs,
            Err(err) => {
                log::warn!("log fetch failed: {err}");
                self.raise(BannerKind::Error, err.to_string(), now);
            }
        }
    }

    pub fn apply_command(
        &mut self,
        command: &DeviceCommand,
        result: Result<(), DeviceError>,
        now: Instant,
    ) {
        self.settle();
        match result {
            Ok(()) => self.raise(BannerKind::Success, command.success_message().into(), now),
            Err(err) => {
                log::warn!("{} failed: {err}", command.path());
                self.raise(BannerKind::Error, err.to_string(), now);
            }
        }
    }

    /// Completion of an explicit refresh request.
    pub fn apply_requested_status(
        &mut self,
        result: Result<DeviceStatus, DeviceError>,
        now: Instant,
    ) {
        self.settle();
        self.apply_status(result, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> DevicePanel {
        DevicePanel::new(Duration::from_secs(3), Duration::from_secs(5))
    }

    fn status() -> DeviceStatus {
        DeviceStatus {
            device_id: Some("cam-01".into()),
            name: Some("rig".into()),
            stream_fps: Some(30),
            enabled: Some(true),
            camera_endpoint: Some("rtsp://rig/cam".into()),
            uptime_sec: Some(12.0),
        }
    }

    #[test]
    fn starts_without_status() {
        let panel = panel();
        assert!(panel.status().is_none());
        assert!(panel.banner().is_none());
        assert!(!panel.is_loading());
    }

    #[test]
    fn status_populates_config() {
        let mut panel = panel();
        panel.apply_status(Ok(status()), Instant::now());
        assert_eq!(panel.config().name, "rig");
        assert_eq!(panel.config().stream_fps, Some(30));
        assert!(panel.config().enabled);
    }

    #[test]
    fn success_banner_clears_after_delay() {
        let mut panel = panel();
        let now = Instant::now();
        panel.begin_request();
        assert!(panel.is_loading());
        panel.apply_command(&DeviceCommand::StopTrial, Ok(()), now);
        assert!(!panel.is_loading());
        let banner = panel.banner().cloned().unwrap();
        assert_eq!(banner.kind, BannerKind::Success);
        assert_eq!(banner.message, "Trial stopped successfully!");
        panel.tick(now + Duration::from_secs(2));
        assert!(panel.banner().is_some());
        panel.tick(now + Duration::from_secs(3));
        assert!(panel.banner().is_none());
    }

    #[test]
    fn fetch_failure_is_not_fatal() {
        let mut panel = panel();
        let now = Instant::now();
        panel.apply_status(Ok(status()), now);
        panel.apply_status(
            Err(DeviceError::Transport("connection refused".into())),
            now,
        );
        assert_eq!(panel.status().and_then(|s| s.name.as_deref()), Some("rig"));
        assert_eq!(panel.banner().map(|b| b.kind), Some(BannerKind::Error));
        panel.tick(now + Duration::from_secs(5));
        assert!(panel.banner().is_none());
    }

    #[test]
    fn fresh_status_clears_error_banner() {
        let mut panel = panel();
        let now = Instant::now();
        panel.apply_status(
            Err(DeviceError::Http {
                status: 500,
                reason: "Internal Server Error".into(),
            }),
            now,
        );
        panel.apply_status(Ok(status()), now);
        assert!(panel.banner().is_none());
    }
}
