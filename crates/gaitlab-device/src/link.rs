use crate::client::{DeviceApi, DeviceCommand, DeviceError};
use crate::model::{DeviceStatus, LogEntry};
use crate::panel::DevicePanel;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use std::ops::{Deref, DerefMut};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

pub enum DeviceRequest {
    RefreshStatus,
    FetchLogs,
    Command(DeviceCommand),
    Shutdown,
}

pub enum DeviceUpdate {
    /// Interval poll or post-command refresh; nobody waits on it.
    Polled(Result<DeviceStatus, DeviceError>),
    Status(Result<DeviceStatus, DeviceError>),
    Logs(Result<Vec<LogEntry>, DeviceError>),
    Command {
        command: DeviceCommand,
        result: Result<(), DeviceError>,
    },
}

/// Panel state plus the worker thread that talks to the device.
///
/// The worker polls status on a fixed interval until the link is dropped.
pub struct DeviceLink {
    panel: DevicePanel,
    request_tx: Sender<DeviceRequest>,
    update_rx: Receiver<DeviceUpdate>,
    worker: Option<JoinHandle<()>>,
}

impl DeviceLink {
    pub fn spawn<A>(api: A, panel: DevicePanel, poll_interval: Duration) -> Self
    where
        A: DeviceApi + Send + 'static,
    {
        let (request_tx, request_rx) = bounded(16);
        let (update_tx, update_rx) = unbounded();
        let worker = std::thread::spawn(move || {
            DeviceWorker {
                api,
                request_rx,
                update_tx,
                poll_interval,
            }
            .run()
        });
        Self {
            panel,
            request_tx,
            update_rx,
            worker: Some(worker),
        }
    }

    /// Queue a request. Refused while another request is in flight.
    pub fn request(&mut self, request: DeviceRequest) -> bool {
        if self.panel.is_loading() {
            return false;
        }
        if self.request_tx.send(request).is_err() {
            return false;
        }
        self.panel.begin_request();
        true
    }

    /// Fold finished work into the panel and expire banners.
    pub fn pump(&mut self, now: Instant) {
        while let Ok(update) = self.update_rx.try_recv() {
            match update {
                DeviceUpdate::Polled(result) => self.panel.apply_status(result, now),
                DeviceUpdate::Status(result) => self.panel.apply_requested_status(result, now),
                DeviceUpdate::Logs(result) => self.panel.apply_logs(result, now),
                DeviceUpdate::Command { command, result } => {
                    self.panel.apply_command(&command, result, now)
                }
            }
        }
        self.panel.tick(now);
    }
}

impl Deref for DeviceLink {
    type Target = DevicePanel;

    fn deref(&self) -> &Self::Target {
        &self.panel
    }
}

impl DerefMut for DeviceLink {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.panel
    }
}

impl Drop for DeviceLink {
    fn drop(&mut self) {
        let _ = self.request_tx.send(DeviceRequest::Shutdown);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

struct DeviceWorker<A> {
    api: A,
    request_rx: Receiver<DeviceRequest>,
    update_tx: Sender<DeviceUpdate>,
    poll_interval: Duration,
}

impl<A: DeviceApi> DeviceWorker<A> {
    fn run(self) {
        let mut next_poll = Instant::now();
        loop {
            let wait = next_poll.saturating_duration_since(Instant::now());
            match self.request_rx.recv_timeout(wait) {
                Ok(DeviceRequest::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(request) => self.handle(request),
                Err(RecvTimeoutError::Timeout) => {
                    let _ = self.update_tx.send(DeviceUpdate::Polled(self.api.status()));
                    next_poll = Instant::now() + self.poll_interval;
                }
            }
        }
        log::debug!("device worker stopped");
    }

    fn handle(&self, request: DeviceRequest) {
        match request {
            DeviceRequest::RefreshStatus => {
                let _ = self.update_tx.send(DeviceUpdate::Status(self.api.status()));
            }
            DeviceRequest::FetchLogs => {
                let _ = self.update_tx.send(DeviceUpdate::Logs(self.api.logs()));
            }
            DeviceRequest::Command(command) => {
                let result = self.api.send(&command).map(|_| ());
                let refresh = result.is_ok() && command.refreshes_status();
                let _ = self
                    .update_tx
                    .send(DeviceUpdate::Command { command, result });
                if refresh {
                    let _ = self.update_tx.send(DeviceUpdate::Polled(self.api.status()));
                }
            }
            DeviceRequest::Shutdown => {}
        }
    }
}
