pub mod client;
pub mod link;
pub mod model;
pub mod panel;

pub use client::{DeviceApi, DeviceCommand, DeviceError, HttpDeviceClient};
pub use link::{DeviceLink, DeviceRequest, DeviceUpdate};
pub use model::{format_uptime, DeviceConfig, DeviceStatus, LogEntry};
pub use panel::{Banner, BannerKind, DevicePanel};
