//! `gaitlab.toml`: entity source and device panel settings.

use crate::entity::EntityStore;
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "gaitlab.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub device: DeviceSettings,
}

/// Entity source. Without both files the built-in cohort is used.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataSettings {
    pub animals: Option<PathBuf>,
    pub trials: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeviceSettings {
    pub base_url: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub success_banner_secs: u64,
    pub error_banner_secs: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            poll_interval_secs: 10,
            request_timeout_secs: 5,
            success_banner_secs: 3,
            error_banner_secs: 5,
        }
    }
}

impl DeviceSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn success_banner(&self) -> Duration {
        Duration::from_secs(self.success_banner_secs)
    }

    pub fn error_banner(&self) -> Duration {
        Duration::from_secs(self.error_banner_secs)
    }
}

impl Settings {
    pub fn parse(text: &str, origin: &Path) -> Result<Self, SettingsError> {
        let mut settings: Settings = toml::from_str(text).map_err(|source| SettingsError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        // Relative data paths are relative to the settings file.
        if let Some(base) = origin.parent() {
            for path in [&mut settings.data.animals, &mut settings.data.trials]
                .into_iter()
                .flatten()
            {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Load `path` if given, else `gaitlab.toml` in the working directory if
    /// present, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn entity_store(&self) -> Result<EntityStore> {
        match (&self.data.animals, &self.data.trials) {
            (Some(animals), Some(trials)) => EntityStore::from_csv(animals, trials),
            _ => Ok(EntityStore::sample()),
        }
    }
}
