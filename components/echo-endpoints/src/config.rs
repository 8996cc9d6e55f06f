//! Host configuration
//!
//! Loaded from TOML. Every key is optional:
//!
//! ```toml
//! capacity = 64
//! cursor_mode = "rebase"      # or "accumulate"
//! device_name = "echo"
//! proc_name = "echo"
//!
//! [sysctl]
//! directory = "lightning-talk"
//! name = "sample"
//! default_value = 0
//! ```

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use echo_channel::{CursorMode, EchoChannel, LogObserver, ECHO_BUFFER_MAX_SIZE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hello::HelloModule;
use crate::host::Host;
use crate::misc::{EchoDevice, DEVICE_NAME};
use crate::proc::{EchoProcFile, PROC_FILENAME};
use crate::sysctl::{SysctlModule, SYSCTL_VAR_DIRECTORY, SYSCTL_VAR_NAME};
use crate::Result;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid capacity: {0} (must be greater than zero)")]
    InvalidCapacity(usize),

    #[error("Invalid endpoint name: {0:?}")]
    InvalidName(String),
}

/// Cursor mode as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorModeSetting {
    #[default]
    Rebase,
    Accumulate,
}

impl From<CursorModeSetting> for CursorMode {
    fn from(setting: CursorModeSetting) -> Self {
        match setting {
            CursorModeSetting::Rebase => CursorMode::Rebase,
            CursorModeSetting::Accumulate => CursorMode::Accumulate,
        }
    }
}

/// Sysctl variable settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SysctlConfig {
    pub directory: String,
    pub name: String,
    /// Start-up value of the variable
    pub default_value: i32,
}

impl Default for SysctlConfig {
    fn default() -> Self {
        Self {
            directory: SYSCTL_VAR_DIRECTORY.to_string(),
            name: SYSCTL_VAR_NAME.to_string(),
            default_value: 0,
        }
    }
}

/// Host configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Echo channel capacity in bytes
    pub capacity: usize,
    pub cursor_mode: CursorModeSetting,
    pub device_name: String,
    pub proc_name: String,
    pub sysctl: SysctlConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            capacity: ECHO_BUFFER_MAX_SIZE,
            cursor_mode: CursorModeSetting::default(),
            device_name: DEVICE_NAME.to_string(),
            proc_name: PROC_FILENAME.to_string(),
            sysctl: SysctlConfig::default(),
        }
    }
}

impl HostConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> core::result::Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> core::result::Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges and endpoint names
    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        self.channel_capacity()?;
        for name in [
            &self.device_name,
            &self.proc_name,
            &self.sysctl.directory,
            &self.sysctl.name,
        ] {
            if name.is_empty() || name.contains('/') {
                return Err(ConfigError::InvalidName(name.clone()));
            }
        }
        Ok(())
    }

    /// Capacity as a non-zero size
    pub fn channel_capacity(&self) -> core::result::Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.capacity).ok_or(ConfigError::InvalidCapacity(self.capacity))
    }

    /// Build a channel configured with capacity, cursor mode and logging
    pub fn build_channel(&self) -> core::result::Result<EchoChannel, ConfigError> {
        Ok(EchoChannel::new(self.channel_capacity()?)
            .with_cursor_mode(self.cursor_mode.into())
            .with_observer(Arc::new(LogObserver)))
    }

    /// Build a host with the hello module, echo device, echo proc file and
    /// sysctl variable loaded in that order
    ///
    /// The device and the proc file each get their own channel.
    pub fn build_host(&self) -> Result<Host> {
        self.validate()?;

        let mut host = Host::new();
        host.load(Box::new(HelloModule))?;
        host.load(Box::new(EchoDevice::new(
            self.device_name.clone(),
            Arc::new(self.build_channel()?),
        )))?;
        host.load(Box::new(EchoProcFile::new(
            self.proc_name.clone(),
            Arc::new(self.build_channel()?),
        )))?;
        host.load(Box::new(SysctlModule::new(
            self.sysctl.directory.clone(),
            self.sysctl.name.clone(),
            self.sysctl.default_value,
        )))?;
        Ok(host)
    }
}
