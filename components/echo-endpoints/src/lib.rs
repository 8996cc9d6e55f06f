//! Echo Endpoints - Host adapters for the echo channel
//!
//! # Purpose
//! Exposes echo channels and a sysctl-style integer through named endpoints
//! in an in-memory host, the way the Linux echo modules expose them through
//! `/dev`, `/proc` and `/proc/sys`.
//!
//! # Integration Points
//! - Depends on: `echo-channel`
//! - Provides to: `echo-ctl`, embedding applications
//! - Endpoints: `/dev/echo`, `/proc/echo`, `/proc/sys/lightning-talk` (0555),
//!   `/proc/sys/lightning-talk/sample`
//!
//! # Architecture
//! - `Module` implementations register `EndpointOps` in a `Registry`
//! - `Host` loads modules, checks permission bits at open and routes
//!   read/write/release to the registered endpoint
//! - `HostConfig` (TOML) selects capacity, cursor mode and endpoint names
//!
//! # Testing Strategy
//! - Unit tests: per module (modes, registry, endpoints, config)
//! - Integration tests: full host scenarios in `tests/host_test.rs`

pub mod config;
pub mod echo;
pub mod file;
pub mod hello;
pub mod host;
pub mod misc;
pub mod mode;
pub mod proc;
pub mod registry;
pub mod sysctl;

pub use config::{ConfigError, CursorModeSetting, HostConfig, SysctlConfig};
pub use echo::EchoEndpoint;
pub use file::{EndpointOps, FileContext, OpenFile};
pub use hello::HelloModule;
pub use host::{Host, Module};
pub use misc::EchoDevice;
pub use mode::{Access, AccessMode, CallerClass};
pub use proc::EchoProcFile;
pub use registry::{Entry, Registry};
pub use sysctl::{SysctlDirEndpoint, SysctlEndpoint, SysctlModule, SysctlVar};

use thiserror::Error;

/// Endpoint error types
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("Endpoint already registered: {path}")]
    AlreadyRegistered { path: String },

    #[error("Endpoint not registered: {path}")]
    NotRegistered { path: String },

    #[error("No such endpoint: {path}")]
    NotFound { path: String },

    #[error("Permission denied: {path} (mode {mode})")]
    PermissionDenied { path: String, mode: AccessMode },

    #[error("Bad file descriptor: {path} not opened for {access:?}")]
    BadAccess { path: String, access: Access },

    #[error("No dynamic misc minor numbers left")]
    MinorsExhausted,

    #[error("Is a directory: {path}")]
    IsADirectory { path: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = core::result::Result<T, EndpointError>;
