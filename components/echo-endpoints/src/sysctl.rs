//! Sysctl integer variable
//!
//! A single named integer under `/proc/sys/<directory>/<name>`. The initial
//! value comes from the `default_value` start-up parameter. Reads and writes
//! through the endpoint use decimal text, one value per access. The
//! directory itself is registered read/search-only (`0555`).

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use crate::file::{EndpointOps, FileContext};
use crate::host::Module;
use crate::mode::AccessMode;
use crate::registry::Registry;
use crate::{EndpointError, Result};

/// Default sysctl directory
pub const SYSCTL_VAR_DIRECTORY: &str = "lightning-talk";

/// Default sysctl variable name
pub const SYSCTL_VAR_NAME: &str = "sample";

/// Integer parameter storage; `get` and `set` always succeed
#[derive(Debug, Default)]
pub struct SysctlVar {
    value: AtomicI32,
}

impl SysctlVar {
    pub fn new(value: i32) -> Self {
        Self {
            value: AtomicI32::new(value),
        }
    }

    pub fn get(&self) -> i32 {
        self.value.load(Ordering::Acquire)
    }

    pub fn set(&self, value: i32) {
        self.value.store(value, Ordering::Release);
    }
}

/// Text interface over a `SysctlVar`
pub struct SysctlEndpoint {
    var: Arc<SysctlVar>,
}

impl SysctlEndpoint {
    pub fn new(var: Arc<SysctlVar>) -> Self {
        Self { var }
    }
}

impl EndpointOps for SysctlEndpoint {
    fn read(&self, ctx: &mut FileContext, buf: &mut [u8]) -> Result<usize> {
        // The whole value is produced by the first read; later reads hit EOF
        if ctx.position != 0 || buf.is_empty() {
            return Ok(0);
        }
        let text = format!("{}\n", self.var.get());
        let n = text.len().min(buf.len());
        buf[..n].copy_from_slice(&text.as_bytes()[..n]);
        ctx.position += n as u64;
        Ok(n)
    }

    fn write(&self, ctx: &mut FileContext, buf: &[u8]) -> Result<usize> {
        if ctx.position != 0 {
            return Ok(buf.len());
        }
        let text = std::str::from_utf8(buf)
            .map_err(|_| EndpointError::InvalidArgument("value is not valid UTF-8".to_string()))?
            .trim();
        if !text.is_empty() {
            let value = text
                .parse::<i32>()
                .map_err(|e| EndpointError::InvalidArgument(format!("{text:?}: {e}")))?;
            self.var.set(value);
        }
        ctx.position += buf.len() as u64;
        Ok(buf.len())
    }
}

/// Sysctl directory entry; reading or writing it as a file fails
pub struct SysctlDirEndpoint {
    path: String,
}

impl SysctlDirEndpoint {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl EndpointOps for SysctlDirEndpoint {
    fn read(&self, _ctx: &mut FileContext, _buf: &mut [u8]) -> Result<usize> {
        Err(EndpointError::IsADirectory { path: self.path.clone() })
    }

    fn write(&self, _ctx: &mut FileContext, _buf: &[u8]) -> Result<usize> {
        Err(EndpointError::IsADirectory { path: self.path.clone() })
    }
}

/// Sysctl variable module
pub struct SysctlModule {
    directory: String,
    name: String,
    default_value: i32,
    var: Arc<SysctlVar>,
}

impl SysctlModule {
    /// Create the module with the `default_value` start-up parameter
    pub fn new(directory: impl Into<String>, name: impl Into<String>, default_value: i32) -> Self {
        Self {
            directory: directory.into(),
            name: name.into(),
            default_value,
            var: Arc::new(SysctlVar::default()),
        }
    }

    /// Directory path, `/proc/sys/<directory>`
    pub fn dir_path(&self) -> String {
        format!("/proc/sys/{}", self.directory)
    }

    /// Variable path, `/proc/sys/<directory>/<name>`
    pub fn path(&self) -> String {
        format!("{}/{}", self.dir_path(), self.name)
    }

    pub fn var(&self) -> &Arc<SysctlVar> {
        &self.var
    }
}

impl Module for SysctlModule {
    fn name(&self) -> &str {
        "sysctl_var"
    }

    fn init(&mut self, registry: &mut Registry) -> Result<()> {
        let dir_path = self.dir_path();
        registry.register(
            &dir_path,
            AccessMode::SYSCTL_DIR,
            Arc::new(SysctlDirEndpoint::new(dir_path.clone())),
        )?;

        let endpoint = Arc::new(SysctlEndpoint::new(Arc::clone(&self.var)));
        if let Err(e) = registry.register(&self.path(), AccessMode::SYSCTL_VAR, endpoint) {
            let _ = registry.deregister(&dir_path);
            return Err(e);
        }
        self.var.set(self.default_value);
        log::info!("Loaded with default sample value {}", self.var.get());
        Ok(())
    }

    fn exit(&mut self, registry: &mut Registry) -> Result<()> {
        registry.deregister(&self.path())?;
        registry.deregister(&self.dir_path())
    }
}
