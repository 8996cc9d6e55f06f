//! Module host
//!
//! Loads modules into a registry and routes open/read/write/release calls
//! to the endpoint registered at a path. Modules are unloaded in reverse
//! load order, and the host unloads everything still loaded when dropped.

use crate::file::{FileContext, OpenFile};
use crate::mode::{Access, CallerClass};
use crate::registry::Registry;
use crate::{EndpointError, Result};

/// Loadable module lifecycle
pub trait Module: Send {
    /// Module name used in log lines
    fn name(&self) -> &str;

    /// Register the module's endpoints
    fn init(&mut self, registry: &mut Registry) -> Result<()>;

    /// Remove the module's endpoints
    fn exit(&mut self, _registry: &mut Registry) -> Result<()> {
        Ok(())
    }
}

/// In-memory module host
#[derive(Default)]
pub struct Host {
    registry: Registry,
    modules: Vec<Box<dyn Module>>,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize `module` and keep it loaded
    ///
    /// A module whose init fails is dropped and the error returned.
    pub fn load(&mut self, mut module: Box<dyn Module>) -> Result<()> {
        module.init(&mut self.registry).map_err(|e| {
            log::error!("{}: init failed: {}", module.name(), e);
            e
        })?;
        log::debug!("{}: loaded", module.name());
        self.modules.push(module);
        Ok(())
    }

    /// Unload every module, most recently loaded first
    pub fn unload_all(&mut self) {
        while let Some(mut module) = self.modules.pop() {
            if let Err(e) = module.exit(&mut self.registry) {
                log::warn!("{}: exit failed: {}", module.name(), e);
            }
        }
    }

    /// Names of loaded modules in load order
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.name())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Open the endpoint at `path`
    ///
    /// Checks the endpoint's mode against `access` for `class` before
    /// calling the endpoint's `open`.
    pub fn open(&self, path: &str, access: Access, class: CallerClass) -> Result<OpenFile> {
        let entry = self
            .registry
            .lookup(path)
            .ok_or_else(|| EndpointError::NotFound { path: path.to_string() })?;

        if !entry.mode.permits(class, access) {
            return Err(EndpointError::PermissionDenied {
                path: path.to_string(),
                mode: entry.mode,
            });
        }

        let mut ctx = FileContext::new(access, class);
        entry.ops.open(&mut ctx)?;
        log::debug!("opened {} ({:?}, {:?})", path, access, class);
        Ok(OpenFile::new(path.to_string(), entry.ops.clone(), ctx))
    }

    /// Read from an open file at its current position
    pub fn read(&self, file: &mut OpenFile, buf: &mut [u8]) -> Result<usize> {
        if !file.access().contains(Access::READ) {
            return Err(EndpointError::BadAccess {
                path: file.path().to_string(),
                access: Access::READ,
            });
        }
        let (ops, ctx) = file.parts();
        ops.read(ctx, buf)
    }

    /// Write to an open file at its current position
    pub fn write(&self, file: &mut OpenFile, buf: &[u8]) -> Result<usize> {
        if !file.access().contains(Access::WRITE) {
            return Err(EndpointError::BadAccess {
                path: file.path().to_string(),
                access: Access::WRITE,
            });
        }
        let (ops, ctx) = file.parts();
        ops.write(ctx, buf)
    }

    /// Release an open file
    pub fn release(&self, mut file: OpenFile) -> Result<()> {
        file.release()
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        self.unload_all();
    }
}
