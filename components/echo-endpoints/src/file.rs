//! Endpoint operation table and open-file state

use std::sync::Arc;

use echo_channel::Session;

use crate::mode::{Access, CallerClass};
use crate::Result;

/// Per-open state passed to endpoint operations
#[derive(Debug)]
pub struct FileContext {
    /// Current file position
    pub position: u64,
    /// Access granted at open
    pub access: Access,
    /// Class of the caller that opened the endpoint
    pub class: CallerClass,
    /// Channel session, for endpoints backed by an echo channel
    pub session: Option<Session>,
}

impl FileContext {
    pub fn new(access: Access, class: CallerClass) -> Self {
        Self {
            position: 0,
            access,
            class,
            session: None,
        }
    }
}

/// Operations an endpoint provides to the host
///
/// Mirrors a file-operation table: `open` and `release` default to no-ops.
pub trait EndpointOps: Send + Sync {
    /// Called when the endpoint is opened
    fn open(&self, _ctx: &mut FileContext) -> Result<()> {
        Ok(())
    }

    /// Called when the last reference to an open file goes away
    fn release(&self, _ctx: &mut FileContext) -> Result<()> {
        Ok(())
    }

    /// Read into `buf` at the current position
    fn read(&self, ctx: &mut FileContext, buf: &mut [u8]) -> Result<usize>;

    /// Write `buf` at the current position
    fn write(&self, ctx: &mut FileContext, buf: &[u8]) -> Result<usize>;
}

/// An open endpoint
///
/// The endpoint's `release` runs exactly once: through `Host::release`, or
/// when the file is dropped without being released.
pub struct OpenFile {
    path: String,
    ops: Arc<dyn EndpointOps>,
    ctx: FileContext,
    released: bool,
}

impl OpenFile {
    pub(crate) fn new(path: String, ops: Arc<dyn EndpointOps>, ctx: FileContext) -> Self {
        Self {
            path,
            ops,
            ctx,
            released: false,
        }
    }

    /// Path the file was opened with
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Current file position
    pub fn position(&self) -> u64 {
        self.ctx.position
    }

    /// Move the file position
    pub fn seek(&mut self, position: u64) {
        self.ctx.position = position;
    }

    /// Access granted at open
    pub fn access(&self) -> Access {
        self.ctx.access
    }

    pub(crate) fn parts(&mut self) -> (&dyn EndpointOps, &mut FileContext) {
        (self.ops.as_ref(), &mut self.ctx)
    }

    /// Run the endpoint's `release` unless it already ran
    pub(crate) fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.ops.release(&mut self.ctx)
    }
}

impl Drop for OpenFile {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("{}: release failed: {}", self.path, e);
        }
    }
}

impl std::fmt::Debug for OpenFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenFile")
            .field("path", &self.path)
            .field("ctx", &self.ctx)
            .finish()
    }
}
