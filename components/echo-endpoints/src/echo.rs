//! Echo channel endpoint operations
//!
//! Shared by the misc device and the proc file: both expose one channel with
//! the same read/write semantics.

use std::sync::Arc;

use echo_channel::{CopySource, EchoChannel};

use crate::file::{EndpointOps, FileContext};
use crate::Result;

/// Endpoint backed by an echo channel
pub struct EchoEndpoint {
    channel: Arc<EchoChannel>,
}

impl EchoEndpoint {
    pub fn new(channel: Arc<EchoChannel>) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &Arc<EchoChannel> {
        &self.channel
    }

    /// Write `length` bytes from a source that may fault part way
    ///
    /// Advances the file position by the bytes actually written.
    pub fn write_from<S: CopySource + ?Sized>(
        &self,
        ctx: &mut FileContext,
        source: &S,
        length: usize,
    ) -> usize {
        let written = self.channel.write_from(source, length);
        ctx.position = ctx.position.saturating_add(written as u64);
        written
    }
}

impl EndpointOps for EchoEndpoint {
    fn open(&self, ctx: &mut FileContext) -> Result<()> {
        ctx.session = Some(self.channel.open());
        Ok(())
    }

    fn release(&self, ctx: &mut FileContext) -> Result<()> {
        if let Some(session) = ctx.session.take() {
            self.channel.close(session);
        }
        Ok(())
    }

    fn read(&self, ctx: &mut FileContext, buf: &mut [u8]) -> Result<usize> {
        let (produced, cursor) = self.channel.read_into(ctx.position, buf);
        ctx.position = cursor;
        Ok(produced)
    }

    fn write(&self, ctx: &mut FileContext, buf: &[u8]) -> Result<usize> {
        Ok(self.write_from(ctx, buf, buf.len()))
    }
}
