//! Echo proc file
//!
//! Same channel semantics as the misc device, exposed as `/proc/<name>`
//! with mode `0646`.

use std::sync::Arc;

use echo_channel::EchoChannel;

use crate::echo::EchoEndpoint;
use crate::host::Module;
use crate::mode::AccessMode;
use crate::registry::Registry;
use crate::Result;

/// Default proc file name
pub const PROC_FILENAME: &str = "echo";

/// Echo proc file module
pub struct EchoProcFile {
    name: String,
    channel: Arc<EchoChannel>,
}

impl EchoProcFile {
    pub fn new(name: impl Into<String>, channel: Arc<EchoChannel>) -> Self {
        Self {
            name: name.into(),
            channel,
        }
    }

    /// Proc path, `/proc/<name>`
    pub fn path(&self) -> String {
        format!("/proc/{}", self.name)
    }

    pub fn channel(&self) -> &Arc<EchoChannel> {
        &self.channel
    }
}

impl Module for EchoProcFile {
    fn name(&self) -> &str {
        "echo_proc"
    }

    fn init(&mut self, registry: &mut Registry) -> Result<()> {
        let endpoint = Arc::new(EchoEndpoint::new(Arc::clone(&self.channel)));
        registry.register(&self.path(), AccessMode::PROC_FILE, endpoint)
    }

    fn exit(&mut self, registry: &mut Registry) -> Result<()> {
        registry.deregister(&self.path())
    }
}
