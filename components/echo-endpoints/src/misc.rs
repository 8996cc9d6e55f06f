//! Echo misc device
//!
//! Registers an echo channel as `/dev/<name>` with a dynamic minor number
//! and a read-only (`S_IRUGO`) mode.

use std::sync::Arc;

use echo_channel::EchoChannel;

use crate::echo::EchoEndpoint;
use crate::host::Module;
use crate::mode::AccessMode;
use crate::registry::Registry;
use crate::Result;

/// Default device name
pub const DEVICE_NAME: &str = "echo";

/// Echo misc device module
pub struct EchoDevice {
    name: String,
    channel: Arc<EchoChannel>,
    minor: Option<u8>,
}

impl EchoDevice {
    pub fn new(name: impl Into<String>, channel: Arc<EchoChannel>) -> Self {
        Self {
            name: name.into(),
            channel,
            minor: None,
        }
    }

    /// Device path, `/dev/<name>`
    pub fn path(&self) -> String {
        format!("/dev/{}", self.name)
    }

    /// Minor number assigned at registration
    pub fn minor(&self) -> Option<u8> {
        self.minor
    }

    pub fn channel(&self) -> &Arc<EchoChannel> {
        &self.channel
    }
}

impl Module for EchoDevice {
    fn name(&self) -> &str {
        "echo_dev"
    }

    fn init(&mut self, registry: &mut Registry) -> Result<()> {
        let path = self.path();
        let endpoint = Arc::new(EchoEndpoint::new(Arc::clone(&self.channel)));

        match registry.register_misc(&path, AccessMode::MISC_DEVICE, endpoint) {
            Ok(minor) => {
                self.minor = Some(minor);
                log::info!("Echo device at {} is ready", path);
                Ok(())
            }
            Err(e) => {
                log::error!("could not register echo device as misc device: {}", e);
                Err(e)
            }
        }
    }

    fn exit(&mut self, registry: &mut Registry) -> Result<()> {
        let path = self.path();
        registry.deregister(&path)?;
        self.minor = None;
        log::info!("Echo device at {} can not longer be used", path);
        Ok(())
    }
}
