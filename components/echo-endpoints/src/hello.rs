//! Hello world module

use crate::host::Module;
use crate::registry::Registry;
use crate::Result;

/// Module that only logs on load and unload
#[derive(Debug, Default)]
pub struct HelloModule;

impl Module for HelloModule {
    fn name(&self) -> &str {
        "hello_world"
    }

    fn init(&mut self, _registry: &mut Registry) -> Result<()> {
        log::info!("Hello, World!");
        Ok(())
    }

    fn exit(&mut self, _registry: &mut Registry) -> Result<()> {
        log::info!("Goodbye, World!");
        Ok(())
    }
}
