//! Endpoint registry
//!
//! In-memory stand-in for the kernel's device and proc namespaces. Paths are
//! plain strings; nothing touches a real filesystem.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::file::EndpointOps;
use crate::mode::AccessMode;
use crate::{EndpointError, Result};

/// Number of dynamically assigned misc minor numbers
pub const DYNAMIC_MINORS: u8 = 64;

/// A registered endpoint
#[derive(Clone)]
pub struct Entry {
    pub mode: AccessMode,
    /// Misc minor number, for misc devices
    pub minor: Option<u8>,
    pub(crate) ops: Arc<dyn EndpointOps>,
}

/// Registered endpoints keyed by path
#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<String, Entry>,
    minors: BTreeSet<u8>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint at `path`
    pub fn register(
        &mut self,
        path: &str,
        mode: AccessMode,
        ops: Arc<dyn EndpointOps>,
    ) -> Result<()> {
        self.insert(path, Entry { mode, minor: None, ops })
    }

    /// Register a misc device at `path` with a dynamic minor number
    ///
    /// Minors are handed out from the top of the dynamic range downwards.
    pub fn register_misc(
        &mut self,
        path: &str,
        mode: AccessMode,
        ops: Arc<dyn EndpointOps>,
    ) -> Result<u8> {
        let minor = (0..DYNAMIC_MINORS)
            .rev()
            .find(|m| !self.minors.contains(m))
            .ok_or(EndpointError::MinorsExhausted)?;

        self.insert(path, Entry { mode, minor: Some(minor), ops })?;
        self.minors.insert(minor);
        Ok(minor)
    }

    /// Remove the endpoint at `path`
    pub fn deregister(&mut self, path: &str) -> Result<()> {
        let entry = self
            .entries
            .remove(path)
            .ok_or_else(|| EndpointError::NotRegistered { path: path.to_string() })?;
        if let Some(minor) = entry.minor {
            self.minors.remove(&minor);
        }
        Ok(())
    }

    /// Look up the endpoint at `path`
    pub fn lookup(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    /// Registered endpoints in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(path, entry)| (path.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, path: &str, entry: Entry) -> Result<()> {
        if self.entries.contains_key(path) {
            return Err(EndpointError::AlreadyRegistered { path: path.to_string() });
        }
        self.entries.insert(path.to_string(), entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileContext;

    struct Null;

    impl EndpointOps for Null {
        fn read(&self, _ctx: &mut FileContext, _buf: &mut [u8]) -> Result<usize> {
            Ok(0)
        }

        fn write(&self, _ctx: &mut FileContext, buf: &[u8]) -> Result<usize> {
            Ok(buf.len())
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = Registry::new();
        registry
            .register("/proc/null", AccessMode::PROC_FILE, Arc::new(Null))
            .unwrap();
        let entry = registry.lookup("/proc/null").unwrap();
        assert_eq!(entry.mode, AccessMode::PROC_FILE);
        assert_eq!(entry.minor, None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let mut registry = Registry::new();
        registry
            .register("/dev/null", AccessMode::MISC_DEVICE, Arc::new(Null))
            .unwrap();
        let err = registry
            .register("/dev/null", AccessMode::MISC_DEVICE, Arc::new(Null))
            .unwrap_err();
        assert!(matches!(err, EndpointError::AlreadyRegistered { .. }));
    }

    #[test]
    fn test_deregister_unknown_path() {
        let mut registry = Registry::new();
        let err = registry.deregister("/dev/missing").unwrap_err();
        assert!(matches!(err, EndpointError::NotRegistered { .. }));
    }

    #[test]
    fn test_misc_minors_are_recycled() {
        let mut registry = Registry::new();
        let a = registry
            .register_misc("/dev/a", AccessMode::MISC_DEVICE, Arc::new(Null))
            .unwrap();
        let b = registry
            .register_misc("/dev/b", AccessMode::MISC_DEVICE, Arc::new(Null))
            .unwrap();
        assert_eq!(a, DYNAMIC_MINORS - 1);
        assert_eq!(b, DYNAMIC_MINORS - 2);

        registry.deregister("/dev/a").unwrap();
        let c = registry
            .register_misc("/dev/c", AccessMode::MISC_DEVICE, Arc::new(Null))
            .unwrap();
        assert_eq!(c, a);
    }

    #[test]
    fn test_misc_minors_exhausted() {
        let mut registry = Registry::new();
        for i in 0..DYNAMIC_MINORS {
            registry
                .register_misc(&format!("/dev/m{i}"), AccessMode::MISC_DEVICE, Arc::new(Null))
                .unwrap();
        }
        let err = registry
            .register_misc("/dev/one-too-many", AccessMode::MISC_DEVICE, Arc::new(Null))
            .unwrap_err();
        assert!(matches!(err, EndpointError::MinorsExhausted));
    }
}
