//! Write notifications
//!
//! Observers are fire-and-forget: the channel never looks at what they do.

use alloc::string::String;

/// Receives the bytes accepted by every channel write
pub trait WriteObserver: Send + Sync {
    /// Called after the write has completed and the channel lock is released
    fn on_write(&self, accepted: &[u8]);
}

/// Observer that logs each captured write
///
/// The captured bytes are printed as a C string, so output stops at the
/// first zero byte.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl WriteObserver for LogObserver {
    fn on_write(&self, accepted: &[u8]) {
        log::info!("captured '{}' in echo buffer", c_str_lossy(accepted));
    }
}

/// Render bytes up to the first NUL, replacing invalid UTF-8
pub fn c_str_lossy(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
