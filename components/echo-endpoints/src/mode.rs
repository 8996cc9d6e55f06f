//! Permission bits and access checks
//!
//! Endpoints carry a classic Unix mode. Opening an endpoint checks the
//! requested access against the permission triple that applies to the
//! caller's class.

use core::fmt;

use bitflags::bitflags;

bitflags! {
    /// Unix permission bits of an endpoint
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessMode: u16 {
        const OWNER_READ = 0o400;
        const OWNER_WRITE = 0o200;
        const OWNER_EXEC = 0o100;
        const GROUP_READ = 0o040;
        const GROUP_WRITE = 0o020;
        const GROUP_EXEC = 0o010;
        const OTHER_READ = 0o004;
        const OTHER_WRITE = 0o002;
        const OTHER_EXEC = 0o001;

        /// `S_IRUGO`: read for owner, group and other
        const READ_ALL = Self::OWNER_READ.bits() | Self::GROUP_READ.bits() | Self::OTHER_READ.bits();
    }
}

bitflags! {
    /// Access requested when opening an endpoint
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Access: u8 {
        const READ = 0b01;
        const WRITE = 0b10;
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

/// Who is opening an endpoint, relative to its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallerClass {
    /// Privileged caller; permission bits do not apply
    Root,
    Owner,
    Group,
    Other,
}

impl AccessMode {
    /// Echo misc device: `S_IRUGO`
    pub const MISC_DEVICE: Self = Self::READ_ALL;

    /// Echo proc file: `0646`
    pub const PROC_FILE: Self = Self::from_bits_truncate(0o646);

    /// Sysctl variable: `0644`
    pub const SYSCTL_VAR: Self = Self::from_bits_truncate(0o644);

    /// Sysctl directory: `0555`
    pub const SYSCTL_DIR: Self = Self::from_bits_truncate(0o555);

    /// Check whether `class` may open with `access`
    pub fn permits(self, class: CallerClass, access: Access) -> bool {
        let (read, write) = match class {
            CallerClass::Root => return true,
            CallerClass::Owner => (Self::OWNER_READ, Self::OWNER_WRITE),
            CallerClass::Group => (Self::GROUP_READ, Self::GROUP_WRITE),
            CallerClass::Other => (Self::OTHER_READ, Self::OTHER_WRITE),
        };

        (!access.contains(Access::READ) || self.contains(read))
            && (!access.contains(Access::WRITE) || self.contains(write))
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.bits())
    }
}
