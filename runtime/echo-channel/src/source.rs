//! Copy sources for channel writes
//!
//! A write crosses a trust boundary: the bytes come from a caller buffer that
//! may become unreadable part way through the copy. `CopySource` models that
//! copy and reports how many bytes could NOT be delivered, the same
//! accounting a `copy_from_user` style primitive uses.

/// Source of bytes for a channel write
///
/// `copy_into` runs with the channel lock held, so it must not block or
/// wait on other channel users.
pub trait CopySource {
    /// Copy bytes into the front of `dst`
    ///
    /// Fills `dst` from the start and returns the number of trailing bytes of
    /// `dst` that could not be copied. Bytes that were not copied are left
    /// for the caller to clear.
    fn copy_into(&self, dst: &mut [u8]) -> usize;
}

impl CopySource for [u8] {
    fn copy_into(&self, dst: &mut [u8]) -> usize {
        let n = dst.len().min(self.len());
        dst[..n].copy_from_slice(&self[..n]);
        dst.len() - n
    }
}

impl<const N: usize> CopySource for [u8; N] {
    fn copy_into(&self, dst: &mut [u8]) -> usize {
        self.as_slice().copy_into(dst)
    }
}

/// Source that faults after a fixed number of readable bytes
///
/// Stands in for a caller buffer whose tail lies in unmapped memory.
#[derive(Debug, Clone, Copy)]
pub struct FaultingSource<'a> {
    data: &'a [u8],
    readable: usize,
}

impl<'a> FaultingSource<'a> {
    /// Create a source over `data` where only the first `readable` bytes can be copied
    pub fn new(data: &'a [u8], readable: usize) -> Self {
        Self {
            data,
            readable: readable.min(data.len()),
        }
    }

    /// Number of bytes that can be copied before the fault
    pub fn readable(&self) -> usize {
        self.readable
    }
}

impl CopySource for FaultingSource<'_> {
    fn copy_into(&self, dst: &mut [u8]) -> usize {
        let n = dst.len().min(self.readable);
        dst[..n].copy_from_slice(&self.data[..n]);
        dst.len() - n
    }
}
