//! Echo Channel - Bounded single-record echo buffer
//!
//! # Purpose
//! Stores the most recent write in a fixed-capacity, zero-padded buffer and
//! serves it back on read. This is the shared core of the echo misc device
//! and the echo proc file.
//!
//! # Integration Points
//! - Depends on: nothing beyond `alloc`
//! - Provides to: echo endpoints (misc device, proc file)
//! - Observability: `WriteObserver` hook fired after each write
//!
//! # Architecture
//! One `EchoChannel` per endpoint, shared through an `Arc` handle. A single
//! spin lock serializes {clear, copy, set length} on write against the
//! copy-out on read, so a reader never sees a buffer mid-overwrite.
//!
//! Every write wipes the whole buffer before copying, and oversized input is
//! truncated to capacity. Reads cover the full capacity, so trailing zero
//! bytes are returned once the cursor passes the written length.
//!
//! # Cursor Modes
//! - `CursorMode::Rebase` (default): the returned cursor is the number of
//!   bytes produced by this read, not the accumulated position. This is how
//!   the Linux echo device and proc file behave; repeated small reads
//!   restart near the front of the buffer.
//! - `CursorMode::Accumulate`: the returned cursor is `cursor + produced`,
//!   ordinary stream semantics with EOF at capacity.
//!
//! # Testing Strategy
//! - Unit tests: write/read contract, truncation, zero-fill, cursor modes
//! - Concurrency: writers racing readers never expose torn contents
//! - Property tests: `tests/properties.rs`
//! - Benchmarks: `benches/channel.rs`

#![no_std]

#[cfg(test)]
extern crate std;

extern crate alloc;

mod observer;
mod source;

pub use observer::{c_str_lossy, LogObserver, WriteObserver};
pub use source::{CopySource, FaultingSource};

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::num::NonZeroUsize;
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use spin::Mutex;
use static_assertions::const_assert;

/// Default channel capacity in bytes
pub const ECHO_BUFFER_MAX_SIZE: usize = 64;

const_assert!(ECHO_BUFFER_MAX_SIZE > 0);

/// How `read` reports the cursor after a read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorMode {
    /// Cursor becomes the count of bytes just produced
    #[default]
    Rebase,
    /// Cursor advances by the count of bytes just produced
    Accumulate,
}

/// Source of per-channel identifiers, used to tie sessions to their channel
static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque token handed out by `EchoChannel::open`
///
/// Carries no buffer state; it only exists so callers have something to
/// hand back on close. A token is only honoured by the channel that issued it.
#[derive(Debug, PartialEq, Eq)]
pub struct Session {
    id: u64,
    channel: u64,
}

impl Session {
    /// Session identifier (diagnostics only)
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Result of a buffered read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResult {
    /// Bytes produced by the read
    pub bytes: Vec<u8>,
    /// Cursor to use for the next read
    pub cursor: u64,
}

/// Buffer state guarded by the channel lock
struct EchoBuffer {
    /// Always exactly `capacity` bytes
    contents: Box<[u8]>,
    /// Bytes from the start of `contents` that came from the last write
    valid_length: usize,
}

/// Fixed-capacity echo buffer
pub struct EchoChannel {
    id: u64,
    buffer: Mutex<EchoBuffer>,
    capacity: usize,
    mode: CursorMode,
    observer: Option<Arc<dyn WriteObserver>>,
    open_sessions: AtomicUsize,
    next_session: AtomicU64,
}

impl EchoChannel {
    /// Create a zero-filled channel with the given capacity
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self {
            id: NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed),
            buffer: Mutex::new(EchoBuffer {
                contents: vec![0u8; capacity].into_boxed_slice(),
                valid_length: 0,
            }),
            capacity,
            mode: CursorMode::default(),
            observer: None,
            open_sessions: AtomicUsize::new(0),
            next_session: AtomicU64::new(1),
        }
    }

    /// Select the cursor mode used by reads
    pub fn with_cursor_mode(mut self, mode: CursorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Attach an observer notified after every write
    pub fn with_observer(mut self, observer: Arc<dyn WriteObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Channel capacity in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cursor mode used by reads
    #[inline]
    pub fn cursor_mode(&self) -> CursorMode {
        self.mode
    }

    /// Number of bytes stored by the most recent write
    pub fn valid_length(&self) -> usize {
        self.buffer.lock().valid_length
    }

    /// Snapshot of the full capacity-sized contents
    pub fn contents(&self) -> Vec<u8> {
        self.buffer.lock().contents.to_vec()
    }

    /// Number of sessions opened and not yet closed
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::Acquire)
    }

    /// Open a session on the channel
    ///
    /// Always succeeds and does not touch the buffer.
    pub fn open(&self) -> Session {
        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        self.open_sessions.fetch_add(1, Ordering::AcqRel);
        log::debug!("echo session {} opened", id);
        Session { id, channel: self.id }
    }

    /// Close a session
    ///
    /// Tokens issued by another channel are ignored.
    pub fn close(&self, session: Session) {
        if session.channel != self.id {
            log::warn!("echo session {} does not belong to this channel", session.id);
            return;
        }
        let _ = self
            .open_sessions
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        log::debug!("echo session {} closed", session.id);
    }

    /// Replace the buffer contents with `input`
    ///
    /// Returns the number of bytes accepted: `min(input.len(), capacity)`.
    pub fn write(&self, input: &[u8]) -> usize {
        self.write_from(input, input.len())
    }

    /// Replace the buffer contents with up to `length` bytes from `source`
    ///
    /// The buffer is cleared first. `min(length, capacity)` bytes are
    /// requested from the source; bytes the source fails to deliver are
    /// subtracted from the returned count and stay zero in the buffer.
    ///
    /// The channel lock is held while the source copies; see `CopySource`.
    pub fn write_from<S: CopySource + ?Sized>(&self, source: &S, length: usize) -> usize {
        let (written, accepted) = {
            let mut buffer = self.buffer.lock();
            buffer.contents.fill(0);

            let write_size = length.min(self.capacity);
            let not_written = source
                .copy_into(&mut buffer.contents[..write_size])
                .min(write_size);
            let written = write_size - not_written;
            buffer.contents[written..write_size].fill(0);
            buffer.valid_length = written;

            let accepted = self
                .observer
                .as_ref()
                .map(|_| buffer.contents[..written].to_vec());
            (written, accepted)
        };

        if let (Some(observer), Some(accepted)) = (&self.observer, accepted) {
            observer.on_write(&accepted);
        }
        written
    }

    /// Copy bytes starting at `cursor` into `out`
    ///
    /// Produces `min(out.len(), capacity - cursor)` bytes (zero when the
    /// cursor is at or past capacity). Returns the number of bytes produced
    /// and the cursor for the next read, according to the cursor mode.
    pub fn read_into(&self, cursor: u64, out: &mut [u8]) -> (usize, u64) {
        let produced = match usize::try_from(cursor) {
            Ok(start) if start < self.capacity => {
                let n = out.len().min(self.capacity - start);
                let buffer = self.buffer.lock();
                out[..n].copy_from_slice(&buffer.contents[start..start + n]);
                n
            }
            _ => 0,
        };

        let next = match self.mode {
            CursorMode::Rebase => produced as u64,
            CursorMode::Accumulate => cursor.saturating_add(produced as u64),
        };
        (produced, next)
    }

    /// Read up to `max_len` bytes starting at `cursor`
    pub fn read(&self, cursor: u64, max_len: usize) -> ReadResult {
        let len = match usize::try_from(cursor) {
            Ok(start) if start < self.capacity => max_len.min(self.capacity - start),
            _ => 0,
        };
        let mut bytes = vec![0u8; len];
        let (produced, cursor) = self.read_into(cursor, &mut bytes);
        bytes.truncate(produced);
        ReadResult { bytes, cursor }
    }
}

impl Default for EchoChannel {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(ECHO_BUFFER_MAX_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

impl core::fmt::Debug for EchoChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EchoChannel")
            .field("capacity", &self.capacity)
            .field("mode", &self.mode)
            .field("valid_length", &self.valid_length())
            .field("open_sessions", &self.open_sessions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    fn channel() -> EchoChannel {
        EchoChannel::default()
    }

    fn padded(data: &[u8], capacity: usize) -> Vec<u8> {
        let mut expected = data.to_vec();
        expected.resize(capacity, 0);
        expected
    }

    #[derive(Default)]
    struct Recorder {
        writes: StdMutex<Vec<Vec<u8>>>,
    }

    impl WriteObserver for Recorder {
        fn on_write(&self, accepted: &[u8]) {
            self.writes.lock().unwrap().push(accepted.to_vec());
        }
    }

    #[test]
    fn test_new_channel_is_zero_filled() {
        let ch = channel();
        assert_eq!(ch.capacity(), ECHO_BUFFER_MAX_SIZE);
        assert_eq!(ch.valid_length(), 0);
        assert_eq!(ch.contents(), vec![0u8; ECHO_BUFFER_MAX_SIZE]);
    }

    #[test]
    fn test_write_then_read_full_capacity() {
        let ch = channel();
        let msg = b"captured-in-echo-buffer";
        assert_eq!(ch.write(msg), msg.len());
        assert_eq!(ch.valid_length(), msg.len());

        let result = ch.read(0, 64);
        assert_eq!(result.bytes, padded(msg, 64));
        assert_eq!(result.cursor, 64);

        let head = ch.read(0, 10);
        assert_eq!(head.bytes, &msg[..10]);
    }

    #[test]
    fn test_write_clears_previous_contents() {
        let ch = channel();
        ch.write(b"hello");
        ch.write(b"hi");
        assert_eq!(ch.contents(), padded(b"hi", 64));
        assert_eq!(ch.valid_length(), 2);
    }

    #[test]
    fn test_write_is_idempotent() {
        let ch = channel();
        ch.write(b"same");
        let once = ch.contents();
        ch.write(b"same");
        assert_eq!(ch.contents(), once);
    }

    #[test]
    fn test_empty_write_zeroes_buffer() {
        let ch = channel();
        ch.write(b"something");
        assert_eq!(ch.write(b""), 0);
        assert_eq!(ch.contents(), vec![0u8; 64]);
        assert_eq!(ch.valid_length(), 0);
    }

    #[test]
    fn test_oversized_write_truncates() {
        let ch = channel();
        let input: Vec<u8> = (0..65u8).map(|i| b'a' + (i % 26)).collect();
        assert_eq!(ch.write(&input), 64);
        assert_eq!(ch.contents(), &input[..64]);
        assert_eq!(ch.valid_length(), 64);
    }

    #[test]
    fn test_read_is_bounded_by_capacity() {
        let ch = channel();
        ch.write(b"abc");
        assert_eq!(ch.read(60, 1000).bytes.len(), 4);
        assert!(ch.read(64, 10).bytes.is_empty());
        assert!(ch.read(u64::MAX, 10).bytes.is_empty());
        assert!(ch.read(0, 0).bytes.is_empty());
    }

    #[test]
    fn test_read_starts_at_cursor() {
        let ch = channel();
        ch.write(b"0123456789");
        assert_eq!(ch.read(3, 4).bytes, b"3456");
    }

    #[test]
    fn test_read_does_not_mutate() {
        let ch = channel();
        ch.write(b"stable");
        let before = ch.contents();
        let _ = ch.read(0, 64);
        let _ = ch.read(2, 3);
        assert_eq!(ch.contents(), before);
    }

    // Reference-compatible, not recommended: the cursor is rebased to the
    // count of the last read instead of accumulating.
    #[test]
    fn test_rebase_cursor_is_batch_count() {
        let ch = channel();
        ch.write(b"0123456789");
        let first = ch.read(5, 10);
        assert_eq!(first.cursor, 10);

        let second = ch.read(first.cursor, 10);
        assert_eq!(second.bytes, padded(b"", 10));
        assert_eq!(second.cursor, 10);
    }

    #[test]
    fn test_rebase_cursor_past_end_resets_to_zero() {
        let ch = channel();
        assert_eq!(ch.read(64, 10).cursor, 0);
    }

    #[test]
    fn test_accumulate_cursor_streams_to_eof() {
        let ch = channel().with_cursor_mode(CursorMode::Accumulate);
        ch.write(b"0123456789");

        let mut cursor = 0;
        let mut streamed = Vec::new();
        loop {
            let chunk = ch.read(cursor, 7);
            if chunk.bytes.is_empty() {
                break;
            }
            streamed.extend_from_slice(&chunk.bytes);
            cursor = chunk.cursor;
        }
        assert_eq!(streamed, padded(b"0123456789", 64));
        assert_eq!(cursor, 64);
        assert_eq!(ch.read(5, 10).cursor, 15);
    }

    #[test]
    fn test_read_into_reports_count() {
        let ch = channel();
        ch.write(b"xyz");
        let mut out = [0xffu8; 5];
        let (n, next) = ch.read_into(0, &mut out);
        assert_eq!(n, 5);
        assert_eq!(next, 5);
        assert_eq!(&out, b"xyz\0\0");
    }

    #[test]
    fn test_partial_copy_reduces_accepted_count() {
        let ch = channel();
        ch.write(b"previous contents");
        let source = FaultingSource::new(b"abcdefgh", 5);
        assert_eq!(ch.write_from(&source, 8), 5);
        assert_eq!(ch.valid_length(), 5);
        assert_eq!(ch.contents(), padded(b"abcde", 64));
    }

    #[test]
    fn test_write_from_clamps_length_to_capacity() {
        let ch = EchoChannel::new(NonZeroUsize::new(4).unwrap());
        assert_eq!(ch.write_from(b"abcdefgh".as_slice(), 100), 4);
        assert_eq!(ch.contents(), b"abcd");
    }

    #[test]
    fn test_small_capacity_channel() {
        let ch = EchoChannel::new(NonZeroUsize::new(1).unwrap());
        assert_eq!(ch.write(b"xy"), 1);
        assert_eq!(ch.read(0, 10).bytes, b"x");
    }

    #[test]
    fn test_observer_sees_accepted_bytes() {
        let recorder = Arc::new(Recorder::default());
        let ch = EchoChannel::new(NonZeroUsize::new(4).unwrap()).with_observer(recorder.clone());
        ch.write(b"abcdef");
        ch.write(b"");
        let writes = recorder.writes.lock().unwrap();
        assert_eq!(*writes, vec![b"abcd".to_vec(), Vec::new()]);
    }

    #[test]
    fn test_sessions_are_accounting_only() {
        let ch = channel();
        ch.write(b"kept");
        let a = ch.open();
        let b = ch.open();
        assert_ne!(a.id(), b.id());
        assert_eq!(ch.open_sessions(), 2);
        ch.close(a);
        ch.close(b);
        assert_eq!(ch.open_sessions(), 0);
        assert_eq!(ch.read(0, 4).bytes, b"kept");
    }

    #[test]
    fn test_foreign_session_is_ignored() {
        let a = channel();
        let b = channel();
        let own = b.open();
        b.close(a.open());
        assert_eq!(b.open_sessions(), 1);
        assert_eq!(a.open_sessions(), 1);
        b.close(own);
        assert_eq!(b.open_sessions(), 0);
    }

    #[test]
    fn test_concurrent_writes_never_tear() {
        let ch = Arc::new(channel());
        let patterns: [&[u8]; 2] = [&[b'a'; 40], &[b'b'; 20]];

        let writers: Vec<_> = patterns
            .iter()
            .map(|pattern| {
                let ch = Arc::clone(&ch);
                let pattern = pattern.to_vec();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        ch.write(&pattern);
                    }
                })
            })
            .collect();

        for _ in 0..500 {
            let snapshot = ch.read(0, 64).bytes;
            let ok = snapshot == vec![0u8; 64]
                || snapshot == padded(patterns[0], 64)
                || snapshot == padded(patterns[1], 64);
            assert!(ok, "torn read: {:?}", snapshot);
        }

        for writer in writers {
            writer.join().unwrap();
        }
    }
}
