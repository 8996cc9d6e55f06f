//! Property-based tests for the echo channel
//!
//! Covers, for arbitrary inputs, capacities and cursors in both cursor modes:
//! - write then full read returns the accepted prefix padded with zeros
//! - writes accept exactly `min(len, capacity)` bytes
//! - writing the same input twice leaves the same contents as writing once
//! - a later write fully clears an earlier one
//! - reads never produce more than `max(0, capacity - cursor)` bytes

use std::num::NonZeroUsize;

use echo_channel::{CursorMode, EchoChannel};
use proptest::prelude::*;

fn arb_mode() -> impl Strategy<Value = CursorMode> {
    prop_oneof![Just(CursorMode::Rebase), Just(CursorMode::Accumulate)]
}

fn arb_cursor() -> impl Strategy<Value = u64> {
    prop_oneof![0u64..=256, any::<u64>()]
}

fn channel(capacity: usize, mode: CursorMode) -> EchoChannel {
    EchoChannel::new(NonZeroUsize::new(capacity).unwrap()).with_cursor_mode(mode)
}

fn padded(data: &[u8], capacity: usize) -> Vec<u8> {
    let mut expected = data[..data.len().min(capacity)].to_vec();
    expected.resize(capacity, 0);
    expected
}

proptest! {
    #[test]
    fn write_then_read_returns_padded_prefix(
        capacity in 1usize..=128,
        mode in arb_mode(),
        input in proptest::collection::vec(any::<u8>(), 0..=256),
    ) {
        let ch = channel(capacity, mode);
        let accepted = ch.write(&input);
        prop_assert_eq!(accepted, input.len().min(capacity));
        prop_assert_eq!(ch.valid_length(), accepted);

        let result = ch.read(0, capacity);
        prop_assert_eq!(result.bytes, padded(&input, capacity));
        prop_assert_eq!(result.cursor, capacity as u64);
    }

    #[test]
    fn repeated_write_is_idempotent(
        capacity in 1usize..=128,
        mode in arb_mode(),
        input in proptest::collection::vec(any::<u8>(), 0..=256),
    ) {
        let ch = channel(capacity, mode);
        let first = ch.write(&input);
        let once = ch.contents();
        let second = ch.write(&input);
        prop_assert_eq!(first, second);
        prop_assert_eq!(ch.contents(), once);
    }

    #[test]
    fn later_write_clears_earlier_one(
        capacity in 1usize..=128,
        mode in arb_mode(),
        earlier in proptest::collection::vec(any::<u8>(), 0..=256),
        later in proptest::collection::vec(any::<u8>(), 0..=256),
    ) {
        let ch = channel(capacity, mode);
        ch.write(&earlier);
        ch.write(&later);
        prop_assert_eq!(ch.contents(), padded(&later, capacity));
    }

    #[test]
    fn read_is_bounded_by_remaining_capacity(
        capacity in 1usize..=128,
        mode in arb_mode(),
        input in proptest::collection::vec(any::<u8>(), 0..=256),
        cursor in arb_cursor(),
        max_len in 0usize..=512,
    ) {
        let ch = channel(capacity, mode);
        ch.write(&input);
        let before = ch.contents();

        let remaining = (capacity as u64).saturating_sub(cursor) as usize;
        let result = ch.read(cursor, max_len);
        prop_assert_eq!(result.bytes.len(), remaining.min(max_len));

        let produced = result.bytes.len() as u64;
        if produced > 0 {
            let start = cursor as usize;
            prop_assert_eq!(&result.bytes[..], &before[start..start + produced as usize]);
        }

        let expected_cursor = match mode {
            CursorMode::Rebase => produced,
            CursorMode::Accumulate => cursor.saturating_add(produced),
        };
        prop_assert_eq!(result.cursor, expected_cursor);
        prop_assert_eq!(ch.contents(), before);
    }
}
