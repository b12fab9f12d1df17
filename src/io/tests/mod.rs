//! I/O bridge 单元测试

use std::time::Duration;

use proptest::prelude::*;

use crate::io::{CaptureSink, InputQueue, IoBridge, ManualClock};

fn bridge_with_clock() -> (IoBridge, CaptureSink, ManualClock) {
    let sink = CaptureSink::new();
    let clock = ManualClock::new();
    let bridge = IoBridge::with_clock(sink.clone(), clock.clone());
    (bridge, sink, clock)
}

#[test]
fn test_queue_drain_partial() {
    let mut queue = InputQueue::new();
    queue.push(b"hello");

    let mut buf = [0u8; 3];
    assert_eq!(queue.drain_into(&mut buf), 3);
    assert_eq!(&buf, b"hel");
    assert_eq!(queue.len(), 2);

    let mut buf = [0u8; 8];
    assert_eq!(queue.drain_into(&mut buf), 2);
    assert_eq!(&buf[..2], b"lo");
    assert!(queue.is_empty());
}

#[test]
fn test_queue_drain_empty_returns_zero() {
    let mut queue = InputQueue::new();
    let mut buf = [0xAAu8; 4];
    assert_eq!(queue.drain_into(&mut buf), 0);
    // destination untouched
    assert_eq!(buf, [0xAA; 4]);
}

#[test]
fn test_queue_zero_length_drain_keeps_bytes() {
    let mut queue = InputQueue::new();
    queue.push(b"xy");
    assert_eq!(queue.drain_into(&mut []), 0);
    assert_eq!(queue.len(), 2);
}

#[test]
fn test_bridge_read_drains_queue() {
    let (mut bridge, _, _) = bridge_with_clock();
    bridge.push_input(b"abc");
    bridge.push_input(b"def");

    let mut dest = [0u8; 4];
    assert_eq!(bridge.console_read(&mut dest), 4);
    assert_eq!(&dest, b"abcd");
    assert_eq!(bridge.input().len(), 2);

    bridge.clear_input();
    assert_eq!(bridge.console_read(&mut dest), 0);
}

#[test]
fn test_bridge_writes_keep_call_order() {
    let (mut bridge, sink, _) = bridge_with_clock();
    bridge.console_write(b"one ").unwrap();
    bridge.console_write(b"two ").unwrap();
    bridge.console_write(&[0xE2, 0x82]).unwrap();
    bridge.console_write(&[0xAC]).unwrap();

    assert_eq!(sink.writes(), 4);
    assert_eq!(sink.text(), "one two \u{20AC}");
}

#[test]
fn test_bridge_clock_measures_from_anchor() {
    let (mut bridge, _, clock) = bridge_with_clock();
    assert_eq!(bridge.elapsed_millis(), 0);

    clock.advance(Duration::from_millis(250));
    assert_eq!(bridge.elapsed_millis(), 250);

    bridge.reset_anchor();
    assert_eq!(bridge.elapsed_millis(), 0);

    clock.advance(Duration::from_millis(5));
    assert_eq!(bridge.elapsed_millis(), 5);
}

#[test]
fn test_bridge_clock_saturates() {
    let (bridge, _, clock) = bridge_with_clock();
    clock.advance(Duration::from_millis(u64::from(u32::MAX) + 10));
    assert_eq!(bridge.elapsed_millis(), u32::MAX);
}

#[test]
fn test_bridge_clear_console() {
    let (mut bridge, sink, _) = bridge_with_clock();
    bridge.announce("banner\r\n").unwrap();
    bridge.clear_console().unwrap();
    assert_eq!(sink.clears(), 1);
    assert!(sink.contents().is_empty());
}

proptest! {
    /// Arbitrary appends followed by arbitrary drains reproduce the
    /// concatenation exactly once, in order.
    #[test]
    fn prop_queue_preserves_order(
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 0..16),
        drains in prop::collection::vec(0usize..40, 1..32),
    ) {
        let mut queue = InputQueue::new();
        let mut expected = Vec::new();
        for chunk in &chunks {
            queue.push(chunk);
            expected.extend_from_slice(chunk);
        }

        let mut seen = Vec::new();
        let mut drain_sizes = drains.iter().cycle();
        while !queue.is_empty() {
            let before = queue.len();
            // a zero-sized drain would never make progress on its own
            let size = (*drain_sizes.next().unwrap()).max(1);
            let mut buf = vec![0u8; size];
            let got = queue.drain_into(&mut buf);
            prop_assert_eq!(got, before.min(size));
            prop_assert_eq!(queue.len(), before - got);
            seen.extend_from_slice(&buf[..got]);
        }

        prop_assert_eq!(seen, expected);
    }

    /// Interleaving pushes and drains never loses or duplicates bytes.
    #[test]
    fn prop_queue_interleaved(
        ops in prop::collection::vec((prop::collection::vec(any::<u8>(), 0..8), 0usize..12), 0..24),
    ) {
        let mut queue = InputQueue::new();
        let mut pushed = Vec::new();
        let mut drained = Vec::new();
        for (chunk, drain) in &ops {
            queue.push(chunk);
            pushed.extend_from_slice(chunk);
            let mut buf = vec![0u8; *drain];
            let got = queue.drain_into(&mut buf);
            drained.extend_from_slice(&buf[..got]);
        }
        let mut rest = vec![0u8; queue.len()];
        let got = queue.drain_into(&mut rest);
        drained.extend_from_slice(&rest[..got]);

        prop_assert_eq!(drained, pushed);
    }
}
