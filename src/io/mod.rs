//! Console I/O bridge
//!
//! Host-owned state behind the guest's three imports:
//!
//! - `readString(ptr, max) -> n`: drains up to `max` bytes of pending input
//! - `writeString(ptr, len)`: forwards guest output to the [`OutputSink`]
//! - `millis() -> ms`: milliseconds since the run's [`TimeAnchor`]
//!
//! The producer side ([`IoBridge::push_input`]) is only called between
//! ticks, never from inside a guest call.

pub mod clock;
pub mod queue;
pub mod sink;

#[cfg(test)]
mod tests;

pub use clock::{Clock, ManualClock, MonotonicClock, TimeAnchor};
pub use queue::InputQueue;
pub use sink::{CaptureSink, OutputSink, StdoutSink};

use std::fmt;
use std::io;

use tracing::trace;

/// Host side of the guest console.
pub struct IoBridge {
    input: InputQueue,
    sink: Box<dyn OutputSink>,
    clock: Box<dyn Clock>,
    anchor: TimeAnchor,
}

impl fmt::Debug for IoBridge {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("IoBridge")
            .field("input", &self.input)
            .field("anchor", &self.anchor)
            .finish_non_exhaustive()
    }
}

impl IoBridge {
    /// Bridge writing to `sink`, timed by a [`MonotonicClock`].
    pub fn new(sink: impl OutputSink + 'static) -> Self {
        Self::with_clock(sink, MonotonicClock::new())
    }

    pub fn with_clock(
        sink: impl OutputSink + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        let clock: Box<dyn Clock> = Box::new(clock);
        let anchor = TimeAnchor::capture(clock.as_ref());
        Self {
            input: InputQueue::new(),
            sink: Box::new(sink),
            clock,
            anchor,
        }
    }

    /// Producer side: queue bytes that arrived from the console.
    pub fn push_input(
        &mut self,
        bytes: &[u8],
    ) {
        self.input.push(bytes);
        trace!(queued = bytes.len(), pending = self.input.len(), "console input");
    }

    /// Guest read: fill `dest` from the front of the queue.
    ///
    /// Returns the number of bytes written into `dest`; `0` when nothing is
    /// pending.
    pub fn console_read(
        &mut self,
        dest: &mut [u8],
    ) -> u32 {
        let count = self.input.drain_into(dest);
        trace!(requested = dest.len(), delivered = count, "guest read");
        // dest comes from a u32-sized guest range
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Guest write: forward `bytes` to the sink as-is.
    pub fn console_write(
        &mut self,
        bytes: &[u8],
    ) -> io::Result<()> {
        trace!(len = bytes.len(), "guest write");
        self.sink.emit(bytes)
    }

    /// Guest clock: milliseconds since the current run started.
    pub fn elapsed_millis(&self) -> u32 {
        self.anchor.elapsed_millis(self.clock.as_ref())
    }

    /// Re-anchor the guest clock at the start of a run.
    pub fn reset_anchor(&mut self) {
        self.anchor = TimeAnchor::capture(self.clock.as_ref());
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    pub fn clear_console(&mut self) -> io::Result<()> {
        self.sink.clear()
    }

    pub fn input(&self) -> &InputQueue {
        &self.input
    }

    /// Write host-originated text (greetings, alarms) to the console.
    pub fn announce(
        &mut self,
        text: &str,
    ) -> io::Result<()> {
        self.sink.emit(text.as_bytes())
    }
}
