//! Pending console input

use std::collections::VecDeque;

/// Bytes received from the console but not yet consumed by the guest.
///
/// Appends go to the back, drains take from the front. A drain never blocks
/// and never drops a byte it did not hand out.
#[derive(Debug, Default, Clone)]
pub struct InputQueue {
    bytes: VecDeque<u8>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` in order.
    pub fn push(
        &mut self,
        bytes: &[u8],
    ) {
        self.bytes.extend(bytes.iter().copied());
    }

    /// Move up to `dest.len()` bytes from the front of the queue into `dest`.
    ///
    /// Returns the number of bytes moved; `0` means nothing is available
    /// right now, not end of input.
    pub fn drain_into(
        &mut self,
        dest: &mut [u8],
    ) -> usize {
        let count = self.bytes.len().min(dest.len());
        for (slot, byte) in dest.iter_mut().zip(self.bytes.drain(..count)) {
            *slot = byte;
        }
        count
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}
