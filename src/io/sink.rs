//! Console output sinks

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// ANSI sequence: clear screen, cursor home.
const CLEAR_SCREEN: &[u8] = b"\x1b[2J\x1b[H";

/// Destination for bytes the guest writes to its console.
pub trait OutputSink: Send {
    /// Forward guest output unmodified.
    fn emit(
        &mut self,
        bytes: &[u8],
    ) -> io::Result<()>;

    /// Reset the console before a new run.
    fn clear(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes straight to the process stdout, flushing after every write.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(
        &mut self,
        bytes: &[u8],
    ) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(bytes)?;
        out.flush()
    }

    fn clear(&mut self) -> io::Result<()> {
        self.emit(CLEAR_SCREEN)
    }
}

/// In-memory sink whose contents stay readable through any clone.
#[derive(Debug, Default, Clone)]
pub struct CaptureSink {
    inner: Arc<Mutex<Capture>>,
}

#[derive(Debug, Default)]
struct Capture {
    bytes: Vec<u8>,
    writes: usize,
    clears: usize,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything emitted since the last clear.
    pub fn contents(&self) -> Vec<u8> {
        self.inner.lock().bytes.clone()
    }

    /// Lossy text view of [`CaptureSink::contents`].
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock().bytes).into_owned()
    }

    /// Number of `emit` calls received.
    pub fn writes(&self) -> usize {
        self.inner.lock().writes
    }

    pub fn clears(&self) -> usize {
        self.inner.lock().clears
    }
}

impl OutputSink for CaptureSink {
    fn emit(
        &mut self,
        bytes: &[u8],
    ) -> io::Result<()> {
        let mut capture = self.inner.lock();
        capture.bytes.extend_from_slice(bytes);
        capture.writes += 1;
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        let mut capture = self.inner.lock();
        capture.bytes.clear();
        capture.clears += 1;
        Ok(())
    }
}
