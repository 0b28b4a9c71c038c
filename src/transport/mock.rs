//! Mock transport for testing

use super::Transport;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Mock transport for unit testing
///
/// Clones share the same buffers, so a test keeps one handle to inject data
/// while the ingestor thread owns another.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

struct MockTransportInner {
    read_buffer: VecDeque<u8>,
    open: bool,
    failures_pending: usize,
    reads: u64,
    reconnects: u64,
}

/// Idle time for a read with nothing buffered, standing in for a port timeout
const EMPTY_READ_DELAY: Duration = Duration::from_millis(1);

impl MockTransport {
    /// Create a new, open mock transport
    pub fn new() -> Self {
        MockTransport {
            inner: Arc::new(Mutex::new(MockTransportInner {
                read_buffer: VecDeque::new(),
                open: true,
                failures_pending: 0,
                reads: 0,
                reconnects: 0,
            })),
        }
    }

    /// Inject data to be read
    pub fn inject_read(&self, data: &[u8]) {
        self.inner.lock().read_buffer.extend(data);
    }

    /// Inject one text line, appending the newline
    pub fn inject_line(&self, line: &str) {
        let mut inner = self.inner.lock();
        inner.read_buffer.extend(line.as_bytes());
        inner.read_buffer.push_back(b'\n');
    }

    /// Mark the stream open or closed; a closed stream stays closed across reconnects
    pub fn set_open(&self, open: bool) {
        self.inner.lock().open = open;
    }

    /// Make the next `count` reads fail with an I/O error
    pub fn fail_next_reads(&self, count: usize) {
        self.inner.lock().failures_pending = count;
    }

    /// Number of read calls made so far
    pub fn read_count(&self) -> u64 {
        self.inner.lock().reads
    }

    /// Number of reconnect attempts made so far
    pub fn reconnect_count(&self) -> u64 {
        self.inner.lock().reconnects
    }

    /// Bytes not yet consumed
    pub fn pending(&self) -> usize {
        self.inner.lock().read_buffer.len()
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let available = {
            let mut inner = self.inner.lock();
            inner.reads += 1;

            if !inner.open {
                return Err(Error::NotOpen);
            }
            if inner.failures_pending > 0 {
                inner.failures_pending -= 1;
                return Err(Error::Io(std::io::Error::other("injected read failure")));
            }

            let available = inner.read_buffer.len().min(buffer.len());
            for (slot, byte) in buffer.iter_mut().zip(inner.read_buffer.drain(..available)) {
                *slot = byte;
            }
            available
        };

        if available == 0 {
            std::thread::sleep(EMPTY_READ_DELAY);
        }
        Ok(available)
    }

    fn is_open(&self) -> bool {
        self.inner.lock().open
    }

    fn reconnect(&mut self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.reconnects += 1;
        if inner.open { Ok(()) } else { Err(Error::NotOpen) }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}
