//! Mock transport for testing
//!
//! Reads are served from a script of chunks; an exhausted script reads as
//! end of stream. Every `write` call is recorded separately so tests can
//! check frame boundaries.

use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

enum ReadStep {
    Data(Vec<u8>),
    Error(ErrorKind),
}

/// Mock transport for unit and integration tests
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

struct MockTransportInner {
    read_script: VecDeque<ReadStep>,
    writes: Vec<Vec<u8>>,
    flushes: usize,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        MockTransport {
            inner: Arc::new(Mutex::new(MockTransportInner {
                read_script: VecDeque::new(),
                writes: Vec::new(),
                flushes: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Inject data to be read
    pub fn inject_read(&self, data: &[u8]) {
        self.lock().read_script.push_back(ReadStep::Data(data.to_vec()));
    }

    /// Make the next read time out, as a serial port with no data does
    pub fn inject_timeout(&self) {
        self.inject_error(ErrorKind::TimedOut);
    }

    /// Make the next read fail with `kind`
    pub fn inject_error(&self, kind: ErrorKind) {
        self.lock().read_script.push_back(ReadStep::Error(kind));
    }

    /// Every write call, in order
    pub fn get_writes(&self) -> Vec<Vec<u8>> {
        self.lock().writes.clone()
    }

    /// All written data, concatenated
    pub fn get_written(&self) -> Vec<u8> {
        self.lock().writes.concat()
    }

    /// Number of `flush` calls
    pub fn flush_count(&self) -> usize {
        self.lock().flushes
    }

    /// Clear written data
    pub fn clear_written(&self) {
        let mut inner = self.lock();
        inner.writes.clear();
        inner.flushes = 0;
    }
}

impl Read for MockTransport {
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        match inner.read_script.pop_front() {
            None => Ok(0),
            Some(ReadStep::Error(kind)) => Err(io::Error::new(kind, "mock read error")),
            Some(ReadStep::Data(mut data)) => {
                let n = data.len().min(buffer.len());
                buffer[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    let rest = data.split_off(n);
                    inner.read_script.push_front(ReadStep::Data(rest));
                }
                Ok(n)
            }
        }
    }
}

impl Write for MockTransport {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.lock().writes.push(data.to_vec());
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().flushes += 1;
        Ok(())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}
