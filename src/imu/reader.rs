//! Sample ingestor thread
//!
//! Reads the IMU byte stream line by line and keeps the shared
//! [`SampleSlot`] pointing at the newest well-formed sample.
//!
//! # Failure Handling
//!
//! - **Malformed line**: counted and dropped; never surfaced
//! - **Stream not open**: reconnect attempted every `retry_interval`
//! - **Read error**: counted, logged, retried after `retry_interval`
//!
//! The thread only exits when the shutdown flag is raised.

use super::protocol::{LineReader, parse_line};
use super::slot::SampleSlot;
use crate::error::{Error, Result};
use crate::transport::Transport;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const READ_BUFFER_SIZE: usize = 512;

/// Snapshot of ingestion counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Lines parsed into samples
    pub accepted: u64,
    /// Lines discarded as malformed
    pub rejected: u64,
    /// Failed reads or reconnect attempts
    pub read_errors: u64,
}

#[derive(Default)]
struct IngestCounters {
    accepted: AtomicU64,
    rejected: AtomicU64,
    read_errors: AtomicU64,
}

impl IngestCounters {
    fn snapshot(&self) -> IngestStats {
        IngestStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
        }
    }
}

/// Background reader feeding the latest-sample slot
pub struct SampleIngestor {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    counters: Arc<IngestCounters>,
}

impl SampleIngestor {
    /// Spawn the ingestor thread
    ///
    /// `shutdown` is normally the process-wide flag so a signal stops
    /// ingestion together with everything else.
    pub fn start<T>(
        transport: T,
        slot: SampleSlot,
        retry_interval: Duration,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self>
    where
        T: Transport + 'static,
    {
        let counters = Arc::new(IngestCounters::default());
        let thread_shutdown = Arc::clone(&shutdown);
        let thread_counters = Arc::clone(&counters);

        let handle = thread::Builder::new()
            .name("imu-ingestor".to_string())
            .spawn(move || {
                reader_loop(
                    transport,
                    slot,
                    retry_interval,
                    thread_shutdown,
                    thread_counters,
                );
            })
            .map_err(|e| Error::Other(format!("Failed to spawn ingestor thread: {}", e)))?;

        log::info!("IMU ingestor started");
        Ok(Self {
            shutdown,
            handle: Some(handle),
            counters,
        })
    }

    /// Current ingestion counters
    pub fn stats(&self) -> IngestStats {
        self.counters.snapshot()
    }

    /// Whether the reader thread is still alive
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Raise the shutdown flag and wait for the thread to exit
    pub fn stop(&mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::Relaxed);

        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| Error::Other("IMU ingestor thread panicked".to_string()))?;
            let stats = self.stats();
            log::info!(
                "IMU ingestor stopped: {} accepted, {} rejected, {} read errors",
                stats.accepted,
                stats.rejected,
                stats.read_errors
            );
        }
        Ok(())
    }
}

impl Drop for SampleIngestor {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Reader loop - reads lines and publishes samples until shutdown
fn reader_loop<T: Transport>(
    mut transport: T,
    slot: SampleSlot,
    retry_interval: Duration,
    shutdown: Arc<AtomicBool>,
    counters: Arc<IngestCounters>,
) {
    let mut lines = LineReader::new();
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    let mut consecutive_errors: u64 = 0;

    while !shutdown.load(Ordering::Relaxed) {
        if !transport.is_open() {
            if let Err(e) = transport.reconnect() {
                counters.read_errors.fetch_add(1, Ordering::Relaxed);
                log_stream_error(&mut consecutive_errors, &e);
                thread::sleep(retry_interval);
                continue;
            }
        }

        match transport.read(&mut buffer) {
            Ok(0) => {
                // Read timeout, nothing arrived
            }
            Ok(n) => {
                if consecutive_errors > 0 {
                    log::info!("IMU stream recovered after {} errors", consecutive_errors);
                    consecutive_errors = 0;
                }
                lines.feed(&buffer[..n], |line| match parse_line(line) {
                    Some(sample) => {
                        slot.publish(sample);
                        let count = counters.accepted.fetch_add(1, Ordering::Relaxed) + 1;
                        if count % 1000 == 0 {
                            log::debug!(
                                "IMU: {} samples, {} rejected lines",
                                count,
                                counters.rejected.load(Ordering::Relaxed)
                            );
                        }
                    }
                    None => {
                        counters.rejected.fetch_add(1, Ordering::Relaxed);
                        log::trace!("Ignoring line: {:?}", line);
                    }
                });
            }
            Err(e) => {
                counters.read_errors.fetch_add(1, Ordering::Relaxed);
                log_stream_error(&mut consecutive_errors, &e);
                thread::sleep(retry_interval);
            }
        }
    }

    log::info!("IMU ingestor thread exiting");
}

/// Warn on the first failure of a streak, then only every 50th
fn log_stream_error(consecutive_errors: &mut u64, e: &Error) {
    *consecutive_errors += 1;
    if *consecutive_errors == 1 {
        log::warn!("IMU stream unavailable: {} (retrying)", e);
    } else if *consecutive_errors % 50 == 0 {
        log::warn!("IMU stream still unavailable after {} attempts: {}", consecutive_errors, e);
    } else {
        log::debug!("IMU stream error: {}", e);
    }
}
