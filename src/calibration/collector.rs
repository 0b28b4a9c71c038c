//! Timed acquisition windows.
//!
//! A collection polls the latest-sample slot at a fixed interval for a fixed
//! window and, if it captured enough samples, installs them as the pose's new
//! dataset. The caller blocks for the whole window.
//!
//! Only one window runs at a time: a global collection lock is held for the
//! full window, so a second request queues behind the first instead of
//! interleaving its polls with it.

use super::store::CalibrationStore;
use crate::config::{CollectionConfig, MIN_SAMPLES_FLOOR};
use crate::core::types::{PoseName, Sample};
use crate::error::{Error, Result};
use crate::imu::SampleSlot;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

/// Runs acquisition windows against the shared slot
pub struct PoseCollector {
    slot: SampleSlot,
    store: Arc<CalibrationStore>,
    config: CollectionConfig,
    window_lock: Mutex<()>,
    collecting: AtomicBool,
}

impl PoseCollector {
    /// Create a collector; `min_samples` is raised to the floor and a zero
    /// poll interval to 1 ms
    pub fn new(slot: SampleSlot, store: Arc<CalibrationStore>, mut config: CollectionConfig) -> Self {
        if config.min_samples < MIN_SAMPLES_FLOOR {
            log::warn!(
                "collection.min_samples {} below floor, using {}",
                config.min_samples,
                MIN_SAMPLES_FLOOR
            );
            config.min_samples = MIN_SAMPLES_FLOOR;
        }
        config.poll_interval_ms = config.poll_interval_ms.max(1);

        Self {
            slot,
            store,
            config,
            window_lock: Mutex::new(()),
            collecting: AtomicBool::new(false),
        }
    }

    /// Collect a dataset for `pose`
    ///
    /// Blocks for the configured window (plus any time spent waiting for a
    /// collection already in progress). Returns the number of samples stored.
    ///
    /// # Errors
    /// [`Error::InsufficientData`] if fewer than `min_samples` were captured;
    /// the pose's previous dataset is kept in that case.
    pub fn collect(&self, pose: PoseName) -> Result<usize> {
        let _window = self.window_lock.lock();
        self.collecting.store(true, Ordering::Release);

        log::info!(
            "Collecting '{}' for {:?} (poll every {:?})",
            pose,
            self.config.window(),
            self.config.poll_interval()
        );
        let samples = self.acquire();
        self.collecting.store(false, Ordering::Release);

        let collected = samples.len();
        if collected < self.config.min_samples {
            log::warn!(
                "Collection for '{}' captured only {} samples (need {}), keeping previous data",
                pose,
                collected,
                self.config.min_samples
            );
            return Err(Error::InsufficientData {
                pose,
                required: self.config.min_samples,
                collected,
            });
        }

        self.store.replace(pose, samples);
        log::info!("Stored {} samples for '{}'", collected, pose);
        Ok(collected)
    }

    /// Whether a window is currently running
    pub fn is_collecting(&self) -> bool {
        self.collecting.load(Ordering::Acquire)
    }

    /// Window configuration in use
    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// Poll the slot until the window elapses
    fn acquire(&self) -> Vec<Sample> {
        let window = self.config.window();
        let poll_interval = self.config.poll_interval();
        let mut samples = Vec::with_capacity(self.config.max_samples());

        let start = Instant::now();
        while start.elapsed() < window {
            if let Some(sample) = self.slot.latest() {
                samples.push(sample);
            }
            thread::sleep(poll_interval);
        }

        log::debug!(
            "Acquisition window closed after {:?} with {} samples",
            start.elapsed(),
            samples.len()
        );
        samples
    }
}
