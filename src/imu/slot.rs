//! Latest-sample slot shared between the ingestor and its readers.
//!
//! One writer (the ingestor thread) overwrites the slot at line rate; any
//! number of readers take copies. The lock is held only for the copy in or
//! out, never across a sleep or an I/O call.

use crate::core::types::Sample;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cloneable handle to the most recent IMU sample
#[derive(Clone, Default)]
pub struct SampleSlot {
    inner: Arc<SlotInner>,
}

#[derive(Default)]
struct SlotInner {
    latest: Mutex<Option<Sample>>,
    updates: AtomicU64,
}

impl SampleSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the latest sample
    #[inline]
    pub fn publish(&self, sample: Sample) {
        *self.inner.latest.lock() = Some(sample);
        self.inner.updates.fetch_add(1, Ordering::Release);
    }

    /// Copy of the latest sample, `None` until the first one arrives
    #[inline]
    pub fn latest(&self) -> Option<Sample> {
        *self.inner.latest.lock()
    }

    /// Total number of samples ever published
    pub fn update_count(&self) -> u64 {
        self.inner.updates.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for SampleSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleSlot")
            .field("latest", &self.latest())
            .field("updates", &self.update_count())
            .finish()
    }
}
