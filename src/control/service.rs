//! Calibration control surface.
//!
//! The operations an operator front end drives: collect a pose, show
//! progress, compute the mapping, peek at the live sample. Every operation
//! returns a `Result`; the console turns errors into failure replies, so
//! nothing here can take down the ingestor or corrupt the store.

use crate::calibration::{
    AxisMapper, CalibrationResult, CalibrationStore, PoseCollector, PoseCounts, artifact,
};
use crate::config::AppConfig;
use crate::core::types::{PoseName, Sample};
use crate::error::Result;
use crate::imu::SampleSlot;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Successful collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionOutcome {
    pub pose: PoseName,
    pub count: usize,
}

/// Progress snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub counts: PoseCounts,
    /// A collection window is running right now
    pub collecting: bool,
    /// Samples the ingestor has published since start
    pub samples_received: u64,
}

/// Successful calibration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationReport {
    pub result: CalibrationResult,
    /// Artifact text as written
    pub code: String,
    pub path: PathBuf,
}

/// Owns the store, collector and mapper behind one interface
pub struct CalibrationService {
    slot: SampleSlot,
    store: Arc<CalibrationStore>,
    collector: PoseCollector,
    mapper: AxisMapper,
    artifact_path: PathBuf,
}

impl CalibrationService {
    pub fn new(slot: SampleSlot, config: &AppConfig) -> Self {
        let store = Arc::new(CalibrationStore::new());
        let collector = PoseCollector::new(
            slot.clone(),
            Arc::clone(&store),
            config.collection.clone(),
        );
        Self {
            slot,
            store,
            collector,
            mapper: AxisMapper::new(config.mapping.ambiguity_ratio),
            artifact_path: config.output.artifact_path.clone(),
        }
    }

    /// Collect a dataset for the pose named `pose_label`
    ///
    /// Blocks for the full acquisition window. An unknown label fails
    /// before anything is sampled.
    pub fn begin_collection(&self, pose_label: &str) -> Result<CollectionOutcome> {
        let pose: PoseName = pose_label.parse()?;
        let count = self.collector.collect(pose)?;
        Ok(CollectionOutcome { pose, count })
    }

    /// Per-pose sample counts
    pub fn status(&self) -> StatusReport {
        StatusReport {
            counts: self.store.counts(),
            collecting: self.collector.is_collecting(),
            samples_received: self.slot.update_count(),
        }
    }

    /// Infer the axis mapping and persist the artifact
    pub fn compute_calibration(&self) -> Result<CalibrationReport> {
        let result = self.mapper.compute(&self.store)?;
        let code = artifact::write(&result, &self.artifact_path)?;
        Ok(CalibrationReport {
            result,
            code,
            path: self.artifact_path.clone(),
        })
    }

    /// Most recent IMU sample, if any has arrived
    pub fn latest_sample(&self) -> Option<Sample> {
        self.slot.latest()
    }

    /// Drop one pose's dataset, or all of them when `pose_label` is `None`
    pub fn reset(&self, pose_label: Option<&str>) -> Result<()> {
        match pose_label {
            Some(label) => {
                let pose: PoseName = label.parse()?;
                self.store.clear(pose);
                log::info!("Cleared data for '{}'", pose);
            }
            None => {
                self.store.clear_all();
                log::info!("Cleared all calibration data");
            }
        }
        Ok(())
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    pub fn store(&self) -> &CalibrationStore {
        &self.store
    }
}
