//! Per-pose dataset table.

use crate::core::types::{PoseName, Sample};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Sample counts keyed by pose, in canonical pose order
pub type PoseCounts = BTreeMap<PoseName, usize>;

/// One dataset slot per calibration pose, all empty at start
///
/// Datasets are only ever replaced wholesale; there is no append path.
#[derive(Debug, Default)]
pub struct CalibrationStore {
    datasets: RwLock<[Vec<Sample>; 6]>,
}

impl CalibrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of samples currently held for `pose`
    pub fn count(&self, pose: PoseName) -> usize {
        self.datasets.read()[pose.index()].len()
    }

    /// Sample count for every pose
    pub fn counts(&self) -> PoseCounts {
        let datasets = self.datasets.read();
        PoseName::ALL
            .iter()
            .map(|&pose| (pose, datasets[pose.index()].len()))
            .collect()
    }

    /// First pose (canonical order) with no data
    pub fn first_missing(&self) -> Option<PoseName> {
        let datasets = self.datasets.read();
        PoseName::ALL
            .into_iter()
            .find(|pose| datasets[pose.index()].is_empty())
    }

    /// Whether every pose has data
    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }

    /// Drop the dataset for one pose
    pub fn clear(&self, pose: PoseName) {
        self.datasets.write()[pose.index()].clear();
    }

    /// Drop every dataset
    pub fn clear_all(&self) {
        self.datasets.write().iter_mut().for_each(Vec::clear);
    }

    /// Install a new dataset for `pose`, discarding the previous one
    pub(crate) fn replace(&self, pose: PoseName, dataset: Vec<Sample>) {
        self.datasets.write()[pose.index()] = dataset;
    }

    /// Copy of all six datasets, indexed by [`PoseName::index`]
    pub(crate) fn snapshot(&self) -> [Vec<Sample>; 6] {
        self.datasets.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(n: usize, z: f64) -> Vec<Sample> {
        vec![Sample::new([0.0, 0.0, z], [0.0; 3]); n]
    }

    #[test]
    fn test_starts_empty() {
        let store = CalibrationStore::new();
        let counts = store.counts();
        assert_eq!(counts.len(), 6);
        assert!(counts.values().all(|&c| c == 0));
        assert_eq!(store.first_missing(), Some(PoseName::Flat));
        assert!(!store.is_complete());
    }

    #[test]
    fn test_replace_is_wholesale() {
        let store = CalibrationStore::new();
        store.replace(PoseName::LeftUp, dataset(40, 1.0));
        store.replace(PoseName::LeftUp, dataset(12, 2.0));

        assert_eq!(store.count(PoseName::LeftUp), 12);
        let snapshot = store.snapshot();
        assert!(snapshot[PoseName::LeftUp.index()].iter().all(|s| s.accel[2] == 2.0));
    }

    #[test]
    fn test_replace_leaves_other_poses_alone() {
        let store = CalibrationStore::new();
        store.replace(PoseName::Flat, dataset(30, 9.8));
        store.replace(PoseName::BackUp, dataset(20, 0.0));

        let counts = store.counts();
        assert_eq!(counts[&PoseName::Flat], 30);
        assert_eq!(counts[&PoseName::BackUp], 20);
        assert_eq!(counts[&PoseName::FrontUp], 0);
        assert_eq!(store.first_missing(), Some(PoseName::FrontUp));
    }

    #[test]
    fn test_first_missing_follows_canonical_order() {
        let store = CalibrationStore::new();
        for pose in PoseName::ALL {
            if pose != PoseName::BackUp && pose != PoseName::UpsideDown {
                store.replace(pose, dataset(10, 0.0));
            }
        }
        assert_eq!(store.first_missing(), Some(PoseName::BackUp));

        store.replace(PoseName::BackUp, dataset(10, 0.0));
        assert_eq!(store.first_missing(), Some(PoseName::UpsideDown));

        store.replace(PoseName::UpsideDown, dataset(10, 0.0));
        assert!(store.is_complete());
    }

    #[test]
    fn test_clear() {
        let store = CalibrationStore::new();
        for pose in PoseName::ALL {
            store.replace(pose, dataset(10, 0.0));
        }

        store.clear(PoseName::RightUp);
        assert_eq!(store.count(PoseName::RightUp), 0);
        assert_eq!(store.count(PoseName::LeftUp), 10);

        store.clear_all();
        assert!(store.counts().values().all(|&c| c == 0));
    }

    #[test]
    fn test_counts_serialize_with_pose_labels() {
        let store = CalibrationStore::new();
        store.replace(PoseName::UpsideDown, dataset(11, -9.8));

        let json = serde_json::to_value(store.counts()).unwrap();
        assert_eq!(json["upside"], 11);
        assert_eq!(json["flat"], 0);
    }
}
