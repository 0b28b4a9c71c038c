//! Gravity-based axis inference.
//!
//! With the robot resting in each of the six canonical poses, the mean
//! accelerometer reading is the gravity reaction vector in raw sensor axes.
//! Three of those means are enough to pin down the raw→body mapping:
//!
//! 1. `flat`: the raw axis with the largest magnitude is body Z
//! 2. `front`: with Z excluded, the largest raw axis is body X
//! 3. the raw axis left over is body Y; its sign comes from `left`
//!
//! An axis whose raw reading is negative in the pose where the body axis
//! points up gets its invert flag set. The other three poses are kept for
//! the diagnostic block of the artifact.
//!
//! Selection is first-maximum-wins in raw index order. When the runner-up is
//! close to the winner the pick is reported as an [`Ambiguity`] rather than
//! silently trusted.

use super::store::{CalibrationStore, PoseCounts};
use crate::core::types::{PoseName, Sample, Vector3};
use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Raw→logical axis mapping in the form the robot firmware consumes
///
/// `logical[i] = raw[permutation[i]]`, negated when `invert[i]` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AxisMapping {
    /// Raw axis index feeding logical X, Y, Z
    pub permutation: [usize; 3],
    /// Whether logical X, Y, Z negate their raw axis
    pub invert: [bool; 3],
}

impl AxisMapping {
    /// Raw axes used as-is
    pub const IDENTITY: AxisMapping = AxisMapping {
        permutation: [0, 1, 2],
        invert: [false, false, false],
    };

    /// Map a raw vector into the logical body frame
    pub fn apply(&self, raw: Vector3) -> Vector3 {
        let mut logical = [0.0; 3];
        for (i, value) in logical.iter_mut().enumerate() {
            let v = raw[self.permutation[i]];
            *value = if self.invert[i] { -v } else { v };
        }
        logical
    }

    /// Map both accel and gyro of a raw sample
    pub fn apply_sample(&self, sample: &Sample) -> Sample {
        Sample::new(self.apply(sample.accel), self.apply(sample.gyro))
    }

    /// Whether `permutation` uses each raw axis exactly once
    pub fn is_bijection(&self) -> bool {
        let mut seen = [false; 3];
        for &axis in &self.permutation {
            if axis > 2 || seen[axis] {
                return false;
            }
            seen[axis] = true;
        }
        true
    }
}

impl Default for AxisMapping {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Mean accelerometer vector of each pose dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoseMeans {
    pub flat: Vector3,
    pub front: Vector3,
    pub back: Vector3,
    pub left: Vector3,
    pub right: Vector3,
    pub upside: Vector3,
}

impl PoseMeans {
    /// Build from vectors listed in canonical pose order
    pub fn from_array(means: [Vector3; 6]) -> Self {
        Self {
            flat: means[0],
            front: means[1],
            back: means[2],
            left: means[3],
            right: means[4],
            upside: means[5],
        }
    }

    pub fn get(&self, pose: PoseName) -> Vector3 {
        match pose {
            PoseName::Flat => self.flat,
            PoseName::FrontUp => self.front,
            PoseName::BackUp => self.back,
            PoseName::LeftUp => self.left,
            PoseName::RightUp => self.right,
            PoseName::UpsideDown => self.upside,
        }
    }
}

/// Which inference step an ambiguity came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceStep {
    /// Picking body Z from the `flat` mean
    ZAxis,
    /// Picking body X from the `front` mean
    XAxis,
}

/// A near-tie between the two strongest candidate raw axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ambiguity {
    pub step: InferenceStep,
    pub pose: PoseName,
    /// Raw axis that was chosen
    pub winner: usize,
    /// Strongest raw axis that was not chosen
    pub runner_up: usize,
    /// |runner_up| / |winner|, 1.0 for an exact tie
    pub ratio: f64,
}

impl fmt::Display for Ambiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = match self.step {
            InferenceStep::ZAxis => "Z",
            InferenceStep::XAxis => "X",
        };
        write!(
            f,
            "ambiguous {} axis in '{}' pose: raw {} chosen over raw {} (ratio {:.2})",
            axis, self.pose, self.winner, self.runner_up, self.ratio
        )
    }
}

/// Output of one calibration run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationResult {
    pub mapping: AxisMapping,
    pub means: PoseMeans,
    /// Number of samples averaged per pose
    pub sample_counts: PoseCounts,
    /// Axis picks that were close calls
    pub ambiguities: Vec<Ambiguity>,
}

impl CalibrationResult {
    /// Raw axis indices for logical (X, Y, Z)
    pub fn axis_permutation(&self) -> (usize, usize, usize) {
        let [x, y, z] = self.mapping.permutation;
        (x, y, z)
    }

    /// Invert flags for logical (X, Y, Z)
    pub fn sign_invert(&self) -> (bool, bool, bool) {
        let [x, y, z] = self.mapping.invert;
        (x, y, z)
    }

    pub fn is_ambiguous(&self) -> bool {
        !self.ambiguities.is_empty()
    }
}

/// Infers the axis mapping from the calibration store
#[derive(Debug, Clone)]
pub struct AxisMapper {
    ambiguity_ratio: f64,
}

impl AxisMapper {
    /// `ambiguity_ratio`: runner-up / winner magnitude ratio at or above
    /// which a pick is flagged
    pub fn new(ambiguity_ratio: f64) -> Self {
        Self { ambiguity_ratio }
    }

    /// Compute a fresh result from the current datasets
    ///
    /// # Errors
    /// [`Error::MissingPoseData`] naming the first pose without samples.
    pub fn compute(&self, store: &CalibrationStore) -> Result<CalibrationResult> {
        let datasets = store.snapshot();
        if let Some(pose) = PoseName::ALL
            .into_iter()
            .find(|pose| datasets[pose.index()].is_empty())
        {
            return Err(Error::MissingPoseData(pose));
        }

        let means = PoseMeans::from_array(datasets.each_ref().map(|d| mean_accel(d)));
        let sample_counts = PoseName::ALL
            .iter()
            .map(|&pose| (pose, datasets[pose.index()].len()))
            .collect();

        for pose in PoseName::ALL {
            let m = means.get(pose);
            log::info!(
                "{:8}: X={:6.2}, Y={:6.2}, Z={:6.2}",
                pose.label(),
                m[0],
                m[1],
                m[2]
            );
        }

        let (mapping, ambiguities) = self.infer(&means);
        for ambiguity in &ambiguities {
            log::warn!("{}", ambiguity);
        }
        log::info!(
            "Axis mapping: permutation={:?} invert={:?}",
            mapping.permutation,
            mapping.invert
        );

        Ok(CalibrationResult {
            mapping,
            means,
            sample_counts,
            ambiguities,
        })
    }

    /// Infer the mapping from per-pose means
    pub fn infer(&self, means: &PoseMeans) -> (AxisMapping, Vec<Ambiguity>) {
        let mut ambiguities = Vec::new();

        let z = self.pick_axis(
            InferenceStep::ZAxis,
            PoseName::Flat,
            &means.flat,
            None,
            &mut ambiguities,
        );
        let x = self.pick_axis(
            InferenceStep::XAxis,
            PoseName::FrontUp,
            &means.front,
            Some(z),
            &mut ambiguities,
        );
        // Indices are 0, 1, 2: the remaining one is whatever completes the sum
        let y = 3 - x - z;

        let mapping = AxisMapping {
            permutation: [x, y, z],
            invert: [means.front[x] < 0.0, means.left[y] < 0.0, means.flat[z] < 0.0],
        };
        (mapping, ambiguities)
    }

    /// Largest-magnitude raw axis of `v`, skipping `excluded`
    fn pick_axis(
        &self,
        step: InferenceStep,
        pose: PoseName,
        v: &Vector3,
        excluded: Option<usize>,
        ambiguities: &mut Vec<Ambiguity>,
    ) -> usize {
        let mut candidates: Vec<usize> = (0..3).filter(|&i| Some(i) != excluded).collect();
        // Stable sort keeps index order among equal magnitudes: first maximum wins
        candidates.sort_by(|&a, &b| v[b].abs().total_cmp(&v[a].abs()));

        let winner = candidates[0];
        let runner_up = candidates[1];
        let top = v[winner].abs();
        let ratio = if top > 0.0 { v[runner_up].abs() / top } else { 1.0 };

        if ratio >= self.ambiguity_ratio {
            ambiguities.push(Ambiguity {
                step,
                pose,
                winner,
                runner_up,
                ratio,
            });
        }
        winner
    }
}

/// Arithmetic mean of the accel vectors (zero for an empty slice)
pub fn mean_accel(samples: &[Sample]) -> Vector3 {
    if samples.is_empty() {
        return [0.0; 3];
    }
    let mut sum = [0.0; 3];
    for sample in samples {
        for axis in 0..3 {
            sum[axis] += sample.accel[axis];
        }
    }
    let n = samples.len() as f64;
    sum.map(|s| s / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const G: f64 = 9.8;

    fn canonical() -> PoseMeans {
        PoseMeans {
            flat: [0.0, 0.0, G],
            front: [G, 0.0, 0.0],
            back: [-G, 0.0, 0.0],
            left: [0.0, G, 0.0],
            right: [0.0, -G, 0.0],
            upside: [0.0, 0.0, -G],
        }
    }

    fn negate(v: Vector3) -> Vector3 {
        v.map(|x| -x)
    }

    /// Means a sensor mounted with `mapping` would read in each pose
    fn means_for_mount(mapping: &AxisMapping) -> PoseMeans {
        let raw = |pose: PoseName| {
            let logical = pose.gravity_reading(G);
            let mut raw = [0.0; 3];
            for i in 0..3 {
                let sign = if mapping.invert[i] { -1.0 } else { 1.0 };
                raw[mapping.permutation[i]] = logical[i] * sign;
            }
            raw
        };
        PoseMeans::from_array(PoseName::ALL.map(raw))
    }

    #[test]
    fn test_canonical_poses_give_identity() {
        let (mapping, ambiguities) = AxisMapper::new(0.8).infer(&canonical());
        assert_eq!(mapping, AxisMapping::IDENTITY);
        assert!(ambiguities.is_empty());
    }

    #[test]
    fn test_negated_poses_invert_every_axis() {
        let c = canonical();
        let means = PoseMeans {
            flat: negate(c.flat),
            front: negate(c.front),
            back: negate(c.back),
            left: negate(c.left),
            right: negate(c.right),
            upside: negate(c.upside),
        };
        let (mapping, _) = AxisMapper::new(0.8).infer(&means);
        assert_eq!(mapping.permutation, [0, 1, 2]);
        assert_eq!(mapping.invert, [true, true, true]);
    }

    #[test]
    fn test_rotated_sensor() {
        let means = PoseMeans {
            flat: [0.0, G, 0.0],
            front: [G, 0.0, 0.0],
            back: [-G, 0.0, 0.0],
            left: [0.0, 0.0, G],
            right: [0.0, 0.0, -G],
            upside: [0.0, -G, 0.0],
        };
        let (mapping, _) = AxisMapper::new(0.8).infer(&means);
        assert_eq!(mapping.permutation, [0, 2, 1]);
        assert_eq!(mapping.invert, [false, false, false]);
    }

    #[test]
    fn test_recovers_every_mount() {
        let permutations = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        let mapper = AxisMapper::new(0.8);
        for permutation in permutations {
            for bits in 0..8u8 {
                let mount = AxisMapping {
                    permutation,
                    invert: [bits & 1 != 0, bits & 2 != 0, bits & 4 != 0],
                };
                let (mapping, ambiguities) = mapper.infer(&means_for_mount(&mount));
                assert_eq!(mapping, mount);
                assert!(ambiguities.is_empty());
            }
        }
    }

    #[test]
    fn test_apply_puts_gravity_on_logical_axes() {
        let mount = AxisMapping {
            permutation: [2, 0, 1],
            invert: [true, false, true],
        };
        let means = means_for_mount(&mount);
        let (mapping, _) = AxisMapper::new(0.8).infer(&means);

        let flat = mapping.apply(means.flat);
        assert_relative_eq!(flat[2], G);
        let front = mapping.apply(means.front);
        assert_relative_eq!(front[0], G);
        let left = mapping.apply(means.left);
        assert_relative_eq!(left[1], G);
    }

    #[test]
    fn test_apply_sample_maps_gyro_too() {
        let mapping = AxisMapping {
            permutation: [1, 0, 2],
            invert: [true, false, false],
        };
        let sample = Sample::new([1.0, 2.0, 3.0], [0.1, 0.2, 0.3]);
        let mapped = mapping.apply_sample(&sample);
        assert_eq!(mapped.accel, [-2.0, 1.0, 3.0]);
        assert_eq!(mapped.gyro, [-0.2, 0.1, 0.3]);
    }

    #[test]
    fn test_near_tie_is_flagged_but_first_wins() {
        let mut means = canonical();
        means.flat = [6.9, 0.0, 6.9];
        let (mapping, ambiguities) = AxisMapper::new(0.8).infer(&means);

        assert_eq!(mapping.permutation[2], 0);
        assert!(mapping.is_bijection());
        assert_eq!(ambiguities.len(), 2);
        assert_eq!(ambiguities[0].step, InferenceStep::ZAxis);
        assert_eq!(ambiguities[0].winner, 0);
        assert_eq!(ambiguities[0].runner_up, 2);
        assert_relative_eq!(ambiguities[0].ratio, 1.0);
    }

    #[test]
    fn test_all_zero_front_stays_bijective() {
        let mut means = canonical();
        means.front = [0.0, 0.0, 0.0];
        let (mapping, ambiguities) = AxisMapper::new(0.8).infer(&means);

        assert!(mapping.is_bijection());
        assert_eq!(mapping.permutation, [0, 1, 2]);
        assert!(ambiguities.iter().any(|a| a.step == InferenceStep::XAxis));
    }

    #[test]
    fn test_compute_requires_every_pose() {
        let store = CalibrationStore::new();
        for pose in PoseName::ALL.into_iter().filter(|&p| p != PoseName::BackUp) {
            store.replace(pose, vec![Sample::new(pose.gravity_reading(G), [0.0; 3]); 10]);
        }

        let err = AxisMapper::new(0.8).compute(&store).unwrap_err();
        assert!(matches!(err, Error::MissingPoseData(PoseName::BackUp)));
        assert_eq!(err.to_string(), "Missing data for back");
    }

    #[test]
    fn test_compute_averages_datasets() {
        let store = CalibrationStore::new();
        for pose in PoseName::ALL {
            let g = pose.gravity_reading(G);
            let mut dataset = Vec::new();
            for i in 0..20 {
                let jitter = if i % 2 == 0 { 0.1 } else { -0.1 };
                dataset.push(Sample::new(g.map(|v| v + jitter), [0.0; 3]));
            }
            store.replace(pose, dataset);
        }

        let result = AxisMapper::new(0.8).compute(&store).unwrap();
        assert_eq!(result.axis_permutation(), (0, 1, 2));
        assert_eq!(result.sign_invert(), (false, false, false));
        assert_relative_eq!(result.means.flat[2], G, epsilon = 1e-9);
        assert_relative_eq!(result.means.back[0], -G, epsilon = 1e-9);
        assert_eq!(result.sample_counts[&PoseName::RightUp], 20);
        assert!(!result.is_ambiguous());
    }

    #[test]
    fn test_mean_accel() {
        let samples = [
            Sample::new([1.0, 2.0, 3.0], [9.0; 3]),
            Sample::new([3.0, 4.0, 5.0], [9.0; 3]),
        ];
        assert_eq!(mean_accel(&samples), [2.0, 3.0, 4.0]);
        assert_eq!(mean_accel(&[]), [0.0; 3]);
    }
}
