//! Simulated IMU board
//!
//! Emits `IMU,...` lines at a fixed rate for the gravity vector of whichever
//! pose the operator has "placed" the robot in. The sensor is modelled as
//! mounted with an arbitrary axis mapping, so a full six-pose calibration
//! against the simulator should recover exactly `mount_permutation` /
//! `mount_invert` from the configuration.

use super::Transport;
use crate::config::SimulationConfig;
use crate::core::types::{PoseName, Sample, Vector3};
use crate::error::{Error, Result};
use crate::imu::protocol::format_line;
use parking_lot::Mutex;
use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::StandardNormal;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Shared handle for moving the simulated robot between poses
#[derive(Clone, Debug)]
pub struct SimulationHandle {
    pose: Arc<Mutex<PoseName>>,
}

impl SimulationHandle {
    fn new(pose: PoseName) -> Self {
        Self {
            pose: Arc::new(Mutex::new(pose)),
        }
    }

    pub fn set_pose(&self, pose: PoseName) {
        *self.pose.lock() = pose;
        log::info!("Simulated robot moved to pose '{}'", pose);
    }

    pub fn pose(&self) -> PoseName {
        *self.pose.lock()
    }
}

/// Gaussian noise source with deterministic seeding support
struct NoiseGenerator {
    rng: SmallRng,
}

impl NoiseGenerator {
    /// If seed is 0, uses random entropy; otherwise results are reproducible.
    fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self { rng }
    }

    #[inline]
    fn gaussian(&mut self, stddev: f64) -> f64 {
        if stddev == 0.0 {
            return 0.0;
        }
        let n: f64 = self.rng.sample(StandardNormal);
        n * stddev
    }
}

/// Transport producing synthetic IMU lines
pub struct SimulatedImu {
    handle: SimulationHandle,
    noise: NoiseGenerator,
    gravity: f64,
    accel_noise: f64,
    gyro_noise: f64,
    permutation: [usize; 3],
    invert: [bool; 3],
    period: Duration,
    next_emit: Instant,
    pending: VecDeque<u8>,
}

impl SimulatedImu {
    /// Create a simulator resting in the `flat` pose
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        let mut seen = [false; 3];
        for &axis in &config.mount_permutation {
            if axis > 2 || seen[axis] {
                return Err(Error::Other(format!(
                    "mount_permutation {:?} is not a permutation of [0, 1, 2]",
                    config.mount_permutation
                )));
            }
            seen[axis] = true;
        }
        if config.rate_hz.is_nan() || config.rate_hz <= 0.0 {
            return Err(Error::Other(format!(
                "simulation rate must be positive, got {}",
                config.rate_hz
            )));
        }

        let period = Duration::from_secs_f64(1.0 / config.rate_hz);
        Ok(Self {
            handle: SimulationHandle::new(PoseName::Flat),
            noise: NoiseGenerator::new(config.seed),
            gravity: config.gravity,
            accel_noise: config.accel_noise,
            gyro_noise: config.gyro_noise,
            permutation: config.mount_permutation,
            invert: config.mount_invert,
            period,
            next_emit: Instant::now(),
            pending: VecDeque::with_capacity(128),
        })
    }

    /// Handle for changing the simulated pose from another thread
    pub fn handle(&self) -> SimulationHandle {
        self.handle.clone()
    }

    /// Rotate a logical body-frame vector into raw sensor order
    fn to_raw(&self, logical: Vector3) -> Vector3 {
        let mut raw = [0.0; 3];
        for i in 0..3 {
            let sign = if self.invert[i] { -1.0 } else { 1.0 };
            raw[self.permutation[i]] = logical[i] * sign;
        }
        raw
    }

    /// Generate the next reading for the current pose
    fn generate(&mut self) -> Sample {
        let logical = self.handle.pose().gravity_reading(self.gravity);
        let mut accel = self.to_raw(logical);
        let mut gyro = [0.0; 3];
        for axis in 0..3 {
            accel[axis] += self.noise.gaussian(self.accel_noise);
            gyro[axis] += self.noise.gaussian(self.gyro_noise);
        }
        Sample::new(accel, gyro)
    }
}

impl Transport for SimulatedImu {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        if self.pending.is_empty() {
            let now = Instant::now();
            if self.next_emit > now {
                thread::sleep(self.next_emit - now);
            }
            // Fell behind (e.g. reader stalled): resync instead of bursting
            let now = Instant::now();
            self.next_emit = if now.duration_since(self.next_emit) > self.period {
                now + self.period
            } else {
                self.next_emit + self.period
            };

            let sample = self.generate();
            self.pending.extend(format_line(&sample).as_bytes());
            self.pending.push_back(b'\n');
        }

        let n = self.pending.len().min(buffer.len());
        for (slot, byte) in buffer.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}
