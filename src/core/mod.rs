//! Core data types shared by every stage of the calibration pipeline.
//!
//! - [`types::Sample`]: one accel + gyro reading from the IMU line protocol
//! - [`types::PoseName`]: the six canonical calibration poses

pub mod types;
