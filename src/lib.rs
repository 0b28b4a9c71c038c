//! Disha - IMU axis-mapping calibration for a robot body
//!
//! Works out which raw accelerometer axis is the robot's forward, left and
//! up, and with which sign, from gravity readings taken in six canonical
//! poses.
//!
//! ## Pipeline
//!
//! - [`imu`]: ingestor thread turning `IMU,...` lines into the latest-sample slot
//! - [`calibration`]: timed pose collection, per-pose store, axis inference, artifact
//! - [`control`]: command surface and operator console
//! - [`transport`]: serial, mock and simulated byte sources

pub mod calibration;
pub mod config;
pub mod control;
pub mod core;
pub mod error;
pub mod imu;
pub mod transport;

// Re-export commonly used types
pub use config::AppConfig;
pub use core::types::{PoseName, Sample};
pub use error::{Error, Result};
