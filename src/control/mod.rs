//! Control surface: the calibration service and the operator console on top.

pub mod commands;
pub mod service;

pub use commands::{Command, Console};
pub use service::{CalibrationReport, CalibrationService, CollectionOutcome, StatusReport};
