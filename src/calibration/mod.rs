//! Six-pose calibration: dataset collection, storage, axis inference and the
//! firmware artifact.

pub mod artifact;
pub mod collector;
pub mod mapper;
pub mod store;

pub use collector::PoseCollector;
pub use mapper::{Ambiguity, AxisMapper, AxisMapping, CalibrationResult, PoseMeans};
pub use store::{CalibrationStore, PoseCounts};
