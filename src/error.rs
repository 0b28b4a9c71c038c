//! Error types for Disha

use crate::core::types::PoseName;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Disha error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration parsed but holds an unusable value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Pose label outside the fixed set of six poses
    #[error("Invalid pose: {0}")]
    InvalidPose(String),

    /// Acquisition window captured too few samples
    #[error("Insufficient data for {pose}: need {required} samples, collected {collected}")]
    InsufficientData {
        /// Pose being collected
        pose: PoseName,
        /// Minimum accepted dataset size
        required: usize,
        /// Samples captured during the window
        collected: usize,
    },

    /// Calibration requested before every pose has data
    #[error("Missing data for {0}")]
    MissingPoseData(PoseName),

    /// Transport not open (yet)
    #[error("Transport not open")]
    NotOpen,

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
