//! Configuration for the Disha calibration tool
//!
//! Loads configuration from a TOML file. Every field has a default, so a
//! missing section (or an empty file) yields the stock setup: IMU on
//! `/dev/ttyS0` at 115200 baud, 2 s collection windows polled every 50 ms.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Smallest dataset a pose may be accepted with
pub const MIN_SAMPLES_FLOOR: usize = 10;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Serial link to the IMU board
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HardwareConfig {
    /// Serial port carrying `IMU,...` lines
    #[serde(default = "default_port")]
    pub port: String,

    /// Baud rate (8N1, no flow control)
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Blocking read timeout for the serial port
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Idle sleep before retrying an unavailable or failing stream
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

/// Acquisition window parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectionConfig {
    /// Length of one acquisition window
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Interval between snapshots of the latest sample
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Smallest dataset accepted for a pose
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

/// Axis inference parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MappingConfig {
    /// Runner-up / winner magnitude ratio at or above which an axis pick is flagged
    #[serde(default = "default_ambiguity_ratio")]
    pub ambiguity_ratio: f64,
}

/// Where the calibration artifact goes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Simulated IMU used with `--simulate`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Line output rate
    #[serde(default = "default_rate_hz")]
    pub rate_hz: f64,

    /// Gravity magnitude (m/s²)
    #[serde(default = "default_gravity")]
    pub gravity: f64,

    /// Accelerometer noise standard deviation (m/s²)
    #[serde(default = "default_accel_noise")]
    pub accel_noise: f64,

    /// Gyroscope noise standard deviation (rad/s)
    #[serde(default = "default_gyro_noise")]
    pub gyro_noise: f64,

    /// Noise seed (0 = random entropy)
    #[serde(default)]
    pub seed: u64,

    /// Axis mapping the simulated mount should calibrate to
    #[serde(default = "default_mount_permutation")]
    pub mount_permutation: [usize; 3],

    #[serde(default)]
    pub mount_invert: [bool; 3],
}

impl HardwareConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl CollectionConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Upper bound on samples one window can capture
    pub fn max_samples(&self) -> usize {
        (self.window_ms / self.poll_interval_ms.max(1)) as usize + 1
    }

    /// Validate the window parameters
    pub fn validate(&self) -> Result<()> {
        if self.min_samples < MIN_SAMPLES_FLOOR {
            return Err(Error::InvalidConfig(format!(
                "collection.min_samples must be >= {}, got {}",
                MIN_SAMPLES_FLOOR, self.min_samples
            )));
        }

        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "collection.poll_interval_ms must be > 0".to_string(),
            ));
        }

        if self.max_samples() < self.min_samples {
            return Err(Error::InvalidConfig(format!(
                "collection window of {} ms polled every {} ms can never reach {} samples",
                self.window_ms, self.poll_interval_ms, self.min_samples
            )));
        }

        Ok(())
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            retry_interval_ms: default_retry_interval_ms(),
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            min_samples: default_min_samples(),
        }
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            ambiguity_ratio: default_ambiguity_ratio(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
            gravity: default_gravity(),
            accel_noise: default_accel_noise(),
            gyro_noise: default_gyro_noise(),
            seed: 0,
            mount_permutation: default_mount_permutation(),
            mount_invert: [false; 3],
        }
    }
}

// Default value functions
fn default_port() -> String {
    "/dev/ttyS0".to_string()
}
fn default_baud_rate() -> u32 {
    115200
}
fn default_read_timeout_ms() -> u64 {
    100
}
fn default_retry_interval_ms() -> u64 {
    100
}
fn default_window_ms() -> u64 {
    2000
}
fn default_poll_interval_ms() -> u64 {
    50
}
fn default_min_samples() -> usize {
    10
}
fn default_ambiguity_ratio() -> f64 {
    0.8
}
fn default_artifact_path() -> PathBuf {
    PathBuf::from("/tmp/imu_calibration.txt")
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_rate_hz() -> f64 {
    20.0
}
fn default_gravity() -> f64 {
    9.80665
}
fn default_accel_noise() -> f64 {
    0.05
}
fn default_gyro_noise() -> f64 {
    0.01
}
fn default_mount_permutation() -> [usize; 3] {
    [0, 1, 2]
}

impl AppConfig {
    /// Load configuration from TOML file
    ///
    /// # Example
    /// ```no_run
    /// use disha::config::AppConfig;
    ///
    /// let config = AppConfig::from_file("disha.toml")?;
    /// # Ok::<(), disha::Error>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the collection and mapping stages cannot work with
    pub fn validate(&self) -> Result<()> {
        self.collection.validate()?;

        if !(0.0..=1.0).contains(&self.mapping.ambiguity_ratio) {
            return Err(Error::InvalidConfig(format!(
                "mapping.ambiguity_ratio must be within [0, 1], got {}",
                self.mapping.ambiguity_ratio
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.hardware.port, "/dev/ttyS0");
        assert_eq!(config.hardware.baud_rate, 115200);
        assert_eq!(config.collection.window(), Duration::from_secs(2));
        assert_eq!(config.collection.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.collection.min_samples, 10);
        assert_eq!(
            config.output.artifact_path,
            PathBuf::from("/tmp/imu_calibration.txt")
        );
    }

    #[test]
    fn test_max_samples_per_window() {
        let config = CollectionConfig::default();
        assert_eq!(config.max_samples(), 41);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.hardware.retry_interval_ms, 100);
        assert_eq!(config.mapping.ambiguity_ratio, 0.8);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.simulation.mount_permutation, [0, 1, 2]);
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[hardware]
port = "/dev/ttyUSB0"
baud_rate = 230400

[collection]
window_ms = 3000

[output]
artifact_path = "out/imu.txt"

[simulation]
mount_permutation = [2, 0, 1]
mount_invert = [false, true, false]
"#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.hardware.port, "/dev/ttyUSB0");
        assert_eq!(config.hardware.baud_rate, 230400);
        assert_eq!(config.hardware.read_timeout_ms, 100);
        assert_eq!(config.collection.window_ms, 3000);
        assert_eq!(config.collection.poll_interval_ms, 50);
        assert_eq!(config.output.artifact_path, PathBuf::from("out/imu.txt"));
        assert_eq!(config.simulation.mount_permutation, [2, 0, 1]);
        assert_eq!(config.simulation.mount_invert, [false, true, false]);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.collection.min_samples, 10);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[collection]\nwindow_ms = \"long\"").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, crate::error::Error::Config(_)));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_threshold_below_floor() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[collection]\nmin_samples = 0").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let config = CollectionConfig {
            min_samples: 9,
            ..CollectionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_poll_interval() {
        let config = CollectionConfig {
            poll_interval_ms: 0,
            ..CollectionConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_window_too_short_for_threshold() {
        // 100 ms / 50 ms polls captures at most 3 samples
        let config = CollectionConfig {
            window_ms: 100,
            ..CollectionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_ambiguity_ratio_out_of_range() {
        let mut config = AppConfig::default();
        config.mapping.ambiguity_ratio = 1.5;
        assert!(config.validate().is_err());
    }
}
