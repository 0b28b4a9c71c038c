//! Calibration artifact for the robot firmware.
//!
//! The firmware takes its IMU axis mapping as a single call,
//! `imu.setAxisMapping(x, y, z, x_invert, y_invert, z_invert)`. The artifact is
//! that line preceded by a comment block with the per-pose means so a bad
//! calibration can be spotted by eye.

use super::mapper::CalibrationResult;
use crate::core::types::PoseName;
use crate::error::Result;
use std::fs;
use std::path::Path;

/// Render the configuration line alone
pub fn mapping_call(result: &CalibrationResult) -> String {
    let (x, y, z) = result.axis_permutation();
    let (xi, yi, zi) = result.sign_invert();
    format!("imu.setAxisMapping({x}, {y}, {z}, {xi}, {yi}, {zi});")
}

/// Render the full artifact text
pub fn render(result: &CalibrationResult) -> String {
    let mut out = String::new();
    out.push_str("// IMU axis calibration result\n");
    out.push_str("// Mean acceleration per pose (m/s^2):\n");
    for pose in PoseName::ALL {
        let m = result.means.get(pose);
        let label = format!("{}:", pose.label());
        out.push_str(&format!(
            "//   {:<8}X={:6.2}, Y={:6.2}, Z={:6.2}\n",
            label, m[0], m[1], m[2]
        ));
    }
    for ambiguity in &result.ambiguities {
        out.push_str(&format!("// WARNING: {}\n", ambiguity));
    }
    out.push('\n');
    out.push_str("// Apply in the robot IMU setup:\n");
    out.push_str(&mapping_call(result));
    out.push('\n');
    out
}

/// Write the artifact to `path`, replacing any previous one
///
/// Returns the rendered text.
pub fn write(result: &CalibrationResult, path: &Path) -> Result<String> {
    let text = render(result);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &text)?;
    log::info!("Calibration written to {}", path.display());
    Ok(text)
}
