//! Sample and pose types.
//!
//! Coordinate convention for logical body axes follows ROS REP-103:
//! X = forward, Y = left, Z = up. An accelerometer at rest reads the force
//! opposing gravity, so a robot lying flat reads `(0, 0, +g)`.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Three-axis vector in raw sensor or logical body order
pub type Vector3 = [f64; 3];

/// One IMU reading: acceleration in m/s², angular rate in rad/s
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub accel: Vector3,
    pub gyro: Vector3,
}

impl Sample {
    pub fn new(accel: Vector3, gyro: Vector3) -> Self {
        Self { accel, gyro }
    }
}

/// The six canonical calibration poses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PoseName {
    /// Level on the floor, top side up
    #[serde(rename = "flat")]
    Flat,
    /// Standing on its back edge, front pointing up
    #[serde(rename = "front")]
    FrontUp,
    /// Standing on its front edge, back pointing up
    #[serde(rename = "back")]
    BackUp,
    /// Lying on its right side, left pointing up
    #[serde(rename = "left")]
    LeftUp,
    /// Lying on its left side, right pointing up
    #[serde(rename = "right")]
    RightUp,
    /// Top side down
    #[serde(rename = "upside")]
    UpsideDown,
}

impl PoseName {
    /// All poses in canonical order
    pub const ALL: [PoseName; 6] = [
        PoseName::Flat,
        PoseName::FrontUp,
        PoseName::BackUp,
        PoseName::LeftUp,
        PoseName::RightUp,
        PoseName::UpsideDown,
    ];

    /// Position in [`PoseName::ALL`]
    pub fn index(self) -> usize {
        match self {
            PoseName::Flat => 0,
            PoseName::FrontUp => 1,
            PoseName::BackUp => 2,
            PoseName::LeftUp => 3,
            PoseName::RightUp => 4,
            PoseName::UpsideDown => 5,
        }
    }

    /// Short label used on the control surface and in the artifact
    pub fn label(self) -> &'static str {
        match self {
            PoseName::Flat => "flat",
            PoseName::FrontUp => "front",
            PoseName::BackUp => "back",
            PoseName::LeftUp => "left",
            PoseName::RightUp => "right",
            PoseName::UpsideDown => "upside",
        }
    }

    /// Operator instruction shown before collecting this pose
    pub fn instruction(self) -> &'static str {
        match self {
            PoseName::Flat => "Place the robot level on the floor",
            PoseName::FrontUp => "Stand the robot on its back edge, front facing up (90 deg)",
            PoseName::BackUp => "Stand the robot on its front edge, back facing up (90 deg)",
            PoseName::LeftUp => "Lay the robot on its right side, left facing up (90 deg)",
            PoseName::RightUp => "Lay the robot on its left side, right facing up (90 deg)",
            PoseName::UpsideDown => "Turn the robot upside down",
        }
    }

    /// Accelerometer reading in the logical body frame for this pose at rest
    pub fn gravity_reading(self, g: f64) -> Vector3 {
        match self {
            PoseName::Flat => [0.0, 0.0, g],
            PoseName::FrontUp => [g, 0.0, 0.0],
            PoseName::BackUp => [-g, 0.0, 0.0],
            PoseName::LeftUp => [0.0, g, 0.0],
            PoseName::RightUp => [0.0, -g, 0.0],
            PoseName::UpsideDown => [0.0, 0.0, -g],
        }
    }
}

impl fmt::Display for PoseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PoseName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "flat" => Ok(PoseName::Flat),
            "front" | "front_up" | "frontup" => Ok(PoseName::FrontUp),
            "back" | "back_up" | "backup" => Ok(PoseName::BackUp),
            "left" | "left_up" | "leftup" => Ok(PoseName::LeftUp),
            "right" | "right_up" | "rightup" => Ok(PoseName::RightUp),
            "upside" | "upside_down" | "upsidedown" => Ok(PoseName::UpsideDown),
            _ => Err(Error::InvalidPose(s.trim().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_labels_round_trip() {
        for pose in PoseName::ALL {
            assert_eq!(pose.label().parse::<PoseName>().unwrap(), pose);
        }
    }

    #[test]
    fn test_pose_index_matches_canonical_order() {
        for (i, pose) in PoseName::ALL.iter().enumerate() {
            assert_eq!(pose.index(), i);
        }
    }

    #[test]
    fn test_pose_parse_accepts_enum_spellings() {
        assert_eq!("FrontUp".parse::<PoseName>().unwrap(), PoseName::FrontUp);
        assert_eq!("upside_down".parse::<PoseName>().unwrap(), PoseName::UpsideDown);
        assert_eq!(" Left-Up ".parse::<PoseName>().unwrap(), PoseName::LeftUp);
    }

    #[test]
    fn test_invalid_pose_is_rejected() {
        let err = "sideways".parse::<PoseName>().unwrap_err();
        assert!(matches!(err, Error::InvalidPose(ref label) if label == "sideways"));
    }

    #[test]
    fn test_pose_serializes_as_label() {
        let json = serde_json::to_string(&PoseName::UpsideDown).unwrap();
        assert_eq!(json, "\"upside\"");
    }

    #[test]
    fn test_opposite_poses_have_opposite_gravity() {
        let g = 9.8;
        let pairs = [
            (PoseName::Flat, PoseName::UpsideDown),
            (PoseName::FrontUp, PoseName::BackUp),
            (PoseName::LeftUp, PoseName::RightUp),
        ];
        for (a, b) in pairs {
            let va = a.gravity_reading(g);
            let vb = b.gravity_reading(g);
            for axis in 0..3 {
                assert_eq!(va[axis], -vb[axis]);
            }
        }
    }
}
