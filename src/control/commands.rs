//! Operator console commands.
//!
//! One command per input line; one JSON reply per command. Replies always
//! carry `"success"`, and failures carry `"error"` with a readable reason.
//!
//! ```text
//! collect <pose>   run a 2 s acquisition window for a pose
//! status           per-pose sample counts
//! compute          infer the axis mapping and write the artifact
//! imu              latest raw sample
//! reset [pose]     clear one pose or everything
//! pose <pose>      move the simulated robot (--simulate only)
//! help
//! quit
//! ```

use super::service::CalibrationService;
use crate::core::types::PoseName;
use crate::transport::SimulationHandle;
use serde_json::{Value, json};
use std::sync::Arc;

/// Parsed console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Collect(String),
    Status,
    Compute,
    Imu,
    Reset(Option<String>),
    Pose(String),
    Help,
    Quit,
}

impl Command {
    /// Parse one input line; `None` for a blank line
    pub fn parse(line: &str) -> Option<std::result::Result<Command, String>> {
        let mut words = line.split_whitespace();
        let verb = words.next()?.to_ascii_lowercase();
        let arg = words.next().map(str::to_string);

        let command = match (verb.as_str(), arg) {
            ("collect", Some(pose)) => Ok(Command::Collect(pose)),
            ("collect", None) => Err("Usage: collect <pose>".to_string()),
            ("status", _) => Ok(Command::Status),
            ("compute" | "calculate", _) => Ok(Command::Compute),
            ("imu", _) => Ok(Command::Imu),
            ("reset", pose) => Ok(Command::Reset(pose)),
            ("pose", Some(pose)) => Ok(Command::Pose(pose)),
            ("pose", None) => Err("Usage: pose <pose>".to_string()),
            ("help" | "?", _) => Ok(Command::Help),
            ("quit" | "exit", _) => Ok(Command::Quit),
            (other, _) => Err(format!("Unknown command: {}", other)),
        };
        Some(command)
    }
}

/// Failure reply
pub fn error_reply(reason: impl std::fmt::Display) -> Value {
    json!({ "success": false, "error": reason.to_string() })
}

/// Executes commands against the calibration service
pub struct Console {
    service: Arc<CalibrationService>,
    simulation: Option<SimulationHandle>,
}

impl Console {
    pub fn new(service: Arc<CalibrationService>, simulation: Option<SimulationHandle>) -> Self {
        Self {
            service,
            simulation,
        }
    }

    /// Run one command and build its reply
    pub fn execute(&self, command: &Command) -> Value {
        match command {
            Command::Collect(label) => match self.service.begin_collection(label) {
                Ok(outcome) => json!({
                    "success": true,
                    "pose": outcome.pose,
                    "count": outcome.count,
                }),
                Err(e) => error_reply(e),
            },
            Command::Status => {
                let status = self.service.status();
                json!({
                    "success": true,
                    "counts": status.counts,
                    "collecting": status.collecting,
                    "samples_received": status.samples_received,
                })
            }
            Command::Compute => match self.service.compute_calibration() {
                Ok(report) => json!({
                    "success": true,
                    "code": report.code,
                    "path": report.path,
                    "mapping": report.result.mapping,
                    "ambiguities": report.result.ambiguities,
                }),
                Err(e) => error_reply(e),
            },
            Command::Imu => match self.service.latest_sample() {
                Some(sample) => json!({
                    "success": true,
                    "accel": sample.accel,
                    "gyro": sample.gyro,
                }),
                None => json!({ "success": true, "accel": null, "gyro": null }),
            },
            Command::Reset(label) => match self.service.reset(label.as_deref()) {
                Ok(()) => json!({ "success": true }),
                Err(e) => error_reply(e),
            },
            Command::Pose(label) => {
                let Some(simulation) = &self.simulation else {
                    return error_reply("pose is only available with --simulate");
                };
                match label.parse::<PoseName>() {
                    Ok(pose) => {
                        simulation.set_pose(pose);
                        json!({ "success": true, "pose": pose })
                    }
                    Err(e) => error_reply(e),
                }
            }
            Command::Help => json!({ "success": true, "help": help_text() }),
            Command::Quit => json!({ "success": true }),
        }
    }
}

/// Command summary plus the pose instructions
pub fn help_text() -> String {
    let mut text = String::from(
        "collect <pose> | status | compute | imu | reset [pose] | pose <pose> | help | quit\nposes:",
    );
    for pose in PoseName::ALL {
        text.push_str(&format!("\n  {:<7} {}", pose.label(), pose.instruction()));
    }
    text
}
