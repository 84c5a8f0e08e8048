//! # Arm commands
//!
//! High level commands accepted by the arm command daemon, and the result returned for each of
//! them. Commands are exchanged as JSON objects tagged by a `type` key, for example:
//!
//! ```json
//! {"type": "move_cam", "pan_deg": 45.0, "tilt_deg": 0.0, "height_m": 0.5}
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::{fmt, io, str::FromStr};
use thiserror::Error;

// Internal
use crate::NUM_JOINTS;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Limit on the magnitude of the camera pan.
///
/// Units: degrees
pub const MAX_PAN_DEG: f64 = 90.0;

/// Limit on the magnitude of the camera tilt.
///
/// Units: degrees
pub const MAX_TILT_DEG: f64 = 90.0;

/// Minimum camera height.
///
/// Units: meters
pub const MIN_HEIGHT_M: f64 = 0.1;

/// Maximum camera height.
///
/// Units: meters
pub const MAX_HEIGHT_M: f64 = 1.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The outcome of handling a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmdResult {
    pub success: bool,
    pub message: String,
    pub error: ErrorKind,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command that can be handled by the arm command daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArmCmd {
    /// Turn the arm power on or off.
    Power { is_on: bool },

    /// Engage or release the joint brakes.
    Brakes { enable: bool },

    /// Point the camera at the given pan and tilt, from the given height.
    MoveCam {
        pan_deg: f64,
        tilt_deg: f64,
        height_m: f64,
    },

    /// Sweep the camera in pan at the height of the last camera move.
    SweepCam,

    /// Move every joint to the given angle.
    ///
    /// Direct joint moves are disabled on the controller, this command is accepted and has no
    /// effect.
    MoveJoints { joints_deg: [f64; NUM_JOINTS] },

    /// Jog a single joint during initialisation.
    ///
    /// `dir` is true for a positive jog.
    JointMove { joint_id: usize, dir: bool },

    /// Prepare the set home primitive.
    SetHome,

    /// Move to a named position, either `home` or `giraffe`.
    SetPosition { position: String },

    /// Reserved for end effector control, currently has no effect.
    MoveEffector,

    /// Run the automatic initialisation, requiring the arm to be at home.
    AutoInit,

    /// Run the automatic initialisation, skipping the home check if `force` is set.
    AutoInitForce { force: bool },
}

/// Category of a command failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    None,
    InvalidInput,
    InvalidRobotState,
    Transport,
}

/// A named position the arm can be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Home,
    Giraffe,
}

/// Reasons a command can be rejected or fail.
#[derive(Debug, Error)]
pub enum CmdError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid robot state: {0}")]
    InvalidRobotState(String),

    #[error("Could not write to the control channel: {0}")]
    Transport(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum CmdParseError {
    #[error("Command contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmCmd {
    /// Parse a command from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, CmdParseError> {
        serde_json::from_str(json).map_err(CmdParseError::InvalidJson)
    }

    /// Name of the command, as used in the `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            ArmCmd::Power { .. } => "power",
            ArmCmd::Brakes { .. } => "brakes",
            ArmCmd::MoveCam { .. } => "move_cam",
            ArmCmd::SweepCam => "sweep_cam",
            ArmCmd::MoveJoints { .. } => "move_joints",
            ArmCmd::JointMove { .. } => "joint_move",
            ArmCmd::SetHome => "set_home",
            ArmCmd::SetPosition { .. } => "set_position",
            ArmCmd::MoveEffector => "move_effector",
            ArmCmd::AutoInit => "auto_init",
            ArmCmd::AutoInitForce { .. } => "auto_init_force",
        }
    }

    /// Check the command's own fields, independently of the arm's state.
    pub fn validate(&self) -> Result<(), CmdError> {
        match self {
            ArmCmd::MoveCam {
                pan_deg,
                tilt_deg,
                height_m,
            } => {
                check_range("pan", *pan_deg, -MAX_PAN_DEG, MAX_PAN_DEG, "deg")?;
                check_range("tilt", *tilt_deg, -MAX_TILT_DEG, MAX_TILT_DEG, "deg")?;
                check_range("height", *height_m, MIN_HEIGHT_M, MAX_HEIGHT_M, "m")
            }
            ArmCmd::JointMove { joint_id, .. } => {
                if *joint_id < NUM_JOINTS {
                    Ok(())
                } else {
                    Err(CmdError::InvalidInput(format!(
                        "joint_id {} is outside [0, {}]",
                        joint_id,
                        NUM_JOINTS - 1
                    )))
                }
            }
            ArmCmd::SetPosition { position } => position.parse::<Position>().map(|_| ()),
            _ => Ok(()),
        }
    }
}

impl CmdResult {
    pub fn ok<S: Into<String>>(message: S) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: ErrorKind::None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl From<CmdError> for CmdResult {
    fn from(e: CmdError) -> Self {
        let error = match e {
            CmdError::InvalidInput(_) => ErrorKind::InvalidInput,
            CmdError::InvalidRobotState(_) => ErrorKind::InvalidRobotState,
            CmdError::Transport(_) => ErrorKind::Transport,
        };

        Self {
            success: false,
            message: e.to_string(),
            error,
        }
    }
}

impl From<CmdParseError> for CmdResult {
    fn from(e: CmdParseError) -> Self {
        Self {
            success: false,
            message: e.to_string(),
            error: ErrorKind::InvalidInput,
        }
    }
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Home => "home",
            Position::Giraffe => "giraffe",
        }
    }
}

impl FromStr for Position {
    type Err = CmdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(Position::Home),
            "giraffe" => Ok(Position::Giraffe),
            _ => Err(CmdError::InvalidInput(format!(
                "unknown position \"{}\", expected home or giraffe",
                s
            ))),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Check that `value` lies in `[min, max]`. NaN is always out of range.
fn check_range(name: &str, value: f64, min: f64, max: f64, unit: &str) -> Result<(), CmdError> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(CmdError::InvalidInput(format!(
            "{} {} {} is outside [{}, {}] {}",
            name, value, unit, min, max, unit
        )))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_json() {
        let cmd = ArmCmd::from_json(
            r#"{"type": "move_cam", "pan_deg": 45.0, "tilt_deg": 0.0, "height_m": 0.5}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            ArmCmd::MoveCam {
                pan_deg: 45.0,
                tilt_deg: 0.0,
                height_m: 0.5
            }
        );

        assert_eq!(
            ArmCmd::from_json(r#"{"type": "sweep_cam"}"#).unwrap(),
            ArmCmd::SweepCam
        );
        assert_eq!(
            ArmCmd::from_json(r#"{"type": "joint_move", "joint_id": 1, "dir": true}"#).unwrap(),
            ArmCmd::JointMove {
                joint_id: 1,
                dir: true
            }
        );

        assert!(ArmCmd::from_json(r#"{"type": "fly"}"#).is_err());
        assert!(ArmCmd::from_json("not json").is_err());
    }

    #[test]
    fn test_validate_move_cam() {
        let cmd = |pan_deg, tilt_deg, height_m| ArmCmd::MoveCam {
            pan_deg,
            tilt_deg,
            height_m,
        };

        assert!(cmd(45.0, 0.0, 0.5).validate().is_ok());
        assert!(cmd(-90.0, 90.0, 0.1).validate().is_ok());
        assert!(cmd(90.0, -90.0, 1.0).validate().is_ok());

        assert!(matches!(
            cmd(91.0, 0.0, 0.5).validate(),
            Err(CmdError::InvalidInput(m)) if m.contains("pan")
        ));
        assert!(cmd(0.0, -90.5, 0.5).validate().is_err());
        assert!(cmd(0.0, 0.0, 0.05).validate().is_err());
        assert!(cmd(0.0, 0.0, f64::NAN).validate().is_err());
    }

    #[test]
    fn test_validate_joint_and_position() {
        assert!(ArmCmd::JointMove {
            joint_id: 5,
            dir: false
        }
        .validate()
        .is_ok());
        assert!(ArmCmd::JointMove {
            joint_id: 6,
            dir: true
        }
        .validate()
        .is_err());

        assert!(ArmCmd::SetPosition {
            position: "giraffe".into()
        }
        .validate()
        .is_ok());
        assert!(ArmCmd::SetPosition {
            position: "sideways".into()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_result_from_error() {
        let r = CmdResult::from(CmdError::InvalidRobotState("arm is not running".into()));
        assert!(!r.is_success());
        assert_eq!(r.error, ErrorKind::InvalidRobotState);
        assert_eq!(r.message, "Invalid robot state: arm is not running");

        let json = serde_json::to_string(&CmdResult::ok("done")).unwrap();
        assert_eq!(json, r#"{"success":true,"message":"done","error":"none"}"#);
    }
}
