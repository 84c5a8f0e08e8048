//! Robot and joint operating modes reported by the arm controller

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Overall operating mode of the arm.
///
/// The declaration order follows the controller's numeric codes, `Running` being `0` and
/// `SafeguardStop` being `10`. Any other code decodes as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotMode {
    Running,
    Freedrive,
    Ready,
    Initializing,
    SecurityStopped,
    EmergencyStopped,
    FatalError,
    NoPower,
    NotConnected,
    Shutdown,
    SafeguardStop,
    Unknown,
}

/// Operating mode of a single joint.
///
/// Joint codes occupy the top of the byte range, from `PartDCalibration` (237) up to `Idle`
/// (255).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointMode {
    PartDCalibration,
    Backdrive,
    PowerOff,
    EmergencyStopped,
    CalvalInitialization,
    Error,
    Freedrive,
    Simulated,
    NotResponding,
    MotorInitialisation,
    Booting,
    PartDCalibrationError,
    Bootloader,
    Calibration,
    SecurityStopped,
    Fault,
    Running,
    Initializing,
    Idle,
    Unknown,
}

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const ROBOT_MODES: [RobotMode; 11] = [
    RobotMode::Running,
    RobotMode::Freedrive,
    RobotMode::Ready,
    RobotMode::Initializing,
    RobotMode::SecurityStopped,
    RobotMode::EmergencyStopped,
    RobotMode::FatalError,
    RobotMode::NoPower,
    RobotMode::NotConnected,
    RobotMode::Shutdown,
    RobotMode::SafeguardStop,
];

const JOINT_MODES: [JointMode; 19] = [
    JointMode::PartDCalibration,
    JointMode::Backdrive,
    JointMode::PowerOff,
    JointMode::EmergencyStopped,
    JointMode::CalvalInitialization,
    JointMode::Error,
    JointMode::Freedrive,
    JointMode::Simulated,
    JointMode::NotResponding,
    JointMode::MotorInitialisation,
    JointMode::Booting,
    JointMode::PartDCalibrationError,
    JointMode::Bootloader,
    JointMode::Calibration,
    JointMode::SecurityStopped,
    JointMode::Fault,
    JointMode::Running,
    JointMode::Initializing,
    JointMode::Idle,
];

/// Code of the first entry in `JOINT_MODES`.
const FIRST_JOINT_MODE_CODE: i64 = 237;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RobotMode {
    /// Get the mode matching the controller code, or `Unknown`.
    pub fn from_code(code: i64) -> Self {
        if code < 0 {
            return RobotMode::Unknown;
        }

        ROBOT_MODES
            .get(code as usize)
            .copied()
            .unwrap_or(RobotMode::Unknown)
    }

    /// Get the mode from a code carried as a floating point number on the wire.
    ///
    /// Non-finite or non-integral values are `Unknown`.
    pub fn from_f64(value: f64) -> Self {
        match integral_code(value) {
            Some(c) => Self::from_code(c),
            None => RobotMode::Unknown,
        }
    }

    /// The controller code for this mode, `-1` for `Unknown`.
    pub fn code(&self) -> i64 {
        ROBOT_MODES
            .iter()
            .position(|m| m == self)
            .map(|p| p as i64)
            .unwrap_or(-1)
    }

    /// Human readable name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            RobotMode::Running => "running",
            RobotMode::Freedrive => "freedrive",
            RobotMode::Ready => "ready",
            RobotMode::Initializing => "initializing",
            RobotMode::SecurityStopped => "security_stopped",
            RobotMode::EmergencyStopped => "emergency_stopped",
            RobotMode::FatalError => "fatal_error",
            RobotMode::NoPower => "no_power",
            RobotMode::NotConnected => "not_connected",
            RobotMode::Shutdown => "shutdown",
            RobotMode::SafeguardStop => "safeguard_stop",
            RobotMode::Unknown => "unknown",
        }
    }
}

impl JointMode {
    /// Get the mode matching the controller code, or `Unknown`.
    pub fn from_code(code: i64) -> Self {
        if code < FIRST_JOINT_MODE_CODE {
            return JointMode::Unknown;
        }

        JOINT_MODES
            .get((code - FIRST_JOINT_MODE_CODE) as usize)
            .copied()
            .unwrap_or(JointMode::Unknown)
    }

    /// Get the mode from a code carried as a floating point number on the wire.
    pub fn from_f64(value: f64) -> Self {
        match integral_code(value) {
            Some(c) => Self::from_code(c),
            None => JointMode::Unknown,
        }
    }

    /// The controller code for this mode, `-1` for `Unknown`.
    pub fn code(&self) -> i64 {
        JOINT_MODES
            .iter()
            .position(|m| m == self)
            .map(|p| p as i64 + FIRST_JOINT_MODE_CODE)
            .unwrap_or(-1)
    }

    /// Human readable name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            JointMode::PartDCalibration => "part_d_calibration",
            JointMode::Backdrive => "backdrive",
            JointMode::PowerOff => "power_off",
            JointMode::EmergencyStopped => "emergency_stopped",
            JointMode::CalvalInitialization => "calval_initialization",
            JointMode::Error => "error",
            JointMode::Freedrive => "freedrive",
            JointMode::Simulated => "simulated",
            JointMode::NotResponding => "not_responding",
            JointMode::MotorInitialisation => "motor_initialisation",
            JointMode::Booting => "booting",
            JointMode::PartDCalibrationError => "part_d_calibration_error",
            JointMode::Bootloader => "bootloader",
            JointMode::Calibration => "calibration",
            JointMode::SecurityStopped => "security_stopped",
            JointMode::Fault => "fault",
            JointMode::Running => "running",
            JointMode::Initializing => "initializing",
            JointMode::Idle => "idle",
            JointMode::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RobotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for JointMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Interpret a wire double as an integer mode code.
fn integral_code(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}
