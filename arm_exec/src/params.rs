//! # Arm Executable Parameters
//!
//! This module provide parameters for the arm executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use arm_if::feed::InputMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmExecParams {
    /// Network endpoint of the controller's status feed
    pub status_endpoint: String,

    /// Network endpoint of the controller's control channel
    pub control_endpoint: String,

    /// Form of the status feed
    pub input_mode: InputMode,

    /// Path of the file marking the arm as being at home
    pub home_marker_path: PathBuf,

    pub auto_init: AutoInitParams,

    pub sweep: SweepParams,
}

/// Parameters of the automatic initialisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoInitParams {
    /// Period between status checks, and between jogs of a joint.
    ///
    /// Units: seconds
    pub poll_period_s: f64,

    /// Maximum time a single joint may take to initialise.
    ///
    /// Units: seconds
    pub joint_timeout_s: f64,

    /// Jog joints in the positive direction.
    pub jog_positive: bool,
}

/// Parameters of the camera sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepParams {
    /// Pan of the outer sweep waypoints, the sweep visits `-pan_limit_deg` then `pan_limit_deg`
    /// before returning to zero.
    ///
    /// Units: degrees
    pub pan_limit_deg: f64,

    /// Tilt held during the sweep.
    ///
    /// Units: degrees
    pub tilt_deg: f64,

    /// Time allowed for the arm to reach each waypoint.
    ///
    /// Units: seconds
    pub dwell_s: f64,
}
