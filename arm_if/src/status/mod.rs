//! # Arm Status
//!
//! The status snapshot decoded from the arm controller's feed, along with the mode
//! classification queries used to decide which commands are currently legal.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod modes;

/// Named fields of the status used for record input and CSV output
pub mod fields;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{kinematics, packet::PACKET_SIZE, NUM_JOINTS};

pub use modes::{JointMode, RobotMode};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Snapshot of the arm status.
///
/// A new snapshot is produced for every packet received, no history is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmStatus {
    /// Local time at which the status was received. This is never read from the wire.
    pub timestamp: DateTime<Utc>,

    /// Payload length declared by the packet.
    ///
    /// Units: bytes
    pub length: u32,

    /// Overall mode of the arm
    pub robot_mode: RobotMode,

    /// Mode of each joint, base first
    pub joint_modes: [JointMode; NUM_JOINTS],

    /// Actual angle of each joint, base first
    ///
    /// Units: radians
    pub joint_angles_rad: [f64; NUM_JOINTS],

    /// Pose of the tool centre point in the arm base frame
    pub position: Pose,
}

/// Pose of the tool centre point (TCP).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Translation of the TCP in the base frame
    ///
    /// Units: meters
    pub position_m: [f64; 3],

    /// Roll, pitch and yaw of the TCP in the base frame
    ///
    /// Units: radians
    pub attitude_rpy_rad: [f64; 3],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmStatus {
    /// Build a status received now from the given modes and joint angles.
    ///
    /// The length is set to the expected packet size and the pose is derived from the joint
    /// angles.
    pub fn new(
        robot_mode: RobotMode,
        joint_modes: [JointMode; NUM_JOINTS],
        joint_angles_rad: [f64; NUM_JOINTS],
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            length: PACKET_SIZE as u32,
            robot_mode,
            joint_modes,
            joint_angles_rad,
            position: kinematics::tcp_pose(&joint_angles_rad),
        }
    }

    /// True if the arm has no power.
    pub fn is_powered_off(&self) -> bool {
        self.robot_mode == RobotMode::NoPower
    }

    /// True if the arm is running.
    pub fn is_running(&self) -> bool {
        self.robot_mode == RobotMode::Running
    }

    /// True if the arm is initialising.
    ///
    /// The arm must report `Initializing` overall, and every joint must be either still
    /// initializing or already running. Any other joint mode means initialisation cannot
    /// proceed.
    pub fn is_initialising(&self) -> bool {
        self.robot_mode == RobotMode::Initializing
            && self
                .joint_modes
                .iter()
                .all(|m| matches!(m, JointMode::Initializing | JointMode::Running))
    }

    /// Mode of the given joint, or `None` if there is no such joint.
    pub fn joint_mode(&self, joint_id: usize) -> Option<JointMode> {
        self.joint_modes.get(joint_id).copied()
    }

    /// Human readable robot mode.
    pub fn mode_str(&self) -> &'static str {
        self.robot_mode.as_str()
    }

    /// Human readable mode of the given joint.
    pub fn joint_mode_str(&self, joint_id: usize) -> &'static str {
        match self.joint_mode(joint_id) {
            Some(m) => m.as_str(),
            None => "no_such_joint",
        }
    }
}
