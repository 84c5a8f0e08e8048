//! # Status Records
//!
//! Byte order neutral textual form of the status, used for replaying captured feeds. A record is
//! a single line of comma separated `name=value` pairs in any order, with names as given by
//! [`Field::name`]. For example:
//!
//! ```text
//! length=812,robot_mode=0,joint_modes[0]=253,...,joint_angles[5]=0.1
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::{
    kinematics,
    packet::DecodeError,
    status::{
        fields::{Field, PoseAxis},
        ArmStatus, JointMode, Pose, RobotMode,
    },
    NUM_JOINTS,
};

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Split a record line into its `(name, value)` pairs.
pub fn parse_record_line(line: &str) -> Result<Vec<(String, String)>, DecodeError> {
    line.trim()
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|pair| {
            let mut split = pair.splitn(2, '=');
            match (split.next(), split.next()) {
                (Some(name), Some(value)) => Ok((name.trim().into(), value.trim().into())),
                _ => Err(DecodeError::MissingOrMalformed(format!(
                    "expected name=value, found \"{}\"",
                    pair
                ))),
            }
        })
        .collect()
}

/// Decode a status from its record pairs.
///
/// The timestamp is never taken from the record, the status is stamped with the current time.
/// If all six pose members are given they are used as-is, otherwise the pose is computed from
/// the joint angles. When a name appears more than once the last value wins.
pub fn decode_record(pairs: &[(String, String)]) -> Result<ArmStatus, DecodeError> {
    let mut length: Option<u32> = None;
    let mut robot_mode: Option<RobotMode> = None;
    let mut joint_modes: [Option<JointMode>; NUM_JOINTS] = [None; NUM_JOINTS];
    let mut joint_angles: [Option<f64>; NUM_JOINTS] = [None; NUM_JOINTS];
    let mut pose = Pose::default();
    let mut num_pose_members = [false; 6];

    for (name, value) in pairs {
        let field = Field::from_name(name).ok_or_else(|| {
            DecodeError::MissingOrMalformed(format!("unknown field \"{}\"", name))
        })?;

        match field {
            Field::Timestamp => (),
            Field::Length => length = Some(parse_value(name, value)?),
            Field::RobotMode => robot_mode = Some(RobotMode::from_f64(parse_value(name, value)?)),
            Field::JointMode(i) => {
                joint_modes[i] = Some(JointMode::from_f64(parse_value(name, value)?))
            }
            Field::JointAngle(i) => joint_angles[i] = Some(parse_value(name, value)?),
            Field::Position(axis) => {
                *axis.get_mut(&mut pose) = parse_value(name, value)?;
                num_pose_members[axis_index(axis)] = true;
            }
        }
    }

    let mut joint_modes_out = [JointMode::Unknown; NUM_JOINTS];
    let mut joint_angles_out = [0f64; NUM_JOINTS];

    for i in 0..NUM_JOINTS {
        joint_modes_out[i] = joint_modes[i].ok_or_else(|| missing(&Field::JointMode(i)))?;
        joint_angles_out[i] = joint_angles[i].ok_or_else(|| missing(&Field::JointAngle(i)))?;
    }

    let mut status = ArmStatus::new(
        robot_mode.ok_or_else(|| missing(&Field::RobotMode))?,
        joint_modes_out,
        joint_angles_out,
    );
    status.length = length.ok_or_else(|| missing(&Field::Length))?;

    status.position = if num_pose_members.iter().all(|&p| p) {
        pose
    } else {
        kinematics::tcp_pose(&joint_angles_out)
    };

    Ok(status)
}

fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, DecodeError> {
    value.parse().map_err(|_| {
        DecodeError::MissingOrMalformed(format!("cannot parse \"{}\" for {}", value, name))
    })
}

fn missing(field: &Field) -> DecodeError {
    DecodeError::MissingOrMalformed(format!("missing field {}", field.name()))
}

fn axis_index(axis: PoseAxis) -> usize {
    match axis {
        PoseAxis::X => 0,
        PoseAxis::Y => 1,
        PoseAxis::Z => 2,
        PoseAxis::Roll => 3,
        PoseAxis::Pitch => 4,
        PoseAxis::Yaw => 5,
    }
}
