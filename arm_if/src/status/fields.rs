//! Named fields of the arm status
//!
//! Field names follow a path convention: arrays are indexed as `joint_modes[2]` and pose members
//! are nested as `position/yaw`. Selecting a bare array or struct name (`joint_modes`,
//! `position`) selects all of its members.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    fmt,
    io::{self, Write},
};

use byteorder::{NativeEndian, WriteBytesExt};
use chrono::{DateTime, Utc};

use super::{ArmStatus, Pose};
use crate::NUM_JOINTS;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// chrono format string used for timestamps in text output.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.6f";

const POSE_AXES: [PoseAxis; 6] = [
    PoseAxis::X,
    PoseAxis::Y,
    PoseAxis::Z,
    PoseAxis::Roll,
    PoseAxis::Pitch,
    PoseAxis::Yaw,
];

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A single named field of [`ArmStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Timestamp,
    Length,
    RobotMode,
    JointMode(usize),
    JointAngle(usize),
    Position(PoseAxis),
}

/// Member of the tool pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseAxis {
    X,
    Y,
    Z,
    Roll,
    Pitch,
    Yaw,
}

/// The value of a field extracted from a status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Time(DateTime<Utc>),
    UInt(u32),
    Int(i64),
    Double(f64),
}

#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("Unknown status field \"{0}\"")]
    UnknownField(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Field {
    /// Every field of the status in output order.
    pub fn all() -> Vec<Field> {
        let mut fields = vec![Field::Timestamp, Field::Length, Field::RobotMode];
        fields.extend((0..NUM_JOINTS).map(Field::JointMode));
        fields.extend((0..NUM_JOINTS).map(Field::JointAngle));
        fields.extend(POSE_AXES.iter().copied().map(Field::Position));
        fields
    }

    /// Find the field with the given full name.
    pub fn from_name(name: &str) -> Option<Field> {
        Self::all().into_iter().find(|f| f.name() == name)
    }

    /// Full name of the field.
    pub fn name(&self) -> String {
        match self {
            Field::Timestamp => "timestamp".into(),
            Field::Length => "length".into(),
            Field::RobotMode => "robot_mode".into(),
            Field::JointMode(i) => format!("joint_modes[{}]", i),
            Field::JointAngle(i) => format!("joint_angles[{}]", i),
            Field::Position(a) => format!("position/{}", a.name()),
        }
    }

    /// Binary format code of the field.
    ///
    /// `t` is a timestamp (microseconds since the unix epoch, `i64`), `ui` an unsigned 32 bit
    /// integer, `i` a signed 32 bit integer and `d` a double.
    pub fn format(&self) -> &'static str {
        match self {
            Field::Timestamp => "t",
            Field::Length => "ui",
            Field::RobotMode | Field::JointMode(_) => "i",
            Field::JointAngle(_) | Field::Position(_) => "d",
        }
    }

    /// Extract the value of this field from the status.
    pub fn value(&self, status: &ArmStatus) -> FieldValue {
        match *self {
            Field::Timestamp => FieldValue::Time(status.timestamp),
            Field::Length => FieldValue::UInt(status.length),
            Field::RobotMode => FieldValue::Int(status.robot_mode.code()),
            Field::JointMode(i) => FieldValue::Int(status.joint_modes[i].code()),
            Field::JointAngle(i) => FieldValue::Double(status.joint_angles_rad[i]),
            Field::Position(a) => FieldValue::Double(a.get(&status.position)),
        }
    }
}

impl PoseAxis {
    fn name(&self) -> &'static str {
        match self {
            PoseAxis::X => "x",
            PoseAxis::Y => "y",
            PoseAxis::Z => "z",
            PoseAxis::Roll => "roll",
            PoseAxis::Pitch => "pitch",
            PoseAxis::Yaw => "yaw",
        }
    }

    /// Read this member of the pose.
    pub fn get(&self, pose: &Pose) -> f64 {
        match self {
            PoseAxis::X => pose.position_m[0],
            PoseAxis::Y => pose.position_m[1],
            PoseAxis::Z => pose.position_m[2],
            PoseAxis::Roll => pose.attitude_rpy_rad[0],
            PoseAxis::Pitch => pose.attitude_rpy_rad[1],
            PoseAxis::Yaw => pose.attitude_rpy_rad[2],
        }
    }

    /// Mutable access to this member of the pose.
    pub fn get_mut<'a>(&self, pose: &'a mut Pose) -> &'a mut f64 {
        match self {
            PoseAxis::X => &mut pose.position_m[0],
            PoseAxis::Y => &mut pose.position_m[1],
            PoseAxis::Z => &mut pose.position_m[2],
            PoseAxis::Roll => &mut pose.attitude_rpy_rad[0],
            PoseAxis::Pitch => &mut pose.attitude_rpy_rad[1],
            PoseAxis::Yaw => &mut pose.attitude_rpy_rad[2],
        }
    }
}

impl FieldValue {
    /// Write the value in its binary format, host byte order.
    pub fn write_binary<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match *self {
            FieldValue::Time(t) => writer.write_i64::<NativeEndian>(
                t.timestamp() * 1_000_000 + t.timestamp_subsec_micros() as i64,
            ),
            FieldValue::UInt(v) => writer.write_u32::<NativeEndian>(v),
            FieldValue::Int(v) => writer.write_i32::<NativeEndian>(v as i32),
            FieldValue::Double(v) => writer.write_f64::<NativeEndian>(v),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Time(t) => write!(f, "{}", t.format(TIMESTAMP_FORMAT)),
            FieldValue::UInt(v) => write!(f, "{}", v),
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Double(v) => write!(f, "{}", v),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Select fields from a comma separated list of names.
///
/// An empty list selects every field.
pub fn select(list: &str) -> Result<Vec<Field>, FieldError> {
    let all = Field::all();

    let names: Vec<&str> = list
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .collect();

    if names.is_empty() {
        return Ok(all);
    }

    let mut selected = Vec::new();

    for name in names {
        let array_prefix = format!("{}[", name);
        let struct_prefix = format!("{}/", name);

        let matching: Vec<Field> = all
            .iter()
            .copied()
            .filter(|f| {
                let full = f.name();
                full == name || full.starts_with(&array_prefix) || full.starts_with(&struct_prefix)
            })
            .collect();

        if matching.is_empty() {
            return Err(FieldError::UnknownField(name.into()));
        }

        selected.extend(matching);
    }

    Ok(selected)
}

/// Comma separated names of the given fields.
pub fn names(fields: &[Field]) -> String {
    fields
        .iter()
        .map(Field::name)
        .collect::<Vec<_>>()
        .join(",")
}

/// Comma separated binary format of the given fields.
pub fn binary_format(fields: &[Field]) -> String {
    fields
        .iter()
        .map(Field::format)
        .collect::<Vec<_>>()
        .join(",")
}
