//! # Control lines
//!
//! The arm controller accepts one text command per line on its control channel. This module
//! builds those lines, including the motion primitive line used to drive the controller's
//! scripted motions.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    fmt,
    io::{self, Write},
};

use crate::{cmd::Position, NUM_JOINTS};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Base jog speed of a joint during initialisation.
///
/// Units: radians/second
pub const JOG_SPEED_RADS: f64 = 0.1;

/// Acceleration of a jog.
///
/// Units: radians/second^2
pub const JOG_ACCEL_RADSS: f64 = 0.05;

/// Duration of a single jog.
///
/// Units: seconds
pub const JOG_DURATION_S: f64 = 0.02;

/// Joint offsets used by the brake stop command.
///
/// Units: radians
const STOP_OFFSETS_RAD: [f64; NUM_JOINTS] = [0.1; NUM_JOINTS];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Inputs of the controller's motion primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionInputs {
    pub primitive: Primitive,
    pub inputs: [f64; 3],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Motion primitives known to the controller script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    MoveCam,
    SetPosition,
    SetHome,
}

/// A single line on the control channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlLine {
    PowerOn,
    PowerOff,

    /// Release the brakes and start running.
    Run,

    /// Stop all joints.
    Stop,

    /// Joint speed command used while the arm initialises.
    SpeedJInit {
        speeds_rads: [f64; NUM_JOINTS],
        accel_radss: f64,
        duration_s: f64,
    },

    /// Run a motion primitive.
    Motion(MotionInputs),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Primitive {
    /// Code of the primitive in the controller script.
    pub fn code(&self) -> u8 {
        match self {
            Primitive::MoveCam => 1,
            Primitive::SetPosition => 2,
            Primitive::SetHome => 3,
        }
    }
}

impl MotionInputs {
    pub fn move_cam(pan_deg: f64, tilt_deg: f64, height_m: f64) -> Self {
        Self {
            primitive: Primitive::MoveCam,
            inputs: [pan_deg, tilt_deg, height_m],
        }
    }

    /// Go to a named position with zero pan and tilt.
    pub fn set_position(position: Position) -> Self {
        Self {
            primitive: Primitive::SetPosition,
            inputs: [position_code(position), 0.0, 0.0],
        }
    }

    pub fn set_home() -> Self {
        Self {
            primitive: Primitive::SetHome,
            inputs: [0.0; 3],
        }
    }
}

impl ControlLine {
    /// Jog a single joint at its initialisation speed, all other joints held still.
    ///
    /// The joints closest to the base carry the largest load and are slowed down.
    pub fn jog_joint(joint_id: usize, dir: bool) -> Self {
        let mut speed = if dir { JOG_SPEED_RADS } else { -JOG_SPEED_RADS };

        match joint_id {
            0 => speed /= 3.0,
            1 => speed /= 2.5,
            2 => speed /= 2.0,
            _ => (),
        }

        let mut speeds_rads = [0f64; NUM_JOINTS];
        if let Some(s) = speeds_rads.get_mut(joint_id) {
            *s = speed;
        }

        ControlLine::SpeedJInit {
            speeds_rads,
            accel_radss: JOG_ACCEL_RADSS,
            duration_s: JOG_DURATION_S,
        }
    }

    /// Write the line to the channel and flush it.
    pub fn send<W: Write + ?Sized>(&self, channel: &mut W) -> io::Result<()> {
        writeln!(channel, "{}", self)?;
        channel.flush()
    }
}

impl fmt::Display for ControlLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlLine::PowerOn => write!(f, "power on"),
            ControlLine::PowerOff => write!(f, "power off"),
            ControlLine::Run => write!(f, "set robotmode run"),
            ControlLine::Stop => write!(f, "stopj([{}])", join(&STOP_OFFSETS_RAD)),
            ControlLine::SpeedJInit {
                speeds_rads,
                accel_radss,
                duration_s,
            } => write!(
                f,
                "speedj_init([{}],{},{})",
                join(speeds_rads),
                accel_radss,
                duration_s
            ),
            ControlLine::Motion(m) => write!(
                f,
                "motion_primitive({},{})",
                m.primitive.code(),
                join(&m.inputs)
            ),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn position_code(position: Position) -> f64 {
    match position {
        Position::Home => 1.0,
        Position::Giraffe => 2.0,
    }
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fixed_lines() {
        assert_eq!(ControlLine::PowerOn.to_string(), "power on");
        assert_eq!(ControlLine::PowerOff.to_string(), "power off");
        assert_eq!(ControlLine::Run.to_string(), "set robotmode run");
        assert_eq!(
            ControlLine::Stop.to_string(),
            "stopj([0.1,0.1,0.1,0.1,0.1,0.1])"
        );
    }

    #[test]
    fn test_jog_joint() {
        match ControlLine::jog_joint(1, true) {
            ControlLine::SpeedJInit { speeds_rads, .. } => {
                assert_eq!(speeds_rads[1], JOG_SPEED_RADS / 2.5);
                assert!(speeds_rads
                    .iter()
                    .enumerate()
                    .all(|(i, &s)| i == 1 || s == 0.0));
            }
            l => panic!("Unexpected line {:?}", l),
        }

        assert_eq!(
            ControlLine::jog_joint(4, false).to_string(),
            "speedj_init([0,0,0,0,-0.1,0],0.05,0.02)"
        );
        assert_eq!(
            ControlLine::jog_joint(2, true).to_string(),
            "speedj_init([0,0,0.05,0,0,0],0.05,0.02)"
        );
    }

    #[test]
    fn test_motion_lines() {
        assert_eq!(
            ControlLine::Motion(MotionInputs::move_cam(45.0, -10.0, 0.5)).to_string(),
            "motion_primitive(1,45,-10,0.5)"
        );
        assert_eq!(
            ControlLine::Motion(MotionInputs::set_position(Position::Giraffe)).to_string(),
            "motion_primitive(2,2,0,0)"
        );
        assert_eq!(
            ControlLine::Motion(MotionInputs::set_home()).to_string(),
            "motion_primitive(3,0,0,0)"
        );
    }

    #[test]
    fn test_send_appends_newline() {
        let mut channel = Vec::new();
        ControlLine::Run.send(&mut channel).unwrap();
        ControlLine::PowerOff.send(&mut channel).unwrap();
        assert_eq!(channel, b"set robotmode run\npower off\n");
    }
}
