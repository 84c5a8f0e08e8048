//! # Forward Kinematics
//!
//! The tool rotation reported by the status feed is not reliable, so the tool centre point pose
//! is derived from the joint angles through the arm's Denavit-Hartenberg chain instead.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use std::f64::consts::FRAC_PI_2;

use crate::{status::Pose, NUM_JOINTS};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Link offsets along the previous z axis.
///
/// Units: meters
const DH_D_M: [f64; NUM_JOINTS] = [0.089159, 0.0, 0.0, 0.10915, 0.09465, 0.0823];

/// Link lengths along the rotated x axis.
///
/// Units: meters
const DH_A_M: [f64; NUM_JOINTS] = [0.0, -0.425, -0.39225, 0.0, 0.0, 0.0];

/// Link twists about the rotated x axis.
///
/// Units: radians
const DH_ALPHA_RAD: [f64; NUM_JOINTS] = [FRAC_PI_2, 0.0, 0.0, FRAC_PI_2, -FRAC_PI_2, 0.0];

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Transform from the arm base to the tool centre point for the given joint angles.
pub fn tcp_transform(joint_angles_rad: &[f64; NUM_JOINTS]) -> Isometry3<f64> {
    let mut transform = Isometry3::identity();

    for i in 0..NUM_JOINTS {
        // Rz(theta) * Tz(d) * Tx(a) * Rx(alpha)
        let joint = Isometry3::from_parts(
            Translation3::identity(),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), joint_angles_rad[i]),
        );
        let link = Isometry3::from_parts(
            Translation3::new(DH_A_M[i], 0.0, DH_D_M[i]),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), DH_ALPHA_RAD[i]),
        );

        transform = transform * joint * link;
    }

    transform
}

/// Pose of the tool centre point for the given joint angles.
pub fn tcp_pose(joint_angles_rad: &[f64; NUM_JOINTS]) -> Pose {
    let transform = tcp_transform(joint_angles_rad);
    let (roll, pitch, yaw) = transform.rotation.euler_angles();
    let t = transform.translation.vector;

    Pose {
        position_m: [t.x, t.y, t.z],
        attitude_rpy_rad: [roll, pitch, yaw],
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TOL: f64 = 1e-6;

    #[test]
    fn test_zero_configuration() {
        let pose = tcp_pose(&[0.0; NUM_JOINTS]);

        // Arm stretched out along -x, wrist offsets in -y and z
        assert!((pose.position_m[0] - (-0.81725)).abs() < TOL, "{:?}", pose);
        assert!((pose.position_m[1] - (-0.19145)).abs() < TOL, "{:?}", pose);
        assert!((pose.position_m[2] - (-0.005491)).abs() < TOL, "{:?}", pose);
    }

    #[test]
    fn test_base_rotation_rotates_tcp() {
        let zero = tcp_pose(&[0.0; NUM_JOINTS]);
        let turned = tcp_pose(&[FRAC_PI_2, 0.0, 0.0, 0.0, 0.0, 0.0]);

        // A quarter turn of the base maps (x, y) to (-y, x), height is unchanged
        assert!((turned.position_m[0] - (-zero.position_m[1])).abs() < TOL);
        assert!((turned.position_m[1] - zero.position_m[0]).abs() < TOL);
        assert!((turned.position_m[2] - zero.position_m[2]).abs() < TOL);
    }

    #[test]
    fn test_wrist_roll_keeps_position() {
        let zero = tcp_pose(&[0.0; NUM_JOINTS]);
        let rolled = tcp_pose(&[0.0, 0.0, 0.0, 0.0, 0.0, 1.2]);

        for i in 0..3 {
            assert!((rolled.position_m[i] - zero.position_m[i]).abs() < TOL);
        }
        assert!(rolled.attitude_rpy_rad != zero.attitude_rpy_rad);
    }
}
