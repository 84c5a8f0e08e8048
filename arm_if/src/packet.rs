//! # Status Packet Codec
//!
//! The arm controller's realtime interface (version 1.8) streams fixed size packets in network
//! byte order. Each packet is a 4 byte length followed by 101 doubles, of which only the joint
//! positions, robot mode and joint modes are used here. The tool vector carried by the packet is
//! discarded and the pose is recomputed from the joint angles instead.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{BigEndian, ByteOrder};
use std::io::{self, Read};

use crate::{
    status::{ArmStatus, JointMode, RobotMode},
    NUM_JOINTS,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Size of a status packet.
///
/// Units: bytes
pub const PACKET_SIZE: usize = 812;

/// Size of the length prefix.
const LENGTH_SIZE: usize = 4;

/// Index of the first actual joint position double.
const Q_ACTUAL_INDEX: usize = 31;

/// Index of the robot mode double.
const ROBOT_MODE_INDEX: usize = 94;

/// Index of the first joint mode double.
const JOINT_MODES_INDEX: usize = 95;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Reads status packets from a byte stream.
pub struct PacketReader<R: Read> {
    reader: R,
    buffer: [u8; PACKET_SIZE],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Status stream ended mid-packet: expected {expected} bytes but got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Status stream closed")]
    Eof,

    #[error("Status record is missing or has a malformed field: {0}")]
    MissingOrMalformed(String),

    #[error("Could not read from the status stream: {0}")]
    Io(#[from] io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<R: Read> PacketReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: [0u8; PACKET_SIZE],
        }
    }

    /// Read and decode the next packet in the stream.
    ///
    /// Returns [`DecodeError::Eof`] if the stream ends cleanly between packets and
    /// [`DecodeError::Truncated`] if it ends part way through one.
    pub fn read_status(&mut self) -> Result<ArmStatus, DecodeError> {
        let mut num_read = 0;

        while num_read < PACKET_SIZE {
            match self.reader.read(&mut self.buffer[num_read..]) {
                Ok(0) => break,
                Ok(n) => num_read += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(DecodeError::Io(e)),
            }
        }

        match num_read {
            0 => Err(DecodeError::Eof),
            PACKET_SIZE => Ok(decode_network(&self.buffer)),
            actual => Err(DecodeError::Truncated {
                expected: PACKET_SIZE,
                actual,
            }),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Decode a complete network order packet.
///
/// Decoding a full buffer cannot fail: unrecognised mode codes become `Unknown` and a bad
/// length is left for the feed's sanity check to catch.
pub fn decode_network(buffer: &[u8; PACKET_SIZE]) -> ArmStatus {
    let length = BigEndian::read_u32(&buffer[0..LENGTH_SIZE]);

    let mut joint_angles_rad = [0f64; NUM_JOINTS];
    let mut joint_modes = [JointMode::Unknown; NUM_JOINTS];

    for i in 0..NUM_JOINTS {
        joint_angles_rad[i] = read_double(buffer, Q_ACTUAL_INDEX + i);
        joint_modes[i] = JointMode::from_f64(read_double(buffer, JOINT_MODES_INDEX + i));
    }

    let robot_mode = RobotMode::from_f64(read_double(buffer, ROBOT_MODE_INDEX));

    let mut status = ArmStatus::new(robot_mode, joint_modes, joint_angles_rad);
    status.length = length;

    status
}

/// Read the double with the given index from the packet body.
fn read_double(buffer: &[u8; PACKET_SIZE], index: usize) -> f64 {
    let offset = LENGTH_SIZE + 8 * index;
    BigEndian::read_f64(&buffer[offset..offset + 8])
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use std::io::Cursor;

    /// Build a network order packet with the given modes and joint angles.
    pub(crate) fn build_packet(
        robot_mode: f64,
        joint_modes: [f64; NUM_JOINTS],
        joint_angles_rad: [f64; NUM_JOINTS],
    ) -> [u8; PACKET_SIZE] {
        let mut buffer = [0u8; PACKET_SIZE];

        BigEndian::write_u32(&mut buffer[0..4], PACKET_SIZE as u32);

        let mut put = |index: usize, value: f64| {
            let offset = LENGTH_SIZE + 8 * index;
            BigEndian::write_f64(&mut buffer[offset..offset + 8], value);
        };

        for i in 0..NUM_JOINTS {
            put(Q_ACTUAL_INDEX + i, joint_angles_rad[i]);
            put(JOINT_MODES_INDEX + i, joint_modes[i]);
        }
        put(ROBOT_MODE_INDEX, robot_mode);

        // Garbage tool vector, must not leak into the pose
        for i in 55..61 {
            put(i, 1234.5);
        }

        buffer
    }

    #[test]
    fn test_decode_network() {
        let angles = [0.1, -0.2, 0.3, -0.4, 0.5, -0.6];
        let packet = build_packet(3.0, [254.0, 254.0, 253.0, 254.0, 254.0, 255.0], angles);

        let status = decode_network(&packet);

        assert_eq!(status.length, PACKET_SIZE as u32);
        assert_eq!(status.robot_mode, RobotMode::Initializing);
        assert_eq!(status.joint_modes[2], JointMode::Running);
        assert_eq!(status.joint_modes[5], JointMode::Idle);
        assert_eq!(status.joint_angles_rad, angles);
        assert_eq!(status.position, crate::kinematics::tcp_pose(&angles));
    }

    #[test]
    fn test_decode_network_keeps_wire_length() {
        let mut packet = build_packet(0.0, [253.0; NUM_JOINTS], [0.0; NUM_JOINTS]);
        BigEndian::write_u32(&mut packet[0..4], 1060);

        assert_eq!(decode_network(&packet).length, 1060);
    }

    #[test]
    fn test_reader_stream_boundaries() {
        let packet = build_packet(0.0, [253.0; NUM_JOINTS], [0.0; NUM_JOINTS]);

        let mut bytes = packet.to_vec();
        bytes.extend_from_slice(&packet[..100]);

        let mut reader = PacketReader::new(Cursor::new(bytes));

        assert!(reader.read_status().unwrap().is_running());
        assert!(matches!(
            reader.read_status(),
            Err(DecodeError::Truncated {
                expected: PACKET_SIZE,
                actual: 100
            })
        ));
        assert!(matches!(reader.read_status(), Err(DecodeError::Eof)));
    }

    #[test]
    fn test_reader_empty_stream_is_eof() {
        let mut reader = PacketReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(matches!(reader.read_status(), Err(DecodeError::Eof)));
    }
}
