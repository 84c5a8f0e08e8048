//! State derived from the commands handled during this session

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use arm_if::ctrl::MotionInputs;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Session local state owned by the command handler.
///
/// Nothing here is persisted, a new session starts with no camera height and no prepared
/// motion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Height of the last successful camera move, cleared once the arm moves away from that
    /// pose.
    ///
    /// Units: meters
    pub last_camera_height_m: Option<f64>,

    /// The most recently prepared motion primitive.
    pub motion: Option<MotionInputs>,
}

