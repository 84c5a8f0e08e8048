//! # Arm interface crate.
//!
//! Provides the interfaces shared by the arm executables: the status feed wire codec and status
//! model, the high level command model and the low level control lines sent to the arm
//! controller.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm status snapshot and mode queries
pub mod status;

/// Network order status packet codec
pub mod packet;

/// Textual `name=value` record form of the status
pub mod record;

/// Forward kinematics used to derive the tool pose
pub mod kinematics;

/// High level arm commands and their results
pub mod cmd;

/// Low level control lines understood by the arm controller
pub mod ctrl;

/// Latest-status snapshot and the feed reading loop
pub mod feed;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The number of joints on the arm.
pub const NUM_JOINTS: usize = 6;
