//! Long running routines invoked by the command handler
//!
//! A routine runs to completion before the handler accepts another command, and may write any
//! number of control lines to the channel it is given.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use arm_if::cmd::CmdResult;
use std::io::Write;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Brings the arm out of initialisation.
pub trait AutoInitRoutine: Send {
    /// Run the initialisation. If `force` is set the routine does not require the arm to be at
    /// home first.
    fn run(&mut self, force: bool, channel: &mut dyn Write) -> CmdResult;
}

/// Sweeps the camera from its current pose.
pub trait SweepRoutine: Send {
    /// Run the sweep at the given camera height.
    fn run(&mut self, height_m: f64, channel: &mut dyn Write) -> CmdResult;
}
