//! Arm control module
//!
//! Commands are handled one at a time by [`CmdHandler`], which checks each one against the
//! latest arm status before writing control lines to the arm controller. Long running sequences
//! are delegated to the auto initialisation and camera sweep routines.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod auto_init;
mod handler;
mod home_marker;
mod routines;
mod session_state;
mod sweep;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use auto_init::JointJogAutoInit;
pub use handler::CmdHandler;
pub use home_marker::{FileHomeMarker, HomeMarker};
pub use routines::{AutoInitRoutine, SweepRoutine};
pub use session_state::SessionState;
pub use sweep::PanSweep;
