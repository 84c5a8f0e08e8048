//! # Arm library.
//!
//! This library allows other crates in the workspace to access items defined inside the arm
//! command daemon.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm control module - validates high level commands and drives the arm controller
pub mod arm_ctrl;

/// Command input - reads command lines without blocking the main loop
pub mod cmd_input;

/// Parameters for the arm executable
pub mod params;

/// Status client - keeps the latest arm status up to date from the controller's feed
pub mod status_client;
