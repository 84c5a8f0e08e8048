//! Camera pan sweep

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;
use std::{
    io::Write,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

// Internal
use super::SweepRoutine;
use crate::params::SweepParams;
use arm_if::{
    cmd::{ArmCmd, CmdError, CmdResult},
    ctrl::{ControlLine, MotionInputs},
};
use util::time::seconds_to_std;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Sweeps the camera out to both pan limits and back to the centre, holding the height of the
/// last camera move.
pub struct PanSweep {
    shutdown: Arc<AtomicBool>,

    params: SweepParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PanSweep {
    pub fn new(shutdown: Arc<AtomicBool>, params: SweepParams) -> Self {
        Self { shutdown, params }
    }

    /// Pan of each waypoint in the order they are visited.
    ///
    /// Units: degrees
    pub fn waypoints_deg(&self) -> [f64; 3] {
        [-self.params.pan_limit_deg, self.params.pan_limit_deg, 0.0]
    }

    fn sweep(&self, height_m: f64, channel: &mut dyn Write) -> Result<(), CmdError> {
        let waypoints = self.waypoints_deg();

        // Waypoints from the parameters must obey the same limits as a camera move
        for pan_deg in waypoints.iter() {
            ArmCmd::MoveCam {
                pan_deg: *pan_deg,
                tilt_deg: self.params.tilt_deg,
                height_m,
            }
            .validate()?;
        }

        for pan_deg in waypoints.iter() {
            if self.shutdown.load(Ordering::Relaxed) {
                return Err(CmdError::InvalidRobotState(
                    "camera sweep interrupted by shutdown".into(),
                ));
            }

            info!("Sweeping camera to pan {} deg", pan_deg);

            ControlLine::Motion(MotionInputs::move_cam(
                *pan_deg,
                self.params.tilt_deg,
                height_m,
            ))
            .send(channel)?;

            thread::sleep(seconds_to_std(self.params.dwell_s));
        }

        Ok(())
    }
}

impl SweepRoutine for PanSweep {
    fn run(&mut self, height_m: f64, channel: &mut dyn Write) -> CmdResult {
        match self.sweep(height_m, channel) {
            Ok(()) => CmdResult::ok(format!("camera swept at height {} m", height_m)),
            Err(e) => e.into(),
        }
    }
}
