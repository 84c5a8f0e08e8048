//! Command handler
//!
//! Every command goes through the same three stages: its own fields are validated, then the
//! latest arm status is checked against the command's preconditions, and only then is anything
//! written to the controller or the session state changed. A rejected command therefore leaves
//! everything as it was.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use std::{io::Write, sync::Arc};

// Internal
use super::{AutoInitRoutine, HomeMarker, SessionState, SweepRoutine};
use arm_if::{
    cmd::{ArmCmd, CmdError, CmdResult, Position},
    ctrl::{ControlLine, MotionInputs},
    feed::StatusFeed,
    status::{ArmStatus, JointMode, RobotMode},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Handles arm commands against the latest arm status.
pub struct CmdHandler<W: Write> {
    feed: StatusFeed,

    channel: W,

    state: SessionState,

    home_marker: Arc<dyn HomeMarker + Send + Sync>,

    auto_init: Box<dyn AutoInitRoutine>,

    sweep: Box<dyn SweepRoutine>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<W: Write> CmdHandler<W> {
    pub fn new(
        feed: StatusFeed,
        channel: W,
        home_marker: Arc<dyn HomeMarker + Send + Sync>,
        auto_init: Box<dyn AutoInitRoutine>,
        sweep: Box<dyn SweepRoutine>,
    ) -> Self {
        Self {
            feed,
            channel,
            state: SessionState::default(),
            home_marker,
            auto_init,
            sweep,
        }
    }

    /// Handle a single command.
    pub fn handle(&mut self, cmd: &ArmCmd) -> CmdResult {
        debug!("Handling {:?}", cmd);

        let result = match self.dispatch(cmd) {
            Ok(r) => r,
            Err(e) => CmdResult::from(e),
        };

        if result.success {
            info!("{} succeeded: {}", cmd.name(), result.message);
        } else {
            warn!("{} failed: {}", cmd.name(), result.message);
        }

        result
    }

    /// The state derived from the commands handled so far.
    pub fn session_state(&self) -> &SessionState {
        &self.state
    }

    /// The control channel.
    pub fn channel(&self) -> &W {
        &self.channel
    }

    fn dispatch(&mut self, cmd: &ArmCmd) -> Result<CmdResult, CmdError> {
        cmd.validate()?;

        match cmd {
            ArmCmd::Power { is_on } => self.power(*is_on),
            ArmCmd::Brakes { enable } => self.brakes(*enable),
            ArmCmd::MoveCam {
                pan_deg,
                tilt_deg,
                height_m,
            } => self.move_cam(*pan_deg, *tilt_deg, *height_m),
            ArmCmd::SweepCam => self.sweep_cam(),
            ArmCmd::MoveJoints { .. } => Ok(CmdResult::ok("move_joints is disabled, ignored")),
            ArmCmd::JointMove { joint_id, dir } => self.joint_move(*joint_id, *dir),
            ArmCmd::SetHome => {
                self.state.motion = Some(MotionInputs::set_home());
                Ok(CmdResult::ok("set home primitive prepared"))
            }
            ArmCmd::SetPosition { position } => self.set_position(position.parse()?),
            ArmCmd::MoveEffector => Ok(CmdResult::ok("move_effector is not supported, ignored")),
            ArmCmd::AutoInit => Ok(self.run_auto_init(false)),
            ArmCmd::AutoInitForce { force } => Ok(self.run_auto_init(*force)),
        }
    }

    fn power(&mut self, is_on: bool) -> Result<CmdResult, CmdError> {
        if is_on {
            let status = self.latest_status()?;
            if !status.is_powered_off() {
                return Err(CmdError::InvalidRobotState(format!(
                    "cannot power on as the robot mode is '{}', expected 'no_power'",
                    status.mode_str()
                )));
            }
        }

        info!("Powering arm {}", if is_on { "on" } else { "off" });

        if is_on {
            self.send(&ControlLine::PowerOn)?;
            Ok(CmdResult::ok("power on sent"))
        } else {
            self.send(&ControlLine::PowerOff)?;
            Ok(CmdResult::ok("power off sent"))
        }
    }

    fn brakes(&mut self, enable: bool) -> Result<CmdResult, CmdError> {
        if enable {
            self.send(&ControlLine::Stop)?;
            Ok(CmdResult::ok("joints stopped"))
        } else {
            self.send(&ControlLine::Run)?;
            Ok(CmdResult::ok("brakes released"))
        }
    }

    fn move_cam(
        &mut self,
        pan_deg: f64,
        tilt_deg: f64,
        height_m: f64,
    ) -> Result<CmdResult, CmdError> {
        self.require_running("move the camera")?;

        let motion = MotionInputs::move_cam(pan_deg, tilt_deg, height_m);
        self.send(&ControlLine::Motion(motion))?;

        self.state.motion = Some(motion);
        self.state.last_camera_height_m = Some(height_m);
        self.mark_left_home();

        Ok(CmdResult::ok(format!(
            "camera moving to pan {} deg, tilt {} deg, height {} m",
            pan_deg, tilt_deg, height_m
        )))
    }

    fn sweep_cam(&mut self) -> Result<CmdResult, CmdError> {
        self.require_running("sweep the camera")?;

        let height_m = self.state.last_camera_height_m.ok_or_else(|| {
            CmdError::InvalidRobotState("arm is not in the move_cam position".into())
        })?;

        Ok(self.sweep.run(height_m, &mut self.channel))
    }

    fn joint_move(&mut self, joint_id: usize, dir: bool) -> Result<CmdResult, CmdError> {
        let status = self.latest_status()?;

        if !can_jog_joint(&status, joint_id) {
            return Err(CmdError::InvalidRobotState(format!(
                "robot and joint {} must be initializing, robot mode is '{}' and joint mode is \
                '{}'",
                joint_id,
                status.mode_str(),
                status.joint_mode_str(joint_id)
            )));
        }

        self.send(&ControlLine::jog_joint(joint_id, dir))?;

        self.state.last_camera_height_m = None;
        self.mark_left_home();

        Ok(CmdResult::ok(format!(
            "joint {} jogged {}",
            joint_id,
            if dir { "positive" } else { "negative" }
        )))
    }

    fn set_position(&mut self, position: Position) -> Result<CmdResult, CmdError> {
        self.require_running("set the position")?;

        let motion = MotionInputs::set_position(position);
        self.send(&ControlLine::Motion(motion))?;

        self.state.motion = Some(motion);
        self.state.last_camera_height_m = None;
        if position == Position::Giraffe {
            self.mark_left_home();
        }

        Ok(CmdResult::ok(format!("moving to {}", position)))
    }

    fn run_auto_init(&mut self, force: bool) -> CmdResult {
        let result = self.auto_init.run(force, &mut self.channel);

        if !result.success {
            return result;
        }

        info!("Auto initialisation complete, going to home position");
        self.handle(&ArmCmd::SetPosition {
            position: Position::Home.as_str().into(),
        })
    }

    fn latest_status(&self) -> Result<Arc<ArmStatus>, CmdError> {
        self.feed
            .latest()
            .ok_or_else(|| CmdError::InvalidRobotState("no arm status has been received".into()))
    }

    fn require_running(&self, action: &str) -> Result<(), CmdError> {
        let status = self.latest_status()?;

        if status.is_running() {
            Ok(())
        } else {
            Err(CmdError::InvalidRobotState(format!(
                "cannot {} as the robot mode is '{}', expected 'running'",
                action,
                status.mode_str()
            )))
        }
    }

    fn send(&mut self, line: &ControlLine) -> Result<(), CmdError> {
        debug!("Sending \"{}\"", line);
        line.send(&mut self.channel)?;
        Ok(())
    }

    fn mark_left_home(&self) {
        if let Err(e) = self.home_marker.mark_left_home() {
            warn!("Could not clear the home marker: {}", e);
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// A joint can only be jogged while the arm is initialising and the joint itself has not
/// finished initialising.
fn can_jog_joint(status: &ArmStatus, joint_id: usize) -> bool {
    status.is_initialising()
        && status.robot_mode == RobotMode::Initializing
        && status.joint_mode(joint_id) == Some(JointMode::Initializing)
}
