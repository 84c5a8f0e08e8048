//! Automatic initialisation by jogging each joint in turn

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use std::{
    io::Write,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Instant,
};

// Internal
use super::{AutoInitRoutine, HomeMarker};
use crate::params::AutoInitParams;
use arm_if::{
    cmd::{CmdError, CmdResult},
    ctrl::ControlLine,
    feed::StatusFeed,
    status::{ArmStatus, JointMode, RobotMode},
    NUM_JOINTS,
};
use util::time::seconds_to_std;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Initialises the arm by jogging each joint until it reports running.
///
/// Joints are taken from the wrist down to the base. Each poll period the latest status is
/// checked and, if the joint is still initialising, it is jogged once more.
pub struct JointJogAutoInit {
    feed: StatusFeed,

    home_marker: Arc<dyn HomeMarker + Send + Sync>,

    shutdown: Arc<AtomicBool>,

    params: AutoInitParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointJogAutoInit {
    pub fn new(
        feed: StatusFeed,
        home_marker: Arc<dyn HomeMarker + Send + Sync>,
        shutdown: Arc<AtomicBool>,
        params: AutoInitParams,
    ) -> Self {
        Self {
            feed,
            home_marker,
            shutdown,
            params,
        }
    }

    fn initialise(&self, force: bool, channel: &mut dyn Write) -> Result<(), CmdError> {
        let status = self.latest_status()?;

        if !status.is_initialising() {
            return Err(CmdError::InvalidRobotState(format!(
                "cannot auto initialise as the robot mode is '{}', expected 'initializing'",
                status.mode_str()
            )));
        }

        if !force && !self.home_marker.is_at_home() {
            return Err(CmdError::InvalidRobotState(
                "arm is not known to be at home, use auto_init_force to initialise anyway".into(),
            ));
        }

        info!("Starting auto initialisation (force: {})", force);

        for joint_id in (0..NUM_JOINTS).rev() {
            if self.initialise_joint(joint_id, channel)? {
                info!("Arm left initialisation, remaining joints skipped");
                break;
            }
        }

        Ok(())
    }

    /// Jog a joint until it is running.
    ///
    /// Returns true if the whole arm is running already.
    fn initialise_joint(&self, joint_id: usize, channel: &mut dyn Write) -> Result<bool, CmdError> {
        let period = seconds_to_std(self.params.poll_period_s);
        let timeout = seconds_to_std(self.params.joint_timeout_s);
        let start = Instant::now();
        let mut num_jogs = 0;

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                return Err(CmdError::InvalidRobotState(
                    "auto initialisation interrupted by shutdown".into(),
                ));
            }

            let status = self.latest_status()?;

            match status.robot_mode {
                RobotMode::Initializing => (),
                RobotMode::Running => return Ok(true),
                _ => {
                    return Err(CmdError::InvalidRobotState(format!(
                        "arm left initialisation in mode '{}'",
                        status.mode_str()
                    )))
                }
            }

            match status.joint_modes[joint_id] {
                JointMode::Initializing => (),
                JointMode::Running => {
                    info!("Joint {} initialised after {} jogs", joint_id, num_jogs);
                    return Ok(false);
                }
                m => {
                    return Err(CmdError::InvalidRobotState(format!(
                        "joint {} is '{}' during initialisation",
                        joint_id, m
                    )))
                }
            }

            if start.elapsed() > timeout {
                return Err(CmdError::InvalidRobotState(format!(
                    "joint {} did not initialise within {} s",
                    joint_id, self.params.joint_timeout_s
                )));
            }

            ControlLine::jog_joint(joint_id, self.params.jog_positive).send(channel)?;
            num_jogs += 1;
            debug!("Joint {} jog {}", joint_id, num_jogs);

            thread::sleep(period);
        }
    }

    fn latest_status(&self) -> Result<Arc<ArmStatus>, CmdError> {
        self.feed
            .latest()
            .ok_or_else(|| CmdError::InvalidRobotState("no arm status has been received".into()))
    }
}

impl AutoInitRoutine for JointJogAutoInit {
    fn run(&mut self, force: bool, channel: &mut dyn Write) -> CmdResult {
        match self.initialise(force, channel) {
            Ok(()) => CmdResult::ok("auto initialisation complete"),
            Err(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use arm_if::cmd::ErrorKind;
    use std::{io, sync::atomic::AtomicBool};

    struct FakeMarker(bool);

    impl HomeMarker for FakeMarker {
        fn mark_left_home(&self) -> io::Result<()> {
            Ok(())
        }

        fn is_at_home(&self) -> bool {
            self.0
        }
    }

    /// An arm which finishes initialising the highest initialising joint on every jog.
    struct FakeArm {
        feed: StatusFeed,
        pending: Vec<u8>,
        lines: Vec<String>,
    }

    impl FakeArm {
        fn new(feed: &StatusFeed) -> Self {
            Self {
                feed: feed.clone(),
                pending: Vec::new(),
                lines: Vec::new(),
            }
        }

        fn on_line(&mut self, line: String) {
            self.lines.push(line);

            if let Some(status) = self.feed.latest() {
                let mut joint_modes = status.joint_modes;
                if let Some(m) = joint_modes
                    .iter_mut()
                    .rev()
                    .find(|m| **m == JointMode::Initializing)
                {
                    *m = JointMode::Running;
                }

                let robot_mode = if joint_modes.iter().all(|m| *m == JointMode::Running) {
                    RobotMode::Running
                } else {
                    RobotMode::Initializing
                };

                self.feed.publish(ArmStatus::new(
                    robot_mode,
                    joint_modes,
                    status.joint_angles_rad,
                ));
            }
        }
    }

    impl Write for FakeArm {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.pending.extend_from_slice(buf);

            while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = self.pending.drain(..=pos).collect();
                self.on_line(String::from_utf8_lossy(&line).trim().to_string());
            }

            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn params(joint_timeout_s: f64) -> AutoInitParams {
        AutoInitParams {
            poll_period_s: 0.001,
            joint_timeout_s,
            jog_positive: true,
        }
    }

    fn routine(feed: &StatusFeed, at_home: bool, timeout_s: f64) -> JointJogAutoInit {
        JointJogAutoInit::new(
            feed.clone(),
            Arc::new(FakeMarker(at_home)),
            Arc::new(AtomicBool::new(false)),
            params(timeout_s),
        )
    }

    fn initialising() -> ArmStatus {
        ArmStatus::new(
            RobotMode::Initializing,
            [JointMode::Initializing; NUM_JOINTS],
            [0.0; NUM_JOINTS],
        )
    }

    #[test]
    fn test_jogs_from_wrist_to_base() {
        let feed = StatusFeed::new();
        feed.publish(initialising());

        let mut arm = FakeArm::new(&feed);

        let r = routine(&feed, true, 1.0).run(false, &mut arm);
        assert!(r.success, "{:?}", r);
        assert_eq!(arm.lines.len(), NUM_JOINTS);

        // First jog moves the wrist, last moves the base
        assert_eq!(
            arm.lines[0],
            ControlLine::jog_joint(5, true).to_string()
        );
        assert_eq!(
            arm.lines[5],
            ControlLine::jog_joint(0, true).to_string()
        );
        assert!(feed.latest().unwrap().is_running());
    }

    #[test]
    fn test_requires_home_unless_forced() {
        let feed = StatusFeed::new();
        feed.publish(initialising());

        let mut channel = Vec::new();
        let r = routine(&feed, false, 1.0).run(false, &mut channel);
        assert_eq!(r.error, ErrorKind::InvalidRobotState);
        assert!(channel.is_empty());

        let mut arm = FakeArm::new(&feed);
        assert!(routine(&feed, false, 1.0).run(true, &mut arm).success);
    }

    #[test]
    fn test_requires_initialising() {
        let feed = StatusFeed::new();
        feed.publish(ArmStatus::new(
            RobotMode::Running,
            [JointMode::Running; NUM_JOINTS],
            [0.0; NUM_JOINTS],
        ));

        let mut channel = Vec::new();
        let r = routine(&feed, true, 1.0).run(false, &mut channel);
        assert_eq!(r.error, ErrorKind::InvalidRobotState);
        assert!(channel.is_empty());
    }

    #[test]
    fn test_joint_timeout() {
        let feed = StatusFeed::new();
        feed.publish(initialising());

        // The arm never reacts
        let mut channel = Vec::new();
        let r = routine(&feed, true, 0.01).run(false, &mut channel);

        assert_eq!(r.error, ErrorKind::InvalidRobotState);
        assert!(r.message.contains("joint 5"));
        assert!(!channel.is_empty());
    }

    #[test]
    fn test_shutdown_interrupts() {
        let feed = StatusFeed::new();
        feed.publish(initialising());

        let mut init = JointJogAutoInit::new(
            feed.clone(),
            Arc::new(FakeMarker(true)),
            Arc::new(AtomicBool::new(true)),
            params(1.0),
        );

        let mut channel = Vec::new();
        let r = init.run(false, &mut channel);
        assert!(r.message.contains("shutdown"));
        assert!(channel.is_empty());
    }
}
