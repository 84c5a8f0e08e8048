//! # Arm Command Daemon
//!
//! Accepts high level arm commands and drives the arm controller.
//!
//! # Architecture
//!
//! - The status client thread keeps the latest arm status up to date from the controller's
//!   status feed.
//! - The command input thread reads one JSON command per line from stdin.
//! - The main thread handles each command against the latest status and writes one JSON result
//!   per line to stdout. Between commands it watches for a shutdown request or the status feed
//!   stopping.
//!
//! Logs go to stderr and the session log file, stdout only carries results.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::{debug, info, warn};
use std::{
    io::{self, Write},
    net::TcpStream,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use structopt::StructOpt;

// Internal
use arm_if::{
    cmd::{ArmCmd, CmdResult},
    feed::StatusFeed,
};
use arm_lib::{
    arm_ctrl::{CmdHandler, FileHomeMarker, HomeMarker, JointJogAutoInit, PanSweep},
    cmd_input::CmdInput,
    params::ArmExecParams,
    status_client::StatusClient,
};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// How often the shutdown flag and status feed are checked while waiting for a command.
const CMD_POLL_PERIOD: Duration = Duration::from_millis(100);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Arm command daemon
#[derive(Debug, StructOpt)]
#[structopt(name = "arm_exec")]
struct Opts {
    /// Parameter file, relative to `$ARM_SW_ROOT/params`
    #[structopt(long, default_value = "arm_exec.toml")]
    params: String,

    /// Log debug messages
    #[structopt(short, long)]
    verbose: bool,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    let level = if opts.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logger_init(level, Some(session.log_file_path.as_path()))
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Arm Command Daemon\n");
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let params: ArmExecParams =
        util::params::load(&opts.params).wrap_err("Could not load arm_exec params")?;

    info!("Parameters loaded");
    debug!("{:#?}", params);

    // ---- SHUTDOWN HANDLER ----

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.store(true, Ordering::Relaxed))
            .wrap_err("Failed to set the interrupt handler")?;
    }

    // ---- STATUS FEED ----

    let feed = StatusFeed::new();
    let status_client = StatusClient::connect(&params, feed.clone(), shutdown.clone())
        .wrap_err("Failed to start the status client")?;

    info!("StatusClient initialised");

    // ---- CONTROL CHANNEL ----

    let control = TcpStream::connect(&params.control_endpoint).wrap_err_with(|| {
        format!(
            "Failed to connect to the control channel at {}",
            params.control_endpoint
        )
    })?;

    info!("Connected to the control channel at {}", params.control_endpoint);

    // ---- COMMAND HANDLER ----

    let home_marker: Arc<dyn HomeMarker + Send + Sync> =
        Arc::new(FileHomeMarker::new(&params.home_marker_path));

    let mut handler = CmdHandler::new(
        feed.clone(),
        control,
        home_marker.clone(),
        Box::new(JointJogAutoInit::new(
            feed.clone(),
            home_marker,
            shutdown.clone(),
            params.auto_init.clone(),
        )),
        Box::new(PanSweep::new(shutdown.clone(), params.sweep.clone())),
    );

    info!("CmdHandler initialised");

    // ---- MAIN LOOP ----

    info!("Initialisation complete, waiting for commands");

    let input = CmdInput::start(io::BufReader::new(io::stdin()))
        .wrap_err("Failed to start the command input")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let keep_going = || {
        if shutdown.load(Ordering::Relaxed) {
            info!("Shutdown requested");
            false
        } else if !status_client.is_running() {
            warn!("Status feed stopped, no more commands will be handled");
            false
        } else {
            true
        }
    };

    while let Some(line) = input
        .next_line(CMD_POLL_PERIOD, &keep_going)
        .wrap_err("Failed to read a command")?
    {
        if line.trim().is_empty() {
            continue;
        }

        let result = match ArmCmd::from_json(&line) {
            Ok(cmd) => handler.handle(&cmd),
            Err(e) => {
                warn!("Could not parse command \"{}\": {}", line, e);
                CmdResult::from(e)
            }
        };

        serde_json::to_writer(&mut out, &result).wrap_err("Failed to write a result")?;
        writeln!(out).wrap_err("Failed to write a result")?;
        out.flush().wrap_err("Failed to write a result")?;
    }

    // ---- SHUTDOWN ----

    info!("Stopping the status client");
    shutdown.store(true, Ordering::Relaxed);

    match status_client.stop() {
        Ok(end) => {
            info!("Status feed ended ({:?})", end);
            Ok(())
        }
        Err(e) => Err(eyre!(e)).wrap_err("Status feed failed"),
    }
}
