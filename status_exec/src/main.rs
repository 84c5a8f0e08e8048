//! # Arm Status Filter
//!
//! Reads the arm controller's status feed on stdin and writes the selected fields of each status
//! to stdout, either as CSV lines or as binary records.
//!
//! Logs go to stderr so that stdout only carries status records.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod output;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::info;
use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use structopt::StructOpt;

// Internal
use arm_if::{
    feed::{run_feed, FeedReader, InputMode},
    status::fields,
};
use output::StatusWriter;
use util::{
    logger::{logger_init, LevelFilter},
    session,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Arm status filter
#[derive(Debug, StructOpt)]
#[structopt(name = "status_exec")]
struct Opts {
    /// Write binary records instead of CSV lines
    #[structopt(short, long)]
    binary: bool,

    /// Print the binary format of the selected fields and exit
    #[structopt(long)]
    format: bool,

    /// Print the names of the selected fields and exit
    #[structopt(long)]
    output_fields: bool,

    /// Read `name=value` record lines instead of network order packets
    #[structopt(long, alias = "host-byte-order")]
    record: bool,

    /// Comma separated fields to output, `joint_modes` or `position` select every element
    #[structopt(long, default_value = "")]
    fields: String,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    let selected = fields::select(&opts.fields).wrap_err("Invalid field selection")?;

    // ---- INTROSPECTION ----

    if opts.output_fields {
        println!("{}", fields::names(&selected));
        return Ok(());
    }

    if opts.format {
        println!("{}", fields::binary_format(&selected));
        return Ok(());
    }

    // ---- EARLY INITIALISATION ----

    session::init_epoch().wrap_err("Failed to initialise the session epoch")?;
    logger_init(LevelFilter::Info, None).wrap_err("Failed to initialise logging")?;

    let mode = if opts.record {
        InputMode::Record
    } else {
        InputMode::Network
    };

    info!("Arm Status Filter ({:?} input)", mode);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.store(true, Ordering::Relaxed))
            .wrap_err("Failed to set the interrupt handler")?;
    }

    // ---- MAIN LOOP ----

    let stdin = io::stdin();
    let stdout = io::stdout();

    let mut writer = if opts.binary {
        StatusWriter::binary(selected, stdout.lock())
    } else {
        StatusWriter::csv(selected, stdout.lock())
    };

    let end = run_feed(FeedReader::new(stdin.lock(), mode), &shutdown, |status| {
        writer.write(&status)
    })
    .wrap_err("Status feed failed")?;

    info!("Status feed ended ({:?})", end);

    Ok(())
}
