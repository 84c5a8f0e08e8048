//! # Command Input
//!
//! Reads command lines on a background thread so that the main loop can keep watching the
//! shutdown flag and the status feed while no command arrives.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    io::{self, BufRead},
    sync::mpsc::{channel, Receiver, RecvTimeoutError},
    thread,
    time::Duration,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Lines read from the command input.
pub struct CmdInput {
    lines: Receiver<io::Result<String>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CmdInput {
    /// Start reading lines from `reader`.
    ///
    /// The reader thread is not joined, a blocked read on stdin cannot be interrupted and ends
    /// with the process.
    pub fn start<R>(reader: R) -> io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, lines) = channel();

        thread::Builder::new()
            .name("cmd_input".into())
            .spawn(move || {
                for line in reader.lines() {
                    let failed = line.is_err();
                    if tx.send(line).is_err() || failed {
                        break;
                    }
                }
            })?;

        Ok(Self { lines })
    }

    /// Wait for the next line.
    ///
    /// `keep_going` is checked every `poll_period` while waiting. Returns `None` once it returns
    /// false or the input has ended.
    pub fn next_line<F>(&self, poll_period: Duration, keep_going: F) -> io::Result<Option<String>>
    where
        F: Fn() -> bool,
    {
        loop {
            if !keep_going() {
                return Ok(None);
            }

            match self.lines.recv_timeout(poll_period) {
                Ok(line) => return line.map(Some),
                Err(RecvTimeoutError::Timeout) => (),
                Err(RecvTimeoutError::Disconnected) => return Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{
        io::{BufReader, Cursor, Read},
        sync::{
            atomic::{AtomicBool, Ordering},
            mpsc::Sender,
        },
        time::Instant,
    };

    const PERIOD: Duration = Duration::from_millis(5);

    /// Input which never delivers anything while the sender is alive.
    struct Silent(Receiver<()>);

    impl Read for Silent {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            self.0.recv().ok();
            Ok(0)
        }
    }

    fn silent() -> (Sender<()>, CmdInput) {
        let (tx, rx) = channel();
        let input = CmdInput::start(BufReader::new(Silent(rx))).unwrap();
        (tx, input)
    }

    #[test]
    fn test_reads_lines_until_end() {
        let input = CmdInput::start(Cursor::new(b"first\n\nsecond\n".to_vec())).unwrap();

        assert_eq!(input.next_line(PERIOD, || true).unwrap().as_deref(), Some("first"));
        assert_eq!(input.next_line(PERIOD, || true).unwrap().as_deref(), Some(""));
        assert_eq!(input.next_line(PERIOD, || true).unwrap().as_deref(), Some("second"));
        assert_eq!(input.next_line(PERIOD, || true).unwrap(), None);
    }

    #[test]
    fn test_stops_waiting_when_told() {
        let (_tx, input) = silent();
        let stop = AtomicBool::new(false);

        // Stop is requested while the input is idle
        let start = Instant::now();
        let line = input
            .next_line(PERIOD, || {
                if start.elapsed() > Duration::from_millis(20) {
                    stop.store(true, Ordering::Relaxed);
                }
                !stop.load(Ordering::Relaxed)
            })
            .unwrap();

        assert_eq!(line, None);
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
