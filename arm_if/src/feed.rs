//! # Status Feed
//!
//! The status feed is read by a single thread which publishes each decoded status into a
//! [`StatusFeed`]. Any number of readers can then take the latest status without blocking the
//! feed, and a reader never sees a partially decoded status.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use arc_swap::ArcSwapOption;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{
    io::{self, BufRead},
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use thiserror::Error;

// Internal
use crate::{
    packet::{DecodeError, PacketReader, PACKET_SIZE},
    record,
    status::{ArmStatus, RobotMode},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Shared handle to the latest arm status.
#[derive(Clone, Default)]
pub struct StatusFeed {
    latest: Arc<ArcSwapOption<ArmStatus>>,
}

/// Reads statuses from a stream in either input form.
pub struct FeedReader<R: BufRead> {
    source: Source<R>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Form of the status input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Fixed size network order packets.
    Network,

    /// `name=value` record lines.
    Record,
}

enum Source<R: BufRead> {
    Network(PacketReader<R>),
    Record { reader: R, line: String },
}

/// How the feed loop ended, when it ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEnd {
    /// The input stream closed.
    Eof,

    /// Shutdown was requested.
    Shutdown,
}

#[derive(Debug, Error)]
pub enum SanityError {
    #[error(
        "Expected a packet length of {expected} bytes but got {actual}, check the controller \
        version or the input byte order"
    )]
    UnexpectedLength { expected: usize, actual: u32 },

    #[error("Robot mode {0} is outside the known range, the stream is likely misaligned")]
    UnknownRobotMode(RobotMode),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Could not decode the status: {0}")]
    Decode(#[from] DecodeError),

    #[error("First status of the feed failed the sanity check: {0}")]
    Sanity(#[from] SanityError),

    #[error("Could not deliver the status: {0}")]
    Sink(io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StatusFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the latest status.
    pub fn publish(&self, status: ArmStatus) {
        self.latest.store(Some(Arc::new(status)));
    }

    /// Get the latest status, if one has been received.
    pub fn latest(&self) -> Option<Arc<ArmStatus>> {
        self.latest.load_full()
    }
}

impl FromStr for InputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "network" => Ok(InputMode::Network),
            "record" => Ok(InputMode::Record),
            _ => Err(format!("Unknown input mode \"{}\"", s)),
        }
    }
}

impl<R: BufRead> FeedReader<R> {
    pub fn new(reader: R, mode: InputMode) -> Self {
        let source = match mode {
            InputMode::Network => Source::Network(PacketReader::new(reader)),
            InputMode::Record => Source::Record {
                reader,
                line: String::new(),
            },
        };

        Self { source }
    }

    /// Read the next status from the stream.
    pub fn read_status(&mut self) -> Result<ArmStatus, DecodeError> {
        match &mut self.source {
            Source::Network(packets) => packets.read_status(),
            Source::Record { reader, line } => loop {
                line.clear();

                if reader.read_line(line)? == 0 {
                    return Err(DecodeError::Eof);
                }

                if line.trim().is_empty() {
                    continue;
                }

                let pairs = record::parse_record_line(line)?;
                return record::decode_record(&pairs);
            },
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Check that a status looks like it came from an aligned stream.
pub fn check_sanity(status: &ArmStatus) -> Result<(), SanityError> {
    if status.length as usize != PACKET_SIZE {
        return Err(SanityError::UnexpectedLength {
            expected: PACKET_SIZE,
            actual: status.length,
        });
    }

    if status.robot_mode == RobotMode::Unknown {
        return Err(SanityError::UnknownRobotMode(status.robot_mode));
    }

    Ok(())
}

/// Read statuses until the stream ends or shutdown is requested, passing each one to `sink`.
///
/// The first status is sanity checked before it is passed on. The shutdown flag is checked
/// before each read, and a read which fails once shutdown has been requested ends the feed
/// cleanly.
pub fn run_feed<R, F>(
    mut reader: FeedReader<R>,
    shutdown: &AtomicBool,
    mut sink: F,
) -> Result<FeedEnd, FeedError>
where
    R: BufRead,
    F: FnMut(ArmStatus) -> io::Result<()>,
{
    let mut first = true;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("Shutdown requested, stopping the status feed");
            return Ok(FeedEnd::Shutdown);
        }

        let status = match reader.read_status() {
            Ok(s) => s,
            Err(DecodeError::Eof) => {
                info!("Status stream closed");
                return Ok(FeedEnd::Eof);
            }
            // Closing the stream to stop the feed can cut a packet short
            Err(e) if shutdown.load(Ordering::Relaxed) => {
                info!("Status stream closed during shutdown ({})", e);
                return Ok(FeedEnd::Shutdown);
            }
            Err(e) => return Err(e.into()),
        };

        if first {
            check_sanity(&status)?;
            debug!("First status passed the sanity check ({})", status.mode_str());
            first = false;
        }

        sink(status).map_err(FeedError::Sink)?;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{packet::test::build_packet, NUM_JOINTS};
    use byteorder::{BigEndian, ByteOrder};
    use std::io::{Cursor, Read};

    fn network_reader(packets: &[[u8; PACKET_SIZE]]) -> FeedReader<Cursor<Vec<u8>>> {
        let bytes: Vec<u8> = packets.iter().flat_map(|p| p.iter().copied()).collect();
        FeedReader::new(Cursor::new(bytes), InputMode::Network)
    }

    #[test]
    fn test_feed_publishes_latest() {
        let feed = StatusFeed::new();
        assert!(feed.latest().is_none());

        let reader = network_reader(&[
            build_packet(7.0, [239.0; NUM_JOINTS], [0.0; NUM_JOINTS]),
            build_packet(0.0, [253.0; NUM_JOINTS], [0.0; NUM_JOINTS]),
        ]);

        let shutdown = AtomicBool::new(false);
        let publisher = feed.clone();
        let end = run_feed(reader, &shutdown, |s| {
            publisher.publish(s);
            Ok(())
        })
        .unwrap();

        assert_eq!(end, FeedEnd::Eof);
        assert!(feed.latest().unwrap().is_running());
    }

    #[test]
    fn test_feed_sanity_check_on_first_packet() {
        let mut bad = build_packet(0.0, [253.0; NUM_JOINTS], [0.0; NUM_JOINTS]);
        BigEndian::write_u32(&mut bad[0..4], 1044);

        let shutdown = AtomicBool::new(false);
        let result = run_feed(network_reader(&[bad]), &shutdown, |_| Ok(()));
        assert!(matches!(
            result,
            Err(FeedError::Sanity(SanityError::UnexpectedLength { actual: 1044, .. }))
        ));

        let bad = build_packet(11.0, [253.0; NUM_JOINTS], [0.0; NUM_JOINTS]);
        let result = run_feed(network_reader(&[bad]), &shutdown, |_| Ok(()));
        assert!(matches!(
            result,
            Err(FeedError::Sanity(SanityError::UnknownRobotMode(_)))
        ));

        // Only the first packet is checked
        let good = build_packet(10.0, [253.0; NUM_JOINTS], [0.0; NUM_JOINTS]);
        let odd = build_packet(11.0, [253.0; NUM_JOINTS], [0.0; NUM_JOINTS]);
        let mut count = 0;
        let result = run_feed(network_reader(&[good, odd]), &shutdown, |_| {
            count += 1;
            Ok(())
        });
        assert_eq!(result.unwrap(), FeedEnd::Eof);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_feed_truncated_is_error() {
        let packet = build_packet(0.0, [253.0; NUM_JOINTS], [0.0; NUM_JOINTS]);
        let reader = FeedReader::new(Cursor::new(packet[..500].to_vec()), InputMode::Network);

        let shutdown = AtomicBool::new(false);
        assert!(matches!(
            run_feed(reader, &shutdown, |_| Ok(())),
            Err(FeedError::Decode(DecodeError::Truncated { actual: 500, .. }))
        ));
    }

    #[test]
    fn test_feed_shutdown() {
        let reader = network_reader(&[build_packet(0.0, [253.0; NUM_JOINTS], [0.0; NUM_JOINTS])]);

        let shutdown = AtomicBool::new(true);
        let mut count = 0;
        let end = run_feed(reader, &shutdown, |_| {
            count += 1;
            Ok(())
        })
        .unwrap();

        assert_eq!(end, FeedEnd::Shutdown);
        assert_eq!(count, 0);
    }

    /// Stream which requests shutdown once its data runs out, as closing the socket does.
    struct ClosedOnShutdown<'a> {
        data: Cursor<Vec<u8>>,
        shutdown: &'a AtomicBool,
    }

    impl io::Read for ClosedOnShutdown<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.data.read(buf)?;
            if n == 0 {
                self.shutdown.store(true, Ordering::Relaxed);
            }
            Ok(n)
        }
    }

    #[test]
    fn test_feed_cut_short_by_shutdown() {
        let packet = build_packet(0.0, [253.0; NUM_JOINTS], [0.0; NUM_JOINTS]);
        let mut bytes = packet.to_vec();
        bytes.extend_from_slice(&packet[..300]);

        let shutdown = AtomicBool::new(false);
        let stream = ClosedOnShutdown {
            data: Cursor::new(bytes),
            shutdown: &shutdown,
        };
        let reader = FeedReader::new(io::BufReader::new(stream), InputMode::Network);

        let mut count = 0;
        let end = run_feed(reader, &shutdown, |_| {
            count += 1;
            Ok(())
        })
        .unwrap();

        assert_eq!(end, FeedEnd::Shutdown);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_feed_record_input() {
        let mut line = String::from("length=812,robot_mode=7");
        for i in 0..NUM_JOINTS {
            line.push_str(&format!(",joint_modes[{}]=239,joint_angles[{}]=0", i, i));
        }
        let input = format!("{}\n\n{}\n", line, line);

        let reader = FeedReader::new(Cursor::new(input.into_bytes()), InputMode::Record);
        let shutdown = AtomicBool::new(false);

        let mut statuses = Vec::new();
        let end = run_feed(reader, &shutdown, |s| {
            statuses.push(s);
            Ok(())
        })
        .unwrap();

        assert_eq!(end, FeedEnd::Eof);
        assert_eq!(statuses.len(), 2);
        assert!(statuses[1].is_powered_off());
    }

    #[test]
    fn test_input_mode_from_str() {
        assert_eq!("record".parse::<InputMode>(), Ok(InputMode::Record));
        assert!("packets".parse::<InputMode>().is_err());
    }
}
