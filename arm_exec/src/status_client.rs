//! # Status Client
//!
//! Connects to the arm controller's status feed and publishes every status it receives into a
//! [`StatusFeed`] from a background thread.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use arm_if::feed::{run_feed, FeedEnd, FeedError, FeedReader, InputMode, StatusFeed};
use log::{error, info};
use std::{
    io::{self, BufRead, BufReader},
    net::{Shutdown, TcpStream},
    sync::{atomic::AtomicBool, Arc},
    thread::{self, JoinHandle},
};

use crate::params::ArmExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Status client
pub struct StatusClient {
    handle: JoinHandle<Result<FeedEnd, FeedError>>,

    /// Handle on the feed's socket, used to unblock the feed thread when stopping.
    socket: Option<TcpStream>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StatusClientError {
    #[error("Could not connect to the status feed at {0}: {1}")]
    ConnectError(String, io::Error),

    #[error("Could not start the status feed thread: {0}")]
    SpawnError(io::Error),

    #[error("The status feed failed: {0}")]
    FeedError(FeedError),

    #[error("The status feed thread panicked")]
    ThreadPanicked,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StatusClient {
    /// Connect to the status feed and start publishing statuses into `feed`.
    ///
    /// The feed thread stops at the end of the stream, on a feed error, or once `shutdown` is
    /// set.
    pub fn connect(
        params: &ArmExecParams,
        feed: StatusFeed,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self, StatusClientError> {
        let stream = TcpStream::connect(&params.status_endpoint)
            .map_err(|e| StatusClientError::ConnectError(params.status_endpoint.clone(), e))?;

        info!("Connected to the status feed at {}", params.status_endpoint);

        let socket = stream
            .try_clone()
            .map_err(|e| StatusClientError::ConnectError(params.status_endpoint.clone(), e))?;

        let mut client = Self::start(BufReader::new(stream), params.input_mode, feed, shutdown)?;
        client.socket = Some(socket);

        Ok(client)
    }

    /// Start publishing statuses read from any stream.
    pub fn start<R>(
        reader: R,
        mode: InputMode,
        feed: StatusFeed,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self, StatusClientError>
    where
        R: BufRead + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name("status_client".into())
            .spawn(move || {
                let result = run_feed(FeedReader::new(reader, mode), &shutdown, |status| {
                    feed.publish(status);
                    Ok(())
                });

                if let Err(ref e) = result {
                    error!("Status feed stopped: {}", e);
                }

                result
            })
            .map_err(StatusClientError::SpawnError)?;

        Ok(Self {
            handle,
            socket: None,
        })
    }

    /// True while the feed thread is still reading statuses.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Close the feed's socket, if there is one, and wait for the feed thread to stop.
    pub fn stop(self) -> Result<FeedEnd, StatusClientError> {
        if let Some(socket) = &self.socket {
            // The socket may already be closed by the peer
            socket.shutdown(Shutdown::Both).ok();
        }

        self.join()
    }

    /// Wait for the feed thread to stop.
    pub fn join(self) -> Result<FeedEnd, StatusClientError> {
        match self.handle.join() {
            Ok(r) => r.map_err(StatusClientError::FeedError),
            Err(_) => Err(StatusClientError::ThreadPanicked),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use arm_if::{packet::PACKET_SIZE, NUM_JOINTS};
    use std::{
        io::{Cursor, Read, Write},
        net::TcpListener,
        sync::atomic::Ordering,
        thread,
        time::{Duration, Instant},
    };

    #[test]
    fn test_client_publishes_records() {
        let mut line = String::from("length=812,robot_mode=0");
        for i in 0..NUM_JOINTS {
            line.push_str(&format!(",joint_modes[{}]=253,joint_angles[{}]=0.1", i, i));
        }
        line.push('\n');

        let feed = StatusFeed::new();
        let client = StatusClient::start(
            Cursor::new(line.into_bytes()),
            InputMode::Record,
            feed.clone(),
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();

        assert_eq!(client.join().unwrap(), FeedEnd::Eof);

        let status = feed.latest().unwrap();
        assert!(status.is_running());
        assert_eq!(status.joint_angles_rad, [0.1; NUM_JOINTS]);
    }

    #[test]
    fn test_client_reports_feed_errors() {
        let feed = StatusFeed::new();
        let client = StatusClient::start(
            Cursor::new(vec![0u8; 100]),
            InputMode::Network,
            feed.clone(),
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();

        assert!(matches!(
            client.join(),
            Err(StatusClientError::FeedError(_))
        ));
        assert!(feed.latest().is_none());
    }

    #[test]
    fn test_stop_mid_packet_is_clean() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();

        // A powered off arm followed by the start of the next packet
        let mut packet = vec![0u8; PACKET_SIZE];
        packet[..4].copy_from_slice(&(PACKET_SIZE as u32).to_be_bytes());
        packet[4 + 8 * 94..4 + 8 * 95].copy_from_slice(&7f64.to_be_bytes());

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(&packet).unwrap();
            stream.write_all(&packet[..300]).unwrap();

            // Hold the connection open until the client closes it
            let mut buf = [0u8; 1];
            stream.read(&mut buf).ok();
        });

        let params: ArmExecParams = util::params::parse(&format!(
            r#"
            status_endpoint = "{}"
            control_endpoint = "127.0.0.1:1"
            input_mode = "network"
            home_marker_path = "/tmp/arm_at_home"

            [auto_init]
            poll_period_s = 0.02
            joint_timeout_s = 30.0
            jog_positive = false

            [sweep]
            pan_limit_deg = 90.0
            tilt_deg = 0.0
            dwell_s = 5.0
            "#,
            endpoint
        ))
        .unwrap();

        let feed = StatusFeed::new();
        let shutdown = Arc::new(AtomicBool::new(false));
        let client = StatusClient::connect(&params, feed.clone(), shutdown.clone()).unwrap();

        let start = Instant::now();
        while feed.latest().is_none() {
            assert!(start.elapsed() < Duration::from_secs(5), "no status received");
            thread::sleep(Duration::from_millis(1));
        }
        assert!(feed.latest().unwrap().is_powered_off());

        shutdown.store(true, Ordering::Relaxed);
        assert_eq!(client.stop().unwrap(), FeedEnd::Shutdown);

        server.join().unwrap();
    }
}
