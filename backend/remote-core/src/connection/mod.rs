//! Transport and framing for the operator's telnet interface.
//!
//! A [`Connection`] owns one TCP socket and runs strictly synchronous
//! request/response exchanges over it: a command line goes out terminated by
//! CRLF, and everything the operator writes up to its prompt comes back as
//! the response. One exchange is in flight at a time; callers that share a
//! connection across threads must serialize access themselves.
//!
//! Dropping a connection disconnects it, so the socket is released on every
//! exit path.

pub mod framing;
pub mod probe;

use crate::CHANGE_TO_LAUNCH_DIR_COMMAND;
use crate::connection::framing::{ResponseAccumulator, is_empty_response};
use crate::decode::FromResponse;
use crate::error::RemoteError;

use common::ErrorLocation;

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::panic::Location;
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

const QUIT_COMMAND: &str = "Quit";
const SHOW_WINDOW_COMMAND: &str = "show window";
const HIDE_WINDOW_COMMAND: &str = "hide window";
const LINE_TERMINATOR: &str = "\r\n";
const READ_CHUNK_SIZE: usize = 4096;
const POLL_SLICE: Duration = Duration::from_millis(10);
const MIN_POLL_SLICE: Duration = Duration::from_millis(1);
const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Whether a side-effecting command must answer with silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectEmpty {
    /// Any non-blank response is the operator reporting a failure.
    Yes,
    /// Receive and discard whatever comes back.
    No,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// Wall-clock limit for one response, in milliseconds. Zero waits forever.
    pub timeout_ms: u64,
    /// Log every command and response at debug level.
    pub debug: bool,
    /// Send `Quit` to the operator before closing the socket.
    pub terminate_on_disconnect: bool,
    pub window_title: Option<String>,
    pub window_visible: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            debug: false,
            terminate_on_disconnect: false,
            window_title: None,
            window_visible: true,
        }
    }
}

impl ConnectionOptions {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

#[derive(Debug)]
struct Socket {
    stream: TcpStream,
    local: SocketAddr,
    peer: SocketAddr,
    /// Cleared once the peer closes or a read/write fails.
    alive: bool,
}

#[derive(Debug, Default)]
pub struct Connection {
    options: ConnectionOptions,
    socket: Option<Socket>,
}

impl Connection {
    pub fn new(options: ConnectionOptions) -> Self {
        Self {
            options,
            socket: None,
        }
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    pub fn set_timeout(&mut self, timeout_ms: u64) {
        self.options.timeout_ms = timeout_ms;
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.options.debug = debug;
    }

    pub fn set_terminate_on_disconnect(&mut self, terminate: bool) {
        self.options.terminate_on_disconnect = terminate;
    }

    /// Operator address this connection is attached to.
    pub fn peer(&self) -> Option<SocketAddr> {
        self.socket.as_ref().map(|s| s.peer)
    }

    /// Whether a socket is held and no failure has been observed on it.
    ///
    /// Purely local; see [`Connection::is_connected`] for the OS-level check.
    pub fn is_open(&self) -> bool {
        self.socket.as_ref().is_some_and(|s| s.alive)
    }

    /// Probe the OS-level TCP state of the socket.
    ///
    /// No round trip to the operator is made. A socket we still hold stays in
    /// the socket table until we close it, so when the table cannot be read or
    /// does not list the socket the local liveness flag is used instead.
    pub fn is_connected(&self) -> bool {
        let Some(socket) = self.socket.as_ref().filter(|s| s.alive) else {
            return false;
        };

        match probe::tcp_state(socket.local, socket.peer) {
            Ok(Some(state)) => probe::is_connected_state(state),
            Ok(None) => {
                trace!("Socket {} not listed, using local state", socket.local);
                true
            }
            Err(e) => {
                debug!("TCP state probe unavailable, using local state: {e}");
                true
            }
        }
    }

    /// Connect to the operator and run the post-connect handshake.
    ///
    /// Discards the unsolicited banner, changes into the operator's launch
    /// directory and applies the window settings. If any of that fails the
    /// socket is released before the error is returned.
    #[track_caller]
    pub fn connect(&mut self, address: &str, port: u16) -> Result<(), RemoteError> {
        if let Some(socket) = &self.socket {
            if self.is_connected() {
                return Err(RemoteError::connection(format!(
                    "Already connected to {}",
                    socket.peer
                )));
            }
            return Err(RemoteError::connection(format!(
                "Connection handle for {} is held but no longer connected; disconnect first",
                socket.peer
            )));
        }

        let addresses: Vec<SocketAddr> = (address, port)
            .to_socket_addrs()
            .map_err(|e| RemoteError::io(format!("Invalid operator address {address}:{port}"), e))?
            .collect();

        if addresses.is_empty() {
            return Err(RemoteError::connection(format!(
                "Operator address {address}:{port} did not resolve"
            )));
        }

        let stream = self.open_stream(&addresses)?;
        let peer = stream
            .peer_addr()
            .map_err(|e| RemoteError::io("Failed to read peer address", e))?;
        let local = stream
            .local_addr()
            .map_err(|e| RemoteError::io("Failed to read local address", e))?;

        info!("Connected to operator at {peer}");
        self.socket = Some(Socket {
            stream,
            local,
            peer,
            alive: true,
        });

        if let Err(e) = self.handshake() {
            warn!("Handshake with operator at {peer} failed: {e}");
            self.release();
            return Err(e);
        }

        Ok(())
    }

    fn open_stream(&self, addresses: &[SocketAddr]) -> Result<TcpStream, RemoteError> {
        let timeout = self.options.timeout();
        let mut last_error = None;

        for candidate in addresses {
            let attempt = match timeout {
                Some(t) => TcpStream::connect_timeout(candidate, t),
                None => TcpStream::connect(candidate),
            };

            match attempt {
                Ok(stream) => {
                    stream
                        .set_nodelay(true)
                        .map_err(|e| RemoteError::io("Failed to configure socket", e))?;
                    stream
                        .set_write_timeout(timeout)
                        .map_err(|e| RemoteError::io("Failed to apply send timeout", e))?;
                    return Ok(stream);
                }
                Err(e) => {
                    debug!("Connect to {candidate} failed: {e}");
                    last_error = Some((candidate, e));
                }
            }
        }

        match last_error {
            Some((candidate, e)) => Err(RemoteError::io(
                format!("Failed to connect to operator at {candidate}"),
                e,
            )),
            None => Err(RemoteError::connection("No operator address to connect to")),
        }
    }

    fn handshake(&mut self) -> Result<(), RemoteError> {
        let banner = self.receive_response()?;
        trace!("Discarded operator banner: {:?}", banner.trim());

        self.execute_expecting_empty(CHANGE_TO_LAUNCH_DIR_COMMAND, ExpectEmpty::Yes)?;

        if let Some(title) = self.options.window_title.clone() {
            self.set_window_title(&title)?;
        }
        if self.options.window_visible {
            self.show_window()
        } else {
            self.hide_window()
        }
    }

    /// Close the session. Idempotent.
    ///
    /// With terminate-on-disconnect set, the operator is first asked to quit;
    /// failures of that request are logged and do not prevent the close.
    pub fn disconnect(&mut self) {
        if self.socket.is_none() {
            return;
        }

        if self.options.terminate_on_disconnect && self.is_connected() {
            debug!("Asking operator to quit before disconnecting");
            if let Err(e) = self.execute_expecting_empty(QUIT_COMMAND, ExpectEmpty::No) {
                debug!("Operator did not answer {QUIT_COMMAND}: {e}");
            }
        }

        if let Some(peer) = self.peer() {
            info!("Disconnecting from operator at {peer}");
        }
        self.release();
    }

    fn release(&mut self) {
        if let Some(socket) = self.socket.take() {
            let _ = socket.stream.shutdown(Shutdown::Both);
        }
    }

    fn mark_lost(&mut self) {
        if let Some(peer) = self.peer() {
            warn!("Lost connection to operator at {peer}");
        }
        self.release();
    }

    /// Write one command line.
    #[track_caller]
    pub fn send_command(&mut self, command: &str) -> Result<(), RemoteError> {
        if command.contains(['\r', '\n']) {
            return Err(RemoteError::argument(format!(
                "Command must be a single line: {command:?}"
            )));
        }

        if !self.is_open() {
            if self.socket.is_some() {
                self.mark_lost();
            }
            return Err(RemoteError::connection(format!(
                "Not connected; cannot send '{command}'"
            )));
        }

        if self.options.debug {
            debug!("> {command}");
        } else {
            trace!("> {command}");
        }

        let line = format!("{command}{LINE_TERMINATOR}");
        let written = match self.socket.as_mut() {
            Some(socket) => socket
                .stream
                .write_all(line.as_bytes())
                .and_then(|_| socket.stream.flush()),
            None => return Err(RemoteError::connection("Not connected")),
        };

        if let Err(e) = written {
            self.mark_lost();
            return Err(RemoteError::io(format!("Failed to send '{command}'"), e));
        }

        Ok(())
    }

    /// Read until a chunk ends with the prompt and return the text before it.
    ///
    /// The timeout is measured from the start of the call, not between bytes.
    /// Missing it closes the connection: the exchange is out of step with the
    /// operator and cannot be resumed.
    #[track_caller]
    pub fn receive_response(&mut self) -> Result<String, RemoteError> {
        let started = Instant::now();
        let timeout = self.options.timeout();
        let mut accumulator = ResponseAccumulator::default();
        let mut buffer = [0u8; READ_CHUNK_SIZE];

        loop {
            let Some(socket) = self.socket.as_mut().filter(|s| s.alive) else {
                return Err(RemoteError::connection(
                    "Not connected while waiting for a response",
                ));
            };

            let elapsed = started.elapsed();
            let slice = match timeout {
                Some(limit) if elapsed > limit => {
                    let message = format!(
                        "No prompt within {} ms; received so far: {:?}",
                        limit.as_millis(),
                        accumulator.pending()
                    );
                    // A late reply would be framed as the next command's response.
                    warn!("{message}; closing connection to {}", socket.peer);
                    self.release();
                    return Err(RemoteError::Timeout {
                        message,
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
                Some(limit) => limit.saturating_sub(elapsed).min(POLL_SLICE),
                None => POLL_SLICE,
            };

            socket
                .stream
                .set_read_timeout(Some(slice.max(MIN_POLL_SLICE)))
                .map_err(|e| RemoteError::io("Failed to apply receive timeout", e))?;

            match socket.stream.read(&mut buffer) {
                Ok(0) => {
                    socket.alive = false;
                    self.mark_lost();
                    return Err(RemoteError::connection(
                        "Operator closed the connection before sending a prompt",
                    ));
                }
                Ok(n) => {
                    let chunk = String::from_utf8_lossy(&buffer[..n]);
                    if let Some(response) = accumulator.push_chunk(&chunk) {
                        if self.options.debug {
                            debug!("< {}", response.trim_end());
                        } else {
                            trace!("< {}", response.trim_end());
                        }
                        return Ok(response);
                    }
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                    ) =>
                {
                    continue;
                }
                Err(e) => {
                    self.mark_lost();
                    return Err(RemoteError::io("Failed to receive response", e));
                }
            }
        }
    }

    /// Send a query and decode its response.
    #[track_caller]
    pub fn execute<T: FromResponse>(&mut self, command: &str) -> Result<T, RemoteError> {
        self.send_command(command)?;
        let response = self.receive_response()?;

        T::from_response(&response).map_err(|reason| {
            RemoteError::command(format!(
                "Could not read response to '{command}' as {}: {:?} ({reason})",
                T::TYPE_NAME,
                response.trim()
            ))
        })
    }

    /// Send a command and return its response verbatim.
    #[track_caller]
    pub fn execute_raw(&mut self, command: &str) -> Result<String, RemoteError> {
        self.execute::<String>(command)
    }

    /// Send a side-effecting command whose success is signalled by silence.
    #[track_caller]
    pub fn execute_expecting_empty(
        &mut self,
        command: &str,
        expect: ExpectEmpty,
    ) -> Result<(), RemoteError> {
        self.send_command(command)?;
        let response = self.receive_response()?;

        if expect == ExpectEmpty::Yes && !is_empty_response(&response) {
            return Err(RemoteError::command(format!(
                "Operator rejected '{command}': {}",
                response.trim()
            )));
        }

        Ok(())
    }

    #[track_caller]
    pub fn set_window_title(&mut self, title: &str) -> Result<(), RemoteError> {
        if title.contains('"') {
            return Err(RemoteError::argument(format!(
                "Window title must not contain quotes: {title:?}"
            )));
        }
        self.execute_expecting_empty(&format!("set title \"{title}\""), ExpectEmpty::Yes)
    }

    #[track_caller]
    pub fn show_window(&mut self) -> Result<(), RemoteError> {
        self.execute_expecting_empty(SHOW_WINDOW_COMMAND, ExpectEmpty::Yes)
    }

    #[track_caller]
    pub fn hide_window(&mut self) -> Result<(), RemoteError> {
        self.execute_expecting_empty(HIDE_WINDOW_COMMAND, ExpectEmpty::Yes)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.disconnect();
    }
}
