use crate::error::discovery::DiscoveryError;

use common::ErrorLocation;

use std::panic::Location;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, info, trace};
use tokio::net::TcpStream as TokioTcpStream;
use tokio::time::sleep as TokioSleep;
use tokio::time::timeout as TokioTimeout;

const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Check once whether `address:port` accepts a TCP connection.
///
/// The probe connection is dropped immediately. An operator treats this as a
/// client that connected and left, so it is safe against a live session.
pub async fn is_port_reachable(address: &str, port: u16) -> bool {
    match TokioTimeout(PROBE_TIMEOUT, TokioTcpStream::connect((address, port))).await {
        Ok(Ok(_stream)) => {
            trace!("Port {address}:{port} accepted a probe connection");
            true
        }
        Ok(Err(e)) => {
            trace!("Port {address}:{port} refused probe: {e}");
            false
        }
        Err(_) => {
            trace!("Probe of {address}:{port} timed out after {PROBE_TIMEOUT:?}");
            false
        }
    }
}

/// Wait until `address:port` accepts connections, retrying with exponential backoff.
///
/// # Returns
///
/// * `Ok(())` - As soon as a probe connection succeeds
/// * `Err(DiscoveryError::Timeout)` - If the port stayed closed for `max_elapsed`
pub async fn wait_for_port(
    address: &str,
    port: u16,
    max_elapsed: Duration,
) -> Result<(), DiscoveryError> {
    debug!("Waiting for {address}:{port} to accept connections");
    poll_port(address, port, true, max_elapsed).await?;
    info!("Operator port {address}:{port} is reachable");
    Ok(())
}

/// Wait until `address:port` refuses connections, e.g. after asking the operator to quit.
///
/// # Returns
///
/// * `Ok(())` - As soon as a probe connection fails
/// * `Err(DiscoveryError::Timeout)` - If the port kept accepting for `max_elapsed`
pub async fn wait_for_port_closed(
    address: &str,
    port: u16,
    max_elapsed: Duration,
) -> Result<(), DiscoveryError> {
    debug!("Waiting for {address}:{port} to close");
    poll_port(address, port, false, max_elapsed).await?;
    info!("Operator port {address}:{port} is closed");
    Ok(())
}

async fn poll_port(
    address: &str,
    port: u16,
    reachable: bool,
    max_elapsed: Duration,
) -> Result<(), DiscoveryError> {
    let mut backoff = ExponentialBackoff {
        max_elapsed_time: Some(max_elapsed),
        ..Default::default()
    };

    loop {
        if is_port_reachable(address, port).await == reachable {
            return Ok(());
        }

        match backoff.next_backoff() {
            Some(duration) => {
                trace!("Port {address}:{port} not there yet, retrying after {duration:?}");
                TokioSleep(duration).await;
            }
            None => {
                let expected = if reachable {
                    "accept connections"
                } else {
                    "close"
                };
                return Err(DiscoveryError::Timeout {
                    message: format!("{address}:{port} did not {expected} within {max_elapsed:?}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
    }
}
