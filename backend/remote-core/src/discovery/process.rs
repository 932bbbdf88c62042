use crate::error::discovery::DiscoveryError;

use common::ErrorLocation;
use models::{OperatorProcess, OperatorProcessBuilder};

use std::panic::Location;
use std::thread::sleep;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, trace, warn};
use netstat2::{
    AddressFamilyFlags, ProtocolFlags, ProtocolSocketInfo, SocketInfo, TcpState, get_sockets_info,
};
use sysinfo::{Pid, Process, ProcessesToUpdate, Signal, System};

const KILL_VERIFY_MAX_ELAPSED: Duration = Duration::from_secs(5);

/// Lowest PID that may be stopped. 0 and 1 belong to the system.
const MIN_STOPPABLE_PID: u32 = 2;

#[track_caller]
pub(crate) fn query_tcp_sockets() -> Result<Vec<SocketInfo>, DiscoveryError> {
    get_sockets_info(
        AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6,
        ProtocolFlags::TCP,
    )
    .map_err(|e| DiscoveryError::NetworkQuery {
        message: format!("Failed to query network sockets: {e}"),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(e),
    })
}

#[track_caller]
pub(crate) fn with_process<F, R>(pid: u32, f: F) -> Option<R>
where
    F: FnOnce(&Process) -> R,
{
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), true);

    sys.process(Pid::from_u32(pid)).map(f)
}

pub(crate) fn format_command(process: &Process) -> String {
    process
        .cmd()
        .iter()
        .map(|s| s.to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Find the process listening on `port`.
///
/// The result is never marked as owned: a process found this way was started
/// by someone else and [`stop_pid`] should only be used on it deliberately.
///
/// # Returns
///
/// * `Ok(Some(OperatorProcess))` - If a listening process was found and is still alive
/// * `Ok(None)` - If nothing listens on the port
/// * `Err(DiscoveryError)` - If the socket table could not be read
#[track_caller]
pub fn discover_on_port(port: u16) -> Result<Option<OperatorProcess>, DiscoveryError> {
    let sockets = query_tcp_sockets()?;

    for s in sockets {
        if let ProtocolSocketInfo::Tcp(tcp) = s.protocol_socket_info
            && tcp.state == TcpState::Listen
            && tcp.local_port == port
            && let Some(&pid) = s.associated_pids.first()
        {
            trace!("Found process {pid} listening on port {port}");

            let data = with_process(pid, |p| {
                (p.name().to_string_lossy().to_string(), format_command(p))
            });

            if let Some((name, command)) = data {
                debug!("Discovered operator: {name} (PID: {pid}) on port {port}");

                let operator = OperatorProcessBuilder::default()
                    .with_pid(pid)
                    .with_port(port)
                    .with_name(name)
                    .with_command(command)
                    .with_owned(false)
                    .build()?;

                return Ok(Some(operator));
            }

            trace!("Process {pid} disappeared before we could read its info");
        }
    }

    debug!("No process found listening on port {port}");
    Ok(None)
}

/// Stop an operator process, escalating from SIGTERM to SIGKILL.
///
/// The process gets `grace` to exit after SIGTERM. If it is still running it
/// is killed and given a few more seconds to disappear. The calling process
/// and PIDs 0 and 1 are never signalled.
///
/// # Returns
///
/// * `true` - If the process is gone
/// * `false` - If the PID was refused, not running, or survived both signals
pub fn stop_pid(pid: u32, grace: Duration) -> bool {
    if pid < MIN_STOPPABLE_PID || pid == std::process::id() {
        warn!("Refusing to stop PID {pid}");
        return false;
    }

    let Some(terminated) = send_signal(pid, Signal::Term) else {
        debug!("Process {pid} not found");
        return false;
    };

    if terminated && wait_for_exit(pid, grace) {
        return true;
    }

    warn!("Process {pid} still running after SIGTERM, killing it");
    match send_signal(pid, Signal::Kill) {
        None => true,
        Some(true) => wait_for_exit(pid, KILL_VERIFY_MAX_ELAPSED),
        Some(false) => {
            warn!("Could not kill process {pid}");
            false
        }
    }
}

/// `None` if the process is not running.
fn send_signal(pid: u32, signal: Signal) -> Option<bool> {
    with_process(pid, |p| {
        let sent = p.kill_with(signal).unwrap_or_else(|| p.kill());
        debug!("Sent {signal:?} to PID {pid}: success={sent}");
        sent
    })
}

fn wait_for_exit(pid: u32, max_elapsed: Duration) -> bool {
    let mut backoff = ExponentialBackoff {
        max_elapsed_time: Some(max_elapsed),
        ..Default::default()
    };

    loop {
        if with_process(pid, |_| ()).is_none() {
            debug!("Process {pid} terminated");
            return true;
        }

        match backoff.next_backoff() {
            Some(duration) => {
                trace!("Process {pid} still alive, retrying after {duration:?}");
                sleep(duration);
            }
            None => {
                debug!("Process {pid} still running after {max_elapsed:?}");
                return false;
            }
        }
    }
}
