use remote_core::discovery::launch::launch_operator;
use remote_core::discovery::port::{is_port_reachable, wait_for_port, wait_for_port_closed};
use remote_core::discovery::process::{discover_on_port, stop_pid};
use remote_core::error::discovery::DiscoveryError;
use remote_core::error::launch::LaunchError;

use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

const GRACE: Duration = Duration::from_millis(200);

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().expect("addr").port()
}

// ----------------------------------------------------------------------------
// stop_pid() - Process termination tests
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies that `stop_pid()` gracefully handles non-existent processes.
///
/// **WHY THIS MATTERS**: An operator can exit between discovery and the stop request.
///
/// **BUG THIS CATCHES**: Would catch `stop_pid()` panicking on a missing PID.
#[test]
fn given_nonexistent_pid_when_stop_pid_called_then_returns_false() {
    // GIVEN: A PID that doesn't exist
    let fake_pid = u32::MAX;

    // WHEN
    let result = stop_pid(fake_pid, GRACE);

    // THEN
    assert!(!result, "Should return false for non-existent process");
}

/// **VALUE**: Refuses to signal PID 0 or PID 1.
///
/// **WHY THIS MATTERS**: Signalling PID 1 takes down the whole system; PID 0 addresses
/// the caller's process group.
///
/// **BUG THIS CATCHES**: Would catch the reserved-PID guard being removed.
#[test]
fn given_reserved_pids_when_stop_pid_called_then_refuses() {
    // GIVEN / WHEN / THEN
    assert!(!stop_pid(0, GRACE), "Should never signal PID 0");
    assert!(!stop_pid(1, GRACE), "Should never kill PID 1 (init process)");
}

/// **VALUE**: Refuses to signal the calling process.
///
/// **WHY THIS MATTERS**: An operator found on a port can turn out to be this very
/// process, e.g. when it hosts the listener itself.
///
/// **BUG THIS CATCHES**: Would catch the client terminating itself while stopping
/// an operator that ignored `Quit`.
#[test]
fn given_own_pid_when_stop_pid_called_then_refuses() {
    // GIVEN
    let own_pid = std::process::id();

    // WHEN
    let result = stop_pid(own_pid, GRACE);

    // THEN
    assert!(!result);
}

// ----------------------------------------------------------------------------
// discover_on_port() - Port lookup tests
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies a listener in this process is found and reported as not owned.
///
/// **BUG THIS CATCHES**: Would catch discovered processes being marked as owned, which
/// would let a client stop an operator it did not start.
#[test]
fn given_listener_when_discovering_port_then_own_process_found() {
    // GIVEN
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();

    // WHEN
    let Ok(found) = discover_on_port(port) else {
        // Socket tables are not readable in every sandbox
        return;
    };

    // THEN
    let Some(process) = found else {
        // Socket-to-process mapping needs procfs access
        return;
    };
    assert_eq!(process.port, port);
    assert_eq!(process.pid, std::process::id());
    assert!(!process.owned);
}

/// **VALUE**: Verifies an unused port yields no process.
///
/// **BUG THIS CATCHES**: Would catch client-side sockets being matched as listeners.
#[test]
fn given_unused_port_when_discovering_then_none() {
    // GIVEN
    let port = free_port();

    // WHEN
    let result = discover_on_port(port);

    // THEN
    if let Ok(found) = result {
        assert!(found.is_none());
    }
}

// ----------------------------------------------------------------------------
// wait_for_port() - Availability tests
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies an open port is reported immediately.
///
/// **BUG THIS CATCHES**: Would catch the first probe being skipped.
#[tokio::test]
async fn given_listening_port_when_waiting_then_ok() {
    // GIVEN
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();

    // WHEN
    let result = wait_for_port("127.0.0.1", port, Duration::from_secs(2)).await;

    // THEN
    assert!(result.is_ok(), "{result:?}");
    assert!(is_port_reachable("127.0.0.1", port).await);
}

/// **VALUE**: Verifies waiting on a closed port ends in a timeout.
///
/// **BUG THIS CATCHES**: Would catch an unbounded retry loop.
#[tokio::test]
async fn given_closed_port_when_waiting_then_timeout() {
    // GIVEN
    let port = free_port();

    // WHEN
    let result = wait_for_port("127.0.0.1", port, Duration::from_millis(300)).await;

    // THEN
    assert!(matches!(result, Err(DiscoveryError::Timeout { .. })));
}

/// **VALUE**: Verifies a port that opens later is picked up.
///
/// **WHY THIS MATTERS**: An operator takes a moment to open its telnet port after launch.
///
/// **BUG THIS CATCHES**: Would catch the poller giving up after the first refusal.
#[tokio::test]
async fn given_port_opens_later_when_waiting_then_ok() {
    // GIVEN: A port that starts listening after a delay
    let port = free_port();
    let opener = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        let listener = TcpListener::bind(("127.0.0.1", port)).expect("bind late");
        std::thread::sleep(Duration::from_secs(3));
        drop(listener);
    });

    // WHEN
    let result = wait_for_port("127.0.0.1", port, Duration::from_secs(5)).await;

    // THEN
    assert!(result.is_ok(), "{result:?}");
    let _ = opener.join();
}

/// **VALUE**: Verifies a port whose listener goes away is reported closed.
///
/// **WHY THIS MATTERS**: `quit` relies on this to tell whether the operator honoured `Quit`.
///
/// **BUG THIS CATCHES**: Would catch the closed-port wait returning on the first
/// successful probe instead of the first refusal.
#[tokio::test]
async fn given_listener_closes_later_when_waiting_for_close_then_ok() {
    // GIVEN: A listener that goes away after a delay
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let closer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(300));
        drop(listener);
    });

    // WHEN
    let result = wait_for_port_closed("127.0.0.1", port, Duration::from_secs(5)).await;

    // THEN
    assert!(result.is_ok(), "{result:?}");
    let _ = closer.join();
}

/// **VALUE**: Verifies a port that keeps listening ends the close wait in a timeout.
///
/// **BUG THIS CATCHES**: Would catch an operator that ignored `Quit` being reported as gone.
#[tokio::test]
async fn given_port_stays_open_when_waiting_for_close_then_timeout() {
    // GIVEN
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();

    // WHEN
    let result = wait_for_port_closed("127.0.0.1", port, Duration::from_millis(300)).await;

    // THEN
    assert!(matches!(result, Err(DiscoveryError::Timeout { .. })));
    drop(listener);
}

// ----------------------------------------------------------------------------
// launch_operator() - Launch failure tests
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies a missing executable is a spawn error, not a timeout.
///
/// **BUG THIS CATCHES**: Would catch spawn failures being retried until the launch timeout.
#[tokio::test]
async fn given_missing_executable_when_launching_then_spawn_error() {
    // GIVEN
    let exe = Path::new("/nonexistent/bci2000/Operator");

    // WHEN
    let result = launch_operator(exe, "127.0.0.1", free_port(), Duration::from_secs(1)).await;

    // THEN
    assert!(matches!(result, Err(LaunchError::Spawn { .. })));
}

/// **VALUE**: Verifies a launched operator keeps running after `launch_operator` returns.
///
/// **WHY THIS MATTERS**: The operator is meant to outlive the client that started it;
/// later invocations connect to it or ask it to quit.
///
/// **BUG THIS CATCHES**: Would catch the child being killed when its handle is dropped.
#[cfg(unix)]
#[tokio::test]
async fn given_port_ready_when_launching_then_operator_outlives_handle() {
    use std::os::unix::fs::PermissionsExt;
    use sysinfo::{Pid, ProcessesToUpdate, System};

    // GIVEN: A stand-in executable and a port that is already listening
    let dir = tempfile::TempDir::new().expect("temp dir");
    let exe = dir.path().join("Operator");
    std::fs::write(&exe, "#!/bin/sh\nexec sleep 5\n").expect("write script");
    std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();

    // WHEN
    let process = launch_operator(&exe, "127.0.0.1", port, Duration::from_secs(2))
        .await
        .expect("launch");
    tokio::time::sleep(Duration::from_millis(200)).await;

    // THEN
    assert!(process.owned);
    assert_eq!(process.port, port);
    let pid = Pid::from_u32(process.pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    let running = system.process(pid);
    assert!(running.is_some(), "operator {pid} should still be running");
    if let Some(p) = running {
        p.kill();
    }
    drop(listener);
}
