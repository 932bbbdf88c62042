use crate::operator_stub::OperatorStub;

use bciremote::session::shutdown_operator;

use remote_core::config::SessionConfig;

use std::fs;
use std::net::TcpListener;
use std::process::Command;

use tempfile::TempDir;

fn session_for(port: u16) -> SessionConfig {
    let mut config = SessionConfig::default();
    config.operator.address = "127.0.0.1".to_string();
    config.operator.port = port;
    config.operator.quit_timeout_secs = 1;
    config
}

/// **VALUE**: Verifies `bciremote state` prints only the state on stdout.
///
/// **WHY THIS MATTERS**: Scripts pipe the output of `state` and `exec`; log lines
/// mixed into stdout break them.
///
/// **BUG THIS CATCHES**: Would catch the console log being sent to stdout.
#[test]
fn given_running_operator_when_querying_state_then_stdout_holds_only_result() {
    // GIVEN: A reachable operator and a session file pointing at it
    let operator = OperatorStub::start();
    let dir = TempDir::new().expect("temp dir");
    let session = dir.path().join("session.toml");
    fs::write(
        &session,
        format!("[operator]\naddress = \"127.0.0.1\"\nport = {}\n", operator.port()),
    )
    .expect("write session");

    // WHEN
    let output = Command::new(env!("CARGO_BIN_EXE_bciremote"))
        .arg("--session")
        .arg(&session)
        .arg("--log-dir")
        .arg(dir.path())
        .arg("state")
        .output()
        .expect("run bciremote");

    // THEN
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr: {stderr}");
    assert_eq!(stdout, "Idle\n");
    assert!(stderr.contains("bciremote starting"), "stderr: {stderr}");
}

/// **VALUE**: Verifies `quit` succeeds once the operator closes its port.
///
/// **BUG THIS CATCHES**: Would catch `Quit` not being sent, or the shutdown waiting
/// on a port that is already gone.
#[tokio::test]
async fn given_operator_honours_quit_when_shutting_down_then_ok() {
    // GIVEN
    let operator = OperatorStub::start();
    let config = session_for(operator.port());

    // WHEN
    let result = shutdown_operator(&config).await;

    // THEN
    assert!(result.is_ok(), "{result:?}");
    assert!(operator.commands().contains(&"Quit".to_string()));
}

/// **VALUE**: Verifies an operator that keeps listening after `Quit` is not reported as stopped.
///
/// **WHY THIS MATTERS**: The operator listening here is this test process, which
/// must be refused as a stop target; a real hung operator is stopped by PID instead.
///
/// **BUG THIS CATCHES**: Would catch `quit` claiming success while the port stays open,
/// or signalling its own process.
#[tokio::test]
async fn given_operator_ignores_quit_when_shutting_down_then_error() {
    // GIVEN
    let operator = OperatorStub::start_ignoring_quit();
    let config = session_for(operator.port());

    // WHEN
    let result = shutdown_operator(&config).await;

    // THEN
    assert!(result.is_err());
    assert!(operator.commands().contains(&"Quit".to_string()));
}

/// **VALUE**: Verifies `quit` with nothing listening is a no-op.
///
/// **BUG THIS CATCHES**: Would catch an attempt to connect or stop a process when
/// the operator is already gone.
#[tokio::test]
async fn given_no_operator_when_shutting_down_then_ok() {
    // GIVEN
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    // WHEN
    let result = shutdown_operator(&session_for(port)).await;

    // THEN
    assert!(result.is_ok(), "{result:?}");
}
