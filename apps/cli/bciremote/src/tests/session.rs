use crate::cli::{Cli, Commands};
use crate::error::BciRemoteError;
use crate::session::{ensure_operator, execute, load_session};

use remote_core::config::SessionConfig;

use std::fs;
use std::net::TcpListener;

use clap::Parser;
use tempfile::TempDir;

fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().expect("addr").port()
}

/// **VALUE**: Verifies `--verbose` turns on wire tracing for the session.
///
/// **BUG THIS CATCHES**: Would catch the flag only raising the log level while the
/// connection still hides commands at trace.
#[test]
fn given_verbose_flag_when_loading_session_then_connection_debug_enabled() {
    // GIVEN: A session file without debug
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("session.toml");
    fs::write(&path, "[operator]\nport = 4000\n").expect("write");
    let cli = Cli::try_parse_from([
        "bciremote",
        "--verbose",
        "--session",
        path.to_str().expect("utf-8 path"),
        "state",
    ])
    .expect("valid command line");

    // WHEN
    let config = load_session(&cli).expect("load");

    // THEN
    assert_eq!(config.operator.port, 4000);
    assert!(config.connection.debug);
}

/// **VALUE**: Verifies an unreachable operator without an executable is reported clearly.
///
/// **BUG THIS CATCHES**: Would catch a launch being attempted with no executable.
#[tokio::test]
async fn given_no_operator_and_no_executable_when_ensuring_then_app_error() {
    // GIVEN
    let mut config = SessionConfig::default();
    config.operator.port = closed_port();

    // WHEN
    let result = ensure_operator(&config).await;

    // THEN
    assert!(matches!(result, Err(BciRemoteError::App { .. })));
}

/// **VALUE**: Verifies connection failures surface as core errors.
///
/// **BUG THIS CATCHES**: Would catch protocol errors being flattened into app errors.
#[test]
fn given_closed_port_when_executing_then_core_error() {
    // GIVEN
    let mut config = SessionConfig::default();
    config.operator.port = closed_port();

    // WHEN
    let result = execute(&config, &Commands::State);

    // THEN
    assert!(matches!(result, Err(BciRemoteError::Core { .. })));
}
