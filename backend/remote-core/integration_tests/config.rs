use crate::fake_operator::FakeOperator;

use remote_core::config::SessionConfig;
use remote_core::connection::Connection;
use remote_core::error::config::ConfigError;
use remote_core::remote::Remote;

use models::RemoteState;

use std::fs;

use tempfile::TempDir;

/// **VALUE**: Verifies a missing session file yields the default session.
///
/// **BUG THIS CATCHES**: Would catch a first run failing because no session file exists yet.
#[test]
fn given_missing_file_when_loading_then_defaults() {
    // GIVEN
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("session.toml");

    // WHEN
    let config = SessionConfig::load(&path).expect("defaults");

    // THEN
    assert_eq!(config, SessionConfig::default());
}

/// **VALUE**: Verifies a session file on disk is read and validated.
///
/// **BUG THIS CATCHES**: Would catch `load` skipping validation for files from disk.
#[test]
fn given_invalid_file_when_loading_then_validation_error() {
    // GIVEN
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("session.toml");
    fs::write(&path, "[[modules]]\nname = \"Signal Generator\"\n").expect("write");

    // WHEN
    let result = SessionConfig::load(&path);

    // THEN
    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

/// **VALUE**: Verifies applying a session issues declarations, startup and parameters in order.
///
/// **WHY THIS MATTERS**: Declarations are only accepted before modules start and
/// parameter files only after; the order is the contract.
///
/// **BUG THIS CATCHES**: Would catch declarations being sent after `startup system`,
/// or parameter files before it.
#[test]
fn given_session_file_when_applied_then_commands_follow_setup_order() {
    // GIVEN: A session on disk and a connected remote
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("session.toml");
    fs::write(
        &path,
        r#"
[[modules]]
name = "SignalGenerator"

[[parameters]]
section = "Application:Remote"
name = "Subject"

[[states]]
name = "Trial"
bits = 8

[[events]]
name = "Marker"
bits = 16

[run]
parameter_files = ["a.prm"]

[run.parameters]
SubjectName = "S01"
"#,
    )
    .expect("write");
    let config = SessionConfig::load(&path).expect("load");

    let operator = FakeOperator::start();
    let mut remote = Remote::with_default_hooks(Connection::new(config.connection.clone()));
    remote
        .connect(&operator.address(), operator.port())
        .expect("connect");

    // WHEN
    config.apply(&mut remote).expect("apply");

    // THEN
    assert_eq!(remote.local_state(), RemoteState::ModulesConnected);
    assert_eq!(
        operator.commands(),
        vec![
            "add parameter Application:Remote variant Subject= % % %".to_string(),
            "add state Trial 8 0".to_string(),
            "add event Marker 16 0".to_string(),
            "startup system".to_string(),
            "start executable SignalGenerator --local".to_string(),
            "wait for Connected|Initialization".to_string(),
            "load parameters a.prm".to_string(),
            "set parameter SubjectName \"S01\"".to_string(),
        ]
    );
}
