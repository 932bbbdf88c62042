use crate::config::{SessionConfig, default_session_path};
use crate::error::config::ConfigError;
use crate::{OPERATOR_DEFAULT_ADDRESS, OPERATOR_DEFAULT_PORT};

use std::path::Path;

const SESSION_PATH: &str = "session.toml";

/// **VALUE**: Verifies a complete session file parses into all sections.
///
/// **WHY THIS MATTERS**: The session file is the only way the CLI learns which
/// modules to start and what to declare.
///
/// **BUG THIS CATCHES**: Would catch a renamed field or a missing `[[array]]` table mapping.
#[test]
fn given_full_session_text_when_parsed_then_all_sections_populated() {
    // GIVEN: A session file using every section
    let text = r#"
        [operator]
        address = "10.0.0.5"
        port = 4000
        executable = "/opt/bci2000/prog/Operator"
        launch_timeout_secs = 30

        [connection]
        timeout_ms = 5000
        debug = true
        window_title = "Session 1"
        window_visible = false

        [[modules]]
        name = "SignalGenerator"
        args = ["LogKeyboard=1"]

        [[modules]]
        name = "DummySignalProcessing"

        [[parameters]]
        section = "Application:Remote"
        name = "Subject"
        default = "S01"

        [[states]]
        name = "Trial"
        bits = 8

        [[events]]
        name = "Marker"
        bits = 16
        initial = 1

        [run]
        parameter_files = ["../parms/a.prm"]
        auto_start = true

        [run.parameters]
        SamplingRate = "256Hz"
    "#;

    // WHEN: Parsing
    let config = SessionConfig::parse(Path::new(SESSION_PATH), text).expect("valid session");

    // THEN: Every section is populated
    assert_eq!(config.operator.address, "10.0.0.5");
    assert_eq!(config.operator.port, 4000);
    assert_eq!(config.operator.launch_timeout_secs, 30);
    assert_eq!(config.connection.timeout_ms, 5000);
    assert!(config.connection.debug);
    assert!(!config.connection.window_visible);
    assert_eq!(config.connection.window_title.as_deref(), Some("Session 1"));
    assert_eq!(config.modules.len(), 2);
    assert_eq!(config.modules[0].args, vec!["LogKeyboard=1".to_string()]);
    assert!(config.modules[1].args.is_empty());
    assert_eq!(config.parameters[0].default.as_deref(), Some("S01"));
    assert_eq!(config.states[0].initial, 0);
    assert_eq!(config.events[0].initial, 1);
    assert!(config.run.auto_start);
    assert_eq!(
        config.run.parameters.get("SamplingRate").map(String::as_str),
        Some("256Hz")
    );
}

/// **VALUE**: Verifies an empty file means the default session.
///
/// **BUG THIS CATCHES**: Would catch a required section making an empty file unparseable.
#[test]
fn given_empty_session_text_when_parsed_then_defaults_apply() {
    // GIVEN / WHEN
    let config = SessionConfig::parse(Path::new(SESSION_PATH), "").expect("empty is valid");

    // THEN
    assert_eq!(config, SessionConfig::default());
    assert_eq!(config.operator.address, OPERATOR_DEFAULT_ADDRESS);
    assert_eq!(config.operator.port, OPERATOR_DEFAULT_PORT);
    assert_eq!(config.connection.timeout_ms, 1000);
    assert!(config.connection.window_visible);
    assert!(!config.connection.terminate_on_disconnect);
}

/// **VALUE**: Verifies declarations are validated at load time.
///
/// **WHY THIS MATTERS**: A bad bit width would otherwise only fail after modules
/// were already half set up.
///
/// **BUG THIS CATCHES**: Would catch `validate()` skipping the state list.
#[test]
fn given_state_with_zero_bits_when_parsed_then_validation_error() {
    // GIVEN: A state with an out-of-range bit width
    let text = r#"
        [[states]]
        name = "Trial"
        bits = 0
    "#;

    // WHEN: Parsing
    let result = SessionConfig::parse(Path::new(SESSION_PATH), text);

    // THEN: Validation rejects it
    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

/// **VALUE**: Verifies duplicate modules are rejected.
///
/// **BUG THIS CATCHES**: Would catch the same module being started twice.
#[test]
fn given_duplicate_module_when_parsed_then_validation_error() {
    // GIVEN
    let text = r#"
        [[modules]]
        name = "SignalGenerator"

        [[modules]]
        name = "SignalGenerator"
    "#;

    // WHEN
    let result = SessionConfig::parse(Path::new(SESSION_PATH), text);

    // THEN
    match result {
        Err(ConfigError::ValidationError { reason, .. }) => {
            assert!(reason.contains("SignalGenerator"), "reason: {reason}");
        }
        other => panic!("Expected validation error, got {other:?}"),
    }
}

/// **VALUE**: Verifies a zero port is rejected.
///
/// **BUG THIS CATCHES**: Would catch port 0 reaching `connect`, which fails with a
/// confusing OS error.
#[test]
fn given_zero_port_when_parsed_then_validation_error() {
    // GIVEN / WHEN
    let result = SessionConfig::parse(Path::new(SESSION_PATH), "[operator]\nport = 0\n");

    // THEN
    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

/// **VALUE**: Verifies malformed TOML is reported as a parse error with the path.
///
/// **BUG THIS CATCHES**: Would catch parse failures being swallowed into defaults.
#[test]
fn given_malformed_text_when_parsed_then_parse_error_names_path() {
    // GIVEN / WHEN
    let result = SessionConfig::parse(Path::new(SESSION_PATH), "[operator\nport = ");

    // THEN
    match result {
        Err(ConfigError::ParseError { path, .. }) => assert_eq!(path, Path::new(SESSION_PATH)),
        other => panic!("Expected parse error, got {other:?}"),
    }
}

/// **VALUE**: Verifies the default session path ends in the application directory.
///
/// **BUG THIS CATCHES**: Would catch the file name or directory being changed.
#[test]
fn given_config_dir_when_resolving_default_path_then_ends_with_app_file() {
    // GIVEN / WHEN
    let Ok(path) = default_session_path() else {
        // No config directory on this platform or user
        return;
    };

    // THEN
    assert!(path.ends_with("bciremote/session.toml"), "path: {}", path.display());
}
