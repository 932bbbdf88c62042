use crate::{ModelError, OperatorProcessBuilder};

/// **VALUE**: Verifies that builder validation rejects zero PIDs.
///
/// **WHY THIS MATTERS**: PID 0 is never a real operator process. Letting it through
/// would make `stop_pid()` target the scheduler on some platforms.
///
/// **BUG THIS CATCHES**: Would catch if the PID zero check is deleted during refactoring.
#[test]
fn given_zero_pid_when_building_operator_process_then_returns_validation_error() {
    // GIVEN: Builder with PID set to zero
    let builder = OperatorProcessBuilder::default()
        .with_pid(0)
        .with_port(3999)
        .with_name("Operator");

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    match result {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "PID must be non-zero");
        }
        other => panic!("Expected validation error, got {other:?}"),
    }
}

/// **VALUE**: Verifies that builder validation rejects a missing port.
///
/// **WHY THIS MATTERS**: The port is how the client reaches the operator's telnet
/// interface. An operator record without it cannot be connected to.
///
/// **BUG THIS CATCHES**: Would catch if the required-field check for port is removed.
#[test]
fn given_missing_port_when_building_then_returns_validation_error() {
    // GIVEN: Builder without port
    let builder = OperatorProcessBuilder::default()
        .with_pid(4242)
        .with_name("Operator");

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error naming the port
    match result {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "Port is required");
        }
        other => panic!("Expected validation error, got {other:?}"),
    }
}

/// **VALUE**: Verifies that builder validation rejects empty names.
///
/// **WHY THIS MATTERS**: The name is what logs show when the client stops an operator.
///
/// **BUG THIS CATCHES**: Would catch if the empty-name check is dropped.
#[test]
fn given_empty_name_when_building_then_returns_validation_error() {
    // GIVEN: Builder with an empty name
    let builder = OperatorProcessBuilder::default()
        .with_pid(4242)
        .with_port(3999)
        .with_name("");

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    assert!(matches!(result, Err(ModelError::Validation { .. })));
}

/// **VALUE**: Verifies that a fully specified builder produces the expected record.
///
/// **WHY THIS MATTERS**: Discovery and launch both go through this builder. Any field
/// mix-up here would surface as the wrong process being stopped.
///
/// **BUG THIS CATCHES**: Would catch swapped fields or lost `owned` flags.
#[test]
fn given_all_valid_fields_when_building_then_returns_operator_process() {
    // GIVEN: A fully populated builder
    let builder = OperatorProcessBuilder::default()
        .with_pid(4242)
        .with_port(3999)
        .with_name("Operator")
        .with_command("Operator --Telnet 127.0.0.1:3999 --StartupIdle")
        .with_owned(true);

    // WHEN: Building
    let process = builder.build().expect("valid builder should build");

    // THEN: All fields should be carried over
    assert_eq!(process.pid, 4242);
    assert_eq!(process.port, 3999);
    assert_eq!(process.name, "Operator");
    assert_eq!(
        process.command,
        "Operator --Telnet 127.0.0.1:3999 --StartupIdle"
    );
    assert!(process.owned);
}

/// **VALUE**: Verifies optional fields fall back to safe defaults.
///
/// **WHY THIS MATTERS**: A discovered operator we did not launch must never be
/// considered owned, otherwise a later cleanup would terminate someone else's session.
///
/// **BUG THIS CATCHES**: Would catch if the `owned` default flips to `true`.
#[test]
fn given_no_owned_flag_when_building_then_defaults_to_not_owned() {
    // GIVEN: Builder without owned flag or command
    let builder = OperatorProcessBuilder::default()
        .with_pid(4242)
        .with_port(3999)
        .with_name("Operator");

    // WHEN: Building
    let process = builder.build().expect("valid builder should build");

    // THEN: Should not be owned and have an empty command
    assert!(!process.owned);
    assert!(process.command.is_empty());
}
