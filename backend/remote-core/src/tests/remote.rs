use crate::remote::{format_seconds, path_argument, wait_command};

use models::SystemState;

use std::time::Duration;

/// **VALUE**: Verifies the wait command joins states with `|` and omits a missing timeout.
///
/// **WHY THIS MATTERS**: Without a timeout the operator blocks and answers with an
/// empty prompt; with one it answers a boolean. Mixing them up desynchronizes decoding.
///
/// **BUG THIS CATCHES**: Would catch a trailing `0` or empty field being sent for `None`.
#[test]
fn given_states_without_timeout_when_building_wait_command_then_no_timeout_field() {
    // GIVEN: Two target states
    let states = [SystemState::Connected, SystemState::Initialization];

    // WHEN: Building the command without timeout
    let command = wait_command(&states, None);

    // THEN: States are pipe-joined and nothing follows
    assert_eq!(command, "wait for Connected|Initialization");
}

/// **VALUE**: Verifies timeouts are rendered in seconds.
///
/// **BUG THIS CATCHES**: Would catch milliseconds being sent where seconds are expected.
#[test]
fn given_timeout_when_building_wait_command_then_seconds_appended() {
    // GIVEN / WHEN
    let whole = wait_command(&[SystemState::Resting], Some(Duration::from_secs(5)));
    let fractional = wait_command(&[SystemState::Running], Some(Duration::from_millis(1500)));

    // THEN
    assert_eq!(whole, "wait for Resting 5");
    assert_eq!(fractional, "wait for Running 1.5");
    assert_eq!(format_seconds(Duration::from_millis(250)), "0.25");
}

/// **VALUE**: Verifies only paths with whitespace are quoted.
///
/// **BUG THIS CATCHES**: Would catch a path with spaces being split into several
/// arguments by the operator's command parser.
#[test]
fn given_paths_when_formatting_argument_then_quoted_only_when_needed() {
    // GIVEN / WHEN / THEN
    assert_eq!(path_argument("../parms/a.prm"), "../parms/a.prm");
    assert_eq!(
        path_argument("C:/My Experiments/a.prm"),
        "\"C:/My Experiments/a.prm\""
    );
}
