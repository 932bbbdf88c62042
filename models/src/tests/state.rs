use crate::{ModelError, RemoteState, SystemState};

/// **VALUE**: Verifies every state name round-trips through its wire spelling.
///
/// **WHY THIS MATTERS**: Run-control decisions are made on the parsed live state.
///
/// **BUG THIS CATCHES**: Would catch a typo in `as_str()` or a variant missing from `ALL`.
#[test]
fn given_each_wire_name_when_parsing_then_returns_matching_state() {
    for state in SystemState::ALL {
        // GIVEN: The operator reply with a trailing newline
        let reply = format!("{}\r\n", state.as_str());

        // WHEN: Parsing
        let parsed: SystemState = reply.parse().expect("known state should parse");

        // THEN: Same variant
        assert_eq!(parsed, state);
    }
}

/// **VALUE**: Verifies case differences in the reply are tolerated.
///
/// **BUG THIS CATCHES**: Would catch exact-case comparison rejecting `running`.
#[test]
fn given_lowercase_reply_when_parsing_then_matches() {
    assert_eq!("  running ".parse::<SystemState>().ok(), Some(SystemState::Running));
}

/// **VALUE**: Verifies unknown replies are rejected with the offending text.
///
/// **WHY THIS MATTERS**: An operator error message in place of a state name must not be
/// mistaken for a state; the text is needed to diagnose what went wrong.
///
/// **BUG THIS CATCHES**: Would catch a fallback to a default state.
#[test]
fn given_unknown_reply_when_parsing_then_error_carries_text() {
    // WHEN: Parsing an operator error
    let result = "Unknown command".parse::<SystemState>();

    // THEN: The error names the reply
    match result {
        Err(ModelError::UnknownSystemState { text, .. }) => assert_eq!(text, "Unknown command"),
        other => panic!("Expected unknown state error, got {other:?}"),
    }
}

/// **VALUE**: Verifies the run-control classification of states.
///
/// **BUG THIS CATCHES**: Would catch `Running` or `Busy` being treated as startable.
#[test]
fn given_states_when_classifying_then_start_and_config_sets_are_disjoint() {
    let startable: Vec<_> = SystemState::ALL.into_iter().filter(SystemState::accepts_start).collect();
    let needs_config: Vec<_> = SystemState::ALL.into_iter().filter(SystemState::needs_config).collect();

    assert_eq!(
        startable,
        vec![SystemState::Resting, SystemState::Suspended, SystemState::ParamsModified]
    );
    assert_eq!(needs_config, vec![SystemState::Initialization, SystemState::Connected]);
}

/// **VALUE**: Verifies the pipe-joined form used by `wait for`.
#[test]
fn given_state_set_when_joining_then_pipe_separated() {
    assert_eq!(
        SystemState::join(&[SystemState::Connected, SystemState::Initialization]),
        "Connected|Initialization"
    );
}

/// **VALUE**: Verifies local setup progress is ordered and starts disconnected.
///
/// **BUG THIS CATCHES**: Would catch reordered variants breaking progress comparisons.
#[test]
fn given_remote_states_when_comparing_then_ordered_by_progress() {
    assert_eq!(RemoteState::default(), RemoteState::Disconnected);
    assert!(RemoteState::Disconnected < RemoteState::Idle);
    assert!(RemoteState::Idle < RemoteState::ModulesConnected);
    assert!(RemoteState::ModulesConnected < RemoteState::Configured);
}
