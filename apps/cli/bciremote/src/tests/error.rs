// Unit tests for error module

use crate::error::BciRemoteError;

use remote_core::error::CoreError;
use remote_core::error::config::ConfigError;

use common::ErrorLocation;

use std::error::Error as StdError;
use std::panic::Location;

/// **VALUE**: Tests that core errors keep their message and their source.
///
/// **WHY THIS MATTERS**: The CLI prints only the top-level error; the core message has
/// to be part of it for the user to see what went wrong.
///
/// **BUG THIS CATCHES**: Would catch the conversion dropping the inner message or source.
#[test]
fn given_config_error_when_converted_then_message_and_source_kept() {
    // GIVEN: A core validation error
    let inner = ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason: String::from("Operator port must be non-zero"),
    };

    // WHEN: Converting into the app error
    let err = BciRemoteError::from(inner);

    // THEN: The display names both layers and the source chain is intact
    let text = err.to_string();
    assert!(text.starts_with("Core Error:"), "text: {text}");
    assert!(text.contains("Operator port must be non-zero"), "text: {text}");
    assert!(matches!(
        err.source().and_then(|s| s.downcast_ref::<CoreError>()),
        Some(CoreError::Config(_))
    ));
}

/// **VALUE**: Tests the app error constructor records where it was raised.
///
/// **BUG THIS CATCHES**: Would catch `#[track_caller]` being removed from `app()`.
#[test]
fn given_app_error_when_created_then_location_is_caller() {
    // GIVEN / WHEN
    let expected_line = line!() + 1;
    let err = BciRemoteError::app("No operator");

    // THEN
    match err {
        BciRemoteError::App { message, location } => {
            assert_eq!(message, "No operator");
            assert_eq!(location.line, expected_line);
            assert!(location.file.ends_with("error.rs"));
        }
        other => panic!("Expected App error, got {other:?}"),
    }
}
