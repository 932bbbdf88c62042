use crate::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies that `ErrorLocation::from()` captures the exact call site.
///
/// **WHY THIS MATTERS**: Every protocol error in the workspace embeds an `ErrorLocation`.
/// When an operator session fails halfway through setup, the location is what tells us
/// which command builder or state gate produced the failure.
///
/// **BUG THIS CATCHES**: Would catch if the `From<&Location>` conversion drops or
/// swaps the file, line or column fields.
#[test]
fn given_location_caller_when_error_location_created_then_captures_file_line_column() {
    // GIVEN: The location of this very line
    let expected_line = line!() + 3;

    // WHEN: Creating ErrorLocation from caller
    let location = ErrorLocation::from(Location::caller());

    // THEN: Should capture file, line, and column
    assert!(
        location.file.contains("error_location.rs"),
        "Should capture file path"
    );
    assert_eq!(location.line, expected_line, "Should capture correct line number");
    assert!(location.column > 0, "Should capture column number");
}

/// **VALUE**: Verifies that ErrorLocation Display formatting produces `[file:line:column]`.
///
/// **WHY THIS MATTERS**: Error messages end up in the CLI log. If the format breaks,
/// log lines lose the position that makes a failed session diagnosable.
///
/// **BUG THIS CATCHES**: Would catch if the Display implementation drops the brackets
/// or changes the separator count.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: An ErrorLocation
    let location = ErrorLocation::here();

    // WHEN: Formatting as string
    let formatted = format!("{location}");

    // THEN: Should produce "[file:line:column]" format
    assert!(formatted.starts_with('['), "Should start with '['");
    assert!(formatted.ends_with(']'), "Should end with ']'");
    assert!(
        formatted.contains("error_location.rs"),
        "Should include filename"
    );
    assert!(
        formatted.contains(&format!(":{}:", location.line)),
        "Should include line number"
    );
    assert_eq!(
        formatted.matches(':').count(),
        2,
        "Should have exactly 2 colons"
    );
}

/// **VALUE**: Verifies that `#[track_caller]` propagates through `ErrorLocation::here()`.
///
/// **WHY THIS MATTERS**: Helpers that build errors are themselves `#[track_caller]`.
/// If propagation breaks, every error points at the helper instead of the failing operation.
///
/// **BUG THIS CATCHES**: Would catch if someone removes `#[track_caller]` from `here()`.
#[test]
fn given_multiple_call_sites_when_capturing_location_then_each_has_unique_line() {
    // GIVEN: A helper function that captures location
    #[track_caller]
    fn capture_location() -> ErrorLocation {
        ErrorLocation::here()
    }

    // WHEN: Capturing location from different call sites
    let loc1 = capture_location();
    let loc2 = capture_location();

    // THEN: Should have same file but sequential line numbers
    assert_eq!(loc1.file, loc2.file, "Should have same file");
    assert_eq!(loc1.line + 1, loc2.line, "Lines should be sequential");
}
