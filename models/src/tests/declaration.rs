use crate::declaration::EMPTY_FIELD;
use crate::{EventDecl, ModelError, ParameterDecl, StateDecl};

/// **VALUE**: Verifies bit widths at both ends of the valid range are accepted.
///
/// **WHY THIS MATTERS**: 1-bit flags and 32-bit counters are the two most common
/// declarations. An off-by-one here rejects real experiment configurations.
///
/// **BUG THIS CATCHES**: Would catch an exclusive range (`1..32`) slipping in.
#[test]
fn given_boundary_bit_widths_when_validating_then_accepted() {
    // GIVEN: States and events at both boundaries
    let candidates = [
        StateDecl::new("Flag", 1, 0).validate(),
        StateDecl::new("Counter", 32, 0).validate(),
        EventDecl::new("Marker", 1, 0).validate(),
        EventDecl::new("Timestamp", 32, 0).validate(),
    ];

    // WHEN / THEN: All validate
    for result in candidates {
        assert!(result.is_ok(), "boundary width rejected: {result:?}");
    }
}

/// **VALUE**: Verifies out-of-range bit widths are rejected.
///
/// **WHY THIS MATTERS**: The operator silently truncates invalid widths, which corrupts
/// recorded data without any error at declaration time.
///
/// **BUG THIS CATCHES**: Would catch a missing lower or upper bound check.
#[test]
fn given_out_of_range_bit_widths_when_validating_then_rejected() {
    // GIVEN: Widths outside 1-32
    for bits in [0, 33, -1] {
        // WHEN: Validating a state and an event
        let state = StateDecl::new("S", bits, 0).validate();
        let event = EventDecl::new("E", bits, 0).validate();

        // THEN: Both are rejected
        assert!(matches!(state, Err(ModelError::Validation { .. })), "state bits {bits}");
        assert!(matches!(event, Err(ModelError::Validation { .. })), "event bits {bits}");
    }
}

/// **VALUE**: Verifies initial values must fit in the declared bit width.
///
/// **WHY THIS MATTERS**: The operator masks the initial value to the width, so the
/// recorded starting value silently differs from the declared one.
///
/// **BUG THIS CATCHES**: Would catch `add state Flag 1 5` reaching the wire, or an
/// off-by-one rejecting the largest value that fits.
#[test]
fn given_initial_value_wider_than_bits_when_validating_then_rejected() {
    // GIVEN / WHEN
    let too_wide = [
        StateDecl::new("Flag", 1, 2).validate(),
        StateDecl::new("Flag", 1, 5).validate(),
        EventDecl::new("Code", 8, 256).validate(),
    ];
    let fitting = [
        StateDecl::new("Flag", 1, 1).validate(),
        EventDecl::new("Code", 8, 255).validate(),
        EventDecl::new("Timestamp", 32, u32::MAX).validate(),
    ];

    // THEN
    for result in too_wide {
        assert!(matches!(result, Err(ModelError::Validation { .. })), "{result:?}");
    }
    for result in fitting {
        assert!(result.is_ok(), "{result:?}");
    }
}

/// **VALUE**: Verifies identifiers containing whitespace are rejected.
///
/// **WHY THIS MATTERS**: The wire protocol is whitespace-delimited; a space in a name
/// turns the rest of the name into the bit width.
///
/// **BUG THIS CATCHES**: Would catch tabs or spaces slipping through validation.
#[test]
fn given_name_with_whitespace_when_validating_then_rejected() {
    // GIVEN: Declarations with whitespace in their names
    let state = StateDecl::new("My State", 8, 0);
    let event = EventDecl::new("My\tEvent", 8, 0);
    let parameter = ParameterDecl::new("Application:Remote", "My Param");

    // WHEN / THEN: All fail validation
    assert!(state.validate().is_err());
    assert!(event.validate().is_err());
    assert!(parameter.validate().is_err());
}

/// **VALUE**: Verifies the parameter command layout, including empty-field placeholders.
///
/// **BUG THIS CATCHES**: Would catch a missing `=` after the name or a missing `%` for
/// unset default/min/max fields.
#[test]
fn given_parameter_without_range_when_building_command_then_uses_placeholders() {
    // GIVEN: A parameter with a default but no range
    let parameter = ParameterDecl::new("Application:Remote", "Gain").with_default("2.5");

    // WHEN: Building the command
    let command = parameter.to_command();

    // THEN: Unset fields are rendered as the placeholder
    assert_eq!(
        command,
        format!("add parameter Application:Remote variant Gain= 2.5 {EMPTY_FIELD} {EMPTY_FIELD}")
    );
}

/// **VALUE**: Verifies state and event commands carry name, width and initial value.
///
/// **BUG THIS CATCHES**: Would catch swapped width/initial fields.
#[test]
fn given_state_and_event_when_building_commands_then_fields_in_order() {
    // GIVEN: A state and an event
    let state = StateDecl::new("Feedback", 2, 1);
    let event = EventDecl::new("Stimulus", 16, 0);

    // WHEN / THEN
    assert_eq!(state.to_command(), "add state Feedback 2 1");
    assert_eq!(event.to_command(), "add event Stimulus 16 0");
}
