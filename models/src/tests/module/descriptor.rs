use crate::module::LOCAL_FLAG;
use crate::{ModelError, ModuleDescriptor, ModuleDescriptorBuilder};

fn count_token(argument_string: &str, token: &str) -> usize {
    argument_string
        .split(' ')
        .filter(|candidate| *candidate == token)
        .count()
}

/// **VALUE**: Verifies argument normalization produces each flag exactly once.
///
/// **WHY THIS MATTERS**: Modules reject unknown tokens. A bare `Foo=1` or a doubled
/// `--local` makes the module exit during startup, which the operator only reports
/// as a timeout.
///
/// **BUG THIS CATCHES**: Would catch a missing `--` prefix, a missing `--local`, or
/// a prefix being added twice to an argument that already has one.
#[test]
fn given_mixed_prefixes_when_building_argument_string_then_each_flag_appears_once() {
    // GIVEN: A module with one bare argument and one prefixed argument
    let module = ModuleDescriptor::new("App", ["Foo=1", "--Bar=2"]);

    // WHEN: Building the argument string
    let args = module.argument_string();

    // THEN: Each normalized flag appears exactly once
    assert_eq!(count_token(&args, "--local"), 1, "args: {args}");
    assert_eq!(count_token(&args, "--Foo=1"), 1, "args: {args}");
    assert_eq!(count_token(&args, "--Bar=2"), 1, "args: {args}");
}

/// **VALUE**: Verifies the local flag is not duplicated when the caller already passed it.
///
/// **WHY THIS MATTERS**: Session files written by hand often include `local` themselves.
///
/// **BUG THIS CATCHES**: Would catch if the presence check compares the raw argument
/// instead of the normalized token.
#[test]
fn given_bare_local_argument_when_building_argument_string_then_local_not_appended() {
    // GIVEN: A module whose arguments include a bare `local`
    let module = ModuleDescriptor::new("SignalGenerator", ["local", "LogKeyboard=1"]);

    // WHEN: Building the argument string
    let args = module.argument_string();

    // THEN: `--local` is present once, in the caller's position
    assert_eq!(args, "--local --LogKeyboard=1");
}

/// **VALUE**: Verifies duplicate and over-prefixed arguments collapse to one token.
///
/// **WHY THIS MATTERS**: Argument lists are often merged from defaults and overrides.
///
/// **BUG THIS CATCHES**: Would catch `----Bar=2` surviving as a distinct token.
#[test]
fn given_duplicate_arguments_when_building_argument_string_then_deduplicated() {
    // GIVEN: Repeated arguments with varying prefixes
    let module = ModuleDescriptor::new("App", ["--Bar=2", "----Bar=2", "Bar=2", "--local"]);

    // WHEN: Building the argument string
    let args = module.argument_string();

    // THEN: Only one of each survives
    assert_eq!(args, "--Bar=2 --local");
}

/// **VALUE**: Verifies the start command embeds the module name and normalized arguments.
///
/// **BUG THIS CATCHES**: Would catch a changed command verb or argument order.
#[test]
fn given_module_without_arguments_when_building_command_then_only_local_flag() {
    // GIVEN: A module without arguments
    let module = ModuleDescriptor::new("DummyApplication", Vec::<String>::new());

    // WHEN: Building the start command
    let command = module.to_command();

    // THEN: Only the local flag is passed
    assert_eq!(command, format!("start executable DummyApplication {LOCAL_FLAG}"));
}

/// **VALUE**: Verifies blank arguments are skipped instead of becoming a bare `--`.
///
/// **BUG THIS CATCHES**: Would catch an empty token being emitted for `""` or `"--"`.
#[test]
fn given_blank_arguments_when_building_argument_string_then_skipped() {
    // GIVEN: Blank and prefix-only arguments
    let module = ModuleDescriptor::new("App", ["", "  ", "--"]);

    // WHEN / THEN: Only the local flag remains
    assert_eq!(module.argument_string(), "--local");
}

/// **VALUE**: Verifies the builder rejects module names containing whitespace.
///
/// **WHY THIS MATTERS**: A space in the name shifts every argument by one token.
///
/// **BUG THIS CATCHES**: Would catch if `build()` stops calling `validate()`.
#[test]
fn given_name_with_whitespace_when_building_then_returns_validation_error() {
    // GIVEN: A builder with an invalid name
    let builder = ModuleDescriptorBuilder::default()
        .with_name("Signal Generator")
        .with_arg("LogKeyboard=1");

    // WHEN: Building
    let result = builder.build();

    // THEN: Should fail validation
    assert!(matches!(result, Err(ModelError::Validation { .. })));
}

/// **VALUE**: Verifies the builder requires a name.
///
/// **BUG THIS CATCHES**: Would catch a descriptor being built with an empty default name.
#[test]
fn given_missing_name_when_building_then_returns_validation_error() {
    // GIVEN: A builder with arguments but no name
    let builder = ModuleDescriptorBuilder::default().with_args(["A=1", "B=2"]);

    // WHEN: Building
    let result = builder.build();

    // THEN: Should fail validation
    match result {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "Module name is required");
        }
        other => panic!("Expected validation error, got {other:?}"),
    }
}
