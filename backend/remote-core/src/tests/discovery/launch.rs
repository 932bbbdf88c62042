// Unit tests for launch module private functions
// Integration tests for public API are in integration_tests/discovery.rs

use crate::discovery::launch::{build_launch_command, telnet_endpoint};

use std::ffi::OsStr;
use std::path::Path;

/// **VALUE**: Verifies the operator is started in telnet mode on the requested endpoint
/// and without starting modules.
///
/// **WHY THIS MATTERS**: Without `--StartupIdle` the operator runs its own startup
/// script, and `startup system` from the client then fails.
///
/// **BUG THIS CATCHES**: Would catch a changed flag spelling or argument order.
#[test]
fn given_executable_when_building_launch_command_then_telnet_arguments_set() {
    // GIVEN: An operator executable path
    let exe = Path::new("/opt/bci2000/prog/Operator");

    // WHEN: Building the launch command
    let cmd = build_launch_command(exe, "127.0.0.1", 3999);

    // THEN: Program and arguments match the telnet launch form
    let std_cmd = cmd.as_std();
    assert_eq!(std_cmd.get_program(), exe.as_os_str());
    let args: Vec<&OsStr> = std_cmd.get_args().collect();
    assert_eq!(args, ["--Telnet", "127.0.0.1:3999", "--StartupIdle"]);
}

/// **VALUE**: Verifies the operator runs from its own directory.
///
/// **WHY THIS MATTERS**: The operator resolves module executables relative to its
/// working directory.
///
/// **BUG THIS CATCHES**: Would catch the launch inheriting the client's directory.
#[test]
fn given_executable_in_directory_when_building_launch_command_then_cwd_is_that_directory() {
    // GIVEN: An executable inside a directory
    let exe = Path::new("/opt/bci2000/prog/Operator");

    // WHEN: Building the launch command
    let cmd = build_launch_command(exe, "127.0.0.1", 3999);

    // THEN: The working directory is the executable's parent
    assert_eq!(
        cmd.as_std().get_current_dir(),
        Some(Path::new("/opt/bci2000/prog"))
    );
}

/// **VALUE**: Verifies a bare executable name keeps the inherited working directory.
///
/// **BUG THIS CATCHES**: Would catch `current_dir("")`, which makes spawn fail.
#[test]
fn given_bare_executable_name_when_building_launch_command_then_no_cwd() {
    // GIVEN / WHEN
    let cmd = build_launch_command(Path::new("Operator"), "localhost", 4000);

    // THEN
    assert_eq!(cmd.as_std().get_current_dir(), None);
    assert_eq!(telnet_endpoint("localhost", 4000), "localhost:4000");
}
