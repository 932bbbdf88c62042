use crate::fake_operator::{FakeOperator, Reply};

use remote_core::connection::{Connection, ConnectionOptions};
use remote_core::error::{RemoteError, RemoteErrorKind};
use remote_core::remote::Remote;
use remote_core::remote::hooks::RemoteHooks;

use models::{EventDecl, ModuleDescriptor, ParameterDecl, RemoteState, StateDecl, SystemState};

use std::time::Duration;

fn connected_remote(operator: &FakeOperator) -> Remote {
    let mut remote = Remote::with_default_hooks(Connection::default());
    remote
        .connect(&operator.address(), operator.port())
        .expect("connect to fake operator");
    remote
}

fn modules_connected_remote(operator: &FakeOperator) -> Remote {
    let mut remote = connected_remote(operator);
    remote.startup_modules(&[]).expect("startup");
    remote
}

#[derive(Debug, Default)]
struct RecordingHooks {
    calls: Vec<&'static str>,
    fail_modules_connected: bool,
    fail_configured: bool,
}

impl RemoteHooks for RecordingHooks {
    fn on_operator_connected(&mut self, connection: &mut Connection) -> Result<(), RemoteError> {
        self.calls.push("operator_connected");
        connection.execute_raw("log hooked").map(|_| ())
    }

    fn on_modules_connected(&mut self, _connection: &mut Connection) -> Result<(), RemoteError> {
        self.calls.push("modules_connected");
        if self.fail_modules_connected {
            let mut unconnected = Connection::default();
            unconnected.send_command("never sent")?;
        }
        Ok(())
    }

    fn on_configured(&mut self, _connection: &mut Connection) -> Result<(), RemoteError> {
        self.calls.push("configured");
        if self.fail_configured {
            let mut unconnected = Connection::default();
            unconnected.send_command("never sent")?;
        }
        Ok(())
    }
}

/// **VALUE**: Verifies the full setup sequence ends with the operator resting.
///
/// **WHY THIS MATTERS**: This is the sequence every experiment runs before its first trial.
///
/// **BUG THIS CATCHES**: Would catch `set_config` not waiting for `Resting`, or the local
/// state not advancing at each step.
#[test]
fn given_fresh_operator_when_connect_startup_and_configure_then_system_resting() {
    // GIVEN: A connected remote
    let operator = FakeOperator::start();
    let mut remote = connected_remote(&operator);
    assert_eq!(remote.local_state(), RemoteState::Idle);

    // WHEN: Starting no modules and committing the configuration
    remote.startup_modules(&[]).expect("startup");
    assert_eq!(remote.local_state(), RemoteState::ModulesConnected);
    remote.set_config().expect("set config");

    // THEN: Local state is Configured and the live state is Resting
    assert_eq!(remote.local_state(), RemoteState::Configured);
    assert_eq!(remote.get_system_state().expect("query"), SystemState::Resting);
    assert_eq!(
        operator.commands(),
        vec![
            "startup system".to_string(),
            "wait for Connected|Initialization".to_string(),
            "set config".to_string(),
            "wait for Resting".to_string(),
            "get system state".to_string(),
        ]
    );
}

/// **VALUE**: Verifies each module is started with normalized arguments.
///
/// **BUG THIS CATCHES**: Would catch modules being started without `--local` or with
/// bare arguments the module rejects.
#[test]
fn given_modules_when_starting_up_then_start_executable_per_module() {
    // GIVEN
    let operator = FakeOperator::start();
    let mut remote = connected_remote(&operator);
    let modules = [
        ModuleDescriptor::new("SignalGenerator", ["LogKeyboard=1"]),
        ModuleDescriptor::new("DummySignalProcessing", Vec::<String>::new()),
    ];

    // WHEN
    remote.startup_modules(&modules).expect("startup");

    // THEN
    let commands = operator.commands();
    assert_eq!(commands[0], "startup system");
    assert_eq!(
        commands[1],
        "start executable SignalGenerator --LogKeyboard=1 --local"
    );
    assert_eq!(commands[2], "start executable DummySignalProcessing --local");
    assert_eq!(commands[3], "wait for Connected|Initialization");
}

/// **VALUE**: Verifies declarations reach the wire while idle, including boundary bit widths.
///
/// **BUG THIS CATCHES**: Would catch an off-by-one that rejects 1 or 32 bits.
#[test]
fn given_idle_remote_when_declaring_then_add_commands_sent() {
    // GIVEN
    let operator = FakeOperator::start();
    let mut remote = connected_remote(&operator);

    // WHEN
    remote
        .add_parameter(&ParameterDecl::new("Application:Remote", "Subject").with_default("S01"))
        .expect("parameter");
    remote.add_state(&StateDecl::new("Flag", 1, 0)).expect("1-bit state");
    remote.add_event(&EventDecl::new("Code", 32, 0)).expect("32-bit event");

    // THEN
    assert_eq!(
        operator.commands(),
        vec![
            "add parameter Application:Remote variant Subject= S01 % %".to_string(),
            "add state Flag 1 0".to_string(),
            "add event Code 32 0".to_string(),
        ]
    );
}

/// **VALUE**: Verifies invalid declarations fail with an argument error before anything is sent.
///
/// **WHY THIS MATTERS**: A rejected declaration on the operator side leaves the session
/// half-declared.
///
/// **BUG THIS CATCHES**: Would catch validation running after the send, 0, 33 and
/// negative widths slipping through, or an initial value wider than its state.
#[test]
fn given_invalid_declarations_when_adding_then_argument_error_and_nothing_sent() {
    // GIVEN
    let operator = FakeOperator::start();
    let mut remote = connected_remote(&operator);

    // WHEN
    let results = [
        remote.add_state(&StateDecl::new("Trial Number", 8, 0)),
        remote.add_state(&StateDecl::new("Trial", 0, 0)),
        remote.add_event(&EventDecl::new("Trial", 33, 0)),
        remote.add_event(&EventDecl::new("Trial", -1, 0)),
        remote.add_state(&StateDecl::new("Flag", 1, 5)),
        remote.add_parameter(&ParameterDecl::new("Application", "Subject Name")),
    ];

    // THEN
    for result in results {
        assert_eq!(
            result.map_err(|e| e.kind()),
            Err(RemoteErrorKind::ArgumentFormat)
        );
    }
    assert!(operator.commands().is_empty());
}

/// **VALUE**: Verifies idle-only operations are refused after module startup without a send.
///
/// **WHY THIS MATTERS**: The operator ignores or misapplies declarations once modules
/// have published their state lists.
///
/// **BUG THIS CATCHES**: Would catch the local state check being skipped or done after sending.
#[test]
fn given_modules_connected_when_adding_state_then_command_error_without_send() {
    // GIVEN
    let operator = FakeOperator::start();
    let mut remote = modules_connected_remote(&operator);
    let sent_before = operator.commands().len();

    // WHEN
    let error = remote
        .add_state(&StateDecl::new("Trial", 8, 0))
        .expect_err("idle-only");

    // THEN
    assert_eq!(error.kind(), RemoteErrorKind::Command);
    assert!(error.message().contains("ModulesConnected"), "{}", error.message());
    assert_eq!(operator.commands().len(), sent_before);
}

/// **VALUE**: Verifies starting from `Connected` commits the configuration first.
///
/// **BUG THIS CATCHES**: Would catch `start system` being sent to an unconfigured operator.
#[test]
fn given_system_connected_when_starting_run_then_set_config_first() {
    // GIVEN
    let operator = FakeOperator::start();
    let mut remote = modules_connected_remote(&operator);
    operator.set_system_state(SystemState::Connected);
    let sent_before = operator.commands().len();

    // WHEN
    remote.start_run().expect("start run");

    // THEN
    let commands = operator.commands()[sent_before..].to_vec();
    assert_eq!(
        commands,
        vec![
            "get system state".to_string(),
            "set config".to_string(),
            "wait for Resting".to_string(),
            "start system".to_string(),
        ]
    );
    assert_eq!(operator.system_state(), SystemState::Running);
    assert_eq!(remote.local_state(), RemoteState::Configured);
}

/// **VALUE**: Verifies a run cannot be started twice.
///
/// **BUG THIS CATCHES**: Would catch `start system` being sent while running.
#[test]
fn given_system_running_when_starting_run_then_command_error() {
    // GIVEN
    let operator = FakeOperator::start_in(SystemState::Running);
    let mut remote = connected_remote(&operator);

    // WHEN
    let error = remote.start_run().expect_err("already running");

    // THEN
    assert_eq!(error.kind(), RemoteErrorKind::Command);
    assert_eq!(operator.commands(), vec!["get system state".to_string()]);
}

/// **VALUE**: Verifies a busy operator refuses run start.
///
/// **BUG THIS CATCHES**: Would catch any state other than the startable ones being accepted.
#[test]
fn given_system_busy_when_starting_run_then_command_error() {
    // GIVEN
    let operator = FakeOperator::start_in(SystemState::Busy);
    let mut remote = connected_remote(&operator);

    // WHEN
    let error = remote.start_run().expect_err("busy");

    // THEN
    assert_eq!(error.kind(), RemoteErrorKind::Command);
    assert!(error.message().contains("Busy"), "{}", error.message());
    assert!(!operator.commands().contains(&"start system".to_string()));
}

/// **VALUE**: Verifies stop is only sent while running.
///
/// **BUG THIS CATCHES**: Would catch `stop system` being sent from `Resting`.
#[test]
fn given_run_states_when_stopping_then_only_running_accepted() {
    // GIVEN: A resting operator
    let operator = FakeOperator::start_in(SystemState::Resting);
    let mut remote = connected_remote(&operator);

    // WHEN: Stopping while resting, then starting and stopping
    let refused = remote.stop_run();
    remote.start_run().expect("start");
    let stopped = remote.stop_run();

    // THEN
    assert_eq!(refused.map_err(|e| e.kind()), Err(RemoteErrorKind::Command));
    assert!(stopped.is_ok(), "{stopped:?}");
    assert_eq!(operator.system_state(), SystemState::Suspended);
}

/// **VALUE**: Verifies timed waits send the timeout in seconds and decode the answer.
///
/// **BUG THIS CATCHES**: Would catch the timed form being treated as an empty reply.
#[test]
fn given_timeout_when_waiting_for_state_then_boolean_returned() {
    // GIVEN
    let operator = FakeOperator::start_in(SystemState::Resting);
    let mut remote = connected_remote(&operator);

    // WHEN
    let reached = remote
        .wait_for_system_state(&[SystemState::Resting], Some(Duration::from_secs(2)))
        .expect("wait");
    let missed = remote
        .wait_for_system_state(&[SystemState::Running], Some(Duration::from_millis(500)))
        .expect("wait");

    // THEN
    assert!(reached);
    assert!(!missed);
    assert_eq!(
        operator.commands(),
        vec![
            "wait for Resting 2".to_string(),
            "wait for Running 0.5".to_string(),
        ]
    );
}

/// **VALUE**: Verifies parameter files can only be loaded between startup and configuration.
///
/// **BUG THIS CATCHES**: Would catch loads while idle, which the operator applies to
/// no module.
#[test]
fn given_local_states_when_loading_parameters_then_only_modules_connected_allowed() {
    // GIVEN
    let operator = FakeOperator::start();
    let mut remote = connected_remote(&operator);

    // WHEN
    let while_idle = remote.load_parameters("../parms/a.prm");
    remote.startup_modules(&[]).expect("startup");
    let after_startup = remote.load_parameters("../parms/my experiment.prm");

    // THEN
    assert_eq!(while_idle.map_err(|e| e.kind()), Err(RemoteErrorKind::Command));
    assert!(after_startup.is_ok(), "{after_startup:?}");
    assert!(
        operator
            .commands()
            .contains(&"load parameters \"../parms/my experiment.prm\"".to_string())
    );
}

/// **VALUE**: Verifies parameter values round-trip through set and get.
///
/// **BUG THIS CATCHES**: Would catch the value not being quoted, or the response not trimmed.
#[test]
fn given_parameter_set_when_reading_back_then_value_matches() {
    // GIVEN
    let operator = FakeOperator::start();
    let mut remote = connected_remote(&operator);

    // WHEN
    remote.set_parameter("SubjectName", "S 01").expect("set");
    let value = remote.get_parameter("SubjectName").expect("get");

    // THEN
    assert_eq!(value, "S 01");
    assert_eq!(operator.commands()[0], "set parameter SubjectName \"S 01\"");
    assert_eq!(operator.commands()[1], "Get parameter SubjectName");
}

/// **VALUE**: Verifies parameter access is refused once configured.
///
/// **BUG THIS CATCHES**: Would catch parameters changing under a committed configuration.
#[test]
fn given_configured_when_setting_parameter_then_command_error() {
    // GIVEN
    let operator = FakeOperator::start();
    let mut remote = modules_connected_remote(&operator);
    remote.set_config().expect("config");

    let sent_before = operator.commands().len();

    // WHEN
    let set = remote.set_parameter("SubjectName", "S01").expect_err("configured");
    let get = remote.get_parameter("SubjectName").expect_err("configured");

    // THEN
    assert_eq!(set.kind(), RemoteErrorKind::Command);
    assert_eq!(get.kind(), RemoteErrorKind::Command);
    assert_eq!(operator.commands().len(), sent_before);
}

/// **VALUE**: Verifies visualize requires started modules.
///
/// **BUG THIS CATCHES**: Would catch `visualize watch` reaching an operator with no modules.
#[test]
fn given_idle_when_visualizing_then_refused_and_allowed_after_startup() {
    // GIVEN
    let operator = FakeOperator::start();
    let mut remote = connected_remote(&operator);

    // WHEN
    let idle = remote.visualize("Signal(1,1)");
    remote.startup_modules(&[]).expect("startup");
    let started = remote.visualize("Signal(1,1)");

    // THEN
    assert_eq!(idle.map_err(|e| e.kind()), Err(RemoteErrorKind::Command));
    assert!(started.is_ok(), "{started:?}");
    assert!(
        operator
            .commands()
            .contains(&"visualize watch Signal(1,1)".to_string())
    );
}

/// **VALUE**: Verifies the ungated accessors send their documented command forms.
///
/// **BUG THIS CATCHES**: Would catch a changed command spelling for state, event and
/// signal access.
#[test]
fn given_connected_when_using_accessors_then_command_forms_match() {
    // GIVEN
    let operator = FakeOperator::start();
    let mut remote = connected_remote(&operator);

    // WHEN
    let state = remote.get_state("Running").expect("state");
    let event = remote.get_event("Marker").expect("event");
    let sample = remote.get_event_sample("Marker", 3).expect("sample");
    let signal = remote.get_signal(1, 2).expect("signal");
    remote.set_state("Trial", 2).expect("set state");
    remote.set_event("Marker", 1).expect("set event");
    remote.pulse_event("Marker", 5).expect("pulse");
    remote.log("hello").expect("log");
    remote.warn("careful").expect("warn");
    remote.error("broken").expect("error");

    // THEN
    assert_eq!((state, event, sample), (0, 0, 0));
    assert!((signal - 0.5).abs() < f64::EPSILON);
    assert_eq!(
        operator.commands(),
        vec![
            "get state Running".to_string(),
            "get event Marker".to_string(),
            "get event[3] Marker".to_string(),
            "get signal(1,2)".to_string(),
            "set state Trial 2".to_string(),
            "set event Marker 1".to_string(),
            "pulse event Marker 5".to_string(),
            "log hello".to_string(),
            "warn careful".to_string(),
            "error broken".to_string(),
        ]
    );
}

/// **VALUE**: Verifies an unknown state name from the operator is a command error.
///
/// **BUG THIS CATCHES**: Would catch unrecognized text mapping to a default state.
#[test]
fn given_unknown_state_reply_when_querying_then_command_error() {
    // GIVEN
    let operator = FakeOperator::start();
    operator.script_text("get system state", "Hibernating");
    let mut remote = connected_remote(&operator);

    // WHEN
    let error = remote.get_system_state().expect_err("unknown state");

    // THEN
    assert_eq!(error.kind(), RemoteErrorKind::Command);
    assert!(error.message().contains("Hibernating"), "{}", error.message());
}

/// **VALUE**: Verifies losing the connection resets local progress.
///
/// **WHY THIS MATTERS**: After a reconnect the operator has to be set up again; keeping
/// `ModulesConnected` would skip declarations.
///
/// **BUG THIS CATCHES**: Would catch local state surviving a dropped socket.
#[test]
fn given_operator_hangs_up_when_querying_then_local_state_disconnected() {
    // GIVEN
    let operator = FakeOperator::start();
    let mut remote = modules_connected_remote(&operator);
    operator.script("get system state", Reply::Hangup);

    // WHEN
    let error = remote.get_system_state().expect_err("hang-up");

    // THEN
    assert_eq!(error.kind(), RemoteErrorKind::Connection);
    assert_eq!(remote.local_state(), RemoteState::Disconnected);
}

/// **VALUE**: Verifies a timeout drops the local state back to Disconnected.
///
/// **WHY THIS MATTERS**: Setup progress cannot continue on a connection whose next
/// response might belong to an earlier command.
///
/// **BUG THIS CATCHES**: Would catch a timed-out session still reporting Idle and
/// accepting further commands.
#[test]
fn given_slow_reply_when_querying_then_timeout_resets_local_state() {
    // GIVEN
    let operator = FakeOperator::start();
    let options = ConnectionOptions {
        timeout_ms: 200,
        ..ConnectionOptions::default()
    };
    let mut remote = Remote::with_default_hooks(Connection::new(options));
    remote
        .connect(&operator.address(), operator.port())
        .expect("connect");
    operator.script("get state Slow", Reply::Silence);

    // WHEN
    let error = remote.get_state("Slow").expect_err("timeout");

    // THEN
    assert_eq!(error.kind(), RemoteErrorKind::Timeout);
    assert_eq!(remote.local_state(), RemoteState::Disconnected);
    assert!(!remote.is_connected());
}

/// **VALUE**: Verifies hooks run at each step and may issue commands.
///
/// **BUG THIS CATCHES**: Would catch a hook being skipped or called at the wrong step.
#[test]
fn given_hooks_when_running_setup_then_each_hook_called_once_in_order() {
    // GIVEN
    let operator = FakeOperator::start();
    let mut remote = Remote::new(Connection::default(), RecordingHooks::default());

    // WHEN
    remote
        .connect(&operator.address(), operator.port())
        .expect("connect");
    remote.startup_modules(&[]).expect("startup");
    remote.set_config().expect("config");

    // THEN
    assert_eq!(
        remote.hooks().calls,
        vec!["operator_connected", "modules_connected", "configured"]
    );
    assert_eq!(operator.commands()[0], "log hooked");
}

/// **VALUE**: Verifies a failing modules-connected hook is swallowed and a failing
/// configured hook is not.
///
/// **WHY THIS MATTERS**: Modules cannot be un-started, so setup must proceed; a failed
/// configuration step should stop the caller.
///
/// **BUG THIS CATCHES**: Would catch both hooks sharing the same error policy.
#[test]
fn given_failing_hooks_when_running_setup_then_only_configured_error_propagates() {
    // GIVEN
    let operator = FakeOperator::start();
    let hooks = RecordingHooks {
        fail_modules_connected: true,
        fail_configured: true,
        ..RecordingHooks::default()
    };
    let mut remote = Remote::new(Connection::default(), hooks);
    remote
        .connect(&operator.address(), operator.port())
        .expect("connect");

    // WHEN
    let startup = remote.startup_modules(&[]);
    let config = remote.set_config();

    // THEN
    assert!(startup.is_ok(), "{startup:?}");
    assert_eq!(remote.local_state(), RemoteState::Configured);
    assert_eq!(config.map_err(|e| e.kind()), Err(RemoteErrorKind::Connection));
}

/// **VALUE**: Verifies an explicit disconnect resets the local state.
///
/// **BUG THIS CATCHES**: Would catch gated calls passing after disconnect.
#[test]
fn given_configured_when_disconnecting_then_local_state_disconnected() {
    // GIVEN
    let operator = FakeOperator::start();
    let mut remote = modules_connected_remote(&operator);

    // WHEN
    remote.disconnect();

    // THEN
    assert_eq!(remote.local_state(), RemoteState::Disconnected);
    assert!(!remote.is_connected());
}
