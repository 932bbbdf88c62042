use crate::fake_operator::{FakeOperator, Reply};

use remote_core::connection::{Connection, ConnectionOptions, ExpectEmpty};
use remote_core::error::RemoteErrorKind;

use models::SystemState;

use std::thread::sleep;
use std::time::Duration;

fn connect_to(operator: &FakeOperator, options: ConnectionOptions) -> Connection {
    let mut connection = Connection::new(options);
    connection
        .connect(&operator.address(), operator.port())
        .expect("connect to fake operator");
    connection
}

/// **VALUE**: Verifies the handshake discards the banner and changes into the launch directory.
///
/// **WHY THIS MATTERS**: If the banner is not consumed, every later response is
/// shifted by one and decoded against the wrong command.
///
/// **BUG THIS CATCHES**: Would catch the banner read being skipped, or the launch
/// directory command being dropped.
#[test]
fn given_operator_with_banner_when_connecting_then_handshake_commands_sent() {
    // GIVEN: A fake operator that greets with a banner
    let operator = FakeOperator::start();

    // WHEN: Connecting with a window title configured
    let options = ConnectionOptions {
        window_title: Some("Session".to_string()),
        ..ConnectionOptions::default()
    };
    let mut connection = connect_to(&operator, options);

    // THEN: The handshake went out in order and the next query decodes cleanly
    let state = connection
        .execute::<SystemState>("get system state")
        .expect("query after handshake");
    assert_eq!(state, SystemState::Idle);
    assert_eq!(
        operator.all_commands(),
        vec![
            "change directory $BCI2000LAUNCHDIR".to_string(),
            "set title \"Session\"".to_string(),
            "show window".to_string(),
            "get system state".to_string(),
        ]
    );
    assert!(connection.is_open());
    assert_eq!(connection.peer().map(|p| p.port()), Some(operator.port()));
}

/// **VALUE**: Verifies a response delivered in several chunks is returned whole.
///
/// **WHY THIS MATTERS**: Long parameter values regularly span several reads.
///
/// **BUG THIS CATCHES**: Would catch the receive loop returning after the first read.
#[test]
fn given_reply_split_across_writes_when_executing_then_returns_full_text() {
    // GIVEN: A reply written in three separate chunks
    let operator = FakeOperator::start();
    operator.script(
        "Get parameter SubjectName",
        Reply::Chunks(vec!["Jo".into(), "hn Do".into(), "e\r\n>".into()]),
    );
    let mut connection = connect_to(&operator, ConnectionOptions::default());

    // WHEN: Executing the query
    let response = connection
        .execute_raw("Get parameter SubjectName")
        .expect("split reply");

    // THEN: All chunks are joined and only the prompt is removed
    assert_eq!(response, "John Doe\r\n");
}

/// **VALUE**: Verifies a prompt character inside a chunk does not end the response early.
///
/// **BUG THIS CATCHES**: Would catch the terminator being searched anywhere in the chunk.
#[test]
fn given_prompt_character_inside_payload_when_executing_then_payload_kept() {
    // GIVEN: A reply with `>` in its first chunk
    let operator = FakeOperator::start();
    operator.script(
        "get expression",
        Reply::Chunks(vec!["x > 1 ".into(), "holds\r\n>".into()]),
    );
    let mut connection = connect_to(&operator, ConnectionOptions::default());

    // WHEN
    let response = connection.execute_raw("get expression").expect("reply");

    // THEN
    assert_eq!(response, "x > 1 holds\r\n");
}

/// **VALUE**: Verifies typed decoding failures are command errors that quote the response.
///
/// **WHY THIS MATTERS**: The operator answers malformed queries with prose; the caller
/// needs to see it to diagnose the problem.
///
/// **BUG THIS CATCHES**: Would catch decode failures surfacing as a default value.
#[test]
fn given_non_numeric_reply_when_executing_typed_then_command_error_with_text() {
    // GIVEN
    let operator = FakeOperator::start();
    operator.script_text("get state Missing", "State Missing does not exist");
    let mut connection = connect_to(&operator, ConnectionOptions::default());

    // WHEN
    let error = connection
        .execute::<u32>("get state Missing")
        .expect_err("non-numeric reply");

    // THEN
    assert_eq!(error.kind(), RemoteErrorKind::Command);
    assert!(
        error.message().contains("State Missing does not exist"),
        "message: {}",
        error.message()
    );
}

/// **VALUE**: Verifies whitespace-only replies count as success and text replies as failure.
///
/// **BUG THIS CATCHES**: Would catch `ExpectEmpty::Yes` ignoring the operator's error text.
#[test]
fn given_side_effect_commands_when_expecting_empty_then_text_is_failure() {
    // GIVEN: One command answered with blanks, one with an error
    let operator = FakeOperator::start();
    operator.script("set state Blank 1", Reply::Chunks(vec!["  \r\n \r\n>".into()]));
    operator.script_text("set state Bad 1", "State Bad does not exist");
    let mut connection = connect_to(&operator, ConnectionOptions::default());

    // WHEN
    let blank = connection.execute_expecting_empty("set state Blank 1", ExpectEmpty::Yes);
    let bad = connection.execute_expecting_empty("set state Bad 1", ExpectEmpty::Yes);
    let tolerated = connection.execute_expecting_empty("set state Bad 1", ExpectEmpty::No);

    // THEN
    assert!(blank.is_ok(), "blank reply: {blank:?}");
    assert_eq!(bad.map_err(|e| e.kind()), Err(RemoteErrorKind::Command));
    assert!(tolerated.is_ok(), "tolerated reply: {tolerated:?}");
}

/// **VALUE**: Verifies a missing prompt ends in a timeout that closes the connection.
///
/// **WHY THIS MATTERS**: After a timeout the operator may still answer; the late reply
/// would otherwise be read as the response to the next command.
///
/// **BUG THIS CATCHES**: Would catch an unbounded wait, or a timeout that leaves the
/// socket open and out of step with the operator.
#[test]
fn given_operator_never_prompts_when_executing_then_times_out_and_closes() {
    // GIVEN: A command the operator never answers and a short timeout
    let operator = FakeOperator::start();
    operator.script("wait for Running", Reply::Silence);
    let options = ConnectionOptions {
        timeout_ms: 200,
        ..ConnectionOptions::default()
    };
    let mut connection = connect_to(&operator, options);

    // WHEN
    let error = connection
        .execute_expecting_empty("wait for Running", ExpectEmpty::No)
        .expect_err("no prompt");

    // THEN
    assert_eq!(error.kind(), RemoteErrorKind::Timeout);
    assert!(!connection.is_open());
    assert!(!connection.is_connected());
}

/// **VALUE**: Verifies a reply that arrives after its timeout is never handed to a later command.
///
/// **WHY THIS MATTERS**: A stale prompt makes the next side-effecting command look
/// successful while its real diagnostic is still queued.
///
/// **BUG THIS CATCHES**: Would catch the socket staying open after a timeout, so the next
/// exchange frames the previous command's answer as its own.
#[test]
fn given_late_reply_after_timeout_when_sending_next_command_then_refused_not_desynchronized() {
    // GIVEN: A reply that only completes after the timeout has passed
    let operator = FakeOperator::start();
    let mut late = vec![String::new(); 15];
    late.push("7\r\n>".to_string());
    operator.script("get state Slow", Reply::Chunks(late));
    let options = ConnectionOptions {
        timeout_ms: 200,
        ..ConnectionOptions::default()
    };
    let mut connection = connect_to(&operator, options);
    let timed_out = connection.execute::<u32>("get state Slow");
    sleep(Duration::from_millis(400));

    // WHEN
    let next = connection.execute::<u32>("get state Other");

    // THEN
    assert_eq!(timed_out.map_err(|e| e.kind()), Err(RemoteErrorKind::Timeout));
    assert_eq!(next.map_err(|e| e.kind()), Err(RemoteErrorKind::Connection));
    assert!(!operator.commands().contains(&"get state Other".to_string()));
}

/// **VALUE**: Verifies the operator hanging up surfaces as a connection error and releases the socket.
///
/// **BUG THIS CATCHES**: Would catch a zero-byte read being retried forever.
#[test]
fn given_operator_hangs_up_when_executing_then_connection_error_and_closed() {
    // GIVEN
    let operator = FakeOperator::start();
    operator.script("get system state", Reply::Hangup);
    let mut connection = connect_to(&operator, ConnectionOptions::default());

    // WHEN
    let error = connection
        .execute::<SystemState>("get system state")
        .expect_err("hang-up");

    // THEN
    assert_eq!(error.kind(), RemoteErrorKind::Connection);
    assert!(!connection.is_open());
    assert!(!connection.is_connected());
}

/// **VALUE**: Verifies a failure seen on the socket gates the next send locally.
///
/// **WHY THIS MATTERS**: The pre-send check runs before every command and must not
/// depend on reading the OS socket table.
///
/// **BUG THIS CATCHES**: Would catch a write being attempted after the peer already
/// closed, or the send gate ignoring the liveness flag.
#[test]
fn given_peer_closed_when_sending_next_command_then_refused_without_write() {
    // GIVEN
    let operator = FakeOperator::start();
    operator.script("get system state", Reply::Hangup);
    let mut connection = connect_to(&operator, ConnectionOptions::default());
    let _ = connection.execute::<SystemState>("get system state");

    // WHEN
    let error = connection.send_command("get state Running").expect_err("closed");

    // THEN
    assert_eq!(error.kind(), RemoteErrorKind::Connection);
    assert!(connection.peer().is_none());
    assert!(!operator.commands().contains(&"get state Running".to_string()));
}

/// **VALUE**: Verifies commands are refused before connecting.
///
/// **BUG THIS CATCHES**: Would catch a write being attempted on a missing socket.
#[test]
fn given_unconnected_connection_when_sending_then_connection_error() {
    // GIVEN
    let mut connection = Connection::default();

    // WHEN
    let error = connection.send_command("get system state").expect_err("not connected");

    // THEN
    assert_eq!(error.kind(), RemoteErrorKind::Connection);
}

/// **VALUE**: Verifies embedded line breaks are rejected before sending.
///
/// **WHY THIS MATTERS**: A newline would smuggle a second command past the caller.
///
/// **BUG THIS CATCHES**: Would catch multi-line input being written verbatim.
#[test]
fn given_command_with_newline_when_sending_then_argument_error_and_nothing_sent() {
    // GIVEN
    let operator = FakeOperator::start();
    let mut connection = connect_to(&operator, ConnectionOptions::default());

    // WHEN
    let error = connection
        .send_command("log a\r\nstart system")
        .expect_err("multi-line");

    // THEN
    assert_eq!(error.kind(), RemoteErrorKind::ArgumentFormat);
    assert!(operator.commands().is_empty());
}

/// **VALUE**: Verifies connecting twice is refused.
///
/// **BUG THIS CATCHES**: Would catch the first socket being leaked by a second connect.
#[test]
fn given_connected_when_connecting_again_then_connection_error() {
    // GIVEN
    let operator = FakeOperator::start();
    let mut connection = connect_to(&operator, ConnectionOptions::default());

    // WHEN
    let error = connection
        .connect(&operator.address(), operator.port())
        .expect_err("second connect");

    // THEN
    assert_eq!(error.kind(), RemoteErrorKind::Connection);
    assert!(connection.is_open());
}

/// **VALUE**: Verifies terminate-on-disconnect sends `Quit` and tolerates its reply.
///
/// **BUG THIS CATCHES**: Would catch `Quit` being sent with `ExpectEmpty::Yes`, which
/// fails on the operator's farewell text.
#[test]
fn given_terminate_flag_when_disconnecting_then_quit_sent_and_idempotent() {
    // GIVEN
    let operator = FakeOperator::start();
    let options = ConnectionOptions {
        terminate_on_disconnect: true,
        ..ConnectionOptions::default()
    };
    let mut connection = connect_to(&operator, options);

    // WHEN: Disconnecting twice
    connection.disconnect();
    connection.disconnect();

    // THEN
    assert!(!connection.is_open());
    assert_eq!(operator.commands(), vec!["Quit".to_string()]);
}

/// **VALUE**: Verifies dropping a connection releases it without asking the operator to quit by default.
///
/// **BUG THIS CATCHES**: Would catch `Quit` being sent when the flag is off.
#[test]
fn given_connection_dropped_when_flag_off_then_no_quit() {
    // GIVEN
    let operator = FakeOperator::start();
    let connection = connect_to(&operator, ConnectionOptions::default());

    // WHEN
    drop(connection);

    // THEN
    assert!(operator.commands().is_empty());
}

/// **VALUE**: Verifies connecting to a closed port fails with a connection error.
///
/// **BUG THIS CATCHES**: Would catch a panic on refused connections.
#[test]
fn given_nothing_listening_when_connecting_then_connection_error() {
    // GIVEN: A port that was just released
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let mut connection = Connection::default();

    // WHEN
    let error = connection.connect("127.0.0.1", port).expect_err("refused");

    // THEN
    assert_eq!(error.kind(), RemoteErrorKind::Connection);
    assert!(!connection.is_open());
}
