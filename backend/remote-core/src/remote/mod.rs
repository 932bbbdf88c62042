//! The remote-control state machine.
//!
//! [`Remote`] tracks how far the client has driven setup
//! ([`RemoteState`]) and checks that progress before anything is sent:
//!
//! ```text
//! Disconnected --connect--> Idle --startup_modules--> ModulesConnected --set_config--> Configured
//! ```
//!
//! Losing the connection resets the local state to `Disconnected`. The
//! operator's own run phase ([`SystemState`]) is never trusted from a cache:
//! run control queries it live every time.

pub mod hooks;

use crate::connection::{Connection, ExpectEmpty};
use crate::decode::FromResponse;
use crate::error::{RemoteError, RemoteErrorKind};
use crate::remote::hooks::{NoHooks, RemoteHooks};

use models::{
    EventDecl, ModuleDescriptor, ParameterDecl, RemoteState, StateDecl, SystemState,
    validate_identifier,
};

use std::path::Path;
use std::time::Duration;

use log::{debug, info, warn};

const STARTUP_SYSTEM_COMMAND: &str = "startup system";
const SET_CONFIG_COMMAND: &str = "set config";
const START_SYSTEM_COMMAND: &str = "start system";
const STOP_SYSTEM_COMMAND: &str = "stop system";
const GET_SYSTEM_STATE_COMMAND: &str = "get system state";

const STARTUP_TARGETS: [SystemState; 2] = [SystemState::Connected, SystemState::Initialization];
const CONFIGURED_TARGETS: [SystemState; 1] = [SystemState::Resting];

/// Render a wait timeout in the seconds the operator expects.
pub(crate) fn format_seconds(timeout: Duration) -> String {
    format!("{}", timeout.as_secs_f64())
}

pub(crate) fn wait_command(states: &[SystemState], timeout: Option<Duration>) -> String {
    match timeout {
        Some(t) => format!("wait for {} {}", SystemState::join(states), format_seconds(t)),
        None => format!("wait for {}", SystemState::join(states)),
    }
}

/// Quote a path argument if the operator would otherwise split it.
pub(crate) fn path_argument(path: &str) -> String {
    if path.chars().any(char::is_whitespace) {
        format!("\"{path}\"")
    } else {
        path.to_string()
    }
}

#[track_caller]
fn validate_message(kind: &str, text: &str) -> Result<(), RemoteError> {
    if text.contains(['\r', '\n']) {
        return Err(RemoteError::argument(format!(
            "{kind} must be a single line: {text:?}"
        )));
    }
    Ok(())
}

#[derive(Debug)]
pub struct Remote<H: RemoteHooks = NoHooks> {
    connection: Connection,
    hooks: H,
    local_state: RemoteState,
    /// Last system state seen by a live query. Only used in error messages.
    last_system_state: Option<SystemState>,
}

impl Remote<NoHooks> {
    pub fn with_default_hooks(connection: Connection) -> Self {
        Self::new(connection, NoHooks)
    }
}

impl<H: RemoteHooks> Remote<H> {
    pub fn new(connection: Connection, hooks: H) -> Self {
        let local_state = if connection.is_open() {
            RemoteState::Idle
        } else {
            RemoteState::Disconnected
        };

        Self {
            connection,
            hooks,
            local_state,
            last_system_state: None,
        }
    }

    pub fn local_state(&self) -> RemoteState {
        self.local_state
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    /// Hand the connection back, still open.
    pub fn into_connection(self) -> Connection {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Connect, run the handshake and the operator-connected hook.
    #[track_caller]
    pub fn connect(&mut self, address: &str, port: u16) -> Result<(), RemoteError> {
        let connected = self.connection.connect(address, port);
        self.track(connected)?;

        self.local_state = RemoteState::Idle;
        self.last_system_state = None;
        debug!("Local state -> {}", self.local_state);

        let hooked = self.hooks.on_operator_connected(&mut self.connection);
        self.track(hooked)
    }

    pub fn disconnect(&mut self) {
        self.connection.disconnect();
        self.reset();
    }

    fn reset(&mut self) {
        if self.local_state != RemoteState::Disconnected {
            debug!("Local state {} -> Disconnected", self.local_state);
        }
        self.local_state = RemoteState::Disconnected;
        self.last_system_state = None;
    }

    /// Reset local progress if a failure took the connection down with it.
    fn track<T>(&mut self, result: Result<T, RemoteError>) -> Result<T, RemoteError> {
        if let Err(e) = &result
            && matches!(
                e.kind(),
                RemoteErrorKind::Connection | RemoteErrorKind::Timeout
            )
            && !self.connection.is_open()
        {
            self.reset();
        }
        result
    }

    #[track_caller]
    fn send_expecting_empty(&mut self, command: &str) -> Result<(), RemoteError> {
        let result = self
            .connection
            .execute_expecting_empty(command, ExpectEmpty::Yes);
        self.track(result)
    }

    #[track_caller]
    fn query<T: FromResponse>(&mut self, command: &str) -> Result<T, RemoteError> {
        let result = self.connection.execute::<T>(command);
        self.track(result)
    }

    #[track_caller]
    fn require(&self, operation: &str, allowed: &[RemoteState]) -> Result<(), RemoteError> {
        if allowed.contains(&self.local_state) {
            return Ok(());
        }

        let expected = allowed
            .iter()
            .map(RemoteState::as_str)
            .collect::<Vec<_>>()
            .join(" or ");

        Err(RemoteError::command(format!(
            "{operation} requires local state {expected}, but it is {} (system state: {})",
            self.local_state,
            self.describe_system_state()
        )))
    }

    fn describe_system_state(&self) -> String {
        match self.last_system_state {
            Some(state) => state.to_string(),
            None => String::from("not yet queried"),
        }
    }

    pub fn add_parameter(&mut self, parameter: &ParameterDecl) -> Result<(), RemoteError> {
        parameter.validate()?;
        self.require("add parameter", &[RemoteState::Idle])?;
        self.send_expecting_empty(&parameter.to_command())
    }

    pub fn add_state(&mut self, state: &StateDecl) -> Result<(), RemoteError> {
        state.validate()?;
        self.require("add state", &[RemoteState::Idle])?;
        self.send_expecting_empty(&state.to_command())
    }

    pub fn add_event(&mut self, event: &EventDecl) -> Result<(), RemoteError> {
        event.validate()?;
        self.require("add event", &[RemoteState::Idle])?;
        self.send_expecting_empty(&event.to_command())
    }

    /// Start the operator's modules and wait until they have all connected.
    ///
    /// Blocks on `wait for Connected|Initialization` bounded only by the
    /// connection timeout. A failing modules-connected hook is logged, not
    /// returned.
    pub fn startup_modules(&mut self, modules: &[ModuleDescriptor]) -> Result<(), RemoteError> {
        for module in modules {
            module.validate()?;
        }
        self.require("startup modules", &[RemoteState::Idle])?;

        info!("Starting {} module(s)", modules.len());
        self.send_expecting_empty(STARTUP_SYSTEM_COMMAND)?;

        for module in modules {
            debug!("Starting module {}", module.name);
            self.send_expecting_empty(&module.to_command())?;
        }

        self.wait_for_system_state(&STARTUP_TARGETS, None)?;

        self.local_state = RemoteState::ModulesConnected;
        debug!("Local state -> {}", self.local_state);

        if let Err(e) = self.hooks.on_modules_connected(&mut self.connection) {
            warn!("Modules-connected hook failed: {e}");
        }

        Ok(())
    }

    /// Load a parameter file on the operator side.
    pub fn load_parameters(&mut self, path: impl AsRef<Path>) -> Result<(), RemoteError> {
        let path = path.as_ref().to_string_lossy().to_string();
        if path.trim().is_empty() || path.contains('"') {
            return Err(RemoteError::argument(format!(
                "Invalid parameter file path: {path:?}"
            )));
        }
        validate_message("Parameter file path", &path)?;
        self.require("load parameters", &[RemoteState::ModulesConnected])?;

        self.send_expecting_empty(&format!("load parameters {}", path_argument(&path)))
    }

    pub fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), RemoteError> {
        validate_identifier("Parameter", name)?;
        if value.contains('"') {
            return Err(RemoteError::argument(format!(
                "Value of parameter '{name}' must not contain quotes: {value:?}"
            )));
        }
        validate_message("Parameter value", value)?;
        self.require(
            "set parameter",
            &[RemoteState::Idle, RemoteState::ModulesConnected],
        )?;

        self.send_expecting_empty(&format!("set parameter {name} \"{value}\""))
    }

    pub fn get_parameter(&mut self, name: &str) -> Result<String, RemoteError> {
        validate_identifier("Parameter", name)?;
        self.require(
            "get parameter",
            &[RemoteState::Idle, RemoteState::ModulesConnected],
        )?;
        let value = self.query::<String>(&format!("Get parameter {name}"))?;
        Ok(value.trim().to_string())
    }

    /// Commit the configuration and wait until the operator is resting.
    pub fn set_config(&mut self) -> Result<(), RemoteError> {
        self.send_expecting_empty(SET_CONFIG_COMMAND)?;
        self.wait_for_system_state(&CONFIGURED_TARGETS, None)?;

        self.local_state = RemoteState::Configured;
        debug!("Local state -> {}", self.local_state);

        let hooked = self.hooks.on_configured(&mut self.connection);
        self.track(hooked)
    }

    /// Start a run, committing the configuration first if modules are only connected.
    pub fn start_run(&mut self) -> Result<(), RemoteError> {
        let state = self.get_system_state()?;

        if state == SystemState::Running {
            return Err(RemoteError::command(
                "Cannot start a run: system state is already Running",
            ));
        }

        if state.needs_config() {
            debug!("System state is {state}, setting config before starting");
            self.set_config()?;
        } else if !state.accepts_start() {
            return Err(RemoteError::command(format!(
                "Cannot start a run in system state {state} (local state: {})",
                self.local_state
            )));
        }

        info!("Starting run");
        self.send_expecting_empty(START_SYSTEM_COMMAND)
    }

    pub fn stop_run(&mut self) -> Result<(), RemoteError> {
        let state = self.get_system_state()?;

        if state != SystemState::Running {
            return Err(RemoteError::command(format!(
                "Cannot stop a run in system state {state}: no run in progress"
            )));
        }

        info!("Stopping run");
        self.send_expecting_empty(STOP_SYSTEM_COMMAND)
    }

    /// Wait until the operator reaches one of `states`.
    ///
    /// With a timeout the operator answers whether the state was reached in
    /// time. Without one the call returns `true` once the operator answers,
    /// or fails on the connection timeout.
    pub fn wait_for_system_state(
        &mut self,
        states: &[SystemState],
        timeout: Option<Duration>,
    ) -> Result<bool, RemoteError> {
        if states.is_empty() {
            return Err(RemoteError::argument(
                "wait for system state needs at least one state",
            ));
        }

        let command = wait_command(states, timeout);
        match timeout {
            Some(_) => self.query::<bool>(&command),
            None => {
                let result = self
                    .connection
                    .execute_expecting_empty(&command, ExpectEmpty::No);
                self.track(result)?;
                Ok(true)
            }
        }
    }

    /// Query the operator's run phase.
    pub fn get_system_state(&mut self) -> Result<SystemState, RemoteError> {
        let state = self.query::<SystemState>(GET_SYSTEM_STATE_COMMAND)?;
        self.last_system_state = Some(state);
        Ok(state)
    }

    pub fn visualize(&mut self, expression: &str) -> Result<(), RemoteError> {
        if expression.trim().is_empty() {
            return Err(RemoteError::argument("Visualize expression cannot be empty"));
        }
        validate_message("Visualize expression", expression)?;
        if self.local_state == RemoteState::Idle {
            return Err(RemoteError::command(format!(
                "visualize requires modules to be started, but local state is Idle (system state: {})",
                self.describe_system_state()
            )));
        }

        self.send_expecting_empty(&format!("visualize watch {expression}"))
    }

    /// Read one signal sample. Channel and element are 1-based.
    pub fn get_signal(&mut self, channel: u32, element: u32) -> Result<f64, RemoteError> {
        if channel == 0 || element == 0 {
            return Err(RemoteError::argument(format!(
                "Signal indices are 1-based, got channel {channel} element {element}"
            )));
        }
        self.query::<f64>(&format!("get signal({channel},{element})"))
    }

    pub fn get_state(&mut self, name: &str) -> Result<u32, RemoteError> {
        validate_identifier("State", name)?;
        self.query::<u32>(&format!("get state {name}"))
    }

    pub fn get_event(&mut self, name: &str) -> Result<u32, RemoteError> {
        validate_identifier("Event", name)?;
        self.query::<u32>(&format!("get event {name}"))
    }

    /// Read an event's value at one sample of the current block.
    pub fn get_event_sample(&mut self, name: &str, sample: u32) -> Result<u32, RemoteError> {
        validate_identifier("Event", name)?;
        self.query::<u32>(&format!("get event[{sample}] {name}"))
    }

    pub fn set_state(&mut self, name: &str, value: u32) -> Result<(), RemoteError> {
        validate_identifier("State", name)?;
        self.send_expecting_empty(&format!("set state {name} {value}"))
    }

    pub fn set_event(&mut self, name: &str, value: u32) -> Result<(), RemoteError> {
        validate_identifier("Event", name)?;
        self.send_expecting_empty(&format!("set event {name} {value}"))
    }

    /// Set an event for exactly one sample.
    pub fn pulse_event(&mut self, name: &str, value: u32) -> Result<(), RemoteError> {
        validate_identifier("Event", name)?;
        self.send_expecting_empty(&format!("pulse event {name} {value}"))
    }

    /// Write to the operator's log window.
    pub fn log(&mut self, message: &str) -> Result<(), RemoteError> {
        validate_message("Log message", message)?;
        self.send_expecting_empty(&format!("log {message}"))
    }

    pub fn warn(&mut self, message: &str) -> Result<(), RemoteError> {
        validate_message("Warning", message)?;
        self.send_expecting_empty(&format!("warn {message}"))
    }

    pub fn error(&mut self, message: &str) -> Result<(), RemoteError> {
        validate_message("Error message", message)?;
        self.send_expecting_empty(&format!("error {message}"))
    }

    pub fn set_window_title(&mut self, title: &str) -> Result<(), RemoteError> {
        let result = self.connection.set_window_title(title);
        self.track(result)
    }

    pub fn show_window(&mut self) -> Result<(), RemoteError> {
        let result = self.connection.show_window();
        self.track(result)
    }

    pub fn hide_window(&mut self) -> Result<(), RemoteError> {
        let result = self.connection.hide_window();
        self.track(result)
    }

    /// Send any command and return the response verbatim. No local checks.
    pub fn execute(&mut self, command: &str) -> Result<String, RemoteError> {
        let result = self.connection.execute_raw(command);
        self.track(result)
    }
}
