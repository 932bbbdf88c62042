//! An in-process stand-in for the operator's telnet interface.
//!
//! Serves one client at a time on `127.0.0.1:<ephemeral>`, records every
//! command line it receives and answers from a small model of the operator:
//! `startup system` → `wait for` → `set config` → `start system` / `stop system`
//! move the system state the way the real operator does. Individual commands
//! can be given scripted replies, written chunk by chunk.

use models::SystemState;

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, sleep};
use std::time::Duration;

pub const BANNER: &str = "BCI2000 Operator\r\nTelnet interface\r\n";
const CHUNK_GAP: Duration = Duration::from_millis(20);

/// How the fake answers one command.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Raw chunks written with a short pause between them. Include the prompt yourself.
    Chunks(Vec<String>),
    /// Write nothing at all.
    Silence,
    /// Close the connection without answering.
    Hangup,
}

#[derive(Debug)]
struct Model {
    commands: Vec<String>,
    system_state: SystemState,
    parameters: HashMap<String, String>,
    scripted: HashMap<String, Reply>,
}

pub struct FakeOperator {
    address: SocketAddr,
    model: Arc<Mutex<Model>>,
    stop: Arc<AtomicBool>,
}

impl FakeOperator {
    pub fn start() -> Self {
        Self::start_in(SystemState::Idle)
    }

    pub fn start_in(system_state: SystemState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake operator");
        let address = listener.local_addr().expect("fake operator address");

        let model = Arc::new(Mutex::new(Model {
            commands: Vec::new(),
            system_state,
            parameters: HashMap::new(),
            scripted: HashMap::new(),
        }));
        let stop = Arc::new(AtomicBool::new(false));

        let thread_model = Arc::clone(&model);
        let thread_stop = Arc::clone(&stop);
        thread::spawn(move || {
            for stream in listener.incoming() {
                if thread_stop.load(Ordering::SeqCst) {
                    break;
                }
                if let Ok(stream) = stream {
                    serve(stream, &thread_model);
                }
            }
        });

        Self {
            address,
            model,
            stop,
        }
    }

    pub fn address(&self) -> String {
        self.address.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.address.port()
    }

    /// Answer `command` with `reply` instead of the modelled behaviour.
    pub fn script(&self, command: &str, reply: Reply) {
        self.lock().scripted.insert(command.to_string(), reply);
    }

    /// Answer `command` with `text` followed by the prompt, in one chunk.
    pub fn script_text(&self, command: &str, text: &str) {
        self.script(command, Reply::Chunks(vec![format!("{text}\r\n>")]));
    }

    pub fn set_system_state(&self, state: SystemState) {
        self.lock().system_state = state;
    }

    pub fn system_state(&self) -> SystemState {
        self.lock().system_state
    }

    /// Every command line received so far, without the handshake.
    pub fn commands(&self) -> Vec<String> {
        self.lock()
            .commands
            .iter()
            .filter(|c| !is_handshake(c))
            .cloned()
            .collect()
    }

    /// Every command line received so far, handshake included.
    pub fn all_commands(&self) -> Vec<String> {
        self.lock().commands.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Model> {
        self.model.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for FakeOperator {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        // Wake the accept loop so it sees the flag
        let _ = TcpStream::connect(self.address);
    }
}

fn is_handshake(command: &str) -> bool {
    command.starts_with("change directory")
        || command.starts_with("set title")
        || command == "show window"
        || command == "hide window"
}

fn serve(stream: TcpStream, model: &Arc<Mutex<Model>>) {
    let _ = stream.set_nodelay(true);
    let Ok(reader_stream) = stream.try_clone() else {
        return;
    };
    let mut writer = stream;

    if write_text(&mut writer, BANNER).is_err() {
        return;
    }

    for line in BufReader::new(reader_stream).lines() {
        let Ok(command) = line else {
            return;
        };

        let reply = {
            let mut model = model.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            model.commands.push(command.clone());
            match model.scripted.get(&command) {
                Some(reply) => reply.clone(),
                None => model.answer(&command),
            }
        };

        match reply {
            Reply::Chunks(chunks) => {
                for (i, chunk) in chunks.iter().enumerate() {
                    if i > 0 {
                        sleep(CHUNK_GAP);
                    }
                    if writer.write_all(chunk.as_bytes()).and_then(|_| writer.flush()).is_err() {
                        return;
                    }
                }
            }
            Reply::Silence => {}
            Reply::Hangup => return,
        }

        if command == "Quit" {
            return;
        }
    }
}

fn write_text(writer: &mut TcpStream, text: &str) -> std::io::Result<()> {
    writer.write_all(format!("{text}\r\n>").as_bytes())?;
    writer.flush()
}

fn text(reply: impl Into<String>) -> Reply {
    Reply::Chunks(vec![format!("{}\r\n>", reply.into())])
}

fn empty() -> Reply {
    text("")
}

impl Model {
    fn answer(&mut self, command: &str) -> Reply {
        use SystemState::*;

        if command == "get system state" {
            return text(self.system_state.as_str());
        }

        if command == "startup system" {
            self.system_state = Startup;
            return empty();
        }

        if let Some(request) = command.strip_prefix("wait for ") {
            return self.wait_for(request);
        }

        if command == "set config" {
            return match self.system_state {
                Initialization | Connected | Resting | Suspended | ParamsModified => {
                    self.system_state = Resting;
                    empty()
                }
                other => text(format!("Cannot set config in state {}", other.as_str())),
            };
        }

        if command == "start system" {
            return match self.system_state {
                Resting | Suspended | ParamsModified => {
                    self.system_state = Running;
                    empty()
                }
                other => text(format!("Cannot start in state {}", other.as_str())),
            };
        }

        if command == "stop system" {
            return match self.system_state {
                Running => {
                    self.system_state = Suspended;
                    empty()
                }
                other => text(format!("Cannot stop in state {}", other.as_str())),
            };
        }

        if command == "Quit" {
            return text("Terminating");
        }

        if let Some(rest) = command.strip_prefix("set parameter ") {
            let (name, value) = rest.split_once(' ').unwrap_or((rest, ""));
            self.parameters
                .insert(name.to_string(), value.trim_matches('"').to_string());
            return empty();
        }

        if let Some(name) = command.strip_prefix("Get parameter ") {
            return match self.parameters.get(name) {
                Some(value) => text(value.clone()),
                None => text(format!("Parameter {name} does not exist")),
            };
        }

        if command.starts_with("get state ")
            || command.starts_with("get event ")
            || command.starts_with("get event[")
        {
            return text("0");
        }

        if command.starts_with("get signal(") {
            return text("0.5");
        }

        const SILENT_PREFIXES: [&str; 16] = [
            "change directory ",
            "set title ",
            "show window",
            "hide window",
            "start executable ",
            "add parameter ",
            "add state ",
            "add event ",
            "load parameters ",
            "set state ",
            "set event ",
            "pulse event ",
            "visualize watch ",
            "log ",
            "warn ",
            "error ",
        ];
        if SILENT_PREFIXES.iter().any(|p| command.starts_with(p)) {
            return empty();
        }

        text(format!("Unknown command: {command}"))
    }

    fn wait_for(&mut self, request: &str) -> Reply {
        let (names, timeout) = match request.split_once(' ') {
            Some((names, timeout)) => (names, Some(timeout)),
            None => (request, None),
        };

        let targets: Vec<SystemState> = names
            .split('|')
            .filter_map(|name| name.parse().ok())
            .collect();

        // Modules "connect" as soon as someone waits for them
        if self.system_state == SystemState::Startup
            && targets.contains(&SystemState::Initialization)
        {
            self.system_state = SystemState::Initialization;
        }

        let reached = targets.contains(&self.system_state);
        match timeout {
            Some(_) => text(if reached { "true" } else { "false" }),
            None => empty(),
        }
    }
}
