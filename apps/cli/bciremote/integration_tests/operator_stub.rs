//! A minimal operator for driving the command line end to end.
//!
//! Answers the connect handshake with an empty prompt, `get system state`
//! with `Idle` and `Quit` with `Terminating`. Depending on how it is started
//! it either closes its port on `Quit` or keeps listening.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

pub struct OperatorStub {
    port: u16,
    commands: Arc<Mutex<Vec<String>>>,
}

impl OperatorStub {
    /// An operator that closes its port once asked to quit.
    pub fn start() -> Self {
        Self::spawn(true)
    }

    /// An operator that answers `Quit` but keeps listening.
    pub fn start_ignoring_quit() -> Self {
        Self::spawn(false)
    }

    fn spawn(honours_quit: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind operator stub");
        let port = listener.local_addr().expect("stub address").port();
        let commands = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&commands);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else {
                    continue;
                };
                let quit = serve(stream, &recorded);
                if quit && honours_quit {
                    return;
                }
            }
        });

        Self { port, commands }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Serve one client. Returns whether it asked the operator to quit.
fn serve(mut stream: TcpStream, commands: &Arc<Mutex<Vec<String>>>) -> bool {
    let Ok(reader) = stream.try_clone() else {
        return false;
    };
    if stream.write_all(b"Operator stub\r\n>").is_err() {
        return false;
    }

    for line in BufReader::new(reader).lines() {
        let Ok(command) = line else {
            return false;
        };
        commands
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(command.clone());

        let reply: &[u8] = match command.as_str() {
            "get system state" => b"Idle\r\n>",
            "Quit" => b"Terminating\r\n>",
            _ => b">",
        };
        if stream.write_all(reply).is_err() {
            return false;
        }
        if command == "Quit" {
            return true;
        }
    }

    false
}
