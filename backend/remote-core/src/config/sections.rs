use crate::{OPERATOR_DEFAULT_ADDRESS, OPERATOR_DEFAULT_PORT};

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_LAUNCH_TIMEOUT_SECS: u64 = 20;
const DEFAULT_QUIT_TIMEOUT_SECS: u64 = 5;

/// Where the operator listens and, optionally, how to start it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSection {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Operator executable to launch when nothing listens on the port.
    #[serde(default)]
    pub executable: Option<PathBuf>,
    #[serde(default = "default_launch_timeout_secs")]
    pub launch_timeout_secs: u64,
    /// How long the operator gets to close its port after `Quit` before it is stopped.
    #[serde(default = "default_quit_timeout_secs")]
    pub quit_timeout_secs: u64,
}

impl Default for OperatorSection {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            executable: None,
            launch_timeout_secs: default_launch_timeout_secs(),
            quit_timeout_secs: default_quit_timeout_secs(),
        }
    }
}

impl OperatorSection {
    pub fn launch_timeout(&self) -> Duration {
        Duration::from_secs(self.launch_timeout_secs)
    }

    pub fn quit_timeout(&self) -> Duration {
        Duration::from_secs(self.quit_timeout_secs)
    }
}

/// What to do once modules are connected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSection {
    /// Parameter files loaded in order, after module startup.
    #[serde(default)]
    pub parameter_files: Vec<PathBuf>,
    /// Individual parameter values, applied after the files.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    /// Start a run after the configuration is committed.
    #[serde(default)]
    pub auto_start: bool,
}

fn default_address() -> String {
    OPERATOR_DEFAULT_ADDRESS.to_string()
}
fn default_port() -> u16 {
    OPERATOR_DEFAULT_PORT
}
fn default_launch_timeout_secs() -> u64 {
    DEFAULT_LAUNCH_TIMEOUT_SECS
}
fn default_quit_timeout_secs() -> u64 {
    DEFAULT_QUIT_TIMEOUT_SECS
}
