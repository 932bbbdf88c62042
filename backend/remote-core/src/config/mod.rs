//! Session files.
//!
//! A session file describes one complete setup: where the operator is, how
//! the connection behaves, which modules to start and what to declare before
//! they start. For example:
//!
//! ```toml
//! [operator]
//! port = 3999
//!
//! [[modules]]
//! name = "SignalGenerator"
//! args = ["LogKeyboard=1"]
//!
//! [[states]]
//! name = "Trial"
//! bits = 8
//!
//! [run]
//! parameter_files = ["../parms/fragments/amplifiers/SignalGenerator.prm"]
//! auto_start = true
//! ```

pub mod sections;

pub use sections::{OperatorSection, RunSection};

use crate::connection::ConnectionOptions;
use crate::error::RemoteError;
use crate::error::config::ConfigError;
use crate::remote::Remote;
use crate::remote::hooks::RemoteHooks;

use common::ErrorLocation;
use models::{EventDecl, ModuleDescriptor, ParameterDecl, StateDecl, validate_identifier};

use std::collections::HashSet;
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

const APP_DIR_NAME: &str = "bciremote";
const SESSION_FILE_NAME: &str = "session.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub operator: OperatorSection,

    #[serde(default)]
    pub connection: ConnectionOptions,

    #[serde(default)]
    pub modules: Vec<ModuleDescriptor>,

    #[serde(default)]
    pub parameters: Vec<ParameterDecl>,

    #[serde(default)]
    pub states: Vec<StateDecl>,

    #[serde(default)]
    pub events: Vec<EventDecl>,

    #[serde(default)]
    pub run: RunSection,
}

/// `{config_dir}/bciremote/session.toml`.
#[track_caller]
pub fn default_session_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::DirectoryNotFound {
        location: ErrorLocation::from(Location::caller()),
    })?;

    Ok(config_dir.join(APP_DIR_NAME).join(SESSION_FILE_NAME))
}

impl SessionConfig {
    /// Load and validate a session file.
    ///
    /// A missing file yields the default session (default operator port,
    /// no modules). A file that exists but cannot be read, parsed or
    /// validated is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("Session file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            warn!("Failed to read session file {}: {e}", path.display());
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        let config = Self::parse(path, &contents)?;

        info!("Session loaded from {}", path.display());
        Ok(config)
    }

    /// Parse and validate session text. `path` is only used in errors.
    pub fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate session values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.operator.address.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "Operator address cannot be empty".to_string(),
            });
        }

        if self.operator.port == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "Operator port must be non-zero".to_string(),
            });
        }

        if self.operator.executable.is_some() && self.operator.launch_timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "launch_timeout_secs must be non-zero when an executable is set"
                    .to_string(),
            });
        }

        if let Some(title) = &self.connection.window_title
            && title.contains('"')
        {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("Window title must not contain quotes: {title:?}"),
            });
        }

        let mut seen = HashSet::new();
        for module in &self.modules {
            module.validate()?;
            if !seen.insert(module.name.as_str()) {
                return Err(ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!("Module '{}' is listed more than once", module.name),
                });
            }
        }

        for parameter in &self.parameters {
            parameter.validate()?;
        }
        for state in &self.states {
            state.validate()?;
        }
        for event in &self.events {
            event.validate()?;
        }

        for (name, value) in &self.run.parameters {
            validate_identifier("Parameter", name)?;
            if value.contains(['"', '\r', '\n']) {
                return Err(ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!("Value of parameter '{name}' must be a single unquoted line"),
                });
            }
        }

        Ok(())
    }

    /// Drive a freshly connected remote through declarations, module startup
    /// and parameter loading.
    ///
    /// Declarations go out while the remote is `Idle` (parameters, then
    /// states, then events), followed by module startup. Parameter files and
    /// overrides are applied once modules are connected. The configuration
    /// is not committed; call [`Remote::set_config`] afterwards.
    pub fn apply<H: RemoteHooks>(&self, remote: &mut Remote<H>) -> Result<(), RemoteError> {
        debug!(
            "Declaring {} parameter(s), {} state(s), {} event(s)",
            self.parameters.len(),
            self.states.len(),
            self.events.len()
        );

        for parameter in &self.parameters {
            remote.add_parameter(parameter)?;
        }
        for state in &self.states {
            remote.add_state(state)?;
        }
        for event in &self.events {
            remote.add_event(event)?;
        }

        remote.startup_modules(&self.modules)?;

        for file in &self.run.parameter_files {
            debug!("Loading parameter file {}", file.display());
            remote.load_parameters(file)?;
        }

        for (name, value) in &self.run.parameters {
            remote.set_parameter(name, value)?;
        }

        Ok(())
    }
}
