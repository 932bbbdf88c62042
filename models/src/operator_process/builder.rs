use crate::operator_process::OperatorProcess;
use crate::{ErrorLocation, ModelError};

use std::panic::Location;

/// Builder for creating validated OperatorProcess instances.
#[derive(Debug, Default)]
pub struct OperatorProcessBuilder {
    pid: Option<u32>,
    port: Option<u16>,
    name: Option<String>,
    command: Option<String>,
    owned: Option<bool>,
}

impl OperatorProcessBuilder {
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_command(mut self, cmd: impl Into<String>) -> Self {
        self.command = Some(cmd.into());
        self
    }

    pub fn with_owned(mut self, owned: bool) -> Self {
        self.owned = Some(owned);
        self
    }

    /// Build the OperatorProcess with validation.
    #[track_caller]
    pub fn build(self) -> Result<OperatorProcess, ModelError> {
        let pid = self.pid.ok_or_else(|| ModelError::Validation {
            message: String::from("PID is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if pid == 0 {
            return Err(ModelError::Validation {
                message: String::from("PID must be non-zero"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let port = self.port.ok_or_else(|| ModelError::Validation {
            message: String::from("Port is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if port == 0 {
            return Err(ModelError::Validation {
                message: String::from("Port must be non-zero"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let name = self.name.ok_or_else(|| ModelError::Validation {
            message: String::from("Operator name is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if name.is_empty() {
            return Err(ModelError::Validation {
                message: String::from("Operator name cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let command = self.command.unwrap_or_default();
        let owned = self.owned.unwrap_or(false);

        Ok(OperatorProcess {
            pid,
            port,
            name,
            command,
            owned,
        })
    }
}
