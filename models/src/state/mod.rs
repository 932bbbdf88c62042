//! The two state enumerations of a remote-control session.
//!
//! [`RemoteState`] is the client's own bookkeeping of how far setup has been
//! driven. [`SystemState`] is the operator's authoritative run phase; it is
//! never cached by the client and is obtained by querying the operator.

use crate::{ErrorLocation, ModelError};

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Local setup progress, advanced only by the client's own commands.
///
/// Ordering follows setup progress: `Disconnected < Idle < ModulesConnected < Configured`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum RemoteState {
    #[default]
    Disconnected,
    Idle,
    ModulesConnected,
    Configured,
}

impl RemoteState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteState::Disconnected => "Disconnected",
            RemoteState::Idle => "Idle",
            RemoteState::ModulesConnected => "ModulesConnected",
            RemoteState::Configured => "Configured",
        }
    }
}

impl Display for RemoteState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(self.as_str())
    }
}

/// Run phase reported by the operator's `get system state` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemState {
    Idle,
    Startup,
    Initialization,
    Connected,
    Resting,
    Suspended,
    ParamsModified,
    Running,
    Termination,
    Busy,
}

impl SystemState {
    pub const ALL: [SystemState; 10] = [
        SystemState::Idle,
        SystemState::Startup,
        SystemState::Initialization,
        SystemState::Connected,
        SystemState::Resting,
        SystemState::Suspended,
        SystemState::ParamsModified,
        SystemState::Running,
        SystemState::Termination,
        SystemState::Busy,
    ];

    /// Name as spelled on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemState::Idle => "Idle",
            SystemState::Startup => "Startup",
            SystemState::Initialization => "Initialization",
            SystemState::Connected => "Connected",
            SystemState::Resting => "Resting",
            SystemState::Suspended => "Suspended",
            SystemState::ParamsModified => "ParamsModified",
            SystemState::Running => "Running",
            SystemState::Termination => "Termination",
            SystemState::Busy => "Busy",
        }
    }

    /// Whether a run may be started from this state without configuring first.
    pub fn accepts_start(&self) -> bool {
        matches!(
            self,
            SystemState::Resting | SystemState::Suspended | SystemState::ParamsModified
        )
    }

    /// Whether the operator still needs `set config` before a run can start.
    pub fn needs_config(&self) -> bool {
        matches!(self, SystemState::Connected | SystemState::Initialization)
    }

    /// Pipe-joined names, the form `wait for` expects.
    pub fn join(states: &[SystemState]) -> String {
        states
            .iter()
            .map(SystemState::as_str)
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl Display for SystemState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for SystemState {
    type Err = ModelError;

    /// Parses an operator reply. Surrounding whitespace is ignored and the
    /// match is case-insensitive; anything else is rejected.
    #[track_caller]
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();

        SystemState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ModelError::UnknownSystemState {
                text: trimmed.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
