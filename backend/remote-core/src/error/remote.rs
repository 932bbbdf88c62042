use common::ErrorLocation;

use models::ModelError;

use std::error::Error as StdError;
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::io::Error as IoError;
use std::panic::Location;

use thiserror::Error as ThisError;

/// Failures of the transport, framing and remote-control layers.
#[derive(Debug, ThisError)]
pub enum RemoteError {
    /// Session-level failure: not connected, socket failure, bad address.
    #[error("Connection Error: {message} {location}")]
    Connection {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// Protocol-level failure: wrong state, unexpected or unparseable response.
    #[error("Command Error: {message} {location}")]
    Command {
        message: String,
        location: ErrorLocation,
    },

    /// Input rejected before anything was sent.
    #[error("Argument Format Error: {message} {location}")]
    ArgumentFormat {
        message: String,
        location: ErrorLocation,
    },

    /// No prompt arrived within the configured timeout.
    #[error("Timeout Error: {message} {location}")]
    Timeout {
        message: String,
        location: ErrorLocation,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    Connection,
    Command,
    ArgumentFormat,
    Timeout,
}

impl Display for RemoteErrorKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let name = match self {
            RemoteErrorKind::Connection => "connection",
            RemoteErrorKind::Command => "command",
            RemoteErrorKind::ArgumentFormat => "argument format",
            RemoteErrorKind::Timeout => "timeout",
        };
        formatter.write_str(name)
    }
}

impl RemoteError {
    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            RemoteError::Connection { .. } => RemoteErrorKind::Connection,
            RemoteError::Command { .. } => RemoteErrorKind::Command,
            RemoteError::ArgumentFormat { .. } => RemoteErrorKind::ArgumentFormat,
            RemoteError::Timeout { .. } => RemoteErrorKind::Timeout,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RemoteError::Connection { message, .. }
            | RemoteError::Command { message, .. }
            | RemoteError::ArgumentFormat { message, .. }
            | RemoteError::Timeout { message, .. } => message,
        }
    }

    #[track_caller]
    pub(crate) fn connection(message: impl Into<String>) -> Self {
        RemoteError::Connection {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
            source: None,
        }
    }

    #[track_caller]
    pub(crate) fn io(message: impl Into<String>, error: IoError) -> Self {
        RemoteError::Connection {
            message: format!("{}: {error}", message.into()),
            location: ErrorLocation::from(Location::caller()),
            source: Some(Box::new(error)),
        }
    }

    #[track_caller]
    pub(crate) fn command(message: impl Into<String>) -> Self {
        RemoteError::Command {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn argument(message: impl Into<String>) -> Self {
        RemoteError::ArgumentFormat {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ModelError> for RemoteError {
    #[track_caller]
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::Validation { message, location } => {
                RemoteError::ArgumentFormat { message, location }
            }
            ModelError::UnknownSystemState { text, location } => RemoteError::Command {
                message: format!("Operator reported an unknown system state: '{text}'"),
                location,
            },
        }
    }
}
