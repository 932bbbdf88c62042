use common::ErrorLocation;

use remote_core::error::CoreError;
use remote_core::error::RemoteError;
use remote_core::error::config::ConfigError;
use remote_core::error::discovery::DiscoveryError;
use remote_core::error::launch::LaunchError;

use std::panic::Location;

use thiserror::Error;

/// Errors surfaced by the command-line front end.
#[derive(Debug, Error)]
pub enum BciRemoteError {
    /// Error from this App
    #[error("BciRemote Error: {message} {location}")]
    App {
        message: String,
        location: ErrorLocation,
    },

    /// Error from remote-core operations (protocol, session file, launch)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
        #[source]
        source: CoreError,
    },
}

impl BciRemoteError {
    #[track_caller]
    pub fn app(message: impl Into<String>) -> Self {
        BciRemoteError::App {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CoreError> for BciRemoteError {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        BciRemoteError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source: error,
        }
    }
}

impl From<RemoteError> for BciRemoteError {
    #[track_caller]
    fn from(error: RemoteError) -> Self {
        BciRemoteError::from(CoreError::from(error))
    }
}

impl From<ConfigError> for BciRemoteError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        BciRemoteError::from(CoreError::from(error))
    }
}

impl From<LaunchError> for BciRemoteError {
    #[track_caller]
    fn from(error: LaunchError) -> Self {
        BciRemoteError::from(CoreError::from(error))
    }
}

impl From<DiscoveryError> for BciRemoteError {
    #[track_caller]
    fn from(error: DiscoveryError) -> Self {
        BciRemoteError::from(CoreError::from(error))
    }
}
