use crate::error::discovery::DiscoveryError;

use common::ErrorLocation;

use models::ModelError;

use std::error::Error as StdError;
use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum LaunchError {
    #[error("Spawn Error: {message} {location}")]
    Spawn {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Timeout Error: {message} {location}")]
    Timeout {
        message: String,
        location: ErrorLocation,
    },

    #[error("Validation Error: {message} {location}")]
    Validation {
        message: String,
        location: ErrorLocation,
    },
}

impl From<ModelError> for LaunchError {
    #[track_caller]
    fn from(error: ModelError) -> Self {
        LaunchError::Validation {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<DiscoveryError> for LaunchError {
    #[track_caller]
    fn from(error: DiscoveryError) -> Self {
        match error {
            DiscoveryError::Timeout { message, location } => {
                LaunchError::Timeout { message, location }
            }
            other => LaunchError::Spawn {
                message: other.to_string(),
                location: ErrorLocation::from(Location::caller()),
                source: Box::new(other),
            },
        }
    }
}
