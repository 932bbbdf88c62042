use std::path::PathBuf;

use common::ErrorLocation;
use models::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Session Read Error: {path}: {source} {location}")]
    ReadError {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session Parse Error: {path}: {reason} {location}")]
    ParseError {
        location: ErrorLocation,
        path: PathBuf,
        reason: String,
    },

    #[error("Session Directory Not Found Error: {location}")]
    DirectoryNotFound { location: ErrorLocation },

    #[error("Session Validation Error: {reason} {location}")]
    ValidationError {
        location: ErrorLocation,
        reason: String,
    },
}

impl From<ModelError> for ConfigError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::Validation { message, location } => ConfigError::ValidationError {
                location,
                reason: message,
            },
            ModelError::UnknownSystemState { text, location } => ConfigError::ValidationError {
                location,
                reason: format!("Unknown system state '{text}'"),
            },
        }
    }
}
