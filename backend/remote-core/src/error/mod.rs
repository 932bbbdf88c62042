pub mod config;
pub mod discovery;
pub mod launch;
pub mod remote;

pub use remote::{RemoteError, RemoteErrorKind};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Remote(#[from] remote::RemoteError),

    #[error(transparent)]
    Discovery(#[from] discovery::DiscoveryError),

    #[error(transparent)]
    Launch(#[from] launch::LaunchError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
