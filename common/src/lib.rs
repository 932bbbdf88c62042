//! Shared building blocks for the BCI2000 remote-control workspace.
//!
//! ## Architecture
//!
//! - **common** (this crate): error location tracking shared by every layer
//! - **models**: pure data (states, declarations, module descriptors)
//! - **remote-core**: transport, framing and the remote-control state machine
//! - **bciremote**: command-line front end wiring everything together

pub mod error;

pub use error::error_location::ErrorLocation;

#[cfg(test)]
mod tests;
